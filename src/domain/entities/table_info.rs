use serde::{Deserialize, Serialize};

use crate::domain::entities::TableSchema;
use crate::domain::value_objects::{CellValue, SqlIdentifier};

/// Page text surrounding a table, handed to the description prompt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableContext {
    pub before: String,
    pub after: String,
}

/// A table being assembled from one or more page grids.
/// `data` includes the header row as its first element.
#[derive(Debug, Clone, PartialEq)]
pub struct TableInfo {
    name: SqlIdentifier,
    schema: TableSchema,
    description: String,
    data: Vec<Vec<String>>,
    column_count: usize,
    context: TableContext,
}

impl TableInfo {
    pub fn new(
        name: SqlIdentifier,
        schema: TableSchema,
        description: String,
        data: Vec<Vec<String>>,
        context: TableContext,
    ) -> Self {
        let column_count = data.first().map(|row| row.len()).unwrap_or(schema.len());
        Self {
            name,
            schema,
            description,
            data,
            column_count,
            context,
        }
    }

    pub fn name(&self) -> &SqlIdentifier {
        &self.name
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn data(&self) -> &[Vec<String>] {
        &self.data
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }

    pub fn context(&self) -> &TableContext {
        &self.context
    }

    pub fn header_row(&self) -> Option<&Vec<String>> {
        self.data.first()
    }

    pub fn data_rows(&self) -> &[Vec<String>] {
        if self.data.is_empty() {
            &self.data
        } else {
            &self.data[1..]
        }
    }

    pub fn row_count(&self) -> usize {
        self.data_rows().len()
    }

    /// Appends the rows of a continuation grid.
    pub fn extend_rows(&mut self, rows: Vec<Vec<String>>) {
        self.data.extend(rows);
    }

    pub fn set_description(&mut self, description: String) {
        self.description = description;
    }

    /// Data rows padded or truncated to the schema width.
    pub fn normalized_rows(&self) -> Vec<Vec<String>> {
        let width = self.schema.len();
        self.data_rows()
            .iter()
            .map(|row| {
                let mut row: Vec<String> = row.iter().take(width).cloned().collect();
                row.resize(width, String::new());
                row
            })
            .collect()
    }

    /// Data rows coerced to the column types.
    pub fn typed_rows(&self) -> Vec<Vec<CellValue>> {
        self.normalized_rows()
            .into_iter()
            .map(|row| {
                self.schema
                    .columns()
                    .iter()
                    .zip(row.iter())
                    .map(|(column, cell)| column.column_type.coerce(cell))
                    .collect()
            })
            .collect()
    }

    /// Up to five data rows, or the first three, an ellipsis row and the last two.
    pub fn preview_rows(&self) -> Vec<Vec<String>> {
        let rows = self.normalized_rows();
        if rows.len() <= 5 {
            return rows;
        }

        let width = self.schema.len();
        let mut preview: Vec<Vec<String>> = rows[..3].to_vec();
        preview.push(vec!["...".to_string(); width]);
        preview.extend_from_slice(&rows[rows.len() - 2..]);
        preview
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ColumnDef;
    use crate::domain::value_objects::ColumnType;

    fn sample_table(rows: usize) -> TableInfo {
        let schema = TableSchema::new(vec![
            ColumnDef {
                name: SqlIdentifier::parse("player").unwrap(),
                column_type: ColumnType::String,
            },
            ColumnDef {
                name: SqlIdentifier::parse("goals").unwrap(),
                column_type: ColumnType::Integer,
            },
        ]);

        let mut data = vec![vec!["Player".to_string(), "Goals".to_string()]];
        for i in 0..rows {
            data.push(vec![format!("P{}", i), i.to_string()]);
        }

        TableInfo::new(
            SqlIdentifier::parse("pdf_1234abcd_goals").unwrap(),
            schema,
            "TBD".to_string(),
            data,
            TableContext::default(),
        )
    }

    #[test]
    fn test_header_is_skipped() {
        let table = sample_table(3);
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.header_row().unwrap()[0], "Player");
    }

    #[test]
    fn test_rows_are_normalized_to_schema_width() {
        let mut table = sample_table(0);
        table.extend_rows(vec![
            vec!["Short".to_string()],
            vec!["Long".into(), "2".into(), "extra".into()],
        ]);

        let rows = table.normalized_rows();
        assert_eq!(rows[0], vec!["Short".to_string(), String::new()]);
        assert_eq!(rows[1], vec!["Long".to_string(), "2".to_string()]);
    }

    #[test]
    fn test_typed_rows_coerce_cells() {
        let mut table = sample_table(1);
        table.extend_rows(vec![vec!["Unknown".into(), "n/a".into()]]);

        let rows = table.typed_rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][1], CellValue::Integer(0));
        assert_eq!(rows[1][0], CellValue::Text("Unknown".to_string()));
        assert!(rows[1][1].is_null());
    }

    #[test]
    fn test_preview_elides_middle_rows() {
        let table = sample_table(8);
        let preview = table.preview_rows();
        assert_eq!(preview.len(), 6);
        assert_eq!(preview[3], vec!["...".to_string(), "...".to_string()]);
        assert_eq!(preview[5][0], "P7");

        assert_eq!(sample_table(4).preview_rows().len(), 4);
    }
}
