use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::value_objects::{ColumnType, SqlIdentifier};

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: SqlIdentifier,
    pub column_type: ColumnType,
}

/// Ordered column → type mapping. Serialized as a JSON object in column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableSchema {
    columns: Vec<ColumnDef>,
}

impl TableSchema {
    pub fn new(columns: Vec<ColumnDef>) -> Self {
        Self { columns }
    }

    /// Every column typed as `string`; used when inference fails.
    pub fn all_strings(names: Vec<SqlIdentifier>) -> Self {
        Self {
            columns: names
                .into_iter()
                .map(|name| ColumnDef {
                    name,
                    column_type: ColumnType::String,
                })
                .collect(),
        }
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.columns
            .iter()
            .find(|c| c.name.as_str() == name)
            .map(|c| c.column_type)
    }
}

impl Serialize for TableSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for column in &self.columns {
            map.serialize_entry(column.name.as_str(), column.column_type.as_str())?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TableSchema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SchemaVisitor;

        impl<'de> Visitor<'de> for SchemaVisitor {
            type Value = TableSchema;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a map of column names to column types")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut columns = Vec::new();
                while let Some((name, column_type)) = access.next_entry::<String, String>()? {
                    let name = SqlIdentifier::parse(&name).map_err(serde::de::Error::custom)?;
                    let column_type =
                        ColumnType::from_string(&column_type).map_err(serde::de::Error::custom)?;
                    columns.push(ColumnDef { name, column_type });
                }
                Ok(TableSchema { columns })
            }
        }

        deserializer.deserialize_map(SchemaVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(s: &str) -> SqlIdentifier {
        SqlIdentifier::parse(s).unwrap()
    }

    #[test]
    fn test_serialization_keeps_column_order() {
        let schema = TableSchema::new(vec![
            ColumnDef {
                name: ident("year"),
                column_type: ColumnType::Integer,
            },
            ColumnDef {
                name: ident("revenue"),
                column_type: ColumnType::Currency,
            },
            ColumnDef {
                name: ident("author"),
                column_type: ColumnType::String,
            },
        ]);

        let json = serde_json::to_string(&schema).unwrap();
        assert_eq!(
            json,
            r#"{"year":"integer","revenue":"currency","author":"string"}"#
        );

        let parsed: TableSchema = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, schema);
        assert_eq!(parsed.column_type("revenue"), Some(ColumnType::Currency));
    }

    #[test]
    fn test_rejects_unknown_types() {
        let result: Result<TableSchema, _> = serde_json::from_str(r#"{"when":"date"}"#);
        assert!(result.is_err());
    }
}
