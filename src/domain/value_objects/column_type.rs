use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static CURRENCY_SYMBOLS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\$€£¥₹₽₩¢₦₨₪₫₡₲₴₸₵₶₷₺₻₼₾₿]").expect("currency pattern is valid")
});

const MAX_STRING_CHARS: usize = 255;

/// Column types the schema inferencer may assign to a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Integer,
    Float,
    Text,
    Currency,
    Percentage,
}

/// A coerced cell, ready to be written into a dynamic table.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
}

impl ColumnType {
    pub const ALL: [ColumnType; 6] = [
        ColumnType::String,
        ColumnType::Integer,
        ColumnType::Float,
        ColumnType::Text,
        ColumnType::Currency,
        ColumnType::Percentage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Text => "text",
            ColumnType::Currency => "currency",
            ColumnType::Percentage => "percentage",
        }
    }

    pub fn from_string(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "string" => Ok(ColumnType::String),
            "integer" => Ok(ColumnType::Integer),
            "float" => Ok(ColumnType::Float),
            "text" => Ok(ColumnType::Text),
            "currency" => Ok(ColumnType::Currency),
            "percentage" => Ok(ColumnType::Percentage),
            other => Err(format!("Invalid column type: {}", other)),
        }
    }

    /// Lenient parse used on LLM output: anything unknown is stored as a string.
    pub fn from_string_lossy(s: &str) -> Self {
        Self::from_string(s).unwrap_or(ColumnType::String)
    }

    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::String => "VARCHAR(255)",
            ColumnType::Integer => "BIGINT",
            ColumnType::Float | ColumnType::Currency | ColumnType::Percentage => {
                "DOUBLE PRECISION"
            }
            ColumnType::Text => "TEXT",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ColumnType::String => "VARCHAR(255) - Text data",
            ColumnType::Text => "TEXT - Long text content",
            ColumnType::Integer => "INT - Whole numbers",
            ColumnType::Float => "FLOAT - Decimal numbers",
            ColumnType::Currency => "FLOAT - Monetary values (parsed from currency symbols)",
            ColumnType::Percentage => {
                "FLOAT - Percentage values (stored as decimal: 0.25 for 25%)"
            }
        }
    }

    pub fn coerce(&self, raw: &str) -> CellValue {
        let cleaned = raw.trim();
        if cleaned.is_empty() {
            return CellValue::Null;
        }

        match self {
            ColumnType::String => CellValue::Text(cleaned.chars().take(MAX_STRING_CHARS).collect()),
            ColumnType::Text => CellValue::Text(cleaned.to_string()),
            numeric => {
                let parsed = numeric
                    .parse_numeric(cleaned)
                    .or_else(|| parse_float(&cleaned.replace(',', "")));

                match parsed {
                    Some(value) if *numeric == ColumnType::Integer => truncate_to_i64(value)
                        .map(CellValue::Integer)
                        .unwrap_or(CellValue::Null),
                    Some(value) => CellValue::Float(value),
                    None => CellValue::Null,
                }
            }
        }
    }

    fn parse_numeric(&self, value: &str) -> Option<f64> {
        match self {
            ColumnType::Currency => {
                let mut cleaned = CURRENCY_SYMBOLS
                    .replace_all(value, "")
                    .replace([',', ' '], "");
                if cleaned.starts_with('(') && cleaned.ends_with(')') && cleaned.len() >= 2 {
                    cleaned = format!("-{}", &cleaned[1..cleaned.len() - 1]);
                }
                parse_float(&cleaned)
            }
            ColumnType::Percentage => {
                if value.contains('%') {
                    parse_float(value.replace('%', "").trim()).map(|v| v / 100.0)
                } else {
                    parse_float(value)
                }
            }
            ColumnType::Float | ColumnType::Integer => {
                let cleaned: String = value
                    .chars()
                    .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | 'e'))
                    .collect();
                parse_float(&cleaned)
            }
            ColumnType::String | ColumnType::Text => None,
        }
    }
}

impl Default for ColumnType {
    fn default() -> Self {
        ColumnType::String
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn parse_float(value: &str) -> Option<f64> {
    if value.is_empty() {
        return None;
    }
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn truncate_to_i64(value: f64) -> Option<i64> {
    let truncated = value.trunc();
    if truncated >= i64::MIN as f64 && truncated <= i64::MAX as f64 {
        Some(truncated as i64)
    } else {
        None
    }
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Renders the value as a PostgreSQL literal.
    pub fn to_sql_literal(&self) -> String {
        match self {
            CellValue::Null => "NULL".to_string(),
            CellValue::Text(s) => format!("'{}'", s.replace('\0', "").replace('\'', "''")),
            CellValue::Integer(i) => i.to_string(),
            CellValue::Float(f) => format!("{:?}", f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_parsing() {
        assert_eq!(ColumnType::Currency.coerce("$4.34"), CellValue::Float(4.34));
        assert_eq!(ColumnType::Currency.coerce("€1,250.50"), CellValue::Float(1250.5));
        assert_eq!(ColumnType::Currency.coerce("(300)"), CellValue::Float(-300.0));
        assert_eq!(ColumnType::Currency.coerce("¥ 1 000"), CellValue::Float(1000.0));
    }

    #[test]
    fn test_percentage_parsing() {
        assert_eq!(ColumnType::Percentage.coerce("25%"), CellValue::Float(0.25));
        assert_eq!(ColumnType::Percentage.coerce("0.15"), CellValue::Float(0.15));
        assert_eq!(ColumnType::Percentage.coerce("n/a"), CellValue::Null);
    }

    #[test]
    fn test_integer_truncates() {
        assert_eq!(ColumnType::Integer.coerce("42"), CellValue::Integer(42));
        assert_eq!(ColumnType::Integer.coerce("3.9 goals"), CellValue::Integer(3));
        assert_eq!(ColumnType::Integer.coerce("1,204"), CellValue::Integer(1204));
    }

    #[test]
    fn test_float_strips_units() {
        assert_eq!(ColumnType::Float.coerce("12.5 kg"), CellValue::Float(12.5));
        assert_eq!(ColumnType::Float.coerce("abc"), CellValue::Null);
    }

    #[test]
    fn test_empty_cells_are_null() {
        for column_type in ColumnType::ALL {
            assert!(column_type.coerce("   ").is_null());
        }
    }

    #[test]
    fn test_string_is_truncated() {
        let long = "x".repeat(300);
        match ColumnType::String.coerce(&long) {
            CellValue::Text(s) => assert_eq!(s.len(), 255),
            other => panic!("unexpected value {:?}", other),
        }
        match ColumnType::Text.coerce(&long) {
            CellValue::Text(s) => assert_eq!(s.len(), 300),
            other => panic!("unexpected value {:?}", other),
        }
    }

    #[test]
    fn test_lossy_type_parsing() {
        assert_eq!(ColumnType::from_string_lossy("Currency"), ColumnType::Currency);
        assert_eq!(ColumnType::from_string_lossy("date"), ColumnType::String);
        assert!(ColumnType::from_string("date").is_err());
    }

    #[test]
    fn test_sql_literals() {
        assert_eq!(CellValue::Text("O'Neil".into()).to_sql_literal(), "'O''Neil'");
        assert_eq!(CellValue::Integer(7).to_sql_literal(), "7");
        assert_eq!(CellValue::Float(1.0).to_sql_literal(), "1.0");
        assert_eq!(CellValue::Null.to_sql_literal(), "NULL");
    }
}
