use serde::{Deserialize, Serialize};
use std::collections::HashSet;

const MAX_IDENTIFIER_LEN: usize = 63;

/// A table or column name reduced to `[a-z0-9_]`, safe to interpolate into DDL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SqlIdentifier(String);

impl SqlIdentifier {
    /// Normalizes free text into an identifier. Returns `None` when nothing usable is left.
    pub fn sanitize(raw: &str) -> Option<Self> {
        let mut out = String::with_capacity(raw.len());
        let mut last_underscore = false;

        for c in raw.trim().chars().flat_map(char::to_lowercase) {
            if c.is_ascii_alphanumeric() {
                out.push(c);
                last_underscore = false;
            } else if !last_underscore && !out.is_empty() {
                out.push('_');
                last_underscore = true;
            }
        }

        let trimmed = out.trim_end_matches('_');
        if trimmed.is_empty() {
            return None;
        }

        let mut ident = if trimmed.starts_with(|c: char| c.is_ascii_digit()) {
            format!("t_{}", trimmed)
        } else {
            trimmed.to_string()
        };
        ident.truncate(MAX_IDENTIFIER_LEN);

        Some(Self(ident.trim_end_matches('_').to_string()))
    }

    /// Accepts only names that already are valid identifiers.
    pub fn parse(raw: &str) -> Result<Self, String> {
        match Self::sanitize(raw) {
            Some(ident) if ident.0 == raw => Ok(ident),
            _ => Err(format!("Invalid SQL identifier: {}", raw)),
        }
    }

    /// Name for the `index`-th table extracted from a document.
    pub fn for_table(pdf_uuid: &str, index: usize) -> Self {
        let raw = format!("pdf_{}_table_{}", pdf_uuid, index);
        Self::sanitize(&raw).unwrap_or_else(|| Self(format!("pdf_table_{}", index)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }

    /// Appends `_2`, `_3`, ... until `taken` reports the name as free.
    pub fn with_unique_suffix(self, taken: impl Fn(&str) -> bool) -> Self {
        if !taken(&self.0) {
            return self;
        }

        let mut n = 2;
        loop {
            let suffix = format!("_{}", n);
            let mut base = self.0.clone();
            base.truncate(MAX_IDENTIFIER_LEN - suffix.len());
            let candidate = format!("{}{}", base, suffix);
            if !taken(&candidate) {
                return Self(candidate);
            }
            n += 1;
        }
    }
}

impl std::fmt::Display for SqlIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cleans a header row into distinct column identifiers.
/// Empty headers become `col_{i}`, repeats become `name_{n}`.
pub fn dedupe_columns<S: AsRef<str>>(headers: &[S]) -> Vec<SqlIdentifier> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut columns = Vec::with_capacity(headers.len());

    for (i, header) in headers.iter().enumerate() {
        let base = SqlIdentifier::sanitize(header.as_ref())
            .unwrap_or_else(|| SqlIdentifier(format!("col_{}", i + 1)));
        let unique = base.with_unique_suffix(|name| seen.contains(name));
        seen.insert(unique.0.clone());
        columns.push(unique);
    }

    columns
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize() {
        let ident = SqlIdentifier::sanitize("Patient ID (Primary)").unwrap();
        assert_eq!(ident.as_str(), "patient_id_primary");

        let ident = SqlIdentifier::sanitize("2024 Revenue").unwrap();
        assert_eq!(ident.as_str(), "t_2024_revenue");

        assert!(SqlIdentifier::sanitize("  %%  ").is_none());
    }

    #[test]
    fn test_sanitize_truncates() {
        let ident = SqlIdentifier::sanitize(&"a".repeat(100)).unwrap();
        assert_eq!(ident.as_str().len(), 63);
    }

    #[test]
    fn test_parse_rejects_unsafe_names() {
        assert!(SqlIdentifier::parse("pdf_ab12_sales").is_ok());
        assert!(SqlIdentifier::parse("sales; DROP TABLE x").is_err());
        assert!(SqlIdentifier::parse("Sales").is_err());
    }

    #[test]
    fn test_for_table() {
        assert_eq!(SqlIdentifier::for_table("AB12cd34", 2).as_str(), "pdf_ab12cd34_table_2");
    }

    #[test]
    fn test_unique_suffix() {
        let taken = ["sales", "sales_2"];
        let ident = SqlIdentifier::sanitize("sales")
            .unwrap()
            .with_unique_suffix(|name| taken.contains(&name));
        assert_eq!(ident.as_str(), "sales_3");
    }

    #[test]
    fn test_dedupe_columns() {
        let columns = dedupe_columns(&["Name", "", "Name", "Goals Scored"]);
        let names: Vec<&str> = columns.iter().map(|c| c.as_str()).collect();
        assert_eq!(names, vec!["name", "col_2", "name_2", "goals_scored"]);
    }
}
