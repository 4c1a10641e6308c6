/// A single read-only SQL statement (`SELECT ...` or `WITH ...`) with any
/// trailing semicolons removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectStatement(String);

impl SelectStatement {
    pub fn parse(sql: &str) -> Result<Self, String> {
        let statement = sql.trim().trim_end_matches(|c: char| c == ';' || c.is_whitespace());
        if statement.is_empty() {
            return Err("Empty SQL statement".to_string());
        }

        let keyword = statement
            .split(|c: char| c.is_whitespace() || c == '(')
            .next()
            .unwrap_or_default()
            .to_uppercase();
        if keyword != "SELECT" && keyword != "WITH" {
            return Err(format!("Only SELECT statements are allowed, got {}", keyword));
        }

        if has_unquoted_semicolon(statement) {
            return Err("Multiple SQL statements are not allowed".to_string());
        }

        Ok(Self(statement.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the statement computes a SUM, COUNT or AVG.
    pub fn is_aggregation(&self) -> bool {
        let upper = self.0.to_uppercase();
        ["SUM", "COUNT", "AVG"].iter().any(|k| upper.contains(k))
    }
}

impl std::fmt::Display for SelectStatement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn has_unquoted_semicolon(sql: &str) -> bool {
    let mut quote: Option<char> = None;
    for c in sql.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, ';') => return true,
            _ => {}
        }
    }
    false
}
