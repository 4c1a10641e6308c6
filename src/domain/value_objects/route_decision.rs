use serde::Serialize;

/// Which agents a query is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteDecision {
    Table,
    Rag,
    Both,
}

impl RouteDecision {
    /// Parses the manager's one-word reply. Anything unrecognised routes to retrieval.
    pub fn from_reply(reply: &str) -> Self {
        let normalized = reply
            .trim()
            .trim_matches(|c: char| c == '"' || c == '\'' || c == '.' || c == '`')
            .to_lowercase();

        match normalized.as_str() {
            "table" => RouteDecision::Table,
            "both" => RouteDecision::Both,
            _ => RouteDecision::Rag,
        }
    }

    pub fn needs_table(&self) -> bool {
        matches!(self, RouteDecision::Table | RouteDecision::Both)
    }

    pub fn needs_rag(&self) -> bool {
        matches!(self, RouteDecision::Rag | RouteDecision::Both)
    }
}

impl Default for RouteDecision {
    fn default() -> Self {
        RouteDecision::Rag
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_parsing() {
        assert_eq!(RouteDecision::from_reply("table"), RouteDecision::Table);
        assert_eq!(RouteDecision::from_reply("  Both\n"), RouteDecision::Both);
        assert_eq!(RouteDecision::from_reply("\"rag\""), RouteDecision::Rag);
        assert_eq!(RouteDecision::from_reply("I think table"), RouteDecision::Rag);
    }

    #[test]
    fn test_flags() {
        assert!(RouteDecision::Both.needs_table() && RouteDecision::Both.needs_rag());
        assert!(RouteDecision::Table.needs_table() && !RouteDecision::Table.needs_rag());
        assert!(!RouteDecision::Rag.needs_table() && RouteDecision::Rag.needs_rag());
    }
}
