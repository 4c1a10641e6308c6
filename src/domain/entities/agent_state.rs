use crate::domain::value_objects::RouteDecision;

/// Per-query workflow state. Lives for the duration of one answer request.
#[derive(Debug, Clone, Default)]
pub struct AgentState {
    query: String,
    route: Option<RouteDecision>,
    table_response: Option<String>,
    rag_response: Option<String>,
    response: Option<String>,
}

impl AgentState {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn needs_table(&self) -> bool {
        self.route.map(|r| r.needs_table()).unwrap_or(false)
    }

    pub fn needs_rag(&self) -> bool {
        self.route.map(|r| r.needs_rag()).unwrap_or(false)
    }

    pub fn table_response(&self) -> Option<&str> {
        self.table_response.as_deref()
    }

    pub fn rag_response(&self) -> Option<&str> {
        self.rag_response.as_deref()
    }

    pub fn set_route(&mut self, route: RouteDecision) {
        self.route = Some(route);
    }

    pub fn set_table_response(&mut self, response: String) {
        self.table_response = Some(response);
    }

    pub fn set_rag_response(&mut self, response: String) {
        self.rag_response = Some(response);
    }

    pub fn set_response(&mut self, response: String) {
        self.response = Some(response);
    }

    pub fn into_response(self) -> Option<String> {
        self.response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_follow_route() {
        let mut state = AgentState::new("How many goals?");
        assert!(!state.needs_table() && !state.needs_rag());

        state.set_route(RouteDecision::Both);
        assert!(state.needs_table() && state.needs_rag());

        state.set_table_response("| goals |".to_string());
        assert_eq!(state.table_response(), Some("| goals |"));
        assert!(state.rag_response().is_none());
    }
}
