use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Lifecycle of a registered table.
#[derive(Debug, Clone, PartialEq)]
pub enum TableStatus {
    Processing,
    Complete,
    Failed(String),
}

impl TableStatus {
    pub fn is_processing(&self) -> bool {
        matches!(self, TableStatus::Processing)
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, TableStatus::Complete)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, TableStatus::Failed(_))
    }

    pub fn can_transition_to(&self, new_status: &TableStatus) -> bool {
        matches!(
            (self, new_status),
            (TableStatus::Processing, TableStatus::Complete)
                | (TableStatus::Processing, TableStatus::Failed(_))
        )
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            TableStatus::Failed(error) => Some(error),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TableStatus::Processing => "processing",
            TableStatus::Complete => "complete",
            TableStatus::Failed(_) => "failed",
        }
    }

    pub fn from_string(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "processing" => Ok(TableStatus::Processing),
            "complete" | "completed" => Ok(TableStatus::Complete),
            "failed" => Ok(TableStatus::Failed("Unknown error".to_string())),
            s if s.starts_with("failed:") => {
                let error = s.strip_prefix("failed:").unwrap_or("").trim();
                Ok(TableStatus::Failed(error.to_string()))
            }
            _ => Err(format!("Invalid table status: {}", s)),
        }
    }
}

impl Default for TableStatus {
    fn default() -> Self {
        TableStatus::Processing
    }
}

impl std::fmt::Display for TableStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableStatus::Failed(error) => write!(f, "failed: {}", error),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

// Registry files store the status as a plain string.
impl Serialize for TableStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TableStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        TableStatus::from_string(&raw).map_err(serde::de::Error::custom)
    }
}
