pub mod combiner_agent;
pub mod manager_agent;
pub mod orchestrator;
pub mod rag_agent;
pub mod table_agent;

pub use combiner_agent::CombinerAgent;
pub use manager_agent::ManagerAgent;
pub use orchestrator::{Orchestrator, OrchestratorReply, QueryMetadata};
pub use rag_agent::{RagAgent, RagAnswer, RagHealth};
pub use table_agent::TableAgent;
