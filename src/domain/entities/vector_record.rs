use pgvector::Vector;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Resume,
    EventDocument,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Resume => "resume",
            DocumentType::EventDocument => "event_document",
        }
    }
}

/// Metadata stored next to each vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorMetadata {
    pub text: String,
    pub filename: String,
    #[serde(rename = "userId", default)]
    pub user_id: String,
    pub document_type: DocumentType,
    #[serde(default)]
    pub table_count: usize,
}

#[derive(Debug, Clone)]
pub struct VectorRecord {
    id: String,
    values: Vector,
    metadata: VectorMetadata,
}

impl VectorRecord {
    /// Ids take the form `{filename}_{uuid}`.
    pub fn new(values: Vector, metadata: VectorMetadata) -> Self {
        Self {
            id: format!("{}_{}", metadata.filename, Uuid::new_v4()),
            values,
            metadata,
        }
    }

    pub fn from_parts(id: String, values: Vector, metadata: VectorMetadata) -> Self {
        Self {
            id,
            values,
            metadata,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn values(&self) -> &Vector {
        &self.values
    }

    pub fn metadata(&self) -> &VectorMetadata {
        &self.metadata
    }

    pub fn text(&self) -> &str {
        &self.metadata.text
    }

    pub fn filename(&self) -> &str {
        &self.metadata.filename
    }
}

/// A similarity-search hit.
#[derive(Debug, Clone, Serialize)]
pub struct VectorMatch {
    pub id: String,
    pub text: String,
    pub filename: String,
    pub score: f32,
}

/// Cosine similarity of two vectors; 0.0 when either has zero norm or the sizes differ.
pub fn cosine_similarity(a: &Vector, b: &Vector) -> f32 {
    let a = a.as_slice();
    let b = b.as_slice();
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_is_prefixed_with_filename() {
        let record = VectorRecord::new(
            Vector::from(vec![0.1, 0.2]),
            VectorMetadata {
                text: "Keynote at 9am".to_string(),
                filename: "agenda.pdf".to_string(),
                user_id: String::new(),
                document_type: DocumentType::EventDocument,
                table_count: 2,
            },
        );

        assert!(record.id().starts_with("agenda.pdf_"));
        assert_eq!(record.id().len(), "agenda.pdf_".len() + 36);
        assert_eq!(record.values().as_slice().len(), 2);
    }

    #[test]
    fn test_metadata_field_names() {
        let metadata = VectorMetadata {
            text: "Jane Doe, engineer".to_string(),
            filename: "jane_resume.pdf".to_string(),
            user_id: "jane_resume".to_string(),
            document_type: DocumentType::Resume,
            table_count: 0,
        };

        let value = serde_json::to_value(&metadata).unwrap();
        assert_eq!(value["userId"], "jane_resume");
        assert_eq!(value["document_type"], "resume");
    }

    #[test]
    fn test_cosine_similarity() {
        let a = Vector::from(vec![1.0, 0.0]);
        let b = Vector::from(vec![1.0, 0.0]);
        let c = Vector::from(vec![0.0, 1.0]);
        let zero = Vector::from(vec![0.0, 0.0]);

        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&a, &c).abs() < 1e-6);
        assert_eq!(cosine_similarity(&a, &zero), 0.0);
    }
}
