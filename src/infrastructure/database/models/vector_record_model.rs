use chrono::{DateTime, Utc};
use diesel::prelude::*;
use pgvector::Vector;

use crate::domain::entities::{VectorMetadata, VectorRecord};
use crate::infrastructure::database::schema::vector_records;

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = vector_records)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct VectorRecordModel {
    pub id: String,
    pub filename: String,
    pub content: String,
    pub metadata: serde_json::Value,
    pub embedding: Vector,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = vector_records)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewVectorRecordModel {
    pub id: String,
    pub filename: String,
    pub content: String,
    pub metadata: serde_json::Value,
    pub embedding: Vector,
}

impl TryFrom<&VectorRecord> for NewVectorRecordModel {
    type Error = String;

    fn try_from(record: &VectorRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: record.id().to_string(),
            filename: record.filename().to_string(),
            content: record.text().to_string(),
            metadata: serde_json::to_value(record.metadata()).map_err(|e| e.to_string())?,
            embedding: record.values().clone(),
        })
    }
}

impl TryFrom<VectorRecordModel> for VectorRecord {
    type Error = String;

    fn try_from(model: VectorRecordModel) -> Result<Self, Self::Error> {
        let metadata: VectorMetadata =
            serde_json::from_value(model.metadata).map_err(|e| e.to_string())?;
        Ok(VectorRecord::from_parts(model.id, model.embedding, metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::DocumentType;

    #[test]
    fn test_model_round_trips_metadata() {
        let record = VectorRecord::new(
            Vector::from(vec![0.3, 0.4]),
            VectorMetadata {
                text: "Workshop in room 2".to_string(),
                filename: "agenda.pdf".to_string(),
                user_id: String::new(),
                document_type: DocumentType::EventDocument,
                table_count: 3,
            },
        );

        let new_model = NewVectorRecordModel::try_from(&record).unwrap();
        assert_eq!(new_model.content, "Workshop in room 2");
        assert_eq!(new_model.metadata["table_count"], 3);

        let stored = VectorRecordModel {
            id: new_model.id,
            filename: new_model.filename,
            content: new_model.content,
            metadata: new_model.metadata,
            embedding: new_model.embedding,
            created_at: Utc::now(),
        };
        let restored = VectorRecord::try_from(stored).unwrap();
        assert_eq!(restored.id(), record.id());
        assert_eq!(restored.metadata(), record.metadata());
    }
}
