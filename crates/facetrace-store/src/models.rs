use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A person record, named or not yet named.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub name: Option<String>,
    pub surname: Option<String>,
    /// Soft-delete tombstone. Inactive identities are excluded from every
    /// registry scan and query result but keep their historical rows.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Identity {
    /// A freshly observed, not yet named identity.
    pub fn unnamed(created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: None,
            surname: None,
            is_active: true,
            created_at,
        }
    }

    /// An identity is known once both name and surname are set.
    pub fn is_known(&self) -> bool {
        self.name.is_some() && self.surname.is_some()
    }
}

/// A stored face embedding. The vector is immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRow {
    pub id: Uuid,
    pub identity_id: Uuid,
    pub vector: Vec<f32>,
    pub crop_path: String,
    pub created_at: DateTime<Utc>,
}

/// "This identity was observed in this image with this confidence."
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRow {
    pub id: Uuid,
    pub identity_id: Uuid,
    pub image_id: Uuid,
    /// Integer confidence in [0, 100].
    pub confidence: u8,
    pub created_at: DateTime<Utc>,
}

/// A source image uploaded for ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRow {
    pub id: Uuid,
    pub file_path: String,
    pub created_at: DateTime<Utc>,
}

/// One identity with its crop and most recent match, as returned by the
/// known/unknown registry scans.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sighting {
    pub identity: Identity,
    pub crop_path: String,
    pub match_id: Uuid,
    pub confidence: u8,
    pub matched_at: DateTime<Utc>,
}

/// One entry of an identity's observation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRow {
    pub match_id: Uuid,
    pub confidence: u8,
    pub matched_at: DateTime<Utc>,
    pub crop_path: String,
    pub source_image_path: String,
}

/// All rows one image ingestion produced, committed in one transaction.
#[derive(Debug, Default)]
pub struct IngestBatch {
    pub identities: Vec<Identity>,
    pub embeddings: Vec<EmbeddingRow>,
    pub matches: Vec<MatchRow>,
}

impl IngestBatch {
    pub fn is_empty(&self) -> bool {
        self.identities.is_empty() && self.embeddings.is_empty() && self.matches.is_empty()
    }
}
