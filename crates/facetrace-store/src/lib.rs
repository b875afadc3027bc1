//! facetrace-store — SQLite-backed identity registry.
//!
//! Holds the four entity tables (identities, embeddings, matches, images)
//! behind the [`IdentityStore`] repository trait. All cross-entity
//! navigation goes through id lookups; callers never see SQL.

pub mod models;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;
use uuid::Uuid;

use facetrace_core::{Embedding, RegistryEntry};

pub use models::{EmbeddingRow, HistoryRow, Identity, ImageRow, IngestBatch, MatchRow, Sighting};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS identities (
    id          TEXT PRIMARY KEY,
    name        TEXT,
    surname     TEXT,
    is_active   INTEGER NOT NULL DEFAULT 1,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS embeddings (
    id          TEXT PRIMARY KEY,
    identity_id TEXT NOT NULL REFERENCES identities(id),
    vector      BLOB NOT NULL,
    crop_path   TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS matches (
    id          TEXT PRIMARY KEY,
    identity_id TEXT NOT NULL REFERENCES identities(id),
    image_id    TEXT NOT NULL REFERENCES images(id),
    confidence  INTEGER NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS images (
    id          TEXT PRIMARY KEY,
    file_path   TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_embeddings_identity ON embeddings(identity_id);
CREATE INDEX IF NOT EXISTS idx_matches_identity ON matches(identity_id);
CREATE INDEX IF NOT EXISTS idx_matches_image ON matches(image_id);
"#;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("embedding blob has invalid length {0}")]
    CorruptVector(usize),
}

/// Repository contract for the identity registry.
///
/// Identities, embeddings and matches are created only through
/// [`commit_ingest`](IdentityStore::commit_ingest); naming and deactivation
/// are the only mutations after that. Nothing is physically deleted.
pub trait IdentityStore {
    /// Record an uploaded source image. Committed immediately — the image
    /// row exists even if the rest of its ingestion later aborts.
    fn create_image(&mut self, file_path: &str) -> Result<ImageRow, StoreError>;

    /// All embeddings of active identities, in insertion order.
    fn registry_snapshot(&self) -> Result<Vec<RegistryEntry>, StoreError>;

    /// Apply one image's accumulated writes atomically.
    fn commit_ingest(&mut self, batch: &IngestBatch) -> Result<(), StoreError>;

    fn identity(&self, id: Uuid) -> Result<Option<Identity>, StoreError>;

    /// Active identities with neither name nor surname, each with its crop
    /// and latest match.
    fn active_unnamed(&self) -> Result<Vec<Sighting>, StoreError>;

    /// Active identities with both name and surname, each with its crop and
    /// latest match.
    fn active_named(&self) -> Result<Vec<Sighting>, StoreError>;

    /// All matches for one identity with source image and crop, newest
    /// first.
    fn history(&self, identity_id: Uuid) -> Result<Vec<HistoryRow>, StoreError>;

    /// Set name and surname. Returns false if the identity is missing or
    /// inactive.
    fn rename_identity(&mut self, id: Uuid, name: &str, surname: &str)
        -> Result<bool, StoreError>;

    /// Soft delete. Returns false if the identity is missing or already
    /// inactive.
    fn deactivate_identity(&mut self, id: Uuid) -> Result<bool, StoreError>;
}

/// Encode an embedding vector as a little-endian f32 blob.
pub fn vector_to_blob(values: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(values.len() * 4);
    for v in values {
        blob.extend_from_slice(&v.to_le_bytes());
    }
    blob
}

/// Decode a little-endian f32 blob back into a vector.
pub fn blob_to_vector(blob: &[u8]) -> Result<Vec<f32>, StoreError> {
    if blob.len() % 4 != 0 {
        return Err(StoreError::CorruptVector(blob.len()));
    }
    Ok(blob
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

fn parse_ts(column: usize, raw: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn parse_id(column: usize, raw: String) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
    })
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and run the schema batch.
    pub fn open(path: &std::path::Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// In-memory store, used by tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self { conn })
    }

    fn sightings(&self, name_filter: &str) -> Result<Vec<Sighting>, StoreError> {
        // Latest match per identity: max created_at, ties broken by match id.
        // The crop comes from the identity's first (oldest) embedding.
        let sql = format!(
            r#"
            SELECT i.id, i.name, i.surname, i.is_active, i.created_at,
                   e.crop_path,
                   m.id, m.confidence, m.created_at
            FROM identities i
            JOIN embeddings e ON e.id = (
                SELECT e2.id FROM embeddings e2
                WHERE e2.identity_id = i.id
                ORDER BY e2.rowid ASC LIMIT 1
            )
            JOIN matches m ON m.id = (
                SELECT m2.id FROM matches m2
                WHERE m2.identity_id = i.id
                ORDER BY m2.created_at DESC, m2.id DESC LIMIT 1
            )
            WHERE i.is_active = 1 AND {name_filter}
            ORDER BY m.created_at DESC, m.id DESC
            "#
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| {
            Ok(Sighting {
                identity: Identity {
                    id: parse_id(0, row.get(0)?)?,
                    name: row.get(1)?,
                    surname: row.get(2)?,
                    is_active: row.get::<_, i64>(3)? != 0,
                    created_at: parse_ts(4, row.get(4)?)?,
                },
                crop_path: row.get(5)?,
                match_id: parse_id(6, row.get(6)?)?,
                confidence: row.get::<_, i64>(7)?.clamp(0, 100) as u8,
                matched_at: parse_ts(8, row.get(8)?)?,
            })
        })?;

        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

impl IdentityStore for SqliteStore {
    fn create_image(&mut self, file_path: &str) -> Result<ImageRow, StoreError> {
        let row = ImageRow {
            id: Uuid::new_v4(),
            file_path: file_path.to_string(),
            created_at: Utc::now(),
        };
        self.conn.execute(
            "INSERT INTO images (id, file_path, created_at) VALUES (?1, ?2, ?3)",
            params![
                row.id.to_string(),
                row.file_path,
                row.created_at.to_rfc3339()
            ],
        )?;
        tracing::debug!(image_id = %row.id, path = %row.file_path, "image recorded");
        Ok(row)
    }

    fn registry_snapshot(&self) -> Result<Vec<RegistryEntry>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT e.identity_id, e.vector
            FROM embeddings e
            JOIN identities i ON i.id = e.identity_id
            WHERE i.is_active = 1
            ORDER BY e.rowid ASC
            "#,
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((parse_id(0, row.get(0)?)?, row.get::<_, Vec<u8>>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(identity_id, blob)| {
                Ok(RegistryEntry {
                    identity_id,
                    embedding: Embedding::new(blob_to_vector(&blob)?),
                })
            })
            .collect()
    }

    fn commit_ingest(&mut self, batch: &IngestBatch) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        for identity in &batch.identities {
            tx.execute(
                "INSERT INTO identities (id, name, surname, is_active, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    identity.id.to_string(),
                    identity.name,
                    identity.surname,
                    identity.is_active as i64,
                    identity.created_at.to_rfc3339()
                ],
            )?;
        }
        for embedding in &batch.embeddings {
            tx.execute(
                "INSERT INTO embeddings (id, identity_id, vector, crop_path, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    embedding.id.to_string(),
                    embedding.identity_id.to_string(),
                    vector_to_blob(&embedding.vector),
                    embedding.crop_path,
                    embedding.created_at.to_rfc3339()
                ],
            )?;
        }
        for m in &batch.matches {
            tx.execute(
                "INSERT INTO matches (id, identity_id, image_id, confidence, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    m.id.to_string(),
                    m.identity_id.to_string(),
                    m.image_id.to_string(),
                    m.confidence as i64,
                    m.created_at.to_rfc3339()
                ],
            )?;
        }
        tx.commit()?;
        tracing::debug!(
            identities = batch.identities.len(),
            embeddings = batch.embeddings.len(),
            matches = batch.matches.len(),
            "ingest batch committed"
        );
        Ok(())
    }

    fn identity(&self, id: Uuid) -> Result<Option<Identity>, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, surname, is_active, created_at
                 FROM identities WHERE id = ?1",
                [id.to_string()],
                |row| {
                    Ok(Identity {
                        id: parse_id(0, row.get(0)?)?,
                        name: row.get(1)?,
                        surname: row.get(2)?,
                        is_active: row.get::<_, i64>(3)? != 0,
                        created_at: parse_ts(4, row.get(4)?)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    fn active_unnamed(&self) -> Result<Vec<Sighting>, StoreError> {
        self.sightings("i.name IS NULL AND i.surname IS NULL")
    }

    fn active_named(&self) -> Result<Vec<Sighting>, StoreError> {
        self.sightings("i.name IS NOT NULL AND i.surname IS NOT NULL")
    }

    fn history(&self, identity_id: Uuid) -> Result<Vec<HistoryRow>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT m.id, m.confidence, m.created_at, img.file_path, e.crop_path
            FROM matches m
            JOIN images img ON img.id = m.image_id
            JOIN embeddings e ON e.id = (
                SELECT e2.id FROM embeddings e2
                WHERE e2.identity_id = m.identity_id
                ORDER BY e2.rowid ASC LIMIT 1
            )
            WHERE m.identity_id = ?1
            ORDER BY m.created_at DESC, m.id DESC
            "#,
        )?;
        let rows = stmt.query_map([identity_id.to_string()], |row| {
            Ok(HistoryRow {
                match_id: parse_id(0, row.get(0)?)?,
                confidence: row.get::<_, i64>(1)?.clamp(0, 100) as u8,
                matched_at: parse_ts(2, row.get(2)?)?,
                source_image_path: row.get(3)?,
                crop_path: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn rename_identity(
        &mut self,
        id: Uuid,
        name: &str,
        surname: &str,
    ) -> Result<bool, StoreError> {
        let changed = self.conn.execute(
            "UPDATE identities SET name = ?1, surname = ?2
             WHERE id = ?3 AND is_active = 1",
            params![name, surname, id.to_string()],
        )?;
        Ok(changed > 0)
    }

    fn deactivate_identity(&mut self, id: Uuid) -> Result<bool, StoreError> {
        let changed = self.conn.execute(
            "UPDATE identities SET is_active = 0 WHERE id = ?1 AND is_active = 1",
            [id.to_string()],
        )?;
        Ok(changed > 0)
    }
}
