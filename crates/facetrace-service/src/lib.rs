//! facetrace-service — the identity resolution service.
//!
//! Wires the extractor contract, the matching strategies and the SQLite
//! store into an ingestion pipeline and a query layer, all driven through
//! a single-writer engine thread.

pub mod config;
pub mod crop;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod queries;

pub use config::Config;
pub use engine::{spawn_engine, EngineHandle};
pub use error::ServiceError;
pub use ingest::{ingest_image, IngestReport};
pub use queries::{KnownFace, UnknownFace};
