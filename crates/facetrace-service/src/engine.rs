//! Engine worker.
//!
//! All storage access runs on one dedicated OS thread that owns the SQLite
//! connection and the matcher; callers talk to it through an async handle.
//! Because every ingestion is serialized through this single writer, two
//! concurrent uploads of the same unseen face cannot both miss the registry
//! and double-create an identity.

use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use facetrace_core::{matcher_for, FaceExtractor};
use facetrace_store::{HistoryRow, SqliteStore};

use crate::config::Config;
use crate::error::ServiceError;
use crate::ingest::{ingest_image, IngestReport};
use crate::queries::{self, KnownFace, UnknownFace};

/// Messages sent from callers to the engine thread.
enum EngineRequest {
    Ingest {
        bytes: Vec<u8>,
        reply: oneshot::Sender<Result<IngestReport, ServiceError>>,
    },
    ListUnknown {
        reply: oneshot::Sender<Result<Vec<UnknownFace>, ServiceError>>,
    },
    ListKnown {
        reply: oneshot::Sender<Result<Vec<KnownFace>, ServiceError>>,
    },
    History {
        identity_id: Uuid,
        reply: oneshot::Sender<Result<Vec<HistoryRow>, ServiceError>>,
    },
    Rename {
        identity_id: Uuid,
        name: String,
        surname: String,
        reply: oneshot::Sender<Result<(), ServiceError>>,
    },
    Remove {
        identity_id: Uuid,
        reply: oneshot::Sender<Result<(), ServiceError>>,
    },
}

/// Clone-safe handle to the engine thread.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineRequest>,
}

impl EngineHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T, ServiceError>>) -> EngineRequest,
    ) -> Result<T, ServiceError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(build(reply_tx))
            .await
            .map_err(|_| ServiceError::ChannelClosed)?;
        reply_rx.await.map_err(|_| ServiceError::ChannelClosed)?
    }

    /// Ingest one uploaded image end to end.
    pub async fn ingest(&self, bytes: Vec<u8>) -> Result<IngestReport, ServiceError> {
        self.request(|reply| EngineRequest::Ingest { bytes, reply })
            .await
    }

    pub async fn list_unknown(&self) -> Result<Vec<UnknownFace>, ServiceError> {
        self.request(|reply| EngineRequest::ListUnknown { reply })
            .await
    }

    pub async fn list_known(&self) -> Result<Vec<KnownFace>, ServiceError> {
        self.request(|reply| EngineRequest::ListKnown { reply })
            .await
    }

    pub async fn history(&self, identity_id: Uuid) -> Result<Vec<HistoryRow>, ServiceError> {
        self.request(|reply| EngineRequest::History { identity_id, reply })
            .await
    }

    pub async fn rename(
        &self,
        identity_id: Uuid,
        name: String,
        surname: String,
    ) -> Result<(), ServiceError> {
        self.request(|reply| EngineRequest::Rename {
            identity_id,
            name,
            surname,
            reply,
        })
        .await
    }

    pub async fn remove(&self, identity_id: Uuid) -> Result<(), ServiceError> {
        self.request(|reply| EngineRequest::Remove { identity_id, reply })
            .await
    }
}

/// Spawn the engine on a dedicated OS thread.
///
/// Creates the data directories, opens the store and builds the configured
/// matcher synchronously (fail-fast), then enters the request loop.
pub fn spawn_engine(
    config: Config,
    extractor: Box<dyn FaceExtractor + Send>,
) -> Result<EngineHandle, ServiceError> {
    config.ensure_dirs()?;
    let mut store = SqliteStore::open(&config.db_path)?;
    tracing::info!(db_path = %config.db_path.display(), "identity store opened");

    let matcher = matcher_for(config.match_policy, config.tolerance);
    tracing::info!(
        policy = ?config.match_policy,
        tolerance = config.tolerance,
        "matcher configured"
    );

    let (tx, mut rx) = mpsc::channel::<EngineRequest>(16);

    std::thread::Builder::new()
        .name("facetrace-engine".into())
        .spawn(move || {
            tracing::info!("engine thread started");
            while let Some(req) = rx.blocking_recv() {
                match req {
                    EngineRequest::Ingest { bytes, reply } => {
                        let result = ingest_image(
                            &mut store,
                            extractor.as_ref(),
                            matcher.as_ref(),
                            &config,
                            &bytes,
                        );
                        let _ = reply.send(result);
                    }
                    EngineRequest::ListUnknown { reply } => {
                        let _ = reply.send(queries::list_unknown(&store));
                    }
                    EngineRequest::ListKnown { reply } => {
                        let _ = reply.send(queries::list_known(&store));
                    }
                    EngineRequest::History { identity_id, reply } => {
                        let _ = reply.send(queries::person_history(&store, identity_id));
                    }
                    EngineRequest::Rename {
                        identity_id,
                        name,
                        surname,
                        reply,
                    } => {
                        let result = queries::update_identity(
                            &mut store,
                            identity_id,
                            &name,
                            &surname,
                            config.min_name_len,
                        );
                        let _ = reply.send(result);
                    }
                    EngineRequest::Remove { identity_id, reply } => {
                        let _ = reply.send(queries::remove_identity(&mut store, identity_id));
                    }
                }
            }
            tracing::info!("engine thread exiting");
        })
        .expect("failed to spawn engine thread");

    Ok(EngineHandle { tx })
}
