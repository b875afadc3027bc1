//! Query service.
//!
//! Read-side operations over the identity store with latest-match-per-
//! identity semantics. A missing crop file is never an error here: the
//! entry is dropped with a warning so a stale filesystem cannot break the
//! listing pages.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use facetrace_store::{HistoryRow, IdentityStore, Sighting};

use crate::error::ServiceError;

/// An active identity with no name yet, as shown on the review listing.
#[derive(Debug, Clone, Serialize)]
pub struct UnknownFace {
    pub identity_id: Uuid,
    pub crop_path: String,
    pub detected_at: DateTime<Utc>,
    pub confidence: u8,
}

/// An active, fully named identity with its most recent sighting.
#[derive(Debug, Clone, Serialize)]
pub struct KnownFace {
    pub identity_id: Uuid,
    pub name: String,
    pub surname: String,
    pub crop_path: String,
    pub last_seen: DateTime<Utc>,
    pub confidence: u8,
}

fn crop_exists(sighting: &Sighting) -> bool {
    if Path::new(&sighting.crop_path).exists() {
        true
    } else {
        tracing::warn!(
            identity_id = %sighting.identity.id,
            crop_path = %sighting.crop_path,
            "crop file missing; identity dropped from listing"
        );
        false
    }
}

/// Active identities with neither name nor surname set, latest match each,
/// filtered to crops that still exist on disk.
pub fn list_unknown<S: IdentityStore>(store: &S) -> Result<Vec<UnknownFace>, ServiceError> {
    let faces = store
        .active_unnamed()?
        .into_iter()
        .filter(crop_exists)
        .map(|s| UnknownFace {
            identity_id: s.identity.id,
            crop_path: s.crop_path,
            detected_at: s.matched_at,
            confidence: s.confidence,
        })
        .collect::<Vec<_>>();
    tracing::info!(count = faces.len(), "unknown faces listed");
    Ok(faces)
}

/// Active identities with both name and surname set, latest match each,
/// filtered to crops that still exist on disk.
pub fn list_known<S: IdentityStore>(store: &S) -> Result<Vec<KnownFace>, ServiceError> {
    let faces = store
        .active_named()?
        .into_iter()
        .filter(crop_exists)
        .filter_map(|s| {
            // The store query guarantees both are set; guard anyway so a
            // malformed row degrades to a dropped entry, not a panic.
            let name = s.identity.name.clone()?;
            let surname = s.identity.surname.clone()?;
            Some(KnownFace {
                identity_id: s.identity.id,
                name,
                surname,
                crop_path: s.crop_path,
                last_seen: s.matched_at,
                confidence: s.confidence,
            })
        })
        .collect::<Vec<_>>();
    tracing::info!(count = faces.len(), "known faces listed");
    Ok(faces)
}

/// All matches for one identity, newest first, crop-existence filtered.
///
/// Reports `NotFound` if the identity does not exist or is inactive.
pub fn person_history<S: IdentityStore>(
    store: &S,
    identity_id: Uuid,
) -> Result<Vec<HistoryRow>, ServiceError> {
    match store.identity(identity_id)? {
        Some(identity) if identity.is_active => {}
        _ => return Err(ServiceError::NotFound(identity_id)),
    }

    let history = store
        .history(identity_id)?
        .into_iter()
        .filter(|row| {
            if Path::new(&row.crop_path).exists() {
                true
            } else {
                tracing::warn!(
                    identity_id = %identity_id,
                    match_id = %row.match_id,
                    crop_path = %row.crop_path,
                    "crop file missing; match dropped from history"
                );
                false
            }
        })
        .collect::<Vec<_>>();
    tracing::info!(identity_id = %identity_id, count = history.len(), "history listed");
    Ok(history)
}

/// Name an identity. Validates both parts as non-empty trimmed strings of
/// at least `min_name_len` characters; does not touch embeddings or
/// matches.
pub fn update_identity<S: IdentityStore>(
    store: &mut S,
    identity_id: Uuid,
    name: &str,
    surname: &str,
    min_name_len: usize,
) -> Result<(), ServiceError> {
    let name = name.trim();
    let surname = surname.trim();
    if name.chars().count() < min_name_len || surname.chars().count() < min_name_len {
        return Err(ServiceError::Validation(format!(
            "name and surname must be at least {min_name_len} characters"
        )));
    }

    if store.rename_identity(identity_id, name, surname)? {
        tracing::info!(identity_id = %identity_id, name, surname, "identity named");
        Ok(())
    } else {
        Err(ServiceError::NotFound(identity_id))
    }
}

/// Soft-delete an identity. Historical matches and embeddings remain; the
/// identity disappears from every scan and listing.
pub fn remove_identity<S: IdentityStore>(
    store: &mut S,
    identity_id: Uuid,
) -> Result<(), ServiceError> {
    if store.deactivate_identity(identity_id)? {
        tracing::info!(identity_id = %identity_id, "identity deactivated");
        Ok(())
    } else {
        Err(ServiceError::NotFound(identity_id))
    }
}
