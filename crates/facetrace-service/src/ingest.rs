//! Ingestion pipeline.
//!
//! Per uploaded image: persist the source bytes, record the Image row,
//! extract detections, then resolve each face against the registry. Matched
//! faces get a Match row on the existing identity; unmatched faces get a new
//! unnamed Identity, its first Embedding and a confidence-100 Match. All
//! accumulated identity/embedding/match rows commit as one transaction.
//!
//! A failure on a single detection (crop write, unusable box) is logged and
//! that detection is skipped; extraction or commit failure aborts the whole
//! image. Crop files already written are not rolled back on a failed
//! commit — the orphaned paths are logged at warn level.

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use facetrace_core::{FaceExtractor, Matcher, RegistryEntry};
use facetrace_store::{EmbeddingRow, Identity, IdentityStore, IngestBatch, MatchRow};

use crate::config::Config;
use crate::crop;
use crate::error::ServiceError;

/// Confidence recorded when a brand-new identity observes itself.
const SELF_OBSERVATION_CONFIDENCE: u8 = 100;

/// Outcome of one image ingestion.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub image_id: Uuid,
    pub faces_detected: usize,
    pub faces_processed: usize,
    pub new_identities: usize,
    pub matched: usize,
    pub skipped: usize,
}

/// Run the full pipeline for one uploaded image.
///
/// The registry is read once after extraction; embeddings created for
/// earlier detections of the same image are appended to that working set,
/// so a face repeated within one image matches its own first occurrence.
pub fn ingest_image<S: IdentityStore>(
    store: &mut S,
    extractor: &dyn FaceExtractor,
    matcher: &dyn Matcher,
    config: &Config,
    image_bytes: &[u8],
) -> Result<IngestReport, ServiceError> {
    // Received -> Stored: persist the source bytes, record the Image row.
    // The row commits immediately; it survives a later abort.
    let file_path = config.image_dir.join(format!("{}.jpg", Uuid::new_v4()));
    std::fs::write(&file_path, image_bytes)?;
    let image = store.create_image(&file_path.to_string_lossy())?;

    // Stored -> Extracted. An extraction error aborts the image here.
    let detections = extractor.extract(image_bytes)?;
    tracing::info!(image_id = %image.id, faces = detections.len(), "extraction complete");

    // Decoded once for crop writes. A decode failure is a per-detection
    // problem: every crop write will be skipped, matching still ran on
    // nothing, and the image commits empty.
    let decoded = image::load_from_memory(image_bytes)
        .map_err(|e| {
            tracing::warn!(image_id = %image.id, error = %e, "source image not decodable for cropping");
            e
        })
        .ok();

    let mut registry = store.registry_snapshot()?;
    let mut batch = IngestBatch::default();
    let mut crops_written: Vec<String> = Vec::new();
    let mut report = IngestReport {
        image_id: image.id,
        faces_detected: detections.len(),
        faces_processed: 0,
        new_identities: 0,
        matched: 0,
        skipped: 0,
    };

    for (index, detection) in detections.iter().enumerate() {
        let Some(source) = decoded.as_ref() else {
            report.skipped += 1;
            continue;
        };

        let dest = crop::crop_path(&config.crop_dir, image.id, index);
        if let Err(e) = crop::write_crop(source, &detection.bounding_box, &dest) {
            tracing::warn!(image_id = %image.id, index, error = %e, "crop write failed; detection skipped");
            report.skipped += 1;
            continue;
        }
        let dest = dest.to_string_lossy().into_owned();
        crops_written.push(dest.clone());

        let now = Utc::now();
        let result = matcher.resolve(&detection.embedding, &registry);
        match result.identity_id {
            Some(identity_id) => {
                tracing::info!(
                    image_id = %image.id,
                    index,
                    identity_id = %identity_id,
                    confidence = result.confidence,
                    "face matched known identity"
                );
                batch.matches.push(MatchRow {
                    id: Uuid::new_v4(),
                    identity_id,
                    image_id: image.id,
                    confidence: result.confidence,
                    created_at: now,
                });
                report.matched += 1;
            }
            None => {
                let identity = Identity::unnamed(now);
                tracing::info!(image_id = %image.id, index, identity_id = %identity.id, "new identity created");
                batch.embeddings.push(EmbeddingRow {
                    id: Uuid::new_v4(),
                    identity_id: identity.id,
                    vector: detection.embedding.values.clone(),
                    crop_path: dest,
                    created_at: now,
                });
                batch.matches.push(MatchRow {
                    id: Uuid::new_v4(),
                    identity_id: identity.id,
                    image_id: image.id,
                    confidence: SELF_OBSERVATION_CONFIDENCE,
                    created_at: now,
                });
                // Later detections of this same image resolve against the
                // new identity too.
                registry.push(RegistryEntry {
                    identity_id: identity.id,
                    embedding: detection.embedding.clone(),
                });
                batch.identities.push(identity);
                report.new_identities += 1;
            }
        }
        report.faces_processed += 1;
    }

    // Extracted -> Committed. Crop files are not rolled back on failure.
    if let Err(e) = store.commit_ingest(&batch) {
        tracing::warn!(
            image_id = %image.id,
            orphaned_crops = ?crops_written,
            "ingest commit failed; crop files left on disk"
        );
        return Err(e.into());
    }

    tracing::info!(
        image_id = %image.id,
        processed = report.faces_processed,
        new_identities = report.new_identities,
        matched = report.matched,
        skipped = report.skipped,
        "image ingested"
    );
    Ok(report)
}
