//! Extractor contract.
//!
//! The embedding model itself lives outside this workspace; the pipeline
//! only depends on this trait. Implementations turn raw image bytes into an
//! ordered list of detections, each a bounding box plus a fixed-length
//! embedding comparable by Euclidean distance.

use thiserror::Error;

use crate::types::Detection;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("image could not be decoded: {0}")]
    Undecodable(String),
    #[error("embedding model unavailable: {0}")]
    ModelUnavailable(String),
    #[error("inference failed: {0}")]
    Inference(String),
}

/// Turns one image into face detections.
///
/// Zero detections is a valid, successful result — an [`ExtractionError`]
/// means the image could not be processed at all. Detection order is stable
/// within one call but carries no meaning across calls.
pub trait FaceExtractor {
    fn extract(&self, image: &[u8]) -> Result<Vec<Detection>, ExtractionError>;
}
