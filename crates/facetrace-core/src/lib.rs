//! facetrace-core — Embedding types and identity matching.
//!
//! Defines the extractor contract (image bytes in, detections out), the
//! embedding vector type with its distance metric, and the matching
//! strategies that resolve a candidate embedding against the registry
//! of known identities.

pub mod extractor;
pub mod matcher;
pub mod types;

pub use extractor::{ExtractionError, FaceExtractor};
pub use matcher::{
    confidence_from_distance, matcher_for, BestMatchMatcher, FirstMatchMatcher, MatchPolicy,
    MatchResult, Matcher, RegistryEntry,
};
pub use types::{BoundingBox, Detection, Embedding};
