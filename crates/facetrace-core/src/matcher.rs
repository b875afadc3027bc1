//! Identity matching strategies.
//!
//! A matcher resolves one candidate embedding against the registry of known
//! embeddings and decides match-or-new with a confidence score. Both
//! strategies are linear scans — O(registry size) per candidate — which is
//! the intended design point for small registries. A larger deployment
//! would put an approximate nearest-neighbor index behind the same trait.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::Embedding;

/// One registry entry: a known identity and one of its stored embeddings.
///
/// The registry order is supplied by the caller (insertion order by
/// default) and is significant under [`FirstMatchMatcher`].
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub identity_id: Uuid,
    pub embedding: Embedding,
}

/// Result of resolving a candidate embedding against the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// The matched identity, or `None` if no known embedding was within
    /// tolerance.
    pub identity_id: Option<Uuid>,
    /// `round((1 - distance) * 100)` clamped to [0, 100].
    pub confidence: u8,
}

impl MatchResult {
    pub fn no_match() -> Self {
        Self {
            identity_id: None,
            confidence: 0,
        }
    }
}

/// Map a distance to an integer confidence score in [0, 100].
pub fn confidence_from_distance(distance: f32) -> u8 {
    ((1.0 - distance) * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Which matching strategy the engine runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Return the first registry entry within tolerance, in registry order.
    ///
    /// This reproduces the historical behaviour and stays the default so
    /// existing registries resolve identically. It can link a candidate to
    /// an earlier-enrolled identity even when a later entry is closer.
    #[default]
    FirstMatch,
    /// Return the minimum-distance entry within tolerance.
    BestMatch,
}

impl FromStr for MatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first" | "first_match" => Ok(Self::FirstMatch),
            "best" | "best_match" => Ok(Self::BestMatch),
            other => Err(format!("unknown match policy: {other}")),
        }
    }
}

/// Strategy for resolving a candidate embedding against the registry.
pub trait Matcher {
    fn resolve(&self, candidate: &Embedding, known: &[RegistryEntry]) -> MatchResult;
}

/// First-match-wins linear scan.
pub struct FirstMatchMatcher {
    pub tolerance: f32,
}

impl Matcher for FirstMatchMatcher {
    fn resolve(&self, candidate: &Embedding, known: &[RegistryEntry]) -> MatchResult {
        for entry in known {
            let distance = candidate.euclidean_distance(&entry.embedding);
            if distance <= self.tolerance {
                return MatchResult {
                    identity_id: Some(entry.identity_id),
                    confidence: confidence_from_distance(distance),
                };
            }
        }
        MatchResult::no_match()
    }
}

/// Closest-match linear scan.
pub struct BestMatchMatcher {
    pub tolerance: f32,
}

impl Matcher for BestMatchMatcher {
    fn resolve(&self, candidate: &Embedding, known: &[RegistryEntry]) -> MatchResult {
        let mut best_distance = f32::INFINITY;
        let mut best_id: Option<Uuid> = None;

        for entry in known {
            let distance = candidate.euclidean_distance(&entry.embedding);
            if distance <= self.tolerance && distance < best_distance {
                best_distance = distance;
                best_id = Some(entry.identity_id);
            }
        }

        match best_id {
            Some(id) => MatchResult {
                identity_id: Some(id),
                confidence: confidence_from_distance(best_distance),
            },
            None => MatchResult::no_match(),
        }
    }
}

/// Build the configured matcher.
pub fn matcher_for(policy: MatchPolicy, tolerance: f32) -> Box<dyn Matcher + Send> {
    match policy {
        MatchPolicy::FirstMatch => Box::new(FirstMatchMatcher { tolerance }),
        MatchPolicy::BestMatch => Box::new(BestMatchMatcher { tolerance }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: Uuid, values: Vec<f32>) -> RegistryEntry {
        RegistryEntry {
            identity_id: id,
            embedding: Embedding::new(values),
        }
    }

    #[test]
    fn test_confidence_from_distance() {
        assert_eq!(confidence_from_distance(0.0), 100);
        assert_eq!(confidence_from_distance(0.1), 90);
        assert_eq!(confidence_from_distance(0.55), 45);
        // Distances above 1.0 clamp to zero rather than going negative.
        assert_eq!(confidence_from_distance(1.4), 0);
        // Negative distances cannot exceed 100.
        assert_eq!(confidence_from_distance(-0.5), 100);
    }

    #[test]
    fn test_first_match_returns_earlier_not_closer() {
        let near = Uuid::new_v4();
        let nearer = Uuid::new_v4();
        let known = vec![
            entry(near, vec![0.5, 0.0]),
            entry(nearer, vec![0.1, 0.0]),
        ];
        let candidate = Embedding::new(vec![0.0, 0.0]);

        let result = FirstMatchMatcher { tolerance: 0.6 }.resolve(&candidate, &known);
        assert_eq!(result.identity_id, Some(near));
        assert_eq!(result.confidence, 50);
    }

    #[test]
    fn test_best_match_returns_closest() {
        let near = Uuid::new_v4();
        let nearer = Uuid::new_v4();
        let known = vec![
            entry(near, vec![0.5, 0.0]),
            entry(nearer, vec![0.1, 0.0]),
        ];
        let candidate = Embedding::new(vec![0.0, 0.0]);

        let result = BestMatchMatcher { tolerance: 0.6 }.resolve(&candidate, &known);
        assert_eq!(result.identity_id, Some(nearer));
        assert_eq!(result.confidence, 90);
    }

    #[test]
    fn test_no_match_above_tolerance() {
        let known = vec![entry(Uuid::new_v4(), vec![2.0, 0.0])];
        let candidate = Embedding::new(vec![0.0, 0.0]);

        let result = FirstMatchMatcher { tolerance: 0.6 }.resolve(&candidate, &known);
        assert_eq!(result, MatchResult::no_match());
        let result = BestMatchMatcher { tolerance: 0.6 }.resolve(&candidate, &known);
        assert_eq!(result, MatchResult::no_match());
    }

    #[test]
    fn test_empty_registry_no_match() {
        let candidate = Embedding::new(vec![0.0, 0.0]);
        let result = FirstMatchMatcher { tolerance: 0.6 }.resolve(&candidate, &[]);
        assert_eq!(result, MatchResult::no_match());
    }

    #[test]
    fn test_distance_zero_yields_confidence_100() {
        let id = Uuid::new_v4();
        let known = vec![entry(id, vec![0.2, 0.7, 0.1])];
        let candidate = Embedding::new(vec![0.2, 0.7, 0.1]);

        let result = FirstMatchMatcher { tolerance: 0.6 }.resolve(&candidate, &known);
        assert_eq!(result.identity_id, Some(id));
        assert_eq!(result.confidence, 100);
    }

    #[test]
    fn test_boundary_distance_exactly_tolerance_matches() {
        let id = Uuid::new_v4();
        let known = vec![entry(id, vec![0.6, 0.0])];
        let candidate = Embedding::new(vec![0.0, 0.0]);

        let result = FirstMatchMatcher { tolerance: 0.6 }.resolve(&candidate, &known);
        assert_eq!(result.identity_id, Some(id));
        assert_eq!(result.confidence, 40);
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("first".parse::<MatchPolicy>(), Ok(MatchPolicy::FirstMatch));
        assert_eq!(
            "best_match".parse::<MatchPolicy>(),
            Ok(MatchPolicy::BestMatch)
        );
        assert!("nearest".parse::<MatchPolicy>().is_err());
    }
}
