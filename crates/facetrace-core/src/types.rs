use serde::{Deserialize, Serialize};

/// Bounding box for a detected face, in source-image pixel coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
}

/// Face embedding vector (typically 128-dimensional, unit scale).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    pub values: Vec<f32>,
    /// Model version that produced this embedding (e.g., "dlib_resnet_v1").
    pub model_version: Option<String>,
}

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self {
            values,
            model_version: None,
        }
    }

    /// Number of dimensions in the vector.
    pub fn dim(&self) -> usize {
        self.values.len()
    }

    /// Compute Euclidean distance between two embeddings.
    ///
    /// Vectors from the same physical face are expected to be close under
    /// this metric; the matcher compares the result against its tolerance.
    pub fn euclidean_distance(&self, other: &Embedding) -> f32 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f32>()
            .sqrt()
    }
}

/// One detected face: where it sits in the source image and its embedding.
///
/// Produced by a [`FaceExtractor`](crate::FaceExtractor). Order is stable
/// within one extraction call but carries no identity meaning across calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    pub bounding_box: BoundingBox,
    pub embedding: Embedding,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_identical() {
        let a = Embedding::new(vec![1.0, 0.0, 0.0]);
        let b = Embedding::new(vec![1.0, 0.0, 0.0]);
        assert!(a.euclidean_distance(&b).abs() < 1e-6);
    }

    #[test]
    fn test_distance_unit_apart() {
        let a = Embedding::new(vec![0.0, 0.0]);
        let b = Embedding::new(vec![0.0, 1.0]);
        assert!((a.euclidean_distance(&b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_distance_symmetric() {
        let a = Embedding::new(vec![0.3, 0.1, 0.5]);
        let b = Embedding::new(vec![0.9, 0.2, 0.4]);
        assert!((a.euclidean_distance(&b) - b.euclidean_distance(&a)).abs() < 1e-6);
    }

    #[test]
    fn test_dim() {
        let e = Embedding::new(vec![0.0; 128]);
        assert_eq!(e.dim(), 128);
    }
}
