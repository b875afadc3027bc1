use std::path::PathBuf;

use facetrace_core::MatchPolicy;

/// Service configuration, loaded from environment variables once at startup
/// and passed into the engine constructor.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory where uploaded source images are written.
    pub image_dir: PathBuf,
    /// Directory where per-face crops are written.
    pub crop_dir: PathBuf,
    /// Path to the SQLite database file.
    pub db_path: PathBuf,
    /// Maximum Euclidean distance at which two embeddings are the same
    /// person.
    pub tolerance: f32,
    /// First-match-wins (historical default) or best-match resolution.
    pub match_policy: MatchPolicy,
    /// Minimum trimmed length accepted for a name or surname.
    pub min_name_len: usize,
}

impl Config {
    /// Load configuration from `FACETRACE_*` environment variables with
    /// defaults.
    pub fn from_env() -> Self {
        let data_dir = std::env::var("FACETRACE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));

        let image_dir = std::env::var("FACETRACE_IMAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("images"));
        let crop_dir = std::env::var("FACETRACE_CROP_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("faces"));
        let db_path = std::env::var("FACETRACE_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("facetrace.db"));

        let match_policy = std::env::var("FACETRACE_MATCH_POLICY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();

        Self {
            image_dir,
            crop_dir,
            db_path,
            tolerance: env_f32("FACETRACE_TOLERANCE", 0.6),
            match_policy,
            min_name_len: env_usize("FACETRACE_MIN_NAME_LEN", 2),
        }
    }

    /// Create the image and crop directories if missing.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.image_dir)?;
        std::fs::create_dir_all(&self.crop_dir)?;
        Ok(())
    }
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
