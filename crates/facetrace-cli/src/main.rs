use anyhow::Result;
use clap::{Parser, Subcommand};
use uuid::Uuid;

use facetrace_core::{Detection, ExtractionError, FaceExtractor};
use facetrace_service::{spawn_engine, Config};

#[derive(Parser)]
#[command(name = "facetrace", about = "facetrace identity registry CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest one or more images; each file succeeds or fails on its own
    Ingest {
        /// Image files to process
        files: Vec<std::path::PathBuf>,
    },
    /// List identities that have not been named yet
    Unknown,
    /// List named identities
    Known,
    /// Show the observation history of one identity
    History {
        /// Identity id
        id: Uuid,
    },
    /// Name an identity
    Name {
        /// Identity id
        id: Uuid,
        name: String,
        surname: String,
    },
    /// Deactivate an identity (its history is kept)
    Remove {
        /// Identity id
        id: Uuid,
    },
}

/// Stand-in for the embedding model, which lives outside this workspace.
/// Deployments pass a model-backed [`FaceExtractor`] to `spawn_engine`;
/// this build can run every query but reports ingestion as unavailable.
struct UnlinkedExtractor;

impl FaceExtractor for UnlinkedExtractor {
    fn extract(&self, _image: &[u8]) -> Result<Vec<Detection>, ExtractionError> {
        Err(ExtractionError::ModelUnavailable(
            "no embedding model linked into this build".into(),
        ))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let handle = spawn_engine(Config::from_env(), Box::new(UnlinkedExtractor))?;

    match cli.command {
        Commands::Ingest { files } => {
            for path in files {
                let bytes = match std::fs::read(&path) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        eprintln!("{}: {e}", path.display());
                        continue;
                    }
                };
                match handle.ingest(bytes).await {
                    Ok(report) => {
                        println!("{}: {}", path.display(), serde_json::to_string(&report)?)
                    }
                    Err(e) => eprintln!("{}: ingestion failed: {e}", path.display()),
                }
            }
        }
        Commands::Unknown => {
            let faces = handle.list_unknown().await?;
            println!("{}", serde_json::to_string_pretty(&faces)?);
        }
        Commands::Known => {
            let faces = handle.list_known().await?;
            println!("{}", serde_json::to_string_pretty(&faces)?);
        }
        Commands::History { id } => {
            let history = handle.history(id).await?;
            println!("{}", serde_json::to_string_pretty(&history)?);
        }
        Commands::Name { id, name, surname } => {
            handle.rename(id, name, surname).await?;
            println!("ok");
        }
        Commands::Remove { id } => {
            handle.remove(id).await?;
            println!("ok");
        }
    }

    Ok(())
}
