//! Species ID - identify a snake from a photo or look one up by name
//!
//! # Usage
//!
//! ```bash
//! # Identify a photo
//! SPECIES_ID_API_KEY=sk-... species-id --image cobra.jpg
//!
//! # Look up a species by name
//! species-id --text "Banded Krait"
//!
//! # Reject unclear photos first, with a custom model pool
//! species-id --image blurry.jpg --precheck --models model-a,model-b
//!
//! # Verbose logging
//! RUST_LOG=debug species-id --text "King Cobra"
//! ```
//!
//! Settings are read from `SPECIES_ID_*` environment variables, optionally
//! from a `.env` file. The validated result is printed as JSON on stdout.
//!
//! # Exit status
//!
//! - `0`: a result was printed (it may still be `found: false`)
//! - `1`: local I/O failure, e.g. an unreadable image
//! - `2`: configuration error
//! - `3`: no backend produced a usable answer

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};

use species_id_sdk::{IdentificationRequest, IdentifierConfig, IdentifyError, Orchestrator};

/// Species ID - snake identification over a pool of vision models
#[derive(Parser, Debug)]
#[command(name = "species-id")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Photo to identify (JPEG)
    #[arg(short = 'i', long, value_name = "FILE", conflicts_with = "text", required_unless_present = "text")]
    image: Option<PathBuf>,

    /// Species name or description to look up
    #[arg(short = 't', long, value_name = "QUERY")]
    text: Option<String>,

    /// Ask the backend whether the photo shows a snake before identifying it
    #[arg(long)]
    precheck: bool,

    /// Comma separated model pool, overriding SPECIES_ID_MODELS
    #[arg(short = 'm', long, value_delimiter = ',', value_name = "MODELS")]
    models: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::from(exit_code(&err))
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let mut config = IdentifierConfig::from_env().context("Failed to load configuration")?;
    if !args.models.is_empty() {
        config.models = args.models;
    }
    if args.precheck {
        config.image_precheck = true;
    }

    let orchestrator = Orchestrator::from_config(&config)?;

    let request = match (args.image, args.text) {
        (Some(path), _) => {
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("Failed to read image {}", path.display()))?;
            info!("Loaded {} ({} bytes)", path.display(), bytes.len());
            IdentificationRequest::image(bytes)
        }
        (None, Some(text)) => IdentificationRequest::text(text),
        (None, None) => anyhow::bail!("Either --image or --text is required"),
    };

    let result = orchestrator.identify(&request).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}

fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<IdentifyError>() {
        Some(IdentifyError::Configuration(_)) => 2,
        Some(IdentifyError::AllBackendsUnavailable) => 3,
        None => 1,
    }
}
