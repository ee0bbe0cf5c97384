//! Inference command handlers
//!
//! Uploading media, generating results with a deployed model, and fetching
//! the generated files.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use kiln_core::domain::inference::Inference;
use kiln_core::domain::model::Model;
use kiln_core::dto::ListQuery;
use kiln_core::dto::inference::GenerateInference;

use super::{Batch, Follow, ListArgs, Session, check_extension, print_json, track};
use crate::render::{format_size, print_inferences};
use crate::scheduler::Inferences;

/// Accepted image and video extensions
const MEDIA_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "mov", "mp4", "avi", "mkv"];

/// Inference subcommands
#[derive(Subcommand)]
pub enum InferenceCommands {
    /// Upload images or videos
    Upload {
        /// Media files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Return without following processing
        #[arg(long)]
        detach: bool,
    },
    /// Run a deployed model over an uploaded file
    Generate {
        /// Uploaded file ID
        file_id: i64,

        /// Model ID
        #[arg(long)]
        model: i64,

        /// Return without following generation
        #[arg(long)]
        detach: bool,
    },
    /// Delete uploaded files and their results
    Delete {
        /// Inference IDs
        #[arg(required = true)]
        ids: Vec<i64>,
    },
    /// List uploaded files and generated results
    List(ListArgs),
    /// Print the download link of a stored file
    Link {
        /// Stored file ID
        id: i64,
    },
    /// Download a stored file
    Download {
        /// Stored file ID
        id: i64,

        /// Destination path (defaults to the stored file name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Follow in-flight generation until it settles
    Watch,
}

/// Handle inference commands
pub async fn handle_inference_command(command: InferenceCommands, session: &Session) -> Result<()> {
    match command {
        InferenceCommands::Upload { files, detach } => upload(session, files, detach).await,
        InferenceCommands::Generate {
            file_id,
            model,
            detach,
        } => generate(session, file_id, model, detach).await,
        InferenceCommands::Delete { ids } => delete(session, ids).await,
        InferenceCommands::List(args) => list(session, args).await,
        InferenceCommands::Link { id } => {
            println!("{}", session.client.download_url(id));
            Ok(())
        }
        InferenceCommands::Download { id, output } => download(session, id, output).await,
        InferenceCommands::Watch => follow(session, Follow::UntilSettled).await,
    }
}

async fn upload(session: &Session, files: Vec<PathBuf>, detach: bool) -> Result<()> {
    let mut batch = Batch::default();

    for file in files {
        let outcome = upload_one(session, &file).await;
        batch.record(session.notifier.as_ref(), outcome);
    }

    if batch.any_succeeded() {
        follow(session, Follow::after_work(detach)).await?;
    }
    batch.finish("uploads")
}

async fn upload_one(session: &Session, file: &Path) -> Result<String> {
    check_extension(file, MEDIA_EXTENSIONS)?;
    let uploaded = session
        .client
        .upload_media(file)
        .await
        .with_context(|| format!("Failed to upload {}", file.display()))?;
    Ok(format!("Uploaded {}", uploaded.original_file_name))
}

async fn generate(session: &Session, file_id: i64, model_id: i64, detach: bool) -> Result<()> {
    let models = session
        .client
        .list_models(ListQuery::default())
        .await
        .context("Failed to fetch model list")?;
    check_servable(&models, model_id)?;

    session
        .client
        .generate_inference(GenerateInference {
            inference_file_id: file_id,
            m_id: model_id,
        })
        .await
        .with_context(|| format!("Failed to start inference on file {}", file_id))?;
    session.notifier.success(format!(
        "Inference started on file {} with model {}",
        file_id, model_id
    ));

    follow(session, Follow::after_work(detach)).await
}

/// The model must have finished building and be deployed
fn check_servable(models: &[Model], model_id: i64) -> Result<()> {
    let Some(model) = models.iter().find(|model| model.id == model_id) else {
        bail!("Model {} not found", model_id);
    };

    if model.is_servable() {
        return Ok(());
    }

    if !model.status.is_complete() {
        bail!(
            "Model {} is not built yet (status: {})",
            model.model_name,
            model.status
        );
    }
    bail!("Model {} is not deployed", model.model_name)
}

async fn delete(session: &Session, ids: Vec<i64>) -> Result<()> {
    let mut batch = Batch::default();

    for id in ids {
        let outcome = session
            .client
            .delete_inference(id)
            .await
            .with_context(|| format!("Failed to delete inference {}", id))
            .map(|_| format!("Deleted inference {}", id));
        batch.record(session.notifier.as_ref(), outcome);
    }

    batch.finish("deletions")
}

async fn list(session: &Session, args: ListArgs) -> Result<()> {
    let inferences = session
        .client
        .list_inferences(args.query())
        .await
        .context("Failed to fetch inference list")?;

    if args.json {
        print_json(&inferences)
    } else {
        print_inferences(&inferences);
        Ok(())
    }
}

async fn download(session: &Session, file_id: i64, output: Option<PathBuf>) -> Result<()> {
    let dest = match output {
        Some(path) => path,
        None => {
            let inferences = session
                .client
                .list_inferences(ListQuery::default())
                .await
                .context("Failed to fetch inference list")?;
            PathBuf::from(default_file_name(&inferences, file_id))
        }
    };

    let written = session
        .client
        .download_file(file_id, &dest)
        .await
        .with_context(|| format!("Failed to download file {}", file_id))?;
    session.notifier.success(format!(
        "Saved {} ({})",
        dest.display(),
        format_size(written)
    ));

    Ok(())
}

/// Local name for a stored file: its backend name when known
fn default_file_name(inferences: &[Inference], file_id: i64) -> String {
    inferences
        .iter()
        .find_map(|inference| {
            if inference.generated_file_id() == Some(file_id) {
                inference.generated_file_name.clone()
            } else if inference.original_file.as_ref().map(|file| file.id) == Some(file_id) {
                Some(inference.original_file_name.clone())
            } else {
                None
            }
        })
        .and_then(|name| {
            // Never let a backend-provided name escape the working directory.
            Path::new(&name)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| format!("file-{}", file_id))
}

/// Track the full inference list
pub(super) async fn follow(session: &Session, follow: Follow) -> Result<()> {
    let orchestrator = session.orchestrator(Inferences::new(
        session.client.clone(),
        ListQuery::default(),
    ));
    track(&orchestrator, follow, print_inferences).await
}
