//! Dataset command handlers
//!
//! Uploading archives, requesting validation, and following validation
//! until every dataset settles.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;
use kiln_core::dto::ListQuery;

use super::{Batch, Follow, ListArgs, Session, check_extension, print_json, track};
use crate::render::print_datasets;
use crate::scheduler::Datasets;

/// Accepted dataset archive extensions
const DATASET_EXTENSIONS: &[&str] = &["zip"];

/// Dataset subcommands
#[derive(Subcommand)]
pub enum DatasetCommands {
    /// Upload one or more dataset archives
    Upload {
        /// Zip archives to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Return without following validation
        #[arg(long)]
        detach: bool,
    },
    /// List datasets
    List(ListArgs),
    /// Delete datasets
    Delete {
        /// Dataset IDs
        #[arg(required = true)]
        ids: Vec<i64>,
    },
    /// Request validation of uploaded datasets
    Validate {
        /// Dataset IDs
        #[arg(required = true)]
        ids: Vec<i64>,

        /// Return without following validation
        #[arg(long)]
        detach: bool,
    },
    /// Follow in-flight validation until it settles
    Watch,
}

/// Handle dataset commands
pub async fn handle_dataset_command(command: DatasetCommands, session: &Session) -> Result<()> {
    match command {
        DatasetCommands::Upload { files, detach } => upload(session, files, detach).await,
        DatasetCommands::List(args) => list(session, args).await,
        DatasetCommands::Delete { ids } => delete(session, ids).await,
        DatasetCommands::Validate { ids, detach } => validate(session, ids, detach).await,
        DatasetCommands::Watch => follow(session, Follow::UntilSettled).await,
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
    check_extension(file, DATASET_EXTENSIONS)?;
    let uploaded = session
        .client
        .upload_dataset(file)
        .await
        .with_context(|| format!("Failed to upload {}", file.display()))?;
    Ok(format!("Uploaded {}", uploaded.file_name))
}

async fn list(session: &Session, args: ListArgs) -> Result<()> {
    let datasets = session
        .client
        .list_datasets(args.query())
        .await
        .context("Failed to fetch dataset list")?;

    if args.json {
        print_json(&datasets)
    } else {
        print_datasets(&datasets);
        Ok(())
    }
}

async fn delete(session: &Session, ids: Vec<i64>) -> Result<()> {
    let mut batch = Batch::default();

    for id in ids {
        let outcome = session
            .client
            .delete_dataset(id)
            .await
            .with_context(|| format!("Failed to delete dataset {}", id))
            .map(|_| format!("Deleted dataset {}", id));
        batch.record(session.notifier.as_ref(), outcome);
    }

    batch.finish("deletions")
}

async fn validate(session: &Session, ids: Vec<i64>, detach: bool) -> Result<()> {
    let mut batch = Batch::default();

    for id in ids {
        let outcome = session
            .client
            .validate_dataset(id)
            .await
            .with_context(|| format!("Failed to validate dataset {}", id))
            .map(|_| format!("Validation started for dataset {}", id));
        batch.record(session.notifier.as_ref(), outcome);
    }

    if batch.any_succeeded() {
        follow(session, Follow::after_work(detach)).await?;
    }
    batch.finish("validation requests")
}

/// Track the full dataset list
pub(super) async fn follow(session: &Session, follow: Follow) -> Result<()> {
    let orchestrator = session.orchestrator(Datasets::new(
        session.client.clone(),
        ListQuery::default(),
    ));
    track(&orchestrator, follow, print_datasets).await
}
