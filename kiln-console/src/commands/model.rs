//! Model command handlers
//!
//! Creating builds from validated datasets, deploying and undeploying, and
//! following builds until they settle.

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use kiln_core::domain::dataset::Dataset;
use kiln_core::domain::model::Model;
use kiln_core::dto::ListQuery;
use kiln_core::dto::model::{CreateModel, DEFAULT_MODEL_EXT};

use super::{Follow, ListArgs, Session, print_json, track};
use crate::render::print_models;
use crate::scheduler::Models;

/// Model subcommands
#[derive(Subcommand)]
pub enum ModelCommands {
    /// Build a new model from a base model and validated datasets
    Create {
        /// Name of the new model
        #[arg(long)]
        name: String,

        /// Name of an existing model to start from
        #[arg(long)]
        base: String,

        /// Dataset IDs to train on (repeatable)
        #[arg(long = "dataset", required = true)]
        datasets: Vec<i64>,

        /// Weights file extension
        #[arg(long, default_value = DEFAULT_MODEL_EXT)]
        ext: String,

        /// Return without following the build
        #[arg(long)]
        detach: bool,
    },
    /// Deploy a model for inference
    Deploy {
        /// Model ID
        id: i64,

        /// Return without following the deployment
        #[arg(long)]
        detach: bool,
    },
    /// Withdraw a deployed model
    Undeploy {
        /// Model ID
        id: i64,

        /// Return without following the change
        #[arg(long)]
        detach: bool,
    },
    /// List models
    List(ListArgs),
    /// Follow in-flight builds until they settle
    Watch,
}

/// Handle model commands
pub async fn handle_model_command(command: ModelCommands, session: &Session) -> Result<()> {
    match command {
        ModelCommands::Create {
            name,
            base,
            datasets,
            ext,
            detach,
        } => {
            let request = CreateModel::new(name, base, datasets).with_ext(ext);
            create(session, request, detach).await
        }
        ModelCommands::Deploy { id, detach } => deploy(session, id, detach).await,
        ModelCommands::Undeploy { id, detach } => undeploy(session, id, detach).await,
        ModelCommands::List(args) => list(session, args).await,
        ModelCommands::Watch => follow(session, Follow::UntilSettled).await,
    }
}

async fn create(session: &Session, request: CreateModel, detach: bool) -> Result<()> {
    let datasets = session
        .client
        .list_datasets(ListQuery::default())
        .await
        .context("Failed to fetch dataset list")?;
    let models = session
        .client
        .list_models(ListQuery::default())
        .await
        .context("Failed to fetch model list")?;

    check_create_inputs(&request, &datasets, &models)?;

    session
        .client
        .create_model(&request)
        .await
        .with_context(|| format!("Failed to create model {}", request.m_name))?;
    session.notifier.success(format!(
        "Build of {} started from {}",
        request.m_name, request.b_m_name
    ));

    follow(session, Follow::after_work(detach)).await
}

/// Every selected dataset must be validated and the base model must exist
fn check_create_inputs(request: &CreateModel, datasets: &[Dataset], models: &[Model]) -> Result<()> {
    if request.m_name.trim().is_empty() {
        bail!("Model name cannot be empty");
    }

    for id in &request.zip_files {
        match datasets.iter().find(|dataset| dataset.id == *id) {
            None => bail!("Dataset {} not found", id),
            Some(dataset) if !dataset.status.is_complete() => bail!(
                "Dataset {} ({}) is not validated yet (status: {})",
                id,
                dataset.file_name,
                dataset.status
            ),
            Some(_) => {}
        }
    }

    if !models
        .iter()
        .any(|model| model.model_name == request.b_m_name)
    {
        bail!("Base model {} not found", request.b_m_name);
    }

    Ok(())
}

async fn deploy(session: &Session, id: i64, detach: bool) -> Result<()> {
    session
        .client
        .deploy_model(id)
        .await
        .with_context(|| format!("Failed to deploy model {}", id))?;
    session.notifier.success(format!("Deploying model {}", id));

    follow(session, Follow::after_work(detach)).await
}

async fn undeploy(session: &Session, id: i64, detach: bool) -> Result<()> {
    session
        .client
        .undeploy_model(id)
        .await
        .with_context(|| format!("Failed to undeploy model {}", id))?;
    session.notifier.success(format!("Undeploying model {}", id));

    follow(session, Follow::after_work(detach)).await
}

async fn list(session: &Session, args: ListArgs) -> Result<()> {
    let models = session
        .client
        .list_models(args.query())
        .await
        .context("Failed to fetch model list")?;

    if args.json {
        print_json(&models)
    } else {
        print_models(&models);
        Ok(())
    }
}

/// Track the full model list
pub(super) async fn follow(session: &Session, follow: Follow) -> Result<()> {
    let orchestrator = session.orchestrator(Models::new(
        session.client.clone(),
        ListQuery::default(),
    ));
    track(&orchestrator, follow, print_models).await
}
