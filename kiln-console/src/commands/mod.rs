//! Commands module
//!
//! Defines all CLI commands and their handlers, plus the pieces they share:
//! the backend session, batch bookkeeping, and following an orchestrator
//! until its jobs settle.

mod dataset;
mod inference;
mod model;
mod watch;

pub use dataset::DatasetCommands;
pub use inference::InferenceCommands;
pub use model::ModelCommands;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use clap::Subcommand;
use kiln_client::BackendClient;
use kiln_core::dto::ListQuery;
use tracing::debug;

use crate::config::Config;
use crate::notify::{ConsoleNotifier, Notifier};
use crate::scheduler::{Collection, PollOrchestrator};
use crate::store::ListStore;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Dataset archives and their validation
    Dataset {
        #[command(subcommand)]
        command: DatasetCommands,
    },
    /// Model builds and deployment
    Model {
        #[command(subcommand)]
        command: ModelCommands,
    },
    /// Inference uploads, generation and results
    Inference {
        #[command(subcommand)]
        command: InferenceCommands,
    },
    /// Follow every in-flight job until it settles
    Watch,
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    let session = Session::connect(config)?;

    match command {
        Commands::Dataset { command } => dataset::handle_dataset_command(command, &session).await,
        Commands::Model { command } => model::handle_model_command(command, &session).await,
        Commands::Inference { command } => {
            inference::handle_inference_command(command, &session).await
        }
        Commands::Watch => watch::watch_all(&session).await,
    }
}

/// Everything a command needs to talk to the backend and the user
pub struct Session {
    pub client: Arc<BackendClient>,
    pub notifier: Arc<dyn Notifier>,
    pub poll_interval: Duration,
}

impl Session {
    pub fn connect(config: &Config) -> Result<Self> {
        let client = BackendClient::with_client(config.api_base_url.clone(), config.http_client()?);
        debug!("Using backend at {}", client.base_url());

        Ok(Self {
            client: Arc::new(client),
            notifier: Arc::new(ConsoleNotifier),
            poll_interval: config.poll_interval,
        })
    }

    /// Orchestrator over a fresh, empty store
    pub fn orchestrator<C: Collection>(&self, collection: C) -> PollOrchestrator<C> {
        PollOrchestrator::new(
            collection,
            ListStore::new(),
            Arc::clone(&self.notifier),
            self.poll_interval,
        )
    }
}

/// Listing options shared by every `list` subcommand
#[derive(clap::Args, Debug, Clone, Copy)]
pub struct ListArgs {
    /// Only show records after this id
    #[arg(long)]
    pub last_id: Option<i64>,

    /// Print raw JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

impl ListArgs {
    pub fn query(&self) -> ListQuery {
        ListQuery {
            last_id: self.last_id,
        }
    }
}

/// How a command hands over to the orchestrator after its requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Follow {
    /// Print the list once and return
    Detach,
    /// Render until polling stops
    UntilSettled,
    /// As `UntilSettled`, re-arming polling first since new work was queued
    NewWork,
}

impl Follow {
    /// Follow mode for a command that queued work, honoring `--detach`
    pub fn after_work(detach: bool) -> Self {
        if detach { Follow::Detach } else { Follow::NewWork }
    }
}

/// Load the collection and keep the rendered list current
pub async fn track<C: Collection>(
    orchestrator: &PollOrchestrator<C>,
    follow: Follow,
    render: fn(&[C::Item]),
) -> Result<()> {
    // A failed load has already been reported by the orchestrator.
    if orchestrator.reload_list().await.is_err() {
        bail!("Could not load {}", orchestrator.name());
    }

    match follow {
        Follow::Detach => {
            orchestrator.shutdown();
            render(&orchestrator.store().snapshot());
            Ok(())
        }
        Follow::UntilSettled => follow_until_settled(orchestrator, render).await,
        Follow::NewWork => {
            if !orchestrator.start_polling() {
                debug!("Already polling {}", orchestrator.name());
            }
            follow_until_settled(orchestrator, render).await
        }
    }
}

/// Re-render on every store change until polling stops or Ctrl-C
async fn follow_until_settled<C: Collection>(
    orchestrator: &PollOrchestrator<C>,
    render: fn(&[C::Item]),
) -> Result<()> {
    debug!(
        "Following {} (polling: {})",
        orchestrator.name(),
        orchestrator.is_polling()
    );
    let mut changes = orchestrator.store().subscribe();
    render(&changes.borrow_and_update());

    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);

    loop {
        tokio::select! {
            _ = orchestrator.wait_settled() => break,
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                let items = changes.borrow_and_update().clone();
                println!();
                render(&items);
            }
            _ = &mut interrupted => {
                orchestrator.shutdown();
                orchestrator.notifier().warning(format!(
                    "Stopped following {}; backend jobs keep running",
                    orchestrator.name()
                ));
                return Ok(());
            }
        }
    }

    // The final reload may land together with the settle signal.
    if changes.has_changed().unwrap_or(false) {
        let items = changes.borrow_and_update().clone();
        println!();
        render(&items);
    }

    Ok(())
}

/// Tally of a command applied to several items independently
#[derive(Debug, Default)]
pub struct Batch {
    succeeded: usize,
    failed: usize,
}

impl Batch {
    /// Report one item's outcome to the user
    pub fn record(&mut self, notifier: &dyn Notifier, outcome: Result<String>) {
        match outcome {
            Ok(message) => {
                self.succeeded += 1;
                notifier.success(message);
            }
            Err(e) => {
                self.failed += 1;
                notifier.error(format!("{:#}", e));
            }
        }
    }

    pub fn any_succeeded(&self) -> bool {
        self.succeeded > 0
    }

    /// Error if any item failed, so the process exits non-zero
    pub fn finish(self, what: &str) -> Result<()> {
        if self.failed > 0 {
            bail!(
                "{} of {} {} failed",
                self.failed,
                self.failed + self.succeeded,
                what
            );
        }
        Ok(())
    }
}

/// Reject files whose extension is not in `allowed` (case-insensitive)
pub fn check_extension(path: &Path, allowed: &[&str]) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match ext {
        Some(ext) if allowed.contains(&ext.as_str()) => Ok(()),
        _ => bail!(
            "{} is not an accepted file type (expected {})",
            path.display(),
            allowed
                .iter()
                .map(|ext| format!(".{}", ext))
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

/// Print records as pretty JSON
pub fn print_json<T: serde::Serialize>(items: &[T]) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(items)?);
    Ok(())
}
