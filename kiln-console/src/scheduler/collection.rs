//! Backend collections the orchestrator can track
//!
//! Each domain exposes a full listing endpoint and a lighter status-only
//! endpoint. The `Collection` trait pairs them so one orchestrator
//! implementation serves datasets, models and inference files alike.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use kiln_client::BackendClient;
use kiln_core::domain::dataset::{Dataset, DatasetStatus};
use kiln_core::domain::inference::{Inference, InferenceStatus};
use kiln_core::domain::model::{Model, ModelStatus};
use kiln_core::dto::ListQuery;
use kiln_core::tracking::{StatusRecord, Tracked};

/// A remote collection with a listing and a status endpoint
#[async_trait]
pub trait Collection: Send + Sync + 'static {
    type Item: Tracked + PartialEq + Send + Sync + 'static;
    type Update: StatusRecord<Key = <Self::Item as Tracked>::Key> + Send + Sync + 'static;

    /// Plural noun used in logs and notices
    fn name(&self) -> &'static str;

    /// Fetch the authoritative full list
    async fn list(&self) -> Result<Vec<Self::Item>>;

    /// Fetch the status of every item
    async fn status(&self) -> Result<Vec<Self::Update>>;
}

/// Uploaded dataset archives
pub struct Datasets {
    client: Arc<BackendClient>,
    query: ListQuery,
}

impl Datasets {
    pub fn new(client: Arc<BackendClient>, query: ListQuery) -> Self {
        Self { client, query }
    }
}

#[async_trait]
impl Collection for Datasets {
    type Item = Dataset;
    type Update = DatasetStatus;

    fn name(&self) -> &'static str {
        "datasets"
    }

    async fn list(&self) -> Result<Vec<Dataset>> {
        self.client
            .list_datasets(self.query)
            .await
            .context("Failed to fetch dataset list")
    }

    async fn status(&self) -> Result<Vec<DatasetStatus>> {
        self.client
            .dataset_status()
            .await
            .context("Failed to fetch dataset status")
    }
}

/// Models and their builds
pub struct Models {
    client: Arc<BackendClient>,
    query: ListQuery,
}

impl Models {
    pub fn new(client: Arc<BackendClient>, query: ListQuery) -> Self {
        Self { client, query }
    }
}

#[async_trait]
impl Collection for Models {
    type Item = Model;
    type Update = ModelStatus;

    fn name(&self) -> &'static str {
        "models"
    }

    async fn list(&self) -> Result<Vec<Model>> {
        self.client
            .list_models(self.query)
            .await
            .context("Failed to fetch model list")
    }

    async fn status(&self) -> Result<Vec<ModelStatus>> {
        self.client
            .model_status()
            .await
            .context("Failed to fetch model status")
    }
}

/// Uploaded inference files and their generated results
pub struct Inferences {
    client: Arc<BackendClient>,
    query: ListQuery,
}

impl Inferences {
    pub fn new(client: Arc<BackendClient>, query: ListQuery) -> Self {
        Self { client, query }
    }
}

#[async_trait]
impl Collection for Inferences {
    type Item = Inference;
    type Update = InferenceStatus;

    fn name(&self) -> &'static str {
        "inference files"
    }

    async fn list(&self) -> Result<Vec<Inference>> {
        self.client
            .list_inferences(self.query)
            .await
            .context("Failed to fetch inference list")
    }

    async fn status(&self) -> Result<Vec<InferenceStatus>> {
        self.client
            .inference_status()
            .await
            .context("Failed to fetch inference status")
    }
}
