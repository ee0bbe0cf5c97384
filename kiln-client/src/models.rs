//! Model-related API endpoints

use crate::BackendClient;
use crate::error::Result;
use kiln_core::domain::model::{Model, ModelStatus};
use kiln_core::dto::ListQuery;
use kiln_core::dto::model::{CreateModel, ModelTarget};

impl BackendClient {
    // =============================================================================
    // Model Lifecycle
    // =============================================================================

    /// Start building a model
    ///
    /// # Example
    /// ```no_run
    /// # use kiln_client::BackendClient;
    /// # use kiln_core::dto::model::CreateModel;
    /// # async fn example() -> anyhow::Result<()> {
    /// let client = BackendClient::new("http://localhost:8000");
    /// client.create_model(&CreateModel::new("helmet", "yolov8n", vec![3, 4])).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn create_model(&self, req: &CreateModel) -> Result<()> {
        let response = self
            .client
            .post(self.url("/ml/create"))
            .json(req)
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    /// Deploy a model to the serving backend
    pub async fn deploy_model(&self, model_id: i64) -> Result<()> {
        let response = self
            .client
            .post(self.url("/ml/deploy"))
            .json(&ModelTarget { m_id: model_id })
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    /// Remove a model from the serving backend
    pub async fn undeploy_model(&self, model_id: i64) -> Result<()> {
        let response = self
            .client
            .post(self.url("/ml/undeploy"))
            .json(&ModelTarget { m_id: model_id })
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    // =============================================================================
    // Model Listing
    // =============================================================================

    /// List models
    ///
    /// # Arguments
    /// * `query` - Optional pagination cursor
    pub async fn list_models(&self, query: ListQuery) -> Result<Vec<Model>> {
        let response = self
            .client
            .get(self.url("/ml/list"))
            .query(&query)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Fetch build status of every model
    pub async fn model_status(&self) -> Result<Vec<ModelStatus>> {
        let response = self.client.get(self.url("/ml/status")).send().await?;

        self.handle_response(response).await
    }
}
