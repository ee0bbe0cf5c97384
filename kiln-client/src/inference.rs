//! Inference-related API endpoints

use std::path::Path;

use crate::BackendClient;
use crate::error::{ClientError, Result};
use kiln_core::domain::inference::{Inference, InferenceStatus};
use kiln_core::dto::ListQuery;
use kiln_core::dto::inference::{GenerateInference, UploadedMedia};
use tracing::debug;

impl BackendClient {
    // =============================================================================
    // Inference Files
    // =============================================================================

    /// Upload an image or video to run inference on
    ///
    /// Like dataset uploads, an echo naming a different file is a failure.
    pub async fn upload_media(&self, file: &Path) -> Result<UploadedMedia> {
        let (sent, echo): (String, UploadedMedia) =
            self.upload_file("/inference/upload", file).await?;

        if echo.original_file_name != sent {
            return Err(ClientError::UnexpectedPayload(format!(
                "uploaded {} but backend stored {}",
                sent, echo.original_file_name
            )));
        }

        Ok(echo)
    }

    /// Start generating an inference result with a deployed model
    pub async fn generate_inference(&self, req: GenerateInference) -> Result<()> {
        let response = self
            .client
            .post(self.url("/inference/generate"))
            .json(&req)
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    /// Delete an uploaded file and its generated result
    pub async fn delete_inference(&self, inference_id: i64) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("/inference/{}", inference_id)))
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    /// List uploaded files with their generated results
    pub async fn list_inferences(&self, query: ListQuery) -> Result<Vec<Inference>> {
        let response = self
            .client
            .get(self.url("/inference/list"))
            .query(&query)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Fetch generation status of every uploaded file
    pub async fn inference_status(&self) -> Result<Vec<InferenceStatus>> {
        let response = self.client.get(self.url("/inference/status")).send().await?;

        self.handle_response(response).await
    }

    // =============================================================================
    // Downloads
    // =============================================================================

    /// Direct download link for a stored file
    pub fn download_url(&self, file_id: i64) -> String {
        self.url(&format!("/inference/download/{}", file_id))
    }

    /// Download a stored file to `dest`
    ///
    /// # Returns
    /// Number of bytes written
    pub async fn download_file(&self, file_id: i64, dest: &Path) -> Result<u64> {
        let response = self.client.get(self.download_url(file_id)).send().await?;
        let bytes = self.check_status(response).await?.bytes().await?;

        debug!("Writing {} bytes to {}", bytes.len(), dest.display());
        tokio::fs::write(dest, &bytes).await?;

        Ok(bytes.len() as u64)
    }
}
