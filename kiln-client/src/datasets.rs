//! Dataset-related API endpoints

use std::path::Path;

use crate::BackendClient;
use crate::error::{ClientError, Result};
use kiln_core::domain::dataset::{Dataset, DatasetStatus};
use kiln_core::dto::dataset::{UploadedDataset, ValidateDataset};
use kiln_core::dto::{ActionResult, ListQuery};

impl BackendClient {
    // =============================================================================
    // Dataset Archives
    // =============================================================================

    /// Upload a dataset archive
    ///
    /// The backend echoes the stored file name. A response naming any other
    /// file is treated as a failed upload even though the request succeeded.
    ///
    /// # Arguments
    /// * `file` - Path of the local archive
    ///
    /// # Example
    /// ```no_run
    /// # use kiln_client::BackendClient;
    /// # async fn example() -> anyhow::Result<()> {
    /// let client = BackendClient::new("http://localhost:8000");
    /// let uploaded = client.upload_dataset("cats.zip".as_ref()).await?;
    /// println!("stored as {}", uploaded.file_name);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn upload_dataset(&self, file: &Path) -> Result<UploadedDataset> {
        let (sent, echo): (String, UploadedDataset) =
            self.upload_file("/dataset/upload", file).await?;

        if echo.file_name != sent {
            return Err(ClientError::UnexpectedPayload(format!(
                "uploaded {} but backend stored {}",
                sent, echo.file_name
            )));
        }

        Ok(echo)
    }

    /// List uploaded datasets
    ///
    /// # Arguments
    /// * `query` - Optional pagination cursor
    pub async fn list_datasets(&self, query: ListQuery) -> Result<Vec<Dataset>> {
        let response = self
            .client
            .get(self.url("/dataset/list"))
            .query(&query)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Delete a dataset
    pub async fn delete_dataset(&self, dataset_id: i64) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("/dataset/{}", dataset_id)))
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    /// Request validation of an uploaded archive
    ///
    /// Validation runs on the backend; this only enqueues it. Anything but
    /// `{"result": true}` means the request was not accepted.
    pub async fn validate_dataset(&self, dataset_id: i64) -> Result<()> {
        let response = self
            .client
            .post(self.url("/dataset/validation"))
            .json(&ValidateDataset { dataset_id })
            .send()
            .await?;

        let body: serde_json::Value = self.handle_response(response).await?;
        match serde_json::from_value::<ActionResult>(body.clone()) {
            Ok(ActionResult { result: true }) => Ok(()),
            _ => Err(ClientError::UnexpectedPayload(format!(
                "validation of dataset {} not accepted: {}",
                dataset_id, body
            ))),
        }
    }

    /// Fetch validation status of every dataset
    pub async fn dataset_status(&self) -> Result<Vec<DatasetStatus>> {
        let response = self.client.get(self.url("/dataset/status")).send().await?;

        self.handle_response(response).await
    }
}
