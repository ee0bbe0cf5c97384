//! Inference domain types

use serde::{Deserialize, Serialize};

use crate::domain::status::JobStatus;
use crate::tracking::{StatusRecord, Tracked};

/// Uploaded media and its generated result, from `GET /inference/list`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inference {
    pub id: i64,
    #[serde(default)]
    pub original_file: Option<StoredFile>,
    pub original_file_name: String,
    #[serde(default)]
    pub generated_file: Option<StoredFile>,
    #[serde(default)]
    pub generated_file_name: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub status: JobStatus,
}

impl Inference {
    /// Identifier of the generated file, once inference produced one
    pub fn generated_file_id(&self) -> Option<i64> {
        self.generated_file.as_ref().map(|file| file.id)
    }
}

/// File stored by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredFile {
    pub id: i64,
    #[serde(default)]
    pub filesize: Option<u64>,
}

/// Generation status as returned by `GET /inference/status`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceStatus {
    pub id: i64,
    #[serde(default)]
    pub original_file_name: String,
    #[serde(default)]
    pub status: JobStatus,
}

impl Tracked for Inference {
    type Key = i64;

    fn key(&self) -> i64 {
        self.id
    }

    fn status(&self) -> &JobStatus {
        &self.status
    }

    fn with_status(&self, status: JobStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }
}

impl StatusRecord for InferenceStatus {
    type Key = i64;

    fn key(&self) -> i64 {
        self.id
    }

    fn status(&self) -> &JobStatus {
        &self.status
    }
}
