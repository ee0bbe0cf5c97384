//! Dataset domain types

use serde::{Deserialize, Serialize};

use crate::domain::status::JobStatus;
use crate::tracking::{StatusRecord, Tracked};

/// Uploaded dataset archive as returned by `GET /dataset/list`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: i64,
    pub file_name: String,
    #[serde(default)]
    pub file_meta: Option<FileMeta>,
    #[serde(default)]
    pub status: JobStatus,
}

/// Stored file metadata attached to a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMeta {
    pub filesize: u64,
    pub creation_time: String,
}

/// Validation status as returned by `GET /dataset/status`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetStatus {
    pub id: i64,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub status: JobStatus,
}

impl Tracked for Dataset {
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

impl StatusRecord for DatasetStatus {
    type Key = i64;

    fn key(&self) -> i64 {
        self.id
    }

    fn status(&self) -> &JobStatus {
        &self.status
    }
}
