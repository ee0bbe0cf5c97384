//! Dataset DTOs

use serde::{Deserialize, Serialize};

/// Echo returned by `POST /dataset/upload`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedDataset {
    pub file_name: String,
}

/// Request to validate an uploaded archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateDataset {
    pub dataset_id: i64,
}
