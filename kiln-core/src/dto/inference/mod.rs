//! Inference DTOs

use serde::{Deserialize, Serialize};

/// Echo returned by `POST /inference/upload`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedMedia {
    pub original_file_name: String,
}

/// Request to run a deployed model over an uploaded file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateInference {
    pub inference_file_id: i64,
    pub m_id: i64,
}
