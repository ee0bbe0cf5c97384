//! Model DTOs

use serde::{Deserialize, Serialize};

/// File extension used when the caller does not choose one
pub const DEFAULT_MODEL_EXT: &str = "pt";

/// Request to build a new model from a base model and validated datasets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateModel {
    /// Name of the new model
    pub m_name: String,
    /// Name of the model to start from
    pub b_m_name: String,
    /// Dataset ids whose archives are merged into the training set
    pub zip_files: Vec<i64>,
    /// Weights file extension
    pub m_ext: String,
}

impl CreateModel {
    pub fn new(name: impl Into<String>, base: impl Into<String>, datasets: Vec<i64>) -> Self {
        Self {
            m_name: name.into(),
            b_m_name: base.into(),
            zip_files: datasets,
            m_ext: DEFAULT_MODEL_EXT.to_string(),
        }
    }

    pub fn with_ext(mut self, ext: impl Into<String>) -> Self {
        self.m_ext = ext.into();
        self
    }
}

/// Target of a deploy or undeploy request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelTarget {
    pub m_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_model_body() {
        let req = CreateModel::new("helmet", "yolov8n", vec![3, 4]);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "m_name": "helmet",
                "b_m_name": "yolov8n",
                "zip_files": [3, 4],
                "m_ext": "pt"
            })
        );
        assert_eq!(req.with_ext("onnx").m_ext, "onnx");
    }
}
