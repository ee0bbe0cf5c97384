//! Model domain types

use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::status::JobStatus;
use crate::tracking::{StatusRecord, Tracked};

/// Trained or training model as returned by `GET /ml/list`
///
/// Evaluation metrics stay empty until the build completes, which is why a
/// full reload follows once no model is in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: i64,
    pub model_name: String,
    #[serde(default)]
    pub version: Option<u32>,
    #[serde(default)]
    pub map50: Option<f64>,
    #[serde(default)]
    pub map50_95: Option<f64>,
    #[serde(default)]
    pub precision: Option<f64>,
    #[serde(default)]
    pub recall: Option<f64>,
    /// Class names; the backend may send them as one comma-joined string
    #[serde(default, deserialize_with = "deserialize_classes")]
    pub classes: Option<Vec<String>>,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default)]
    pub is_deploy: bool,
    #[serde(default)]
    pub base_model: Option<BaseModelRef>,
}

impl Model {
    /// Usable for inference: built successfully and deployed
    pub fn is_servable(&self) -> bool {
        self.status.is_complete() && self.is_deploy
    }
}

/// Accepts `["a", "b"]` as well as `"a,b"`
fn deserialize_classes<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawClasses {
        List(Vec<String>),
        Joined(String),
    }

    let raw = Option::<RawClasses>::deserialize(deserializer)?;
    Ok(raw.map(|raw| match raw {
        RawClasses::List(classes) => classes,
        RawClasses::Joined(joined) => joined
            .split(',')
            .map(str::trim)
            .filter(|class| !class.is_empty())
            .map(String::from)
            .collect(),
    }))
}

/// Reference to the model a build started from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseModelRef {
    pub model_name: String,
}

/// Build status as returned by `GET /ml/status`
///
/// `status` may be an all-digit percentage while training runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelStatus {
    pub id: i64,
    #[serde(default)]
    pub model_name: String,
    #[serde(default)]
    pub status: JobStatus,
}

impl Tracked for Model {
    type Key = i64;
    const PROGRESS_IS_IN_FLIGHT: bool = true;

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

impl StatusRecord for ModelStatus {
    type Key = i64;

    fn key(&self) -> i64 {
        self.id
    }

    fn status(&self) -> &JobStatus {
        &self.status
    }
}
