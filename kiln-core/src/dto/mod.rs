//! Data Transfer Objects for backend communication
//!
//! Request bodies sent to the backend and the small acknowledgement bodies
//! it answers with. Listing and status records live in `domain`.

pub mod dataset;
pub mod inference;
pub mod model;

use serde::{Deserialize, Serialize};

/// Acknowledgement returned by endpoints that enqueue backend work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    pub result: bool,
}

/// Pagination cursor accepted by every listing endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_id: Option<i64>,
}

impl ListQuery {
    pub fn after(last_id: i64) -> Self {
        Self {
            last_id: Some(last_id),
        }
    }
}
