//! Job status shared by every tracked collection

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a backend job attached to a dataset, model or inference file
///
/// The backend sends plain strings. Model builds additionally report an
/// all-digit string while training, which is kept as percent progress.
/// Anything unrecognised (including `null`) is preserved verbatim in `Other`
/// so it can be shown and sent back unchanged. Percentages are written back
/// in canonical decimal form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum JobStatus {
    Pending,
    Running,
    Complete,
    Failed,
    Progress(u32),
    Other(String),
}

impl JobStatus {
    /// Job is queued or executing
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Running)
    }

    /// Job reached `complete` or `failed`
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }

    /// Percent complete, if the backend reported one
    pub fn progress(&self) -> Option<u32> {
        match self {
            Self::Progress(percent) => Some(*percent),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Complete => "complete",
            Self::Failed => "failed",
            Self::Progress(_) => "progress",
            Self::Other(raw) => raw,
        }
    }
}

impl Default for JobStatus {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<&str> for JobStatus {
    fn from(raw: &str) -> Self {
        match raw {
            "pending" => Self::Pending,
            "running" => Self::Running,
            "complete" => Self::Complete,
            "failed" => Self::Failed,
            digits if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
                // Absurdly long digit strings are not a percentage.
                digits
                    .parse()
                    .map(Self::Progress)
                    .unwrap_or_else(|_| Self::Other(digits.to_string()))
            }
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for JobStatus {
    fn from(raw: String) -> Self {
        Self::from(raw.as_str())
    }
}

impl From<Option<String>> for JobStatus {
    fn from(raw: Option<String>) -> Self {
        raw.map(Self::from).unwrap_or_default()
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        status.to_string()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Progress(percent) => write!(f, "{}", percent),
            other => f.write_str(other.as_str()),
        }
    }
}
