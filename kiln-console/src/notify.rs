//! User notifications
//!
//! Outcomes of user actions and poll ticks are reported as short transient
//! notices on stderr, leaving stdout to tables and JSON.

use colored::*;
use tracing::{error, info, warn};

/// Severity of a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Info,
    Warning,
    Error,
}

/// A single user-facing message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: Level,
    pub message: String,
}

/// Sink for user-facing notices
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);

    fn success(&self, message: String) {
        self.notify(Notice {
            level: Level::Success,
            message,
        });
    }

    fn info(&self, message: String) {
        self.notify(Notice {
            level: Level::Info,
            message,
        });
    }

    fn warning(&self, message: String) {
        self.notify(Notice {
            level: Level::Warning,
            message,
        });
    }

    fn error(&self, message: String) {
        self.notify(Notice {
            level: Level::Error,
            message,
        });
    }
}

/// Prints notices to stderr and mirrors them into the log
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            Level::Success => {
                info!("{}", notice.message);
                eprintln!("{} {}", "✓".green(), notice.message);
            }
            Level::Info => {
                info!("{}", notice.message);
                eprintln!("{} {}", "ℹ".cyan(), notice.message);
            }
            Level::Warning => {
                warn!("{}", notice.message);
                eprintln!("{} {}", "⚠".yellow(), notice.message.yellow());
            }
            Level::Error => {
                error!("{}", notice.message);
                eprintln!("{} {}", "✗".red(), notice.message.red());
            }
        }
    }
}

/// Collects notices for assertions
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: std::sync::Mutex<Vec<Notice>>,
}

#[cfg(test)]
impl RecordingNotifier {
    pub fn take(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().drain(..).collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.notices
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.level == Level::Error)
            .map(|n| n.message.clone())
            .collect()
    }
}

#[cfg(test)]
impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}
