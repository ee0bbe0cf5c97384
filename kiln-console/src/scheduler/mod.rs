//! Scheduler layer for the console
//!
//! This layer keeps the displayed lists in step with backend jobs. A
//! repeating executor drives status polling, and one orchestrator per
//! collection decides when polling starts, what each tick merges, and when
//! everything has settled.

pub mod collection;
pub mod executor;
pub mod orchestrator;
#[cfg(test)]
pub mod testing;

pub use collection::{Collection, Datasets, Inferences, Models};
pub use orchestrator::PollOrchestrator;
