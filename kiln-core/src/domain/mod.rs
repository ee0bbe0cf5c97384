//! Core domain types
//!
//! This module contains the records the backend returns from its listing and
//! status endpoints. The console keeps listing records as its display rows and
//! merges status-only records into them while jobs are in flight.

pub mod dataset;
pub mod inference;
pub mod model;
pub mod status;
