//! Kiln Core
//!
//! Core types and abstractions for the Kiln ML pipeline console.
//!
//! This crate contains:
//! - Domain types: Records returned by the backend (Dataset, Model, Inference)
//! - DTOs: Request and response bodies for backend calls
//! - Tracking: Reconciliation of status updates and completion detection

pub mod domain;
pub mod dto;
pub mod tracking;
