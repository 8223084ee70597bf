//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Build the sample dataset and render stores as console text.
//! - Keep the CLI decoupled from storage details.

pub mod display;
pub mod seed;
pub mod store_service;
