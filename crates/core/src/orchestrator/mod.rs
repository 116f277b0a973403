//! Backend orchestrator for video retrieval.
//!
//! A retrieval request runs the configured backends strictly in order:
//! - the first backend to succeed wins and later ones are never invoked
//! - each failure is logged in full and collected
//! - when the chain is exhausted only an aggregate, user-safe error remains
//!
//! Nothing is retried beyond this single pass.

mod config;
mod error;
mod runner;
mod types;

pub use config::OrchestratorConfig;
pub use error::RetrievalError;
pub use runner::Orchestrator;
pub use types::{BackendFailure, RetrievalRequest, RetrievalResult};
