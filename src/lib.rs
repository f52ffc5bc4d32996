//! pdf2zh Server Library
//!
//! An HTTP relay for PDF translation. `POST /translate` stages the uploaded
//! PDF, runs an external translator on it and returns the translator's
//! stdout as `application/pdf`.
//!
//! # Modules
//!
//! - `config`: environment-driven settings
//! - `error`: request errors and their HTTP mapping
//! - `routes`: axum router and handlers
//! - `state`: shared state holding the injectable translator
//! - `translator`: the `Translator` trait, staging files and the process backend

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod translator;

pub use config::Config;
pub use error::AppError;
pub use state::AppState;
