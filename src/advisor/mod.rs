//! Package advisor scoring
//!
//! This module talks to the advisor scores API and memoizes its answers.
//! Configuration is read from the shared [`crate::config::SharedConfig`]:
//!
//! - `SNYK_TOKEN`: API token (required for scoring)
//! - `SNYK_API`: API base URL (default `https://api.snyk.io`)
//!
//! # Example
//!
//! ```rust,ignore
//! use advisor_lens::advisor::{AdvisorClient, AdvisorService};
//!
//! let client = AdvisorClient::new(shared_config);
//! let mut service = AdvisorService::new(client);
//! let scores = service.get_scores(&modules);
//! ```

mod client;
mod service;

pub use client::{AdvisorClient, ScoreApi, SCORES_API_PATH, NPM_REGISTRY};
pub use service::AdvisorService;

use thiserror::Error;

/// Errors that can occur while fetching scores
#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("Missing API token: set {env_var} or add `token` to the [advisor] config")]
    MissingToken { env_var: &'static str },

    #[error("API request failed: {0}")]
    Transport(String),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse API response: {0}")]
    Parse(String),
}

pub type AdvisorResult<T> = Result<T, AdvisorError>;
