//! Configuration module for advisor-lens
//!
//! This module handles:
//! - User-level configuration (~/.config/advisor-lens/config.toml)
//! - Environment overrides for the API URL and token
//! - The live config handle the API client reads from

mod user_config;

pub use user_config::{
    AdvisorConfig,
    AdvisorSection,
    SharedConfig,
    UserConfig,
    API_URL_ENV,
    DEFAULT_ADVISOR_URL,
    DEFAULT_BASE_API_URL,
    DEFAULT_SCORE_THRESHOLD,
    DEFAULT_TIMEOUT_SECS,
    TOKEN_ENV,
};
