//! advisor-lens - package health badges for npm dependencies
//!
//! Reads the packages a document depends on (manifest entries, ES imports,
//! `require` calls, inline `<script>` blocks), scores them through the
//! advisor API and annotates the lines whose packages score poorly.

pub mod advisor;
pub mod cli;
pub mod config;
pub mod editor;
pub mod models;
pub mod parsers;
pub mod session;
