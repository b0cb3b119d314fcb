//! tries - a fuzzy picker for dated experiment directories
//!
//! This crate ranks the directories under a base path against a typed
//! query, drives the interactive selector, and turns the chosen action into
//! shell commands for the caller to run.

pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod fuzzy;
pub mod script;
pub mod tui;

// Re-export primary types for convenience
pub use config::SessionConfig;
pub use domain::{discover_candidates, CandidateEntry, DeletePath, SelectionResult};
pub use error::{DeleteError, RenameError, Result, TryError};
pub use fuzzy::{Matcher, ScoredMatch};
pub use tui::{run_session, Selector};
