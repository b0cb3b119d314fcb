//! Error types for the picker

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Environment failures that abort an interactive session.
#[derive(Debug, Error)]
pub enum TryError {
    #[error("try requires an interactive terminal")]
    NotATty,

    #[error("terminal error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, TryError>;

/// Rejections raised by the rename dialog. Shown inline, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenameError {
    #[error("Name cannot be empty")]
    Empty,

    #[error("Name cannot contain /")]
    PathSeparator,

    #[error("Directory exists: {0}")]
    Exists(String),
}

/// Rejections raised while confirming a batch delete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeleteError {
    #[error("Safety check failed: {} not in {}", target.display(), base.display())]
    OutsideBase { target: PathBuf, base: PathBuf },
}
