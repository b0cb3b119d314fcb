use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Basenames created by the picker start with an ISO date and a hyphen.
/// ASCII digits only; renderers slice the prefix by byte offset.
static DATE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}-").expect("valid date prefix regex"));

/// Bonus added to the base score of date-prefixed directories.
const DATE_PREFIX_BONUS: f64 = 2.0;

/// One directory eligible for selection.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateEntry {
    /// Text the fuzzy matcher scores against
    pub text: String,
    pub basename: String,
    pub path: PathBuf,
    pub modified_at: DateTime<Utc>,
    /// Recency weighting plus naming-convention bonus, independent of the query
    pub base_score: f64,
}

impl CandidateEntry {
    /// Builds an entry for the directory `name` under `base`, scoring it against `now`.
    pub fn new(base: &Path, name: &str, modified_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self {
            text: name.to_string(),
            basename: name.to_string(),
            path: base.join(name),
            modified_at,
            base_score: base_score(name, modified_at, now),
        }
    }
}

/// Returns true when `name` follows the `YYYY-MM-DD-` naming convention.
pub fn has_date_prefix(name: &str) -> bool {
    DATE_PREFIX.is_match(name)
}

/// Recency-biased score: `3 / sqrt(hours + 1)`, plus a bonus for dated names.
///
/// Modification times in the future count as "just now".
pub fn base_score(name: &str, modified_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let hours = ((now - modified_at).num_milliseconds() as f64 / 3_600_000.0).max(0.0);
    let mut score = 3.0 / (hours + 1.0).sqrt();
    if has_date_prefix(name) {
        score += DATE_PREFIX_BONUS;
    }
    score
}

/// Lists the non-hidden directories directly under `base`.
///
/// # Behavior
/// - Skips names starting with '.'
/// - Skips plain files and symlinks, even symlinks to directories
/// - Skips entries whose metadata cannot be read
/// - Returns an error only when `base` itself cannot be read
pub fn discover_candidates(base: &Path, now: DateTime<Utc>) -> io::Result<Vec<CandidateEntry>> {
    let mut candidates = Vec::new();

    for entry_result in fs::read_dir(base)? {
        let entry = match entry_result {
            Ok(e) => e,
            Err(_) => continue,
        };

        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(_) => continue,
        };

        if name.starts_with('.') {
            continue;
        }

        match entry.file_type() {
            Ok(kind) if kind.is_dir() => {}
            _ => continue,
        }

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(_) => continue,
        };

        let modified_at: DateTime<Utc> = match metadata.modified() {
            Ok(t) => t.into(),
            Err(_) => continue,
        };

        candidates.push(CandidateEntry::new(base, &name, modified_at, now));
    }

    Ok(candidates)
}

/// A directory scheduled for deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletePath {
    pub path: PathBuf,
    pub basename: String,
}

/// Terminal outcome of one picker session.
///
/// The picker never touches the filesystem itself; whoever runs the session
/// turns this into actual directory operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SelectionResult {
    Cd {
        path: PathBuf,
    },
    Mkdir {
        path: PathBuf,
    },
    Rename {
        base_path: PathBuf,
        old_name: String,
        new_name: String,
    },
    Delete {
        base_path: PathBuf,
        paths: Vec<DeletePath>,
    },
    Cancelled,
}

impl SelectionResult {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SelectionResult::Cancelled)
    }
}
