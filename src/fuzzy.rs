//! Subsequence fuzzy matching and ranking of candidate directories
//!
//! Matching is greedy: each query character binds to its first occurrence
//! after the previous match. There is no search for a better alignment.

use crate::domain::CandidateEntry;
use std::path::Path;
use std::sync::LazyLock;

/// Gaps up to this size use the precomputed contiguity bonus.
const GAP_TABLE_MAX: usize = 16;

static GAP_BONUS: LazyLock<[f64; GAP_TABLE_MAX + 1]> = LazyLock::new(|| {
    let mut table = [0.0; GAP_TABLE_MAX + 1];
    for (gap, slot) in table.iter_mut().enumerate() {
        *slot = 2.0 / ((gap + 1) as f64).sqrt();
    }
    table
});

fn gap_bonus(gap: usize) -> f64 {
    if gap <= GAP_TABLE_MAX {
        GAP_BONUS[gap]
    } else {
        2.0 / ((gap + 1) as f64).sqrt()
    }
}

/// Per-char case fold that keeps indices aligned with the original text.
fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// A successful match of a query against one candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredMatch {
    pub entry: CandidateEntry,
    pub score: f64,
    /// Char indices into `entry.text`, in match order
    pub positions: Vec<usize>,
}

/// Scores `query` against pre-folded candidate text.
///
/// Returns `None` when some query character has no remaining occurrence.
fn score_folded(folded: &[char], base_score: f64, query: &str) -> Option<(f64, Vec<usize>)> {
    if query.is_empty() {
        return Some((base_score, Vec::new()));
    }

    let mut score = base_score;
    let mut positions = Vec::new();
    let mut scan = 0;
    let mut last: Option<usize> = None;

    for qc in query.chars().map(fold) {
        let found = scan + folded[scan..].iter().position(|&c| c == qc)?;
        positions.push(found);
        score += 1.0;

        if found == 0 || !folded[found - 1].is_ascii_alphanumeric() {
            score += 1.0;
        }

        if let Some(prev) = last {
            score += gap_bonus(found - prev - 1);
        }

        last = Some(found);
        scan = found + 1;
    }

    if let Some(last) = last {
        score *= positions.len() as f64 / (last + 1) as f64;
    }
    score *= 10.0 / (folded.len() as f64 + 10.0);

    Some((score, positions))
}

/// Scores `query` against a single candidate.
pub fn score(entry: &CandidateEntry, query: &str) -> Option<(f64, Vec<usize>)> {
    let folded: Vec<char> = entry.text.chars().map(fold).collect();
    score_folded(&folded, entry.base_score, query)
}

#[derive(Debug, Clone)]
struct IndexedEntry {
    entry: CandidateEntry,
    folded: Vec<char>,
}

/// Holds a fixed candidate set and ranks it for a query.
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    entries: Vec<IndexedEntry>,
}

impl Matcher {
    pub fn new(candidates: Vec<CandidateEntry>) -> Self {
        let entries = candidates
            .into_iter()
            .map(|entry| IndexedEntry {
                folded: entry.text.chars().map(fold).collect(),
                entry,
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up a candidate by its full path.
    pub fn find(&self, path: &Path) -> Option<&CandidateEntry> {
        self.entries
            .iter()
            .map(|indexed| &indexed.entry)
            .find(|entry| entry.path == path)
    }

    /// All matching candidates, best first. Equal scores keep insertion order.
    pub fn matches(&self, query: &str) -> Vec<ScoredMatch> {
        let mut results: Vec<ScoredMatch> = self
            .entries
            .iter()
            .filter_map(|indexed| {
                score_folded(&indexed.folded, indexed.entry.base_score, query).map(
                    |(score, positions)| ScoredMatch {
                        entry: indexed.entry.clone(),
                        score,
                        positions,
                    },
                )
            })
            .collect();

        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results
    }
}
