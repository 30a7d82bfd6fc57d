//! Word-frequency statistics for one library.
//!
//! # Responsibility
//! - Count words across point content, or tag names across points.
//!
//! # Invariants
//! - Single-character tokens are never counted.
//! - Result is capped at [`WORD_FREQUENCY_LIMIT`] entries, ordered by
//!   `count DESC, word ASC`.

use crate::model::library::LibraryId;
use crate::repo::library_repo::{LibraryRepository, SqliteLibraryRepository};
use crate::repo::point_repo::{PointRepository, SqlitePointRepository};
use crate::repo::RepoError;
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const WORD_FREQUENCY_LIMIT: usize = 100;

// Han runs are captured separately: there is no dictionary segmenter, so they
// are split into overlapping bigrams.
static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?P<han>\p{Han}+)|(?P<word>[\p{L}\p{N}_&&\P{Han}]+)").expect("valid token regex")
});

/// What to count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyMode {
    /// Words in point content.
    #[default]
    Content,
    /// Tag names attached to points.
    Tag,
}

/// One ranked entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCount {
    pub word: String,
    pub count: u64,
}

#[derive(Debug)]
pub enum AnalysisError {
    LibraryNotFound(LibraryId),
    Repo(RepoError),
}

impl Display for AnalysisError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LibraryNotFound(id) => write!(f, "library not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AnalysisError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::LibraryNotFound(_) => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for AnalysisError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Computes the ranked word (or tag) frequency of a library.
pub fn word_frequency(
    conn: &Connection,
    library_id: LibraryId,
    mode: FrequencyMode,
) -> Result<Vec<WordCount>, AnalysisError> {
    if !SqliteLibraryRepository::try_new(conn)?.library_exists(library_id)? {
        return Err(AnalysisError::LibraryNotFound(library_id));
    }

    let points = SqlitePointRepository::try_new(conn)?.list_point_records(library_id)?;
    let mut counts: HashMap<String, u64> = HashMap::new();
    for record in &points {
        match mode {
            FrequencyMode::Content => {
                for word in tokenize(&record.point.content) {
                    *counts.entry(word).or_default() += 1;
                }
            }
            FrequencyMode::Tag => {
                for tag in &record.tags {
                    *counts.entry(tag.name.clone()).or_default() += 1;
                }
            }
        }
    }

    Ok(rank(counts))
}

/// Splits text into countable lowercase tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for caps in TOKEN_RE.captures_iter(text) {
        if let Some(han) = caps.name("han") {
            let chars: Vec<char> = han.as_str().chars().collect();
            tokens.extend(chars.windows(2).map(|pair| pair.iter().collect::<String>()));
        } else if let Some(word) = caps.name("word") {
            if word.as_str().chars().count() > 1 {
                tokens.push(word.as_str().to_lowercase());
            }
        }
    }
    tokens
}

fn rank(counts: HashMap<String, u64>) -> Vec<WordCount> {
    let mut ranked: Vec<WordCount> = counts
        .into_iter()
        .map(|(word, count)| WordCount { word, count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.word.cmp(&b.word)));
    ranked.truncate(WORD_FREQUENCY_LIMIT);
    ranked
}

#[cfg(test)]
mod tests {
    use super::{rank, tokenize, WORD_FREQUENCY_LIMIT};
    use std::collections::HashMap;

    #[test]
    fn tokenize_lowercases_and_drops_single_chars() {
        assert_eq!(
            tokenize("A Graph, a graph: GRAPH-theory x"),
            vec!["graph", "graph", "graph", "theory"]
        );
    }

    #[test]
    fn tokenize_splits_han_runs_into_bigrams() {
        assert_eq!(tokenize("知识点 网络"), vec!["知识", "识点", "网络"]);
        assert!(tokenize("我 是").is_empty());
    }

    #[test]
    fn rank_orders_by_count_then_word_and_caps() {
        let mut counts = HashMap::new();
        for idx in 0..150u64 {
            counts.insert(format!("w{idx:03}"), 1);
        }
        counts.insert("zeta".to_string(), 5);
        counts.insert("alpha".to_string(), 5);
        let ranked = rank(counts);
        assert_eq!(ranked.len(), WORD_FREQUENCY_LIMIT);
        assert_eq!(ranked[0].word, "alpha");
        assert_eq!(ranked[1].word, "zeta");
        assert_eq!(ranked[2].word, "w000");
    }
}
