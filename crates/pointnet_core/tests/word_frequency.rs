mod common;

use common::{library, point_with};
use pointnet_core::db::open_db_in_memory;
use pointnet_core::{word_frequency, AnalysisError, FrequencyMode};

#[test]
fn content_words_are_ranked_by_count_then_word() {
    let conn = open_db_in_memory().unwrap();
    let lib = library(&conn, "words", &[]);
    point_with(&conn, lib, "A", "Graph graph storage", &[]);
    point_with(&conn, lib, "B", "storage engine a", &[]);

    let ranked = word_frequency(&conn, lib, FrequencyMode::Content).unwrap();
    let pairs: Vec<(&str, u64)> = ranked
        .iter()
        .map(|entry| (entry.word.as_str(), entry.count))
        .collect();
    assert_eq!(pairs, vec![("graph", 2), ("storage", 2), ("engine", 1)]);
}

#[test]
fn tag_mode_counts_tag_usage() {
    let conn = open_db_in_memory().unwrap();
    let lib = library(&conn, "words", &["x", "y"]);
    point_with(&conn, lib, "A", "", &["x", "y"]);
    point_with(&conn, lib, "B", "", &["y"]);

    let ranked = word_frequency(&conn, lib, FrequencyMode::Tag).unwrap();
    assert_eq!(ranked[0].word, "y");
    assert_eq!(ranked[0].count, 2);
    assert_eq!(ranked[1].word, "x");
}

#[test]
fn unknown_library_is_reported() {
    let conn = open_db_in_memory().unwrap();
    assert!(matches!(
        word_frequency(&conn, uuid::Uuid::new_v4(), FrequencyMode::Content),
        Err(AnalysisError::LibraryNotFound(_))
    ));
}
