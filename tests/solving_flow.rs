//! End-to-end: open a shared link, solve it, persist progress, come back.

use std::cell::Cell;

use cryptic_core::{
    decode, encode, solution_length_pattern, Category, GameState, MemoryStorage, ProgressConfig,
    ProgressStore, PuzzleClass, SharePayload, SolvingSession,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn shared_query() -> String {
    let payload = SharePayload {
        puzzle: "Hound finally gone (3)".to_string(),
        solution: "dog".to_string(),
        explanation: Some("Definition: hound".to_string()),
        source: Some(Category::Official),
        difficulty: Some(2.0),
    };
    format!("?{}", encode(&payload).unwrap())
}

#[test]
fn test_shared_puzzle_solved_and_remembered() {
    init_tracing();

    let puzzle = decode(&shared_query()).expect("link decodes");
    assert!(puzzle.is_ephemeral());
    assert_eq!(puzzle.category, Category::Official);
    assert_eq!(solution_length_pattern(&puzzle.solution), "(3)");

    let storage = MemoryStorage::new();
    let consent = Cell::new(true);
    let store = ProgressStore::new(&storage, &consent);

    let mut session = SolvingSession::new(&puzzle.solution);
    session.input(0, "d");
    session.input(1, "o");
    assert!(store.save(puzzle.id, PuzzleClass::Regular, session.user_input()));

    // Reload the page: the half-filled grid comes back.
    let entry = store.load(puzzle.id, PuzzleClass::Regular).unwrap();
    let mut session = SolvingSession::resume(&puzzle.solution, &entry);
    assert_eq!(session.user_input(), ["d", "o", ""]);

    session.input(2, "G");
    assert_eq!(session.check(), GameState::Correct);
    assert!(store.mark_completed(puzzle.id, PuzzleClass::Regular, session.user_input()));
    assert!(store.is_completed(puzzle.id, PuzzleClass::Regular));
    assert_eq!(store.completed_count(), 1);

    // Same id as a user puzzle is a separate record.
    assert!(!store.is_completed(puzzle.id, PuzzleClass::User));

    let entry = store.load(puzzle.id, PuzzleClass::Regular).unwrap();
    assert_eq!(
        SolvingSession::resume(&puzzle.solution, &entry).state(),
        GameState::Correct
    );
}

#[test]
fn test_same_link_gives_same_id() {
    let first = decode(&shared_query()).unwrap();
    let second = decode(&shared_query()).unwrap();
    assert_eq!(first.id, second.id);
    assert!(first.id < 0);
}

#[test]
fn test_withdrawn_consent_hides_progress() {
    init_tracing();

    let storage = MemoryStorage::new();
    let consent = Cell::new(true);
    let store = ProgressStore::new(&storage, &consent);

    let mut session = SolvingSession::new("see-through");
    session.give_up();
    assert!(store.mark_user_completed(7, session.user_input()));
    assert!(store.is_user_completed(7));

    consent.set(false);
    assert!(!store.is_user_completed(7));
    assert!(!store.save_user(8, &["a"]));
    assert!(store.recently_played(10).is_empty());

    consent.set(true);
    assert!(store.is_user_completed(7));
    assert!(store.load_user(8).is_none());
}

#[test]
fn test_bounded_store_keeps_most_recent() {
    let storage = MemoryStorage::new();
    let config = ProgressConfig {
        max_entries: 3,
        ..ProgressConfig::default()
    };
    let store = ProgressStore::with_config(&storage, true, config);

    for id in 1..=5 {
        assert!(store.save(id, PuzzleClass::Regular, &["x"]));
    }

    let ids: Vec<i64> = store
        .recently_played(10)
        .iter()
        .map(|entry| entry.puzzle_id)
        .collect();
    assert_eq!(ids.len(), 3);
    assert!(store.load(1, PuzzleClass::Regular).is_none());
    assert!(store.load(5, PuzzleClass::Regular).is_some());

    assert!(store.clear_all());
    assert_eq!(store.completed_count(), 0);
    assert!(store.recently_played(10).is_empty());
}
