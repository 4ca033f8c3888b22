//! Consent-gated, size-bounded solving progress.
//!
//! All progress lives in one slot as a JSON list, most recently touched
//! first. Every write is a full read-modify-write of that list:
//!
//! 1. read and migrate the stored list
//! 2. drop the entry for the same `(puzzle id, puzzle class)` key
//! 3. prepend the new entry
//! 4. truncate to `max_entries`, evicting the least recently touched
//! 5. write the list back with the configured retention
//!
//! Nothing here panics or returns an error for bad stored data: a corrupt
//! blob reads as an empty store.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::consent::ConsentGate;
use crate::current_time_ms;
use crate::puzzle::PuzzleClass;
use crate::storage::ProgressStorage;

// ============================================================================
// Configuration
// ============================================================================

pub const DEFAULT_PROGRESS_SLOT: &str = "cryptics-puzzle-progress";
pub const DEFAULT_MAX_ENTRIES: usize = 50;
pub const DEFAULT_RETENTION_DAYS: u64 = 30;
pub const DEFAULT_RECENT_LIMIT: usize = 10;

/// Progress store settings.
///
/// Every field is optional when deserialized; missing ones take the
/// defaults above.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    /// Name of the storage slot holding the list
    pub slot_name: String,
    /// Upper bound on retained entries
    pub max_entries: usize,
    /// Expiry applied to the slot on every write
    pub retention_days: u64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            slot_name: DEFAULT_PROGRESS_SLOT.to_string(),
            max_entries: DEFAULT_MAX_ENTRIES,
            retention_days: DEFAULT_RETENTION_DAYS,
        }
    }
}

impl ProgressConfig {
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_days.saturating_mul(24 * 60 * 60))
    }
}

// ============================================================================
// Entries
// ============================================================================

/// Solving state for one `(puzzle id, puzzle class)` pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEntry {
    pub puzzle_id: i64,
    #[serde(rename = "puzzleType")]
    pub puzzle_class: PuzzleClass,
    /// One slot per solution character; separator slots stay blank
    pub user_input: Vec<String>,
    /// Set once solved or given up, ms since epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
    /// Updated on every save, ms since epoch
    pub last_played: i64,
}

impl ProgressEntry {
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    fn matches(&self, puzzle_id: i64, puzzle_class: PuzzleClass) -> bool {
        self.puzzle_id == puzzle_id && self.puzzle_class == puzzle_class
    }
}

/// An entry as it may appear on disk, including records written before
/// the class distinction existed.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredEntry {
    puzzle_id: i64,
    /// Kept loose: old clients wrote falsy placeholders here
    #[serde(default, rename = "puzzleType")]
    puzzle_class: Option<Value>,
    #[serde(default)]
    user_input: Vec<String>,
    #[serde(default)]
    completed_at: Option<i64>,
    #[serde(default)]
    last_played: i64,
}

/// Parse a stored blob into entries, migrating legacy records.
///
/// - anything but a JSON array reads as empty
/// - entries that cannot be read are dropped individually
/// - entries without a class, or with a blank one (`""`, `null`, `false`,
///   `0`), become [`PuzzleClass::Regular`]
/// - entries with an unknown class are dropped, since no lookup can reach them
/// - repeated keys keep only their first (most recent) occurrence
pub fn migrate_legacy(blob: &str) -> Vec<ProgressEntry> {
    let items = match serde_json::from_str::<Value>(blob) {
        Ok(Value::Array(items)) => items,
        Ok(_) => {
            warn!("Stored progress is not a list, ignoring it");
            return Vec::new();
        }
        Err(e) => {
            warn!("Failed to parse stored progress: {}", e);
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<StoredEntry>(item) {
            Ok(stored) => Some(stored),
            Err(e) => {
                warn!("Dropping unreadable progress entry: {}", e);
                None
            }
        })
        .filter_map(|stored| {
            let Some(puzzle_class) = stored_class(stored.puzzle_class.as_ref()) else {
                debug!(
                    "Dropping progress entry {} with unknown class {:?}",
                    stored.puzzle_id, stored.puzzle_class
                );
                return None;
            };
            Some(ProgressEntry {
                puzzle_id: stored.puzzle_id,
                puzzle_class,
                user_input: stored.user_input,
                completed_at: stored.completed_at,
                last_played: stored.last_played,
            })
        })
        .filter(|entry| seen.insert((entry.puzzle_id, entry.puzzle_class)))
        .collect()
}

fn stored_class(value: Option<&Value>) -> Option<PuzzleClass> {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => Some(PuzzleClass::default()),
        Some(Value::String(s)) if s.is_empty() => Some(PuzzleClass::default()),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => Some(PuzzleClass::default()),
        Some(other) => serde_json::from_value(other.clone()).ok(),
    }
}

// ============================================================================
// Store
// ============================================================================

/// Progress persistence over a storage port, gated by a consent port.
pub struct ProgressStore<S, C> {
    storage: S,
    consent: C,
    config: ProgressConfig,
}

impl<S: ProgressStorage, C: ConsentGate> ProgressStore<S, C> {
    pub fn new(storage: S, consent: C) -> Self {
        Self::with_config(storage, consent, ProgressConfig::default())
    }

    pub fn with_config(storage: S, consent: C, config: ProgressConfig) -> Self {
        Self {
            storage,
            consent,
            config,
        }
    }

    pub fn config(&self) -> &ProgressConfig {
        &self.config
    }

    /// Record in-progress input. Returns `false` without consent or when the
    /// medium refuses the write.
    pub fn save<I: AsRef<str>>(&self, puzzle_id: i64, puzzle_class: PuzzleClass, user_input: &[I]) -> bool {
        if !self.consent.functional_allowed() {
            info!("Puzzle progress not saved - functional cookies not allowed");
            return false;
        }

        let entry = ProgressEntry {
            puzzle_id,
            puzzle_class,
            user_input: to_owned_input(user_input),
            completed_at: None,
            last_played: now(),
        };
        self.upsert(entry)
    }

    /// Record the final input and stamp completion (solved or given up).
    pub fn mark_completed<I: AsRef<str>>(
        &self,
        puzzle_id: i64,
        puzzle_class: PuzzleClass,
        user_input: &[I],
    ) -> bool {
        if !self.consent.functional_allowed() {
            info!("Puzzle completion not saved - functional cookies not allowed");
            return false;
        }

        let stamp = now();
        let entry = ProgressEntry {
            puzzle_id,
            puzzle_class,
            user_input: to_owned_input(user_input),
            completed_at: Some(stamp),
            last_played: stamp,
        };
        self.upsert(entry)
    }

    /// Stored state for the key, or `None`. Always `None` without consent,
    /// even when a record survives from an earlier consenting session.
    pub fn load(&self, puzzle_id: i64, puzzle_class: PuzzleClass) -> Option<ProgressEntry> {
        if !self.consent.functional_allowed() {
            return None;
        }

        self.read_entries()
            .into_iter()
            .find(|entry| entry.matches(puzzle_id, puzzle_class))
    }

    pub fn is_completed(&self, puzzle_id: i64, puzzle_class: PuzzleClass) -> bool {
        self.load(puzzle_id, puzzle_class)
            .is_some_and(|entry| entry.is_completed())
    }

    /// Up to `limit` entries, most recently played first.
    pub fn recently_played(&self, limit: usize) -> Vec<ProgressEntry> {
        if !self.consent.functional_allowed() {
            return Vec::new();
        }

        let mut entries = self.read_entries();
        entries.sort_by(|a, b| b.last_played.cmp(&a.last_played));
        entries.truncate(limit);
        entries
    }

    pub fn completed_count(&self) -> usize {
        if !self.consent.functional_allowed() {
            return 0;
        }

        self.read_entries()
            .iter()
            .filter(|entry| entry.is_completed())
            .count()
    }

    /// Empty the store. Ignores consent: users can always erase their data.
    pub fn clear_all(&self) -> bool {
        self.write_entries(&[])
    }

    pub fn save_user<I: AsRef<str>>(&self, puzzle_id: i64, user_input: &[I]) -> bool {
        self.save(puzzle_id, PuzzleClass::User, user_input)
    }

    pub fn load_user(&self, puzzle_id: i64) -> Option<ProgressEntry> {
        self.load(puzzle_id, PuzzleClass::User)
    }

    pub fn mark_user_completed<I: AsRef<str>>(&self, puzzle_id: i64, user_input: &[I]) -> bool {
        self.mark_completed(puzzle_id, PuzzleClass::User, user_input)
    }

    pub fn is_user_completed(&self, puzzle_id: i64) -> bool {
        self.is_completed(puzzle_id, PuzzleClass::User)
    }

    fn upsert(&self, entry: ProgressEntry) -> bool {
        let mut entries = self.read_entries();
        entries.retain(|existing| !existing.matches(entry.puzzle_id, entry.puzzle_class));
        entries.insert(0, entry);
        entries.truncate(self.config.max_entries);
        self.write_entries(&entries)
    }

    fn read_entries(&self) -> Vec<ProgressEntry> {
        match self.storage.read(&self.config.slot_name) {
            Ok(Some(blob)) => migrate_legacy(&blob),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Failed to read puzzle progress: {}", e);
                Vec::new()
            }
        }
    }

    fn write_entries(&self, entries: &[ProgressEntry]) -> bool {
        let blob = match serde_json::to_string(entries) {
            Ok(blob) => blob,
            Err(e) => {
                warn!("Failed to serialize puzzle progress: {}", e);
                return false;
            }
        };

        match self
            .storage
            .write(&self.config.slot_name, &blob, self.config.retention())
        {
            Ok(()) => {
                debug!("Stored {} progress entries", entries.len());
                true
            }
            Err(e) => {
                warn!("Failed to store puzzle progress: {}", e);
                false
            }
        }
    }
}

fn to_owned_input<I: AsRef<str>>(user_input: &[I]) -> Vec<String> {
    user_input.iter().map(|slot| slot.as_ref().to_string()).collect()
}

fn now() -> i64 {
    i64::try_from(current_time_ms()).unwrap_or(i64::MAX)
}
