//! Persistence medium for solving progress.
//!
//! The progress store only needs "get blob / set blob with TTL" on a single
//! named slot. Browsers back this with a cookie (see `browser`); tests and
//! native callers use [`MemoryStorage`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;

use thiserror::Error;

use crate::current_time_ms;

/// Errors from the underlying medium
#[derive(Debug, Error)]
pub enum StorageError {
    /// Medium cannot be reached at all (no document, storage disabled)
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Medium refused the write (quota, blocked cookie)
    #[error("Storage rejected write: {0}")]
    Rejected(String),
}

/// A synchronous named-slot store with per-write expiry.
pub trait ProgressStorage {
    /// Current value of slot `name`, or `None` if unset or expired
    fn read(&self, name: &str) -> Result<Option<String>, StorageError>;

    /// Replace slot `name`, expiring `ttl` from now
    fn write(&self, name: &str, value: &str, ttl: Duration) -> Result<(), StorageError>;

    /// Drop slot `name` entirely
    fn remove(&self, name: &str) -> Result<(), StorageError>;
}

impl<T: ProgressStorage + ?Sized> ProgressStorage for &T {
    fn read(&self, name: &str) -> Result<Option<String>, StorageError> {
        (**self).read(name)
    }

    fn write(&self, name: &str, value: &str, ttl: Duration) -> Result<(), StorageError> {
        (**self).write(name, value, ttl)
    }

    fn remove(&self, name: &str) -> Result<(), StorageError> {
        (**self).remove(name)
    }
}

// ============================================================================
// In-memory medium
// ============================================================================

#[derive(Clone, Debug)]
struct Slot {
    value: String,
    expires_at: u64,
}

/// Slot store held in memory, honoring expiry on read.
///
/// Interior mutability lets one instance be shared by reference between a
/// progress store and the code that inspects it.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slots: RefCell<HashMap<String, Slot>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live slots
    pub fn len(&self) -> usize {
        let now = current_time_ms();
        self.slots
            .borrow()
            .values()
            .filter(|slot| slot.expires_at > now)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ProgressStorage for MemoryStorage {
    fn read(&self, name: &str) -> Result<Option<String>, StorageError> {
        let now = current_time_ms();
        let mut slots = self.slots.borrow_mut();

        let expired = match slots.get(name) {
            Some(slot) if slot.expires_at > now => return Ok(Some(slot.value.clone())),
            Some(_) => true,
            None => false,
        };

        if expired {
            slots.remove(name);
        }
        Ok(None)
    }

    fn write(&self, name: &str, value: &str, ttl: Duration) -> Result<(), StorageError> {
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        let expires_at = current_time_ms().saturating_add(ttl_ms);

        self.slots.borrow_mut().insert(
            name.to_string(),
            Slot {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<(), StorageError> {
        self.slots.borrow_mut().remove(name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: Duration = Duration::from_secs(86_400);

    #[test]
    fn test_memory_storage_round_trip() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.read("slot").unwrap(), None);

        storage.write("slot", "[]", DAY).unwrap();
        assert_eq!(storage.read("slot").unwrap().as_deref(), Some("[]"));
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn test_memory_storage_expires() {
        let storage = MemoryStorage::new();
        storage.write("slot", "[]", Duration::ZERO).unwrap();

        assert_eq!(storage.read("slot").unwrap(), None);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_memory_storage_remove() {
        let storage = MemoryStorage::new();
        storage.write("a", "1", DAY).unwrap();
        storage.write("b", "2", DAY).unwrap();

        storage.remove("a").unwrap();
        assert_eq!(storage.read("a").unwrap(), None);
        assert_eq!(storage.read("b").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn test_storage_through_reference() {
        fn write_through<S: ProgressStorage>(storage: S) {
            storage.write("slot", "x", DAY).unwrap();
        }

        let storage = MemoryStorage::new();
        write_through(&storage);
        assert_eq!(storage.read("slot").unwrap().as_deref(), Some("x"));
    }
}
