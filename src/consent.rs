//! Consent gate for functional-category persistence.
//!
//! The progress store asks the gate before every read and write; only
//! `clear_all` bypasses it. The gate is a port so that the browser cookie
//! banner, a fixed flag, or a test toggle can all stand behind it.

use std::cell::Cell;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::progress::DEFAULT_PROGRESS_SLOT;
use crate::storage::ProgressStorage;

/// Slot holding the user's consent record
pub const CONSENT_SLOT: &str = "cryptics-cookie-consent";

/// Consent records are re-requested after this long
pub const CONSENT_VALIDITY_MS: i64 = 365 * 24 * 60 * 60 * 1000;

/// Slots written only with functional consent; purged when it is withdrawn
pub const NON_ESSENTIAL_SLOTS: &[&str] = &[DEFAULT_PROGRESS_SLOT];

/// Answers "may functional state be persisted right now?"
pub trait ConsentGate {
    fn functional_allowed(&self) -> bool;
}

impl ConsentGate for bool {
    fn functional_allowed(&self) -> bool {
        *self
    }
}

impl ConsentGate for Cell<bool> {
    fn functional_allowed(&self) -> bool {
        self.get()
    }
}

impl<T: ConsentGate + ?Sized> ConsentGate for &T {
    fn functional_allowed(&self) -> bool {
        (**self).functional_allowed()
    }
}

/// No record means the user never answered the banner: deny.
impl ConsentGate for Option<CookieConsent> {
    fn functional_allowed(&self) -> bool {
        self.as_ref().is_some_and(|c| c.functional)
    }
}

/// The user's answer to the cookie banner, per category.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieConsent {
    pub essential: bool,
    pub functional: bool,
    pub analytics: bool,
    pub marketing: bool,
    /// When the answer was given, ms since epoch
    pub timestamp: i64,
}

impl CookieConsent {
    /// Parse a stored record. Unreadable records count as "never answered".
    pub fn parse(raw: &str) -> Option<Self> {
        match serde_json::from_str(raw) {
            Ok(consent) => Some(consent),
            Err(e) => {
                warn!("Ignoring unreadable consent record: {}", e);
                None
            }
        }
    }

    /// True once the record is older than a year and must be asked again
    pub fn needs_renewal(&self, now_ms: i64) -> bool {
        self.timestamp < now_ms - CONSENT_VALIDITY_MS
    }
}

impl ConsentGate for CookieConsent {
    fn functional_allowed(&self) -> bool {
        self.functional
    }
}

/// Whether the banner must be shown: no record, or a stale one.
pub fn needs_consent(consent: Option<&CookieConsent>, now_ms: i64) -> bool {
    consent.map_or(true, |c| c.needs_renewal(now_ms))
}

/// Drop every non-essential slot if functional consent is not granted.
///
/// Returns the number of slots removed. Failures are logged and skipped.
pub fn purge_non_essential<S: ProgressStorage, C: ConsentGate>(storage: &S, consent: &C) -> usize {
    if consent.functional_allowed() {
        return 0;
    }

    NON_ESSENTIAL_SLOTS
        .iter()
        .filter(|slot| match storage.remove(slot) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to remove slot {}: {}", slot, e);
                false
            }
        })
        .count()
}
