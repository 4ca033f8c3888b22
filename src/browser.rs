//! Browser-backed ports: `document.cookie` as the storage medium and the
//! cookie banner's record as the consent gate.
//!
//! # Example (JavaScript)
//!
//! ```javascript
//! const store = new BrowserProgressStore();          // default config
//! store.save(42, PuzzleClass.Regular, session.userInput());
//! if (session.finished) {
//!   store.markCompleted(42, PuzzleClass.Regular, session.userInput());
//! }
//! const resumed = store.load(42, PuzzleClass.Regular); // JSON or undefined
//! ```

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::warn;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::HtmlDocument;

use crate::bindings::parse_input;
use crate::consent::{self, ConsentGate, CookieConsent, CONSENT_SLOT};
use crate::progress::{ProgressConfig, ProgressStore, DEFAULT_RECENT_LIMIT};
use crate::puzzle::PuzzleClass;
use crate::storage::{ProgressStorage, StorageError};
use crate::current_time_ms;

const COOKIE_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

fn html_document() -> Result<HtmlDocument, StorageError> {
    web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| StorageError::Unavailable("no document".to_string()))?
        .dyn_into::<HtmlDocument>()
        .map_err(|_| StorageError::Unavailable("document is not HTML".to_string()))
}

// ============================================================================
// Cookie medium
// ============================================================================

/// Named slots stored as `SameSite=Strict` cookies on path `/`.
#[derive(Clone, Copy, Debug, Default)]
pub struct CookieStorage;

impl CookieStorage {
    fn set_raw(&self, cookie: &str) -> Result<(), StorageError> {
        html_document()?
            .set_cookie(cookie)
            .map_err(|e| StorageError::Rejected(format!("{:?}", e)))
    }
}

impl ProgressStorage for CookieStorage {
    fn read(&self, name: &str) -> Result<Option<String>, StorageError> {
        let cookies = html_document()?
            .cookie()
            .map_err(|e| StorageError::Unavailable(format!("{:?}", e)))?;

        let Some(raw) = cookies
            .split("; ")
            .find_map(|row| row.strip_prefix(name).and_then(|rest| rest.strip_prefix('=')))
        else {
            return Ok(None);
        };

        // undecodable values read as unset
        Ok(js_sys::decode_uri_component(raw).ok().map(String::from))
    }

    fn write(&self, name: &str, value: &str, ttl: Duration) -> Result<(), StorageError> {
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        let expires_ms = current_time_ms().saturating_add(ttl_ms);
        let expires = i64::try_from(expires_ms)
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .ok_or_else(|| StorageError::Rejected("expiry out of range".to_string()))?;

        let encoded = String::from(js_sys::encode_uri_component(value));
        self.set_raw(&format!(
            "{}={}; expires={}; path=/; SameSite=Strict",
            name,
            encoded,
            expires.format(COOKIE_DATE_FORMAT)
        ))
    }

    fn remove(&self, name: &str) -> Result<(), StorageError> {
        self.set_raw(&format!(
            "{}=; expires=Thu, 01 Jan 1970 00:00:00 GMT; path=/;",
            name
        ))
    }
}

// ============================================================================
// Consent from the banner cookie
// ============================================================================

/// Reads the consent cookie on every call, so withdrawing consent in
/// another tab takes effect immediately.
#[derive(Clone, Copy, Debug, Default)]
pub struct CookieConsentGate;

impl CookieConsentGate {
    pub fn current(&self) -> Option<CookieConsent> {
        match CookieStorage.read(CONSENT_SLOT) {
            Ok(Some(raw)) => CookieConsent::parse(&raw),
            Ok(None) => None,
            Err(e) => {
                warn!("Failed to read consent cookie: {}", e);
                None
            }
        }
    }
}

impl ConsentGate for CookieConsentGate {
    fn functional_allowed(&self) -> bool {
        self.current().functional_allowed()
    }
}

// ============================================================================
// Store exported to JS
// ============================================================================

/// JS numbers arrive as `f64`; every backend and shared id is an integer
/// well inside the exactly representable range.
fn puzzle_id(id: f64) -> i64 {
    id as i64
}

/// Progress store over browser cookies, gated by the cookie banner.
#[wasm_bindgen]
pub struct BrowserProgressStore {
    inner: ProgressStore<CookieStorage, CookieConsentGate>,
}

#[wasm_bindgen]
impl BrowserProgressStore {
    /// `config_json` may set `slot_name`, `max_entries`, `retention_days`.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> BrowserProgressStore {
        #[cfg(feature = "console_error_panic_hook")]
        crate::set_panic_hook();

        let config = config_json
            .and_then(|json| match serde_json::from_str::<ProgressConfig>(&json) {
                Ok(config) => Some(config),
                Err(e) => {
                    warn!("Invalid progress config, using defaults: {}", e);
                    None
                }
            })
            .unwrap_or_default();

        BrowserProgressStore {
            inner: ProgressStore::with_config(CookieStorage, CookieConsentGate, config),
        }
    }

    pub fn save(&self, id: f64, puzzle_class: PuzzleClass, user_input_json: &str) -> bool {
        self.inner
            .save(puzzle_id(id), puzzle_class, &parse_input(user_input_json))
    }

    #[wasm_bindgen(js_name = markCompleted)]
    pub fn mark_completed(
        &self,
        id: f64,
        puzzle_class: PuzzleClass,
        user_input_json: &str,
    ) -> bool {
        self.inner
            .mark_completed(puzzle_id(id), puzzle_class, &parse_input(user_input_json))
    }

    /// Stored entry as JSON, or `undefined`
    pub fn load(&self, id: f64, puzzle_class: PuzzleClass) -> Option<String> {
        let entry = self.inner.load(puzzle_id(id), puzzle_class)?;
        serde_json::to_string(&entry).ok()
    }

    #[wasm_bindgen(js_name = isCompleted)]
    pub fn is_completed(&self, id: f64, puzzle_class: PuzzleClass) -> bool {
        self.inner.is_completed(puzzle_id(id), puzzle_class)
    }

    /// JSON array of entries, newest first
    #[wasm_bindgen(js_name = recentlyPlayed)]
    pub fn recently_played(&self, limit: Option<usize>) -> String {
        let entries = self
            .inner
            .recently_played(limit.unwrap_or(DEFAULT_RECENT_LIMIT));
        serde_json::to_string(&entries).unwrap_or_else(|_| "[]".to_string())
    }

    #[wasm_bindgen(js_name = completedCount)]
    pub fn completed_count(&self) -> usize {
        self.inner.completed_count()
    }

    #[wasm_bindgen(js_name = clearAll)]
    pub fn clear_all(&self) -> bool {
        self.inner.clear_all()
    }

    /// Call after the banner changes; drops functional cookies when
    /// functional consent is now off. Returns the number removed.
    #[wasm_bindgen(js_name = purgeNonEssential)]
    pub fn purge_non_essential(&self) -> usize {
        consent::purge_non_essential(&CookieStorage, &CookieConsentGate)
    }
}

/// Whether the cookie banner must be shown
#[wasm_bindgen(js_name = needsConsent)]
pub fn needs_consent() -> bool {
    let now = i64::try_from(current_time_ms()).unwrap_or(i64::MAX);
    consent::needs_consent(CookieConsentGate.current().as_ref(), now)
}
