//! Cryptic Core - Client-Side Puzzle State Engine
//!
//! The parts of the cryptics web client that need to be exactly right,
//! compiled to WebAssembly for the browser and usable natively for tests.
//!
//! # Key Features
//! - Answer checking that ignores word separators ([`answer`])
//! - Public length patterns such as `(3-4)` ([`pattern`])
//! - Shareable puzzle links with a stable negative id ([`share`])
//! - Consent-gated, bounded progress storage with legacy migration
//!   ([`progress`], [`consent`], [`storage`])
//! - The per-puzzle solving state machine ([`session`])
//!
//! ## Usage in JavaScript
//!
//! ```javascript
//! import init, { decodeShareLink, lengthPattern, PuzzleSession } from 'cryptic-core';
//!
//! await init();
//!
//! const puzzle = JSON.parse(decodeShareLink(location.search) ?? 'null');
//! const session = new PuzzleSession(puzzle.solution);
//! session.input(0, 'd');
//! console.log(lengthPattern(puzzle.solution), session.check());
//! ```
//!
//! ## Build
//!
//! ```bash
//! wasm-pack build --target web --out-dir pkg
//! ```

pub mod answer;
pub mod bindings;
pub mod consent;
pub mod pattern;
pub mod progress;
pub mod puzzle;
pub mod session;
pub mod share;
pub mod storage;

#[cfg(target_arch = "wasm32")]
pub mod browser;

pub use answer::{check_answer, is_answer_complete, normalize};
pub use consent::{ConsentGate, CookieConsent};
pub use pattern::solution_length_pattern;
pub use progress::{ProgressConfig, ProgressEntry, ProgressStore};
pub use puzzle::{Category, Puzzle, PuzzleClass};
pub use session::{GameState, SolvingSession};
pub use share::{decode, encode, ShareError, ShareLink, SharePayload};
pub use storage::{MemoryStorage, ProgressStorage, StorageError};

// Initialize panic hook for better error messages in browser console
#[cfg(feature = "console_error_panic_hook")]
pub fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

// ============================================================================
// Time Utility
// ============================================================================

pub(crate) fn current_time_ms() -> u64 {
    #[cfg(target_arch = "wasm32")]
    {
        js_sys::Date::now() as u64
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}
