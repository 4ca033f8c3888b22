//! Shareable puzzle links.
//!
//! A puzzle that was never submitted to the backend travels entirely inside
//! one query parameter: the normalized payload as a JSON record, encoded as
//! URL-safe base64 without padding. Decoding never fails loudly; a broken
//! link is simply "no puzzle".
//!
//! # Token format
//!
//! ```text
//! code=<base64url({"v":1,"puzzle":..,"solution":..,"explanation":..,"source":..,"difficulty":..})>
//! ```
//!
//! Tokens minted before the `v` field existed decode as version 1.
//!
//! # Identifiers
//!
//! Shared puzzles get a synthetic id from [`shared_puzzle_id`], a fixed
//! content fingerprint (version 1):
//!
//! ```text
//! seed = puzzle|solution|explanation-or-empty|SOURCE|difficulty
//! h    = fold(h * 31 + utf16_unit) over seed, wrapping i32
//! id   = -|h|          (h == 0 is replaced by 1)
//! ```
//!
//! The id is strictly negative, so it cannot collide with backend ids, and
//! stable across reloads of the same link. It is not tamper-evident.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, URL_SAFE_NO_PAD};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::puzzle::{Category, Puzzle, MAX_DIFFICULTY, MIN_DIFFICULTY};

// ============================================================================
// Constants
// ============================================================================

/// Query parameter carrying the token
pub const SHARE_PARAM: &str = "code";

/// Version written into every new token
pub const SHARE_FORMAT_VERSION: u64 = 1;

pub const DEFAULT_DIFFICULTY: u8 = 3;

/// Accepts padded and unpadded input and non-canonical trailing bits, so
/// links copied through mail clients or mangled by hand still decode.
const LENIENT_URL_SAFE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

// ============================================================================
// Errors
// ============================================================================

/// Reasons a payload cannot be encoded or a token cannot be decoded
#[derive(Debug, Error)]
pub enum ShareError {
    /// Puzzle text or solution empty after trimming
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid base64 token: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Token is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Invalid payload JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Payload is not a JSON object")]
    NotAnObject,

    #[error("Unsupported share format version: {0}")]
    UnsupportedVersion(u64),
}

// ============================================================================
// Payload types
// ============================================================================

/// What a caller hands to [`encode`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SharePayload {
    pub puzzle: String,
    pub solution: String,
    pub explanation: Option<String>,
    pub source: Option<Category>,
    pub difficulty: Option<f64>,
}

impl From<&Puzzle> for SharePayload {
    fn from(puzzle: &Puzzle) -> Self {
        Self {
            puzzle: puzzle.puzzle_text.clone(),
            solution: puzzle.solution.clone(),
            explanation: puzzle.explanation.clone(),
            source: Some(puzzle.category),
            difficulty: Some(f64::from(puzzle.difficulty)),
        }
    }
}

/// Untrusted record as found inside a token or built by hand.
///
/// `source` and `difficulty` stay loosely typed so that bad values fall
/// back to defaults instead of failing the whole link.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawPayload {
    #[serde(default)]
    pub v: Option<u64>,
    #[serde(default)]
    pub puzzle: Option<String>,
    #[serde(default)]
    pub solution: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub source: Option<Value>,
    /// `Some(Value::Null)` for an explicit `null`, `None` when absent
    #[serde(default, deserialize_with = "present_value")]
    pub difficulty: Option<Value>,
}

fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl From<&SharePayload> for RawPayload {
    fn from(payload: &SharePayload) -> Self {
        Self {
            v: Some(SHARE_FORMAT_VERSION),
            puzzle: Some(payload.puzzle.clone()),
            solution: Some(payload.solution.clone()),
            explanation: payload.explanation.clone(),
            source: payload.source.map(|s| Value::String(s.as_str().to_string())),
            difficulty: payload
                .difficulty
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number),
        }
    }
}

/// Validated payload: trimmed text, known category, difficulty in 1..=5.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct NormalizedPayload {
    pub puzzle: String,
    pub solution: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    pub source: Category,
    pub difficulty: u8,
}

#[derive(Serialize)]
struct WireRecord<'a> {
    v: u64,
    #[serde(flatten)]
    payload: &'a NormalizedPayload,
}

impl NormalizedPayload {
    /// Apply the trim, default and clamp rules shared by encode and decode.
    pub fn from_raw(raw: RawPayload) -> Result<Self, ShareError> {
        let puzzle = required(raw.puzzle, "puzzle")?;
        let solution = required(raw.solution, "solution")?;

        let explanation = raw
            .explanation
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());

        let source = raw
            .source
            .as_ref()
            .and_then(Value::as_str)
            .and_then(Category::from_wire)
            .unwrap_or_default();

        let difficulty = coerce_difficulty(raw.difficulty.as_ref());

        Ok(Self {
            puzzle,
            solution,
            explanation,
            source,
            difficulty,
        })
    }

    /// Build the ephemeral puzzle, stamped with the current time.
    pub fn into_puzzle(self) -> Puzzle {
        let id = shared_puzzle_id(&self);
        Puzzle {
            id,
            puzzle_text: self.puzzle,
            solution: self.solution,
            explanation: self.explanation,
            category: self.source,
            difficulty: self.difficulty,
            date_added: Utc::now(),
        }
    }
}

fn required(field: Option<String>, name: &'static str) -> Result<String, ShareError> {
    field
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or(ShareError::MissingField(name))
}

/// Lenient numeric coercion, the way a loosely typed client reads a form
/// value: numbers pass through, numeric strings parse, blank strings and
/// `null` are 0, booleans 0/1, and a one-element array coerces its element.
/// Absent or non-finite results default.
fn coerce_difficulty(value: Option<&Value>) -> u8 {
    match value.and_then(numeric_value) {
        Some(n) if n.is_finite() => {
            n.round()
                .clamp(f64::from(MIN_DIFFICULTY), f64::from(MAX_DIFFICULTY)) as u8
        }
        _ => DEFAULT_DIFFICULTY,
    }
}

fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Null => Some(0.0),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => numeric_str(s),
        Value::Array(items) => match items.as_slice() {
            [] => Some(0.0),
            [item] => array_element_value(item),
            _ => None,
        },
        Value::Object(_) => None,
    }
}

/// An array element is read through its text form, so `[null]` is blank
/// and `[true]` is not a number.
fn array_element_value(item: &Value) -> Option<f64> {
    match item {
        Value::Null => Some(0.0),
        Value::Bool(_) | Value::Object(_) => None,
        other => numeric_value(other),
    }
}

fn numeric_str(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        Some(0.0)
    } else {
        s.parse::<f64>().ok()
    }
}

// ============================================================================
// Identifier derivation
// ============================================================================

/// Synthetic id for a shared puzzle. Always strictly negative.
pub fn shared_puzzle_id(payload: &NormalizedPayload) -> i64 {
    let seed = format!(
        "{}|{}|{}|{}|{}",
        payload.puzzle,
        payload.solution,
        payload.explanation.as_deref().unwrap_or(""),
        payload.source.as_str(),
        payload.difficulty
    );
    negative_id(rolling_hash(&seed))
}

fn rolling_hash(seed: &str) -> i32 {
    seed.encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)))
}

fn negative_id(hash: i32) -> i64 {
    let hash = if hash == 0 { 1 } else { hash };
    -i64::from(hash).abs()
}

// ============================================================================
// Encode / decode
// ============================================================================

/// An encoded share token, ready to be put on a URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShareLink {
    token: String,
}

impl ShareLink {
    pub fn token(&self) -> &str {
        &self.token
    }

    /// `code=<token>`, without a leading `?`
    pub fn query_string(&self) -> String {
        format!("{}={}", SHARE_PARAM, self.token)
    }
}

impl std::fmt::Display for ShareLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.query_string())
    }
}

/// Encode `payload` into a share link.
///
/// Fails only when the puzzle text or solution is blank; every other field
/// is defaulted or clamped.
pub fn encode(payload: &SharePayload) -> Result<ShareLink, ShareError> {
    encode_raw(RawPayload::from(payload))
}

/// Encode an untyped payload, e.g. one parsed from a submission form.
pub fn encode_raw(raw: RawPayload) -> Result<ShareLink, ShareError> {
    let payload = NormalizedPayload::from_raw(raw)?;
    let record = WireRecord {
        v: SHARE_FORMAT_VERSION,
        payload: &payload,
    };
    let serialized = serde_json::to_string(&record)?;

    Ok(ShareLink {
        token: URL_SAFE_NO_PAD.encode(serialized),
    })
}

/// Decode the puzzle carried by a query string such as `?code=...&x=1`.
///
/// Returns `None` when the parameter is absent or the token is unusable.
pub fn decode(query: &str) -> Option<Puzzle> {
    let token = query_param(query, SHARE_PARAM)?;
    decode_token(&token)
}

/// Decode a bare token, returning `None` on any failure.
pub fn decode_token(token: &str) -> Option<Puzzle> {
    if token.is_empty() {
        return None;
    }

    match parse_token(token) {
        Ok(payload) => Some(payload.into_puzzle()),
        Err(e) => {
            debug!("Failed to decode shared puzzle: {}", e);
            None
        }
    }
}

/// Decode a bare token into its normalized payload, reporting why it failed.
pub fn parse_token(token: &str) -> Result<NormalizedPayload, ShareError> {
    let token: String = token
        .trim()
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            c => c,
        })
        .collect();

    let bytes = LENIENT_URL_SAFE.decode(token)?;
    let serialized = String::from_utf8(bytes)?;

    let value: Value = serde_json::from_str(&serialized)?;
    if !value.is_object() {
        return Err(ShareError::NotAnObject);
    }

    let raw: RawPayload = serde_json::from_value(value)?;
    match raw.v {
        None | Some(SHARE_FORMAT_VERSION) => {}
        Some(other) => return Err(ShareError::UnsupportedVersion(other)),
    }

    NormalizedPayload::from_raw(raw)
}

/// First value of `name` in a URL query string, decoded the way
/// `URLSearchParams` does. Empty values count as absent.
fn query_param(query: &str, name: &str) -> Option<String> {
    let query = query.strip_prefix('?').unwrap_or(query);

    query
        .split('&')
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (key == name).then_some(value)
        })
        .next()
        .and_then(|value| {
            let value = value.replace('+', " ");
            urlencoding::decode(&value).ok().map(|v| v.into_owned())
        })
        .filter(|value| !value.is_empty())
}
