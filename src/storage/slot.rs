use serde::de::DeserializeOwned;
use thiserror::Error;

/// Why a persisted slot value was rejected.
#[derive(Error, Debug)]
pub enum SlotError {
    /// The raw value matches a known corruption marker: empty or
    /// whitespace-only, the literal strings `undefined`/`null`, or an
    /// object-stringification artifact (`[object Object]` and friends).
    /// Older builds wrote these when serialization went wrong upstream.
    #[error("corrupted sentinel value: {0}")]
    CorruptSentinel(String),

    #[error("failed to parse slot value: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Maximum prefix of a rejected value carried in the error, to keep log
/// lines bounded.
const SENTINEL_PREVIEW_LEN: usize = 50;

fn preview(raw: &str) -> String {
    let end = raw
        .char_indices()
        .nth(SENTINEL_PREVIEW_LEN)
        .map(|(i, _)| i)
        .unwrap_or(raw.len());
    raw[..end].to_string()
}

/// Check a raw stored string against the known corruption markers.
pub fn is_corrupt_sentinel(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty()
        || trimmed == "undefined"
        || trimmed == "null"
        || trimmed.starts_with("[object")
        || trimmed.starts_with("object Object")
}

/// Strictly decode a persisted slot value against the expected schema.
///
/// Sentinel values are rejected before parsing; everything else must
/// deserialize as `T` exactly (a non-array value under a collection slot
/// fails here). Callers purge the slot and fall back to seed data on `Err`.
pub fn decode_slot<T: DeserializeOwned>(raw: &str) -> Result<T, SlotError> {
    if is_corrupt_sentinel(raw) {
        return Err(SlotError::CorruptSentinel(preview(raw)));
    }
    Ok(serde_json::from_str(raw)?)
}

/// Decode a plain-string slot (city/country style values stored verbatim,
/// not as JSON). Only the sentinel check applies.
pub fn decode_plain(raw: &str) -> Result<String, SlotError> {
    if is_corrupt_sentinel(raw) {
        return Err(SlotError::CorruptSentinel(preview(raw)));
    }
    Ok(raw.trim().to_string())
}
