use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// A user review of a location. Immutable once created.
///
/// `created_at` is an ISO-8601 string rather than a `DateTime` so that
/// snapshots written by older builds (which stored whatever the device
/// produced) round-trip byte-for-byte. Use [`Review::created_at_parsed`]
/// for timestamp comparisons.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub location_id: String,
    pub user_id: String,
    pub user_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_avatar: Option<String>,
    /// 1-5 in well-formed data. Range enforcement is caller-side; the
    /// store aggregates whatever it is handed.
    pub rating: u8,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    pub created_at: String,
}

impl Review {
    /// Parse `created_at` as a timestamp, tolerating any ISO-8601 offset.
    /// Returns `None` for unparseable stamps; callers decide how those sort.
    pub fn created_at_parsed(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.created_at).ok()
    }
}

/// Payload for creating a review. The store assigns id, user identity,
/// and the creation timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub location_id: String,
    pub rating: u8,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}
