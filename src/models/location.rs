use serde::{Deserialize, Serialize};

/// A place users can discover and review.
///
/// `average_rating` and `total_reviews` are derived fields: they are
/// recomputed from the review collection on every review mutation and
/// stored unrounded. Rounding happens only at display time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: String,
    pub name: String,
    pub address: String,
    /// Free-text category tag ("Cafe", "Park", ...).
    pub category: String,
    pub latitude: f64,
    pub longitude: f64,
    pub average_rating: f64,
    pub total_reviews: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Payload for creating a location. The store assigns the id.
///
/// Name/address blank-checks are caller-side validation; the store
/// accepts the payload as given.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLocation {
    pub name: String,
    pub address: String,
    pub category: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub average_rating: f64,
    #[serde(default)]
    pub total_reviews: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl NewLocation {
    pub fn into_location(self, id: String) -> Location {
        Location {
            id,
            name: self.name,
            address: self.address,
            category: self.category,
            latitude: self.latitude,
            longitude: self.longitude,
            average_rating: self.average_rating,
            total_reviews: self.total_reviews,
            image: self.image,
        }
    }
}
