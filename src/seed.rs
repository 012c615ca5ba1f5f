//! Bundled fallback dataset.
//!
//! Installed whenever a persisted slot is absent or fails validation.
//! The collections are self-consistent: every location's rating aggregate
//! is derived exactly from the seed reviews present, so the aggregate
//! invariant holds from first launch.

use crate::models::{Location, Review};

fn location(
    id: &str,
    name: &str,
    address: &str,
    category: &str,
    latitude: f64,
    longitude: f64,
    average_rating: f64,
    total_reviews: u32,
) -> Location {
    Location {
        id: id.to_string(),
        name: name.to_string(),
        address: address.to_string(),
        category: category.to_string(),
        latitude,
        longitude,
        average_rating,
        total_reviews,
        image: None,
    }
}

fn review(
    id: &str,
    location_id: &str,
    user_id: &str,
    user_name: &str,
    rating: u8,
    text: &str,
    created_at: &str,
) -> Review {
    Review {
        id: id.to_string(),
        location_id: location_id.to_string(),
        user_id: user_id.to_string(),
        user_name: user_name.to_string(),
        user_avatar: None,
        rating,
        text: text.to_string(),
        images: None,
        created_at: created_at.to_string(),
    }
}

/// Seed location collection.
pub fn locations() -> Vec<Location> {
    vec![
        location(
            "1",
            "The Daily Grind",
            "14 Market Street",
            "Cafe",
            47.6097,
            -122.3331,
            4.5,
            2,
        ),
        location(
            "2",
            "Riverside Park",
            "200 Waterfront Way",
            "Park",
            47.6205,
            -122.3493,
            5.0,
            1,
        ),
        location(
            "3",
            "Harbor View Restaurant",
            "88 Pier Avenue",
            "Restaurant",
            47.6029,
            -122.3398,
            3.5,
            2,
        ),
        location(
            "4",
            "City Museum of Art",
            "1300 First Avenue",
            "Museum",
            47.6076,
            -122.3380,
            4.0,
            1,
        ),
        location(
            "5",
            "Night Market on 5th",
            "501 Fifth Avenue",
            "Market",
            47.6112,
            -122.3343,
            0.0,
            0,
        ),
    ]
}

/// Seed review collection, most-recent-first like the live collection.
pub fn reviews() -> Vec<Review> {
    vec![
        review(
            "106",
            "3",
            "u-204",
            "Priya",
            3,
            "Slow service on a busy night, but the chowder is worth it.",
            "2025-05-20T19:42:00Z",
        ),
        review(
            "105",
            "1",
            "u-203",
            "Marcus",
            4,
            "Good espresso, gets crowded around nine.",
            "2025-05-18T08:15:00Z",
        ),
        review(
            "104",
            "4",
            "u-202",
            "Elena",
            4,
            "The modern wing alone is worth the ticket.",
            "2025-05-12T14:03:00Z",
        ),
        review(
            "103",
            "2",
            "u-201",
            "Jonas",
            5,
            "Best running loop in the city, shaded the whole way.",
            "2025-05-05T07:30:00Z",
        ),
        review(
            "102",
            "3",
            "u-202",
            "Elena",
            4,
            "Great view of the bay at sunset.",
            "2025-04-28T20:10:00Z",
        ),
        review(
            "101",
            "1",
            "u-201",
            "Jonas",
            5,
            "Hidden gem. The cardamom buns sell out early.",
            "2025-04-22T09:50:00Z",
        ),
    ]
}
