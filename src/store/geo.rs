use anyhow::{bail, Context, Result};
use chrono::Utc;
use tracing::{debug, warn};

use crate::storage::{decode_plain, KeyValueStore};

const CITY_SLOT: &str = "userCity";
const COUNTRY_SLOT: &str = "userCountry";
const GEOCODED_AT_SLOT: &str = "lastGeocodedSession";

/// Re-geocode at most once per hour.
const GEOCODE_INTERVAL_MS: i64 = 3_600_000;

/// Maximum accepted length for city/country names.
const MAX_PLACE_NAME_LEN: usize = 100;

/// The user's remembered city/country and the last-geocoded stamp.
///
/// These slots hold raw strings, not JSON, so validation is the sentinel
/// check plus an integer parse for the timestamp. Geocoding itself (GPS,
/// reverse lookup) is an external collaborator; this store only remembers
/// its results and rate-limits how often it should run.
pub struct GeoStore<S: KeyValueStore> {
    store: S,
    city: Option<String>,
    country: Option<String>,
    geocoded_at_ms: Option<i64>,
}

impl<S: KeyValueStore> GeoStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            city: None,
            country: None,
            geocoded_at_ms: None,
        }
    }

    pub fn city(&self) -> Option<&str> {
        self.city.as_deref()
    }

    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    /// Load the persisted slots, purging anything corrupt. Never fatal.
    pub async fn load(&mut self) {
        self.city = self.load_plain(CITY_SLOT).await;
        self.country = self.load_plain(COUNTRY_SLOT).await;
        // A stamp in the future is clock damage, not state; reject it
        // along with everything non-numeric or non-positive.
        let now = Utc::now().timestamp_millis();
        self.geocoded_at_ms = match self.load_plain(GEOCODED_AT_SLOT).await {
            Some(raw) => match raw.parse::<i64>() {
                Ok(ms) if ms > 0 && ms <= now => Some(ms),
                _ => {
                    warn!(value = %raw, "Invalid geocode timestamp, discarding");
                    self.purge(GEOCODED_AT_SLOT).await;
                    None
                }
            },
            None => None,
        };
    }

    async fn load_plain(&self, key: &str) -> Option<String> {
        let raw = match self.store.get(key).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(slot = key, error = %e, "Failed to read preference slot");
                return None;
            }
        };
        match decode_plain(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(slot = key, error = %e, "Discarding corrupt preference slot");
                self.purge(key).await;
                None
            }
        }
    }

    async fn purge(&self, key: &str) {
        if let Err(e) = self.store.remove(key).await {
            debug!(slot = key, error = %e, "Failed to purge preference slot");
        }
    }

    /// Manually set the user's city/country. Trimmed values must be
    /// non-empty and at most 100 characters; persist-then-commit.
    pub async fn set_location(&mut self, city: &str, country: &str) -> Result<()> {
        let city = city.trim();
        let country = country.trim();
        if city.is_empty() || country.is_empty() {
            bail!("City and country cannot be empty");
        }
        if city.chars().count() > MAX_PLACE_NAME_LEN || country.chars().count() > MAX_PLACE_NAME_LEN {
            bail!("City and country names are too long (max {} characters)", MAX_PLACE_NAME_LEN);
        }

        self.store
            .set(CITY_SLOT, city)
            .await
            .context("Failed to persist city")?;
        self.store
            .set(COUNTRY_SLOT, country)
            .await
            .context("Failed to persist country")?;

        self.city = Some(city.to_string());
        self.country = Some(country.to_string());
        Ok(())
    }

    /// Whether the geocoding collaborator should run again: true when no
    /// geocode has been recorded or the last one is over an hour old.
    pub fn geocode_due(&self) -> bool {
        match self.geocoded_at_ms {
            // saturating_sub: load rejects future stamps, but a clock that
            // jumps backwards after load must not overflow here
            Some(ms) => Utc::now().timestamp_millis().saturating_sub(ms) > GEOCODE_INTERVAL_MS,
            None => true,
        }
    }

    /// Record that a geocode just completed, alongside its result.
    pub async fn record_geocode(&mut self, city: &str, country: &str) -> Result<()> {
        self.set_location(city, country).await?;
        let now = Utc::now().timestamp_millis();
        self.store
            .set(GEOCODED_AT_SLOT, &now.to_string())
            .await
            .context("Failed to persist geocode timestamp")?;
        self.geocoded_at_ms = Some(now);
        Ok(())
    }
}
