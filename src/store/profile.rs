use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use tracing::{debug, warn};

use crate::api::ProfileClient;
use crate::models::{ProfileUpdate, UserProfile};
use crate::storage::{decode_slot, KeyValueStore};

const USER_SLOT: &str = "user";

/// The signed-in user, backed by the `user` slot and mirrored to the
/// remote profile store on a best-effort basis.
///
/// An explicit injected service with an init-at-start lifecycle: construct,
/// `load`, then pass a reference to consumers.
pub struct ProfileStore<S: KeyValueStore> {
    store: S,
    user: Option<UserProfile>,
}

impl<S: KeyValueStore> ProfileStore<S> {
    pub fn new(store: S) -> Self {
        Self { store, user: None }
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    /// Load the persisted profile. A corrupt or malformed slot is purged
    /// and the store starts signed out; never fatal.
    pub async fn load(&mut self) {
        let raw = match self.store.get(USER_SLOT).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return,
            Err(e) => {
                warn!(error = %e, "Failed to read persisted user, starting signed out");
                return;
            }
        };

        match decode_slot::<UserProfile>(&raw) {
            Ok(profile) if !profile.id.trim().is_empty() => {
                debug!(user_id = %profile.id, "Restored persisted user");
                self.user = Some(profile);
            }
            Ok(_) => {
                warn!("Persisted user has no id, discarding");
                self.purge().await;
            }
            Err(e) => {
                warn!(error = %e, "Discarding invalid persisted user");
                self.purge().await;
            }
        }
    }

    /// Sign in with an email. Credential verification is delegated to the
    /// external auth provider; this layer only installs the local profile.
    pub async fn login(&mut self, email: &str) -> Result<()> {
        let name = email.split('@').next().unwrap_or(email).to_string();
        let profile = UserProfile {
            id: "1".to_string(),
            email: email.to_string(),
            name,
            avatar: None,
            bio: Some("Explorer of cities and hidden gems".to_string()),
            joined_date: now_iso(),
            hobbies: None,
            city: None,
            country: None,
            profile_photo: None,
        };
        self.install(profile).await
    }

    /// Create a fresh local account with a clock-derived id.
    pub async fn register(&mut self, email: &str, name: &str) -> Result<()> {
        let profile = UserProfile {
            id: Utc::now().timestamp_millis().to_string(),
            email: email.to_string(),
            name: name.to_string(),
            avatar: None,
            bio: Some("New to CitySync!".to_string()),
            joined_date: now_iso(),
            hobbies: None,
            city: None,
            country: None,
            profile_photo: None,
        };
        self.install(profile).await
    }

    pub async fn logout(&mut self) -> Result<()> {
        self.store
            .remove(USER_SLOT)
            .await
            .context("Failed to clear persisted user")?;
        self.user = None;
        Ok(())
    }

    /// Merge an update into the current profile, persist-then-commit.
    /// A no-op when signed out.
    pub async fn update(&mut self, update: &ProfileUpdate) -> Result<()> {
        let Some(current) = self.user.as_ref() else {
            return Ok(());
        };
        let mut updated = current.clone();
        update.apply_to(&mut updated);
        self.install(updated).await
    }

    /// Pull the remote profile and merge it over the local copy.
    ///
    /// Any failure (network, decode, persistence) keeps the local copy and
    /// is logged only; profile sync must never take down startup.
    pub async fn sync_remote(&mut self, client: &ProfileClient) {
        if self.user.is_none() {
            return;
        }
        match client.get_profile().await {
            Ok(Some(remote)) => {
                let update = remote.into_update();
                if let Err(e) = self.update(&update).await {
                    warn!(error = %e, "Failed to persist remote profile locally");
                }
            }
            Ok(None) => {
                debug!("No remote profile document, keeping local copy");
            }
            Err(e) => {
                warn!(error = %e, "Remote profile fetch failed, keeping local copy");
            }
        }
    }

    /// Push the current profile's fields to the remote profile store.
    /// A no-op when signed out (nothing to forward, mirroring `update`);
    /// errors propagate and user-visible messaging is the caller's concern.
    pub async fn push_remote(&self, client: &ProfileClient) -> Result<()> {
        let Some(user) = self.user.as_ref() else {
            return Ok(());
        };
        client.update_profile(&user.to_update()).await
    }

    async fn install(&mut self, profile: UserProfile) -> Result<()> {
        let json = serde_json::to_string(&profile).context("Failed to serialize user profile")?;
        self.store
            .set(USER_SLOT, &json)
            .await
            .context("Failed to persist user profile")?;
        self.user = Some(profile);
        Ok(())
    }

    async fn purge(&self) {
        if let Err(e) = self.store.remove(USER_SLOT).await {
            debug!(error = %e, "Failed to purge rejected user slot");
        }
    }
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
