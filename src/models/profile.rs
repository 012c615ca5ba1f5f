use serde::{Deserialize, Serialize};

/// The signed-in user's profile, persisted in the `user` slot and mirrored
/// to the remote profile store when reachable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    pub joined_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hobbies: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_photo: Option<String>,
}

impl UserProfile {
    /// The profile's shareable fields as an upsert payload for the remote
    /// store. Unset optional fields stay unset rather than overwriting the
    /// remote document with empty values.
    pub fn to_update(&self) -> ProfileUpdate {
        ProfileUpdate {
            name: Some(self.name.clone()),
            bio: self.bio.clone(),
            hobbies: self.hobbies.clone(),
            city: self.city.clone(),
            country: self.country.clone(),
            profile_photo: self.profile_photo.clone(),
        }
    }
}

/// Partial profile update. Only set fields are applied; the remote store
/// treats this as an upsert of the present fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hobbies: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_photo: Option<String>,
}

impl ProfileUpdate {
    /// Apply the set fields on top of an existing profile.
    pub fn apply_to(&self, profile: &mut UserProfile) {
        if let Some(ref name) = self.name {
            profile.name = name.clone();
        }
        if let Some(ref bio) = self.bio {
            profile.bio = Some(bio.clone());
        }
        if let Some(ref hobbies) = self.hobbies {
            profile.hobbies = Some(hobbies.clone());
        }
        if let Some(ref city) = self.city {
            profile.city = Some(city.clone());
        }
        if let Some(ref country) = self.country {
            profile.country = Some(country.clone());
        }
        if let Some(ref photo) = self.profile_photo {
            profile.profile_photo = Some(photo.clone());
        }
    }
}

/// Profile document as returned by the remote store. All fields optional:
/// the document is free-form and may predate any given client build.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteProfile {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub hobbies: Option<Vec<String>>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub profile_photo: Option<String>,
    pub updated_at: Option<String>,
}

impl RemoteProfile {
    /// Convert to an update payload so remote fields can be merged through
    /// the same code path as local edits.
    pub fn into_update(self) -> ProfileUpdate {
        ProfileUpdate {
            name: self.name,
            bio: self.bio,
            hobbies: self.hobbies,
            city: self.city,
            country: self.country,
            profile_photo: self.profile_photo,
        }
    }
}
