use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::durable::DurableStore;
use crate::error::StoreError;
use crate::media::{Comment, MediaRecord, MediaType};

/// Denormalized summary of one upload, kept in the uploader's profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileEntry {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub media_type: MediaType,
    pub upload_date: DateTime<Utc>,
    pub likes: u64,
    pub comments: Vec<Comment>,
    pub shares: u64,
    pub saved: bool,
}

impl From<&MediaRecord> for ProfileEntry {
    fn from(record: &MediaRecord) -> Self {
        Self {
            id: record.id,
            title: record.title.clone(),
            description: record.description.clone(),
            media_type: record.media_type,
            upload_date: record.upload_date,
            likes: record.likes,
            comments: record.comments.clone(),
            shares: record.shares,
            saved: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedPost {
    pub id: u64,
    pub saved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub uploads: Vec<ProfileEntry>,
    #[serde(default)]
    pub saved_posts: Vec<SavedPost>,
}

/// Per-user upload summaries and bookmarks, keyed by user id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileIndex {
    users: BTreeMap<String, UserProfile>,
}

impl ProfileIndex {
    /// Read the index. Missing or unreadable data yields an empty index.
    pub fn load(store: &dyn DurableStore, key: &str) -> Result<Self, StoreError> {
        let Some(raw) = store.get(key)? else {
            return Ok(Self::default());
        };
        match serde_json::from_str(&raw) {
            Ok(index) => Ok(index),
            Err(e) => {
                warn!(key, error = %e, "discarding unreadable profile index");
                Ok(Self::default())
            }
        }
    }

    pub fn save(&self, store: &mut dyn DurableStore, key: &str) -> Result<(), StoreError> {
        let json = serde_json::to_string(self)?;
        store.set(key, &json)
    }

    pub fn user(&self, user_id: &str) -> Option<&UserProfile> {
        self.users.get(user_id)
    }

    pub fn record_upload(&mut self, user_id: &str, entry: ProfileEntry) {
        self.users
            .entry(user_id.to_string())
            .or_default()
            .uploads
            .push(entry);
    }

    /// Flip the bookmark for `media_id`. Returns whether it is now saved.
    pub fn toggle_saved(&mut self, user_id: &str, media_id: u64, now: DateTime<Utc>) -> bool {
        let profile = self.users.entry(user_id.to_string()).or_default();
        if let Some(pos) = profile.saved_posts.iter().position(|p| p.id == media_id) {
            profile.saved_posts.remove(pos);
            false
        } else {
            profile.saved_posts.push(SavedPost {
                id: media_id,
                saved_at: now,
            });
            true
        }
    }

    pub fn is_saved(&self, user_id: &str, media_id: u64) -> bool {
        self.user(user_id)
            .is_some_and(|p| p.saved_posts.iter().any(|s| s.id == media_id))
    }
}
