use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::media::MediaType;

const MIB: u64 = 1024 * 1024;

fn default_max_video_bytes() -> u64 {
    100 * MIB
}

fn default_max_image_bytes() -> u64 {
    10 * MIB
}

fn default_inline_threshold_bytes() -> u64 {
    10 * MIB
}

fn default_max_avatar_bytes() -> u64 {
    5 * MIB
}

fn default_quota_bytes() -> u64 {
    5 * MIB
}

fn default_collection_key() -> String {
    "media_collection".to_string()
}

fn default_profile_key() -> String {
    "user_profile_index".to_string()
}

/// Size limits and storage keys for a [`MediaStore`](crate::MediaStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_max_video_bytes")]
    pub max_video_bytes: u64,
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: u64,
    /// Payloads strictly below this size are embedded in the durable record.
    #[serde(default = "default_inline_threshold_bytes")]
    pub inline_threshold_bytes: u64,
    #[serde(default = "default_max_avatar_bytes")]
    pub max_avatar_bytes: u64,
    /// Total capacity of the durable store across all keys.
    #[serde(default = "default_quota_bytes")]
    pub quota_bytes: u64,
    #[serde(default = "default_collection_key")]
    pub collection_key: String,
    #[serde(default = "default_profile_key")]
    pub profile_key: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_video_bytes: default_max_video_bytes(),
            max_image_bytes: default_max_image_bytes(),
            inline_threshold_bytes: default_inline_threshold_bytes(),
            max_avatar_bytes: default_max_avatar_bytes(),
            quota_bytes: default_quota_bytes(),
            collection_key: default_collection_key(),
            profile_key: default_profile_key(),
        }
    }
}

impl StoreConfig {
    /// Load a config file. Fields missing from the file keep their defaults.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn with_quota(mut self, quota_bytes: u64) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    /// Upload size limit for the given media type.
    pub fn max_bytes_for(&self, media_type: MediaType) -> u64 {
        match media_type {
            MediaType::Video => self.max_video_bytes,
            MediaType::Image => self.max_image_bytes,
        }
    }
}
