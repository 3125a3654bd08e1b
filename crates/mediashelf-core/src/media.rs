use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::encoding;

const DEFAULT_AVATAR_SVG: &str = concat!(
    r#"<svg width="40" height="40" viewBox="0 0 40 40" fill="none" xmlns="http://www.w3.org/2000/svg">"#,
    r##"<circle cx="20" cy="20" r="20" fill="#6D5BD0"/>"##,
    r#"<circle cx="20" cy="15" r="6" fill="white" fill-opacity="0.8"/>"#,
    r#"<path d="M30 30C30 25.58 26.42 22 22 22H12C7.58 22 4 25.58 4 30H30Z" fill="white" fill-opacity="0.8"/>"#,
    "</svg>"
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Video,
    Image,
}

impl MediaType {
    /// Classify a MIME type such as `video/mp4`. Anything not video or image is rejected.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.split('/').next()? {
            "video" => Some(MediaType::Video),
            "image" => Some(MediaType::Image),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Video => "video",
            MediaType::Image => "image",
        }
    }
}

/// Where a record's payload lives. Chosen once at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Encoding {
    /// Payload is embedded in the durable record and survives restarts.
    Inline,
    /// Payload is held only by the session cache.
    ExternalReference,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    pub text: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRecord {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub media_type: MediaType,
    pub upload_date: DateTime<Utc>,
    pub file_name: String,
    pub file_size: u64,
    pub file_type: String,
    /// Seconds; 0 when unknown or for images.
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub shares: u64,
    #[serde(default)]
    pub comments: Vec<Comment>,
    pub encoding: Encoding,
    /// Data URL for inline records, always `None` for external references.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    pub avatar_url: String,
    pub username: String,
    pub uploaded_by: String,
}

impl MediaRecord {
    /// Case-insensitive substring match against title or description.
    /// `needle` must already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        needle.is_empty()
            || self.title.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
    }
}

/// The user on whose behalf media is uploaded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribution {
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}

impl Attribution {
    pub fn user(user_id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            username: Some(username.into()),
            avatar_url: None,
        }
    }

    pub fn uploaded_by(&self) -> String {
        self.user_id.clone().unwrap_or_else(|| "unknown".to_string())
    }

    pub fn display_name(&self) -> String {
        self.username
            .clone()
            .unwrap_or_else(|| "Unknown User".to_string())
    }

    pub fn avatar(&self) -> String {
        self.avatar_url.clone().unwrap_or_else(default_avatar_url)
    }

    /// Name used for comments left by this user.
    pub fn comment_author(&self) -> String {
        self.username
            .clone()
            .unwrap_or_else(|| "Anonymous".to_string())
    }
}

pub fn default_avatar_url() -> String {
    encoding::to_data_url("image/svg+xml", DEFAULT_AVATAR_SVG.as_bytes())
}

/// An upload whose bytes have been fully read by the caller.
#[derive(Debug, Clone)]
pub struct NewMedia {
    pub title: String,
    pub description: String,
    pub media_type: MediaType,
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub file_type: String,
    pub duration: Option<f64>,
    pub attribution: Attribution,
}

impl NewMedia {
    pub fn file_size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

#[derive(Debug, Clone)]
pub struct AvatarUpload {
    pub bytes: Vec<u8>,
    pub mime: String,
}

#[derive(Debug, Clone)]
pub struct MediaEdit {
    pub title: String,
    pub description: String,
    pub avatar: Option<AvatarUpload>,
}
