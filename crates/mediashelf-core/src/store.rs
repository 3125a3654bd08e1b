use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::config::StoreConfig;
use crate::durable::DurableStore;
use crate::encoding::{from_data_url, to_data_url};
use crate::error::{Mutation, StoreError};
use crate::format::format_file_size;
use crate::id::IdGenerator;
use crate::media::{Attribution, Comment, Encoding, MediaEdit, MediaRecord, MediaType, NewMedia};
use crate::profile::{ProfileEntry, ProfileIndex};
use crate::session::SessionCache;

/// Result of looking up a record's bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedPayload {
    Inline {
        mime: String,
        bytes: Vec<u8>,
    },
    Session {
        mime: String,
        reference: String,
        bytes: Arc<[u8]>,
    },
    /// Nothing to show; render a placeholder.
    Unavailable,
}

impl ResolvedPayload {
    pub fn is_available(&self) -> bool {
        !matches!(self, ResolvedPayload::Unavailable)
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            ResolvedPayload::Inline { bytes, .. } => Some(&bytes[..]),
            ResolvedPayload::Session { bytes, .. } => Some(&bytes[..]),
            ResolvedPayload::Unavailable => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Counter {
    Views,
    Likes,
    Shares,
}

/// A payload paired with the name it was uploaded under.
#[derive(Debug, Clone)]
pub struct Download {
    pub file_name: String,
    pub payload: ResolvedPayload,
}

/// The authoritative media collection for one profile.
///
/// Loaded once from the durable store; afterwards the in-memory records are
/// the source of truth and every mutation is written through.
#[derive(Debug)]
pub struct MediaStore<S: DurableStore> {
    config: StoreConfig,
    durable: S,
    records: Vec<MediaRecord>,
    session: SessionCache,
    ids: IdGenerator,
}

impl<S: DurableStore> MediaStore<S> {
    /// Read the collection from `durable`. Missing or corrupt data yields an
    /// empty collection. External-reference records come back without
    /// payloads since the session cache starts empty.
    pub fn load(durable: S, config: StoreConfig) -> Self {
        let records = match durable.get(&config.collection_key) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<MediaRecord>>(&raw) {
                Ok(records) => records,
                Err(e) => {
                    warn!(key = %config.collection_key, error = %e, "discarding unreadable media collection");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(key = %config.collection_key, error = %e, "could not read media collection");
                Vec::new()
            }
        };

        let mut unique: Vec<MediaRecord> = Vec::with_capacity(records.len());
        for record in records {
            if unique.iter().any(|r| r.id == record.id) {
                warn!(id = record.id, "dropping record with duplicate id");
                continue;
            }
            unique.push(record);
        }

        let mut ids = IdGenerator::new();
        if let Some(max) = unique.iter().map(|r| r.id).max() {
            ids.observe(max);
        }

        let unavailable = unique
            .iter()
            .filter(|r| r.encoding == Encoding::ExternalReference)
            .count();
        info!(
            records = unique.len(),
            unavailable, "loaded media collection"
        );

        Self {
            config,
            durable,
            records: unique,
            session: SessionCache::new(),
            ids,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn records(&self) -> &[MediaRecord] {
        &self.records
    }

    pub fn get(&self, id: u64) -> Option<&MediaRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn session(&self) -> &SessionCache {
        &self.session
    }

    pub fn durable(&self) -> &S {
        &self.durable
    }

    pub fn into_durable(self) -> S {
        self.durable
    }

    fn find_mut(&mut self, id: u64) -> Result<&mut MediaRecord, StoreError> {
        self.records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound(id))
    }

    fn commit<T>(&mut self, value: T) -> Mutation<T> {
        let persisted = self.persist();
        Mutation::new(value, persisted)
    }

    /// Write the whole collection to the durable store.
    ///
    /// On failure the in-memory collection is kept as is.
    pub fn persist(&mut self) -> Result<(), StoreError> {
        let json = serde_json::to_string(&self.records)?;
        let result = self.durable.set(&self.config.collection_key, &json);
        if let Err(e) = &result {
            warn!(records = self.records.len(), error = %e, "failed to persist media collection");
        }
        result
    }

    /// Validate and store a new upload.
    pub fn add(&mut self, candidate: NewMedia) -> Result<Mutation<MediaRecord>, StoreError> {
        let title = candidate.title.trim();
        if title.is_empty() {
            return Err(StoreError::validation("title must not be empty"));
        }
        let size = candidate.file_size();
        let max = self.config.max_bytes_for(candidate.media_type);
        if size > max {
            return Err(StoreError::validation(format!(
                "{} file is too large ({}); maximum size is {}",
                candidate.media_type.as_str(),
                format_file_size(size),
                format_file_size(max)
            )));
        }

        let id = self.ids.next(|c| self.records.iter().any(|r| r.id == c));
        let duration = match candidate.media_type {
            MediaType::Video => candidate
                .duration
                .filter(|d| d.is_finite() && *d > 0.0)
                .unwrap_or(0.0),
            MediaType::Image => 0.0,
        };

        // Images are always inline; only large videos stay session-only.
        let external = candidate.media_type == MediaType::Video
            && size >= self.config.inline_threshold_bytes;
        let (encoding, payload) = if external {
            self.session
                .insert(id, candidate.file_type.clone(), candidate.bytes);
            (Encoding::ExternalReference, None)
        } else {
            let url = to_data_url(&candidate.file_type, &candidate.bytes);
            (Encoding::Inline, Some(url))
        };

        let attribution = candidate.attribution;
        let record = MediaRecord {
            id,
            title: title.to_string(),
            description: candidate.description.trim().to_string(),
            media_type: candidate.media_type,
            upload_date: Utc::now(),
            file_name: candidate.file_name,
            file_size: size,
            file_type: candidate.file_type,
            duration,
            favorite: false,
            views: 0,
            likes: 0,
            shares: 0,
            comments: Vec::new(),
            encoding,
            payload,
            avatar_url: attribution.avatar(),
            username: attribution.display_name(),
            uploaded_by: attribution.uploaded_by(),
        };

        self.records.push(record.clone());
        let mutation = self.commit(record);
        self.sync_profile(&mutation.value, &attribution);
        Ok(mutation)
    }

    /// Append the upload summary to the uploader's profile. Failures are
    /// logged and never reach the caller.
    fn sync_profile(&mut self, record: &MediaRecord, attribution: &Attribution) {
        let Some(user_id) = attribution.user_id.as_deref() else {
            return;
        };
        let key = self.config.profile_key.clone();
        let result = ProfileIndex::load(&self.durable, &key).and_then(|mut index| {
            index.record_upload(user_id, ProfileEntry::from(record));
            index.save(&mut self.durable, &key)
        });
        if let Err(e) = result {
            warn!(id = record.id, user_id, error = %e, "failed to update profile index");
        }
    }

    pub fn edit(&mut self, id: u64, edit: MediaEdit) -> Result<Mutation<MediaRecord>, StoreError> {
        let max_avatar = self.config.max_avatar_bytes;
        let record = self.find_mut(id)?;
        let title = edit.title.trim();
        if title.is_empty() {
            return Err(StoreError::validation("title must not be empty"));
        }
        if let Some(avatar) = &edit.avatar {
            let size = avatar.bytes.len() as u64;
            if size > max_avatar {
                return Err(StoreError::validation(format!(
                    "avatar is too large ({}); maximum size is {}",
                    format_file_size(size),
                    format_file_size(max_avatar)
                )));
            }
        }

        record.title = title.to_string();
        record.description = edit.description.trim().to_string();
        if let Some(avatar) = edit.avatar {
            record.avatar_url = to_data_url(&avatar.mime, &avatar.bytes);
        }
        let updated = record.clone();
        Ok(self.commit(updated))
    }

    /// Flip the favorite flag; the value is the new state.
    pub fn toggle_favorite(&mut self, id: u64) -> Result<Mutation<bool>, StoreError> {
        let record = self.find_mut(id)?;
        record.favorite = !record.favorite;
        let favorite = record.favorite;
        Ok(self.commit(favorite))
    }

    /// Set the favorite flag on every known id; the value is how many matched.
    pub fn set_favorite_many(&mut self, ids: &[u64], favorite: bool) -> Mutation<usize> {
        let mut matched = 0;
        for record in self.records.iter_mut().filter(|r| ids.contains(&r.id)) {
            record.favorite = favorite;
            matched += 1;
        }
        self.commit(matched)
    }

    fn bump(&mut self, id: u64, counter: Counter) -> Result<Mutation<u64>, StoreError> {
        let record = self.find_mut(id)?;
        let value = match counter {
            Counter::Views => &mut record.views,
            Counter::Likes => &mut record.likes,
            Counter::Shares => &mut record.shares,
        };
        *value = value.saturating_add(1);
        let count = *value;
        Ok(self.commit(count))
    }

    pub fn increment_views(&mut self, id: u64) -> Result<Mutation<u64>, StoreError> {
        self.bump(id, Counter::Views)
    }

    pub fn increment_likes(&mut self, id: u64) -> Result<Mutation<u64>, StoreError> {
        self.bump(id, Counter::Likes)
    }

    pub fn increment_shares(&mut self, id: u64) -> Result<Mutation<u64>, StoreError> {
        self.bump(id, Counter::Shares)
    }

    pub fn append_comment(
        &mut self,
        id: u64,
        text: &str,
        author: &str,
    ) -> Result<Mutation<Comment>, StoreError> {
        let text = text.trim();
        if !self.records.iter().any(|r| r.id == id) {
            return Err(StoreError::NotFound(id));
        }
        if text.is_empty() {
            return Err(StoreError::validation("comment must not be empty"));
        }

        let comment = Comment {
            id: self.ids.next(|_| false),
            text: text.to_string(),
            author: author.to_string(),
            timestamp: Utc::now(),
        };
        self.find_mut(id)?.comments.push(comment.clone());
        Ok(self.commit(comment))
    }

    /// Delete one record and release its session payload. Unknown ids are a no-op.
    pub fn remove(&mut self, id: u64) -> Mutation<bool> {
        self.session.release(id);
        let before = self.records.len();
        self.records.retain(|r| r.id != id);
        if self.records.len() == before {
            return Mutation::new(false, Ok(()));
        }
        self.commit(true)
    }

    /// Delete several records with a single write; the value is how many were removed.
    pub fn remove_many(&mut self, ids: &[u64]) -> Mutation<usize> {
        for &id in ids {
            self.session.release(id);
        }
        let before = self.records.len();
        self.records.retain(|r| !ids.contains(&r.id));
        let removed = before - self.records.len();
        if removed == 0 {
            return Mutation::new(0, Ok(()));
        }
        self.commit(removed)
    }

    /// Bytes for `id`, or [`ResolvedPayload::Unavailable`].
    pub fn resolve_payload(&mut self, id: u64) -> ResolvedPayload {
        let Some(record) = self.records.iter().find(|r| r.id == id) else {
            return ResolvedPayload::Unavailable;
        };
        match record.encoding {
            Encoding::Inline => {
                let decoded = record.payload.as_deref().and_then(from_data_url);
                match decoded {
                    Some(data) => ResolvedPayload::Inline {
                        mime: data.mime,
                        bytes: data.bytes,
                    },
                    None => {
                        if record.payload.is_some() {
                            warn!(id, "inline payload could not be decoded");
                        }
                        ResolvedPayload::Unavailable
                    }
                }
            }
            Encoding::ExternalReference => {
                let Some(bytes) = self.session.bytes(id) else {
                    return ResolvedPayload::Unavailable;
                };
                let mime = self.session.mime(id).unwrap_or_default().to_string();
                match self.session.reference(id) {
                    Some(reference) => ResolvedPayload::Session {
                        mime,
                        reference,
                        bytes,
                    },
                    None => ResolvedPayload::Unavailable,
                }
            }
        }
    }

    pub fn is_available(&self, id: u64) -> bool {
        match self.get(id) {
            Some(record) => match record.encoding {
                Encoding::Inline => record
                    .payload
                    .as_deref()
                    .and_then(from_data_url)
                    .is_some(),
                Encoding::ExternalReference => self.session.contains(id),
            },
            None => false,
        }
    }

    pub fn download(&mut self, id: u64) -> Download {
        let file_name = self
            .get(id)
            .map(|r| r.file_name.clone())
            .unwrap_or_default();
        Download {
            file_name,
            payload: self.resolve_payload(id),
        }
    }

    /// Toggle `user_id`'s bookmark on a media item. Returns whether it is now saved.
    pub fn toggle_saved(&mut self, user_id: &str, media_id: u64) -> Result<bool, StoreError> {
        if self.get(media_id).is_none() {
            return Err(StoreError::NotFound(media_id));
        }
        let key = self.config.profile_key.clone();
        let mut index = ProfileIndex::load(&self.durable, &key)?;
        let saved = index.toggle_saved(user_id, media_id, Utc::now());
        index.save(&mut self.durable, &key)?;
        Ok(saved)
    }

    /// The profile index as currently stored.
    pub fn profile_index(&self) -> Result<ProfileIndex, StoreError> {
        ProfileIndex::load(&self.durable, &self.config.profile_key)
    }
}
