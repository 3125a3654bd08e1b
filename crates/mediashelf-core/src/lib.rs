pub mod config;
pub mod durable;
pub mod encoding;
pub mod error;
pub mod format;
pub mod id;
pub mod media;
pub mod profile;
pub mod session;
pub mod store;
pub mod view;

pub use config::StoreConfig;
pub use durable::{DurableStore, FileStore, MemoryStore};
pub use error::{Mutation, StoreError};
pub use format::{
    count_label, format_date, format_duration, format_file_size, relative_time, share_link,
    share_text,
};
pub use media::{
    Attribution, AvatarUpload, Comment, Encoding, MediaEdit, MediaRecord, MediaType, NewMedia,
};
pub use profile::{ProfileEntry, ProfileIndex, SavedPost, UserProfile};
pub use session::SessionCache;
pub use store::{Download, MediaStore, ResolvedPayload};
pub use view::{project, FilterCategory, MediaView, QueryState, SortOrder};
