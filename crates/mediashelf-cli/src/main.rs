use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use mediashelf_core::{
    count_label, format_date, format_duration, format_file_size, relative_time, share_link,
    share_text, Attribution, AvatarUpload, FileStore, FilterCategory, MediaEdit, MediaStore,
    MediaType, MediaView, Mutation, NewMedia, SortOrder, StoreConfig,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "mediashelf", version, about = "Local media gallery - upload, browse and curate videos and images")]
struct Cli {
    /// Directory holding the durable store
    #[arg(long, default_value = ".mediashelf")]
    data_dir: PathBuf,

    /// JSON config file with size limits and storage keys
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the storage capacity in bytes
    #[arg(long)]
    quota: Option<u64>,

    /// Id of the acting user
    #[arg(long)]
    user: Option<String>,

    /// Display name of the acting user
    #[arg(long)]
    username: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload a video or image file
    Add {
        file: PathBuf,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Video length in seconds
        #[arg(long)]
        duration: Option<f64>,
    },
    /// List media, newest first by default
    List {
        #[arg(long, default_value = "")]
        search: String,
        /// Only show favorites
        #[arg(long)]
        favorites: bool,
        /// newest, oldest, title or favorites
        #[arg(long, default_value = "newest")]
        sort: SortOrder,
    },
    /// Show details for one item
    Show { id: u64 },
    /// Change title, description or avatar
    Edit {
        id: u64,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        avatar: Option<PathBuf>,
    },
    /// Toggle the favorite flag
    Favorite { id: u64 },
    /// Mark several items as favorites (or clear with --off)
    FavoriteMany {
        #[arg(required = true)]
        ids: Vec<u64>,
        #[arg(long)]
        off: bool,
    },
    /// Record a view
    View { id: u64 },
    Like { id: u64 },
    /// Record a share and print the share text and permalink
    Share {
        id: u64,
        /// Base URL the permalink points at
        #[arg(long, default_value = "http://localhost:8080")]
        origin: String,
    },
    Comment { id: u64, text: String },
    /// Bookmark an item for the acting user (toggle)
    Save { id: u64 },
    /// Delete one or more items
    Remove {
        #[arg(required = true)]
        ids: Vec<u64>,
    },
    /// Write an item's payload to a file
    Export {
        id: u64,
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn report<T>(mutation: &Mutation<T>) {
    if let Err(e) = &mutation.persisted {
        if e.is_quota() {
            eprintln!("warning: storage full, this change will be lost on exit. Delete some media to free space.");
        } else {
            eprintln!("warning: change kept for this session but not saved: {}", e);
        }
    }
}

fn guess_mime(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
        .to_string()
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => StoreConfig::load(path)
            .with_context(|| format!("failed to read config {}", path.display()))?,
        None => StoreConfig::default(),
    };
    if let Some(quota) = cli.quota {
        config = config.with_quota(quota);
    }

    tracing::debug!(data_dir = %cli.data_dir.display(), quota = config.quota_bytes, "opening store");
    let durable = FileStore::open(&cli.data_dir, config.quota_bytes)
        .with_context(|| format!("failed to open store at {}", cli.data_dir.display()))?;
    let mut store = MediaStore::load(durable, config);

    let attribution = Attribution {
        user_id: cli.user.clone(),
        username: cli.username.clone(),
        avatar_url: None,
    };

    match cli.command {
        Command::Add {
            file,
            title,
            description,
            duration,
        } => {
            let file_type = guess_mime(&file);
            let Some(media_type) = MediaType::from_mime(&file_type) else {
                bail!("{} is not a video or image ({})", file.display(), file_type);
            };
            let bytes = std::fs::read(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let mutation = store.add(NewMedia {
                title,
                description,
                media_type,
                bytes,
                file_name: file_name(&file),
                file_type,
                duration,
                attribution,
            })?;
            report(&mutation);
            let record = &mutation.value;
            eprintln!(
                "Added {} {} \"{}\" ({})",
                record.media_type.as_str(),
                record.id,
                record.title,
                format_file_size(record.file_size)
            );
        }
        Command::List {
            search,
            favorites,
            sort,
        } => {
            let mut view = MediaView::new();
            view.set_search(search);
            view.set_sort(sort);
            if favorites {
                view.set_filter(FilterCategory::Favorites);
            }
            let now = chrono::Utc::now();
            let items = view.project(store.records());
            println!("{}", count_label(items.len()));
            for record in items {
                let length = match record.media_type {
                    MediaType::Video => format_duration(record.duration),
                    MediaType::Image => format_file_size(record.file_size),
                };
                println!(
                    "{:>14}  {}  {:<5}  {:<32}  {:>9}  {:<16}  {} views, {} likes, {} comments{}",
                    record.id,
                    if record.favorite { '*' } else { ' ' },
                    record.media_type.as_str(),
                    record.title,
                    length,
                    relative_time(&record.upload_date, &now),
                    record.views,
                    record.likes,
                    record.comments.len(),
                    if store.is_available(record.id) { "" } else { "  [unavailable]" }
                );
            }
        }
        Command::Show { id } => {
            let Some(record) = store.get(id) else {
                bail!("media {} not found", id);
            };
            println!("{} ({})", record.title, record.media_type.as_str());
            println!("  id:          {}", record.id);
            println!(
                "  description: {}",
                if record.description.is_empty() {
                    "No description provided."
                } else {
                    record.description.as_str()
                }
            );
            println!("  uploaded:    {} by {}", format_date(&record.upload_date), record.username);
            println!(
                "  file:        {} ({}, {})",
                record.file_name,
                record.file_type,
                format_file_size(record.file_size)
            );
            if record.media_type == MediaType::Video {
                println!("  duration:    {}", format_duration(record.duration));
            }
            println!(
                "  stats:       {} views, {} likes, {} shares",
                record.views, record.likes, record.shares
            );
            println!("  favorite:    {}", if record.favorite { "yes" } else { "no" });
            println!(
                "  available:   {}",
                if store.is_available(id) { "yes" } else { "no (session-only payload)" }
            );
            for comment in &record.comments {
                println!("  - {}: {}", comment.author, comment.text);
            }
        }
        Command::Edit {
            id,
            title,
            description,
            avatar,
        } => {
            let avatar = match avatar {
                Some(path) => Some(AvatarUpload {
                    bytes: std::fs::read(&path)
                        .with_context(|| format!("failed to read {}", path.display()))?,
                    mime: guess_mime(&path),
                }),
                None => None,
            };
            let mutation = store.edit(
                id,
                MediaEdit {
                    title,
                    description,
                    avatar,
                },
            )?;
            report(&mutation);
            eprintln!("Updated {}", id);
        }
        Command::Favorite { id } => {
            let mutation = store.toggle_favorite(id)?;
            report(&mutation);
            if mutation.value {
                eprintln!("Added to favorites!");
            } else {
                eprintln!("Removed from favorites!");
            }
        }
        Command::FavoriteMany { ids, off } => {
            let mutation = store.set_favorite_many(&ids, !off);
            report(&mutation);
            eprintln!("Updated {} item(s)", mutation.value);
        }
        Command::View { id } => {
            let mutation = store.increment_views(id)?;
            report(&mutation);
            println!("{} views", mutation.value);
        }
        Command::Like { id } => {
            let mutation = store.increment_likes(id)?;
            report(&mutation);
            println!("{} likes", mutation.value);
        }
        Command::Share { id, origin } => {
            let mutation = store.increment_shares(id)?;
            report(&mutation);
            if let Some(record) = store.get(id) {
                println!("{}", share_text(record));
                println!("{}", share_link(&origin, id));
            }
        }
        Command::Comment { id, text } => {
            let mutation = store.append_comment(id, &text, &attribution.comment_author())?;
            report(&mutation);
            eprintln!("Comment added");
        }
        Command::Save { id } => {
            let Some(user_id) = attribution.user_id.as_deref() else {
                bail!("sign in with --user to save posts");
            };
            if store.toggle_saved(user_id, id)? {
                eprintln!("Saved {}", id);
            } else {
                eprintln!("Removed {} from saved", id);
            }
        }
        Command::Remove { ids } => {
            let mutation = store.remove_many(&ids);
            report(&mutation);
            eprintln!("Deleted {} item(s)", mutation.value);
        }
        Command::Export { id, output } => {
            let download = store.download(id);
            let Some(bytes) = download.payload.bytes() else {
                bail!("media {} is not available for download", id);
            };
            std::fs::write(&output, bytes)
                .with_context(|| format!("failed to write {}", output.display()))?;
            eprintln!("Wrote {} ({})", output.display(), download.file_name);
        }
    }

    Ok(())
}
