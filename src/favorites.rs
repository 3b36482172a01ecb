//! Persistent favorites list with change notification.
//!
//! The list is stored as one JSON string under [`FAVORITES_KEY`] in a
//! key-value [`PreferenceStore`]. Every mutation publishes the full list to
//! subscribers through a `watch` channel.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use tokio::sync::{watch, Mutex};
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, warn};

use crate::models::{dedup_by, ContentCategory, MediaType, Movie};

pub const FAVORITES_KEY: &str = "favorites";

#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: String) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Preferences kept in a single JSON object file.
#[derive(Debug)]
pub struct FilePreferences {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FilePreferences {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<HashMap<String, String>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", self.path.display()))
            }
        };
        if raw.trim().is_empty() {
            return Ok(HashMap::new());
        }
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", self.path.display()))
    }

    /// Existing keys are kept when the file is readable; a corrupt file is
    /// replaced.
    async fn read_for_update(&self) -> HashMap<String, String> {
        self.read_all().await.unwrap_or_else(|e| {
            warn!("Discarding unreadable preferences file: {:#}", e);
            HashMap::new()
        })
    }

    async fn write_all(&self, values: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let body = serde_json::to_string_pretty(values).context("serializing preferences")?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, body)
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl PreferenceStore for FilePreferences {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut values = self.read_for_update().await;
        values.insert(key.to_string(), value);
        self.write_all(&values).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut values = self.read_for_update().await;
        if values.remove(key).is_none() {
            return Ok(());
        }
        self.write_all(&values).await
    }
}

/// Non-durable store, used when no favorites file is configured and in tests.
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: StdMutex<HashMap<String, String>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(key: &str, value: &str) -> Self {
        let store = Self::default();
        store
            .values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        store
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }
}

#[async_trait]
impl PreferenceStore for MemoryPreferences {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

fn default_media_type() -> String {
    MediaType::Movie.as_str().to_string()
}

fn default_category() -> String {
    ContentCategory::Film.as_str().to_string()
}

/// On-disk record. Enums are kept as strings so older or newer files still
/// decode; absent fields take defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredMovie {
    id: i32,
    #[serde(default)]
    title: String,
    #[serde(default)]
    overview: String,
    #[serde(default)]
    poster_url: Option<String>,
    #[serde(default)]
    backdrop_url: Option<String>,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    vote_average: f64,
    #[serde(default = "default_media_type")]
    media_type: String,
    #[serde(default = "default_category")]
    category: String,
    #[serde(default)]
    is_from_globo: bool,
}

impl StoredMovie {
    fn from_movie(movie: &Movie) -> Self {
        Self {
            id: movie.id,
            title: movie.title.clone(),
            overview: movie.overview.clone(),
            poster_url: movie.poster_url.clone(),
            backdrop_url: movie.backdrop_url.clone(),
            release_date: movie.release_date.clone(),
            vote_average: movie.vote_average,
            media_type: movie.media_type.as_str().to_string(),
            category: movie.category.as_str().to_string(),
            is_from_globo: movie.is_from_globo,
        }
    }

    fn into_movie(self) -> Result<Movie> {
        Ok(Movie {
            id: self.id,
            title: self.title,
            overview: self.overview,
            poster_url: self.poster_url,
            backdrop_url: self.backdrop_url,
            release_date: self.release_date,
            vote_average: self.vote_average,
            media_type: self.media_type.parse()?,
            category: self.category.parse()?,
            is_from_globo: self.is_from_globo,
        })
    }
}

fn decode_favorites(raw: &str) -> Result<Vec<Movie>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    let stored: Vec<StoredMovie> =
        serde_json::from_str(raw).context("decoding stored favorites")?;
    stored.into_iter().map(StoredMovie::into_movie).collect()
}

fn encode_favorites(movies: &[Movie]) -> Result<String> {
    let stored: Vec<StoredMovie> = movies.iter().map(StoredMovie::from_movie).collect();
    serde_json::to_string(&stored).context("encoding favorites")
}

/// Reads the persisted list; any failure counts as "no favorites".
async fn read_favorites(prefs: &dyn PreferenceStore) -> Vec<Movie> {
    let raw = match prefs.get(FAVORITES_KEY).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            warn!("Failed to read favorites, treating as empty: {:#}", e);
            return Vec::new();
        }
    };
    match decode_favorites(&raw) {
        Ok(movies) => dedup_by(movies, Movie::key),
        Err(e) => {
            warn!("Stored favorites are unreadable, treating as empty: {:#}", e);
            Vec::new()
        }
    }
}

pub struct FavoriteStore {
    prefs: Arc<dyn PreferenceStore>,
    tx: watch::Sender<Vec<Movie>>,
    write_lock: Mutex<()>,
}

impl std::fmt::Debug for FavoriteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FavoriteStore")
            .field("count", &self.tx.borrow().len())
            .finish()
    }
}

impl FavoriteStore {
    pub async fn load(prefs: Arc<dyn PreferenceStore>) -> Self {
        let current = read_favorites(prefs.as_ref()).await;
        debug!("Loaded {} favorites", current.len());
        let (tx, _rx) = watch::channel(current);
        Self {
            prefs,
            tx,
            write_lock: Mutex::new(()),
        }
    }

    /// Yields the current list immediately, then the full list after every
    /// mutation.
    pub fn observe(&self) -> WatchStream<Vec<Movie>> {
        WatchStream::new(self.tx.subscribe())
    }

    pub fn snapshot(&self) -> Vec<Movie> {
        self.tx.borrow().clone()
    }

    pub fn is_favorite(&self, id: i32, media_type: MediaType) -> bool {
        self.tx
            .borrow()
            .iter()
            .any(|m| m.id == id && m.media_type == media_type)
    }

    /// Adds the movie if absent, removes it otherwise. Returns the new list.
    /// Starts from the published list, not from storage.
    pub async fn toggle(&self, movie: &Movie) -> Result<Vec<Movie>> {
        let _guard = self.write_lock.lock().await;
        let mut current = self.snapshot();
        match current.iter().position(|m| m.key() == movie.key()) {
            Some(pos) => {
                current.remove(pos);
                debug!(id = movie.id, media_type = %movie.media_type, "Removed favorite");
            }
            None => {
                current.push(movie.clone());
                debug!(id = movie.id, media_type = %movie.media_type, "Added favorite");
            }
        }
        self.persist(&current).await?;
        self.tx.send_replace(current.clone());
        Ok(current)
    }

    /// Replaces the whole list. Repeated `(id, media_type)` entries keep only
    /// their first occurrence.
    pub async fn replace_all(&self, movies: Vec<Movie>) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let movies = dedup_by(movies, Movie::key);
        self.persist(&movies).await?;
        self.tx.send_replace(movies);
        Ok(())
    }

    async fn persist(&self, movies: &[Movie]) -> Result<()> {
        if movies.is_empty() {
            self.prefs.remove(FAVORITES_KEY).await
        } else {
            self.prefs.set(FAVORITES_KEY, encode_favorites(movies)?).await
        }
    }
}
