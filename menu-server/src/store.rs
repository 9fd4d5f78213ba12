//! JSON file storage
//!
//! The menu lives in `products.json`, the events in `events.json`, the
//! navigation settings in `navigationSettings.json` and the background
//! video table in `videoMappings.json`, all under the configured data
//! directory. The last two are optional and read as defaults when absent. Reads parse the file each time so
//! hand edits are picked up; writes are serialised by one async mutex and
//! land atomically through a temporary file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::models::NavigationSettings;
use shared::{AppError, Event, MenuDocument, VersionCheck};
use thiserror::Error;
use tokio::sync::Mutex;

pub const PRODUCTS_FILE: &str = "products.json";
pub const EVENTS_FILE: &str = "events.json";
pub const SETTINGS_FILE: &str = "navigationSettings.json";
pub const VIDEOS_FILE: &str = "videoMappings.json";

/// Category key to video path
pub type VideoTable = BTreeMap<String, String>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        tracing::error!(error = %err, "Storage failure");
        AppError::storage(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// File-backed menu and event store
#[derive(Debug)]
pub struct JsonFileStore {
    data_dir: PathBuf,
    write_lock: Mutex<()>,
    version: AtomicU64,
    last_modified: RwLock<DateTime<Utc>>,
}

impl JsonFileStore {
    /// Open the store, creating the directory and default files when missing
    pub async fn open(data_dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let data_dir = data_dir.into();
        tokio::fs::create_dir_all(&data_dir)
            .await
            .map_err(|source| StoreError::Io {
                path: data_dir.clone(),
                source,
            })?;

        let store = Self {
            write_lock: Mutex::new(()),
            version: AtomicU64::new(0),
            last_modified: RwLock::new(Utc::now()),
            data_dir,
        };

        let products = store.products_path();
        if !tokio::fs::try_exists(&products).await.unwrap_or(false) {
            tracing::info!(path = %products.display(), "Creating empty menu file");
            write_json(&products, &MenuDocument::default()).await?;
        }
        let events = store.events_path();
        if !tokio::fs::try_exists(&events).await.unwrap_or(false) {
            tracing::info!(path = %events.display(), "Creating empty events file");
            write_json(&events, &Vec::<Event>::new()).await?;
        }

        if let Ok(modified) = tokio::fs::metadata(&products)
            .await
            .and_then(|m| m.modified())
        {
            *store.last_modified.write() = DateTime::<Utc>::from(modified);
        }

        Ok(store)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn products_path(&self) -> PathBuf {
        self.data_dir.join(PRODUCTS_FILE)
    }

    pub fn events_path(&self) -> PathBuf {
        self.data_dir.join(EVENTS_FILE)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join(SETTINGS_FILE)
    }

    pub fn videos_path(&self) -> PathBuf {
        self.data_dir.join(VIDEOS_FILE)
    }

    /// Writes since the process started
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    pub fn last_modified(&self) -> DateTime<Utc> {
        *self.last_modified.read()
    }

    fn mark_written(&self, at: DateTime<Utc>) {
        self.version.fetch_add(1, Ordering::SeqCst);
        *self.last_modified.write() = at;
    }

    // ========== Menu ==========

    pub async fn menu(&self) -> StoreResult<MenuDocument> {
        read_json(&self.products_path()).await
    }

    /// Read-modify-write the menu under the write lock
    ///
    /// Nothing is written when `apply` fails. Metadata is refreshed before
    /// saving.
    pub async fn update_menu<T, F>(&self, apply: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut MenuDocument) -> Result<T, AppError>,
    {
        let _guard = self.write_lock.lock().await;
        let path = self.products_path();
        let mut doc: MenuDocument = read_json(&path).await?;
        let out = apply(&mut doc)?;

        let now = Utc::now();
        doc.refresh_metadata(now);
        write_json(&path, &doc).await?;
        self.mark_written(now);
        Ok(out)
    }

    /// Replace the whole document; returns what was stored
    pub async fn replace_menu(&self, doc: MenuDocument) -> Result<MenuDocument, AppError> {
        self.update_menu(move |current| {
            *current = doc;
            Ok(())
        })
        .await?;
        Ok(self.menu().await?)
    }

    /// Hash, write time and counter for change polling
    pub async fn version_check(&self) -> StoreResult<VersionCheck> {
        let doc = self.menu().await?;
        Ok(VersionCheck {
            hash: doc.content_hash(),
            last_modified: self.last_modified(),
            version: self.version(),
        })
    }

    // ========== Events ==========

    pub async fn events(&self) -> StoreResult<Vec<Event>> {
        read_json(&self.events_path()).await
    }

    pub async fn update_events<T, F>(&self, apply: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut Vec<Event>) -> Result<T, AppError>,
    {
        let _guard = self.write_lock.lock().await;
        let path = self.events_path();
        let mut events: Vec<Event> = read_json(&path).await?;
        let out = apply(&mut events)?;
        write_json(&path, &events).await?;
        Ok(out)
    }

    // ========== Settings ==========

    pub async fn settings(&self) -> StoreResult<NavigationSettings> {
        read_json_or_default(&self.settings_path()).await
    }

    pub async fn replace_settings(
        &self,
        settings: NavigationSettings,
    ) -> StoreResult<NavigationSettings> {
        let _guard = self.write_lock.lock().await;
        write_json(&self.settings_path(), &settings).await?;
        Ok(settings)
    }

    pub async fn video_mappings(&self) -> StoreResult<VideoTable> {
        read_json_or_default(&self.videos_path()).await
    }

    pub async fn replace_video_mappings(&self, table: VideoTable) -> StoreResult<VideoTable> {
        let _guard = self.write_lock.lock().await;
        write_json(&self.videos_path(), &table).await?;
        Ok(table)
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> StoreResult<T> {
    let raw = tokio::fs::read(path).await.map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&raw).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Like [`read_json`], but a missing file yields `T::default()`
async fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> StoreResult<T> {
    match tokio::fs::try_exists(path).await {
        Ok(false) => Ok(T::default()),
        _ => read_json(path).await,
    }
}

async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> StoreResult<()> {
    let json = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let tmp = path.with_extension("json.tmp");
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };
    tokio::fs::write(&tmp, json).await.map_err(io_err)?;
    tokio::fs::rename(&tmp, path).await.map_err(io_err)?;
    Ok(())
}
