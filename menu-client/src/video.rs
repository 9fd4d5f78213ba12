//! Background video mappings
//!
//! Maps category ids to video paths. Mappings come from three places
//! (the built-in table, a local file, the server) and are merged with the
//! server winning. Changes made at runtime are announced on a
//! [`VideoConfigBus`].

use crate::{ClientError, ClientResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::models::VideoMapping;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Video used when no mapping matches
pub const FALLBACK_VIDEO: &str = "/safira/videos/Home_Rosen_Background_2.mp4";
/// Mapping key of the home screen
pub const HOME_KEY: &str = "home";

const LEGACY_ALIASES: &[(&str, &str)] = &[
    ("tee-kaffee", "hot-drinks"),
    ("1", "shisha"),
    ("2", "beverages"),
    ("3", "snacks"),
];

/// Mappings shipped with the client, the base layer of every merge
const DEFAULT_MAPPINGS: &[(&str, &str)] = &[
    (HOME_KEY, "/videos/Home_Rosen_Background.mp4"),
    ("shisha", "/videos/shisha-background.mp4"),
    (
        "softdrinks",
        "/videos/closeup-of-glass-of-cola-with-ice-rotating-2025-08-29-14-34-40-utc.mp4",
    ),
    ("eistee-energy", "/videos/redbull-background.mp4"),
    (
        "hot-drinks",
        "/videos/cup-of-tea-with-mint-4k-2025-08-29-06-05-12-utc.mp4",
    ),
    ("saefte", "/videos/Juice-and-NightClub-FHD.mp4"),
    ("wein-sekt", "/videos/Home_Rosen_Background.mp4"),
    ("bier", "/videos/redbull-background.mp4"),
    ("cocktails-mocktails", "/videos/Juice-and-NightClub-FHD.mp4"),
    ("spirituosen", "/videos/redbull-background.mp4"),
    ("snacks", "/videos/Home_Rosen_Background.mp4"),
];

/// Stored key prefixes from older admin versions, longest first
const LEGACY_KEY_PREFIXES: &[&str] = &["subcat_subcat_", "subcat_"];

/// `false` for blank paths, object URLs and stringified null/undefined
pub fn is_valid_source(path: &str) -> bool {
    let trimmed = path.trim();
    !trimmed.is_empty() && !trimmed.starts_with("blob:") && trimmed != "undefined" && trimmed != "null"
}

fn migrate_key(key: &str) -> &str {
    LEGACY_KEY_PREFIXES
        .iter()
        .find_map(|prefix| key.strip_prefix(prefix))
        .filter(|rest| !rest.is_empty())
        .unwrap_or(key)
}

/// Category id to video path
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoMappings(BTreeMap<String, String>);

impl VideoMappings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in table
    pub fn defaults() -> Self {
        let mut mappings = Self::new();
        for (key, path) in DEFAULT_MAPPINGS {
            mappings.insert(key, path);
        }
        mappings
    }

    /// Parse a stored map, dropping invalid entries and migrating legacy keys
    pub fn from_stored(stored: &Value) -> Self {
        let mut mappings = Self::new();
        let Some(object) = stored.as_object() else {
            tracing::warn!("Stored video mappings are not an object, ignoring");
            return mappings;
        };
        for (key, value) in object {
            match value.as_str() {
                Some(path) if is_valid_source(path) => {
                    let migrated = migrate_key(key);
                    if migrated != key {
                        tracing::info!(from = %key, to = migrated, "Migrated legacy video key");
                    }
                    mappings.0.insert(migrated.to_string(), path.to_string());
                }
                _ => tracing::info!(%key, "Dropping invalid video mapping"),
            }
        }
        mappings
    }

    /// Build from the server's list, skipping invalid rows
    pub fn from_server(rows: &[VideoMapping]) -> Self {
        let mut mappings = Self::new();
        for row in rows {
            if !mappings.insert(&row.category_id, &row.video_path) {
                tracing::warn!(category = %row.category_id, "Skipped invalid server video mapping");
            }
        }
        mappings
    }

    /// Later layers win: server over stored over defaults
    pub fn merge(defaults: &Self, stored: &Self, server: &Self) -> Self {
        let mut merged = defaults.0.clone();
        merged.extend(stored.0.clone());
        merged.extend(server.0.clone());
        Self(merged)
    }

    /// [`merge`](Self::merge) over the built-in table
    pub fn resolve(stored: &Self, server: &Self) -> Self {
        Self::merge(&Self::defaults(), stored, server)
    }

    /// Insert a valid mapping; returns `false` and changes nothing otherwise
    pub fn insert(&mut self, key: &str, path: &str) -> bool {
        if key.trim().is_empty() || !is_valid_source(path) {
            return false;
        }
        self.0.insert(key.to_string(), path.to_string());
        true
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Video for a category key
    ///
    /// The menus overview and the empty key mean the home screen. Lookup order is the
    /// key itself, its legacy alias, then [`FALLBACK_VIDEO`]. Returns `None`
    /// while no mappings are loaded or when the chosen source is invalid.
    pub fn video_for(&self, key: &str) -> Option<&str> {
        if self.is_empty() {
            return None;
        }
        let key = match key.trim() {
            "" | "menus" | "safira-menus" => HOME_KEY,
            other => other,
        };
        let source = self
            .get(key)
            .or_else(|| {
                LEGACY_ALIASES
                    .iter()
                    .find(|(legacy, _)| *legacy == key)
                    .and_then(|(_, current)| self.get(current))
            })
            .unwrap_or(FALLBACK_VIDEO);
        is_valid_source(source).then_some(source)
    }
}

/// Runtime video configuration change
#[derive(Debug, Clone, PartialEq)]
pub enum VideoConfigEvent {
    /// Whole mapping table replaced
    Replaced(Arc<VideoMappings>),
    /// One mapping set (`Some`) or removed (`None`)
    Changed { key: String, path: Option<String> },
}

/// Publish/subscribe channel for video configuration changes
#[derive(Debug, Clone)]
pub struct VideoConfigBus {
    sender: broadcast::Sender<VideoConfigEvent>,
}

impl VideoConfigBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<VideoConfigEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of subscribers that will see the event
    pub fn publish(&self, event: VideoConfigEvent) -> usize {
        // No subscribers is not an error for a notification bus
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for VideoConfigBus {
    fn default() -> Self {
        Self::new(16)
    }
}

/// Mappings persisted as a JSON object on disk
#[derive(Debug, Clone)]
pub struct VideoMappingFile {
    path: PathBuf,
}

impl VideoMappingFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing or unreadable JSON yields empty mappings
    pub async fn load(&self) -> ClientResult<VideoMappings> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(VideoMappings::new()),
            Err(e) => return Err(ClientError::Io(e)),
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(value) => Ok(VideoMappings::from_stored(&value)),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Invalid video mapping file");
                Ok(VideoMappings::new())
            }
        }
    }

    /// Write through a temporary file and rename
    pub async fn save(&self, mappings: &VideoMappings) -> ClientResult<()> {
        let json = serde_json::to_vec_pretty(mappings)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared::models::VideoMappingList;

    #[test]
    fn test_from_stored_cleans_and_migrates() {
        let stored = json!({
            "shisha": "/videos/shisha.mp4",
            "subcat_subcat_8": "/videos/eight.mp4",
            "subcat_5": "/videos/five.mp4",
            "broken": "blob:http://localhost/123",
            "gone": "undefined",
            "nothing": "null",
            "blank": "   ",
            "number": 12
        });
        let mappings = VideoMappings::from_stored(&stored);

        assert_eq!(mappings.len(), 3);
        assert_eq!(mappings.get("shisha"), Some("/videos/shisha.mp4"));
        assert_eq!(mappings.get("8"), Some("/videos/eight.mp4"));
        assert_eq!(mappings.get("5"), Some("/videos/five.mp4"));
        assert!(VideoMappings::from_stored(&json!([1, 2])).is_empty());
    }

    #[test]
    fn test_merge_priority() {
        let mut defaults = VideoMappings::new();
        defaults.insert("home", "/d/home.mp4");
        defaults.insert("shisha", "/d/shisha.mp4");
        let mut stored = VideoMappings::new();
        stored.insert("shisha", "/s/shisha.mp4");
        stored.insert("snacks", "/s/snacks.mp4");
        let server = VideoMappings::from_server(&[
            VideoMapping {
                category_id: "snacks".into(),
                video_path: "/srv/snacks.mp4".into(),
            },
            VideoMapping {
                category_id: "bad".into(),
                video_path: "blob:x".into(),
            },
        ]);

        let merged = VideoMappings::merge(&defaults, &stored, &server);
        assert_eq!(merged.get("home"), Some("/d/home.mp4"));
        assert_eq!(merged.get("shisha"), Some("/s/shisha.mp4"));
        assert_eq!(merged.get("snacks"), Some("/srv/snacks.mp4"));
        assert_eq!(merged.get("bad"), None);
    }

    #[test]
    fn test_fresh_install_uses_defaults() {
        let mappings = VideoMappings::resolve(&VideoMappings::new(), &VideoMappings::new());
        assert_eq!(mappings.len(), DEFAULT_MAPPINGS.len());
        assert_eq!(
            mappings.video_for("shisha"),
            Some("/videos/shisha-background.mp4")
        );
        assert_eq!(
            mappings.video_for("safira-menus"),
            Some("/videos/Home_Rosen_Background.mp4")
        );
        assert_eq!(mappings.video_for("unknown"), Some(FALLBACK_VIDEO));

        let mut server = VideoMappings::new();
        server.insert("shisha", "/srv/shisha.mp4");
        let merged = VideoMappings::resolve(&VideoMappings::new(), &server);
        assert_eq!(merged.video_for("shisha"), Some("/srv/shisha.mp4"));
        assert_eq!(merged.video_for("bier"), Some("/videos/redbull-background.mp4"));
    }

    #[test]
    fn test_server_payload_parses() {
        let body = json!({
            "status": "success",
            "mappings": [
                {"category_id": "snacks", "video_path": "/v/snacks.mp4"},
                {"category_id": "bad", "video_path": "undefined"}
            ]
        });
        let list: VideoMappingList = serde_json::from_value(body).unwrap();
        let mappings = VideoMappings::from_server(&list.mappings);
        assert_eq!(mappings.len(), 1);
        assert_eq!(mappings.get("snacks"), Some("/v/snacks.mp4"));
    }

    #[test]
    fn test_video_lookup() {
        assert_eq!(VideoMappings::new().video_for("shisha"), None);

        let mut mappings = VideoMappings::new();
        mappings.insert("home", "/v/home.mp4");
        mappings.insert("hot-drinks", "/v/hot.mp4");
        mappings.insert("shisha", "/v/shisha.mp4");

        assert_eq!(mappings.video_for("shisha"), Some("/v/shisha.mp4"));
        assert_eq!(mappings.video_for("tee-kaffee"), Some("/v/hot.mp4"));
        assert_eq!(mappings.video_for("1"), Some("/v/shisha.mp4"));
        assert_eq!(mappings.video_for("menus"), Some("/v/home.mp4"));
        assert_eq!(mappings.video_for(""), Some("/v/home.mp4"));
        assert_eq!(mappings.video_for("unknown"), Some(FALLBACK_VIDEO));
        assert!(!mappings.insert("x", "blob:abc"));
    }

    #[tokio::test]
    async fn test_bus_delivers_events() {
        let bus = VideoConfigBus::default();
        assert_eq!(
            bus.publish(VideoConfigEvent::Changed {
                key: "a".into(),
                path: None
            }),
            0
        );

        let mut rx = bus.subscribe();
        let event = VideoConfigEvent::Changed {
            key: "shisha".into(),
            path: Some("/v/s.mp4".into()),
        };
        assert_eq!(bus.publish(event.clone()), 1);
        assert_eq!(rx.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let file = VideoMappingFile::new(dir.path().join("videos.json"));
        assert!(file.load().await.unwrap().is_empty());

        let mut mappings = VideoMappings::new();
        mappings.insert("home", "/v/home.mp4");
        file.save(&mappings).await.unwrap();
        assert_eq!(file.load().await.unwrap(), mappings);

        tokio::fs::write(file.path(), "not json").await.unwrap();
        assert!(file.load().await.unwrap().is_empty());
    }
}
