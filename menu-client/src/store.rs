//! Menu data store
//!
//! Holds the current [`MenuDocument`] as an `Arc` snapshot. `load()` never
//! fails: when the remote source errors, the bundled fallback document is
//! installed and the error is recorded. Every load takes a sequence number;
//! a response that completes after a newer request was issued is dropped.

use crate::http::MenuSource;
use parking_lot::RwLock;
use shared::MenuDocument;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tokio::sync::watch;

/// Message recorded when the remote document could not be loaded
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load latest menu data";

const BUNDLED_MENU: &str = include_str!("../data/fallback_menu.json");

/// Where the current document came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    /// Nothing loaded yet; the fallback document is shown
    Initial,
    Remote,
    Fallback,
}

/// Result of a single `load()` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Remote document installed
    Remote,
    /// Remote failed; fallback installed and error recorded
    Fallback { error: String },
    /// A newer load was issued while this one was in flight; nothing changed
    Stale,
}

struct StoreStatus {
    source: DataSource,
    last_error: Option<String>,
}

/// Parse the document bundled with the crate
pub fn bundled_menu() -> MenuDocument {
    match serde_json::from_str(BUNDLED_MENU) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::error!(error = %e, "Bundled fallback menu is invalid, using empty menu");
            MenuDocument::default()
        }
    }
}

/// Counts a load as in flight until dropped, including on cancellation
struct Loading<'a>(&'a AtomicUsize);

impl<'a> Loading<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for Loading<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct MenuStore<S> {
    source: S,
    fallback: Arc<MenuDocument>,
    current: watch::Sender<Arc<MenuDocument>>,
    status: RwLock<StoreStatus>,
    issued: AtomicU64,
    in_flight: AtomicUsize,
}

impl<S: MenuSource> MenuStore<S> {
    /// Store backed by `source`, falling back to the bundled document
    pub fn new(source: S) -> Self {
        Self::with_fallback(source, bundled_menu())
    }

    pub fn with_fallback(source: S, fallback: MenuDocument) -> Self {
        let fallback = Arc::new(fallback);
        let (current, _) = watch::channel(fallback.clone());
        Self {
            source,
            fallback,
            current,
            status: RwLock::new(StoreStatus {
                source: DataSource::Initial,
                last_error: None,
            }),
            issued: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Fetch the document and install it (or the fallback on failure)
    pub async fn load(&self) -> LoadOutcome {
        let seq = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let result = {
            let _loading = Loading::enter(&self.in_flight);
            self.source.fetch_menu().await
        };

        if seq != self.issued.load(Ordering::SeqCst) {
            tracing::debug!(seq, "Discarding stale menu response");
            return LoadOutcome::Stale;
        }

        let mut status = self.status.write();
        match result {
            Ok(doc) => {
                let stats = doc.stats();
                tracing::info!(
                    categories = stats.total_categories,
                    products = stats.total_products,
                    "Menu loaded"
                );
                status.source = DataSource::Remote;
                status.last_error = None;
                self.current.send_replace(Arc::new(doc));
                LoadOutcome::Remote
            }
            Err(e) => {
                tracing::warn!(error = %e, "Menu load failed, using fallback menu");
                let error = format!("{}: {}", LOAD_FAILED_MESSAGE, e);
                status.source = DataSource::Fallback;
                status.last_error = Some(error.clone());
                self.current.send_replace(self.fallback.clone());
                LoadOutcome::Fallback { error }
            }
        }
    }

    /// Alias of [`load`](Self::load) for refresh handlers
    pub async fn reload(&self) -> LoadOutcome {
        self.load().await
    }
}

impl<S> MenuStore<S> {
    /// Current document; cheap to clone and safe to hold across reloads
    pub fn snapshot(&self) -> Arc<MenuDocument> {
        self.current.borrow().clone()
    }

    /// Receiver notified on every installed document
    pub fn subscribe(&self) -> watch::Receiver<Arc<MenuDocument>> {
        self.current.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub fn last_error(&self) -> Option<String> {
        self.status.read().last_error.clone()
    }

    pub fn source(&self) -> DataSource {
        self.status.read().source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ClientError, ClientResult};
    use async_trait::async_trait;
    use shared::Category;
    use std::time::Duration;
    use tokio::sync::Mutex;

    /// Returns queued responses in order, each after its own delay
    struct ScriptedSource {
        script: Mutex<Vec<(Duration, ClientResult<MenuDocument>)>>,
    }

    impl ScriptedSource {
        fn new(mut script: Vec<(Duration, ClientResult<MenuDocument>)>) -> Self {
            script.reverse();
            Self {
                script: Mutex::new(script),
            }
        }
    }

    #[async_trait]
    impl MenuSource for ScriptedSource {
        async fn fetch_menu(&self) -> ClientResult<MenuDocument> {
            let (delay, result) = self
                .script
                .lock()
                .await
                .pop()
                .unwrap_or((Duration::ZERO, Err(ClientError::Internal("empty".into()))));
            tokio::time::sleep(delay).await;
            result
        }
    }

    fn doc(id: &str) -> MenuDocument {
        MenuDocument::new(vec![Category::main(id, id)])
    }

    #[test]
    fn test_bundled_menu_parses() {
        let menu = bundled_menu();
        assert!(menu.find_category("shisha").is_some());
        assert!(menu.find_category("softdrinks").is_some());
        assert_eq!(menu.stats().total_products, 13);
    }

    #[tokio::test]
    async fn test_initial_state_is_fallback_snapshot() {
        let store = MenuStore::with_fallback(ScriptedSource::new(vec![]), doc("fallback"));
        assert_eq!(store.source(), DataSource::Initial);
        assert!(store.snapshot().contains_category("fallback"));
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_remote_load_installs_document() {
        let source = ScriptedSource::new(vec![(Duration::ZERO, Ok(doc("remote")))]);
        let store = MenuStore::with_fallback(source, doc("fallback"));

        assert_eq!(store.load().await, LoadOutcome::Remote);
        assert_eq!(store.source(), DataSource::Remote);
        assert!(store.snapshot().contains_category("remote"));
        assert!(store.last_error().is_none());
    }

    #[tokio::test]
    async fn test_failed_load_uses_fallback_and_records_error() {
        let source = ScriptedSource::new(vec![
            (Duration::ZERO, Ok(doc("remote"))),
            (
                Duration::ZERO,
                Err(ClientError::Status {
                    status: 503,
                    body: "down".into(),
                }),
            ),
        ]);
        let store = MenuStore::with_fallback(source, doc("fallback"));
        store.load().await;
        let before = store.snapshot();

        let outcome = store.load().await;
        assert!(matches!(outcome, LoadOutcome::Fallback { .. }));
        assert_eq!(store.source(), DataSource::Fallback);
        assert!(
            store
                .last_error()
                .unwrap()
                .starts_with(LOAD_FAILED_MESSAGE)
        );
        assert!(store.snapshot().contains_category("fallback"));
        // Earlier snapshots stay valid
        assert!(before.contains_category("remote"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_older_response_is_discarded() {
        let source = ScriptedSource::new(vec![
            (Duration::from_millis(200), Ok(doc("slow-old"))),
            (Duration::from_millis(10), Ok(doc("fast-new"))),
        ]);
        let store = Arc::new(MenuStore::with_fallback(source, doc("fallback")));

        let first = {
            let store = store.clone();
            tokio::spawn(async move { store.load().await })
        };
        tokio::task::yield_now().await;
        let second = {
            let store = store.clone();
            tokio::spawn(async move { store.load().await })
        };
        tokio::task::yield_now().await;
        assert!(store.is_loading());

        assert_eq!(second.await.unwrap(), LoadOutcome::Remote);
        assert_eq!(first.await.unwrap(), LoadOutcome::Stale);
        assert!(store.snapshot().contains_category("fast-new"));
        assert!(!store.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_load_clears_loading_state() {
        let source = ScriptedSource::new(vec![(Duration::from_secs(10), Ok(doc("slow")))]);
        let store = MenuStore::with_fallback(source, doc("fallback"));

        let timed_out = tokio::time::timeout(Duration::from_millis(50), store.load()).await;
        assert!(timed_out.is_err());
        assert!(!store.is_loading());
        assert_eq!(store.source(), DataSource::Initial);
        assert!(store.snapshot().contains_category("fallback"));
    }

    #[tokio::test]
    async fn test_subscribers_see_reload() {
        let source = ScriptedSource::new(vec![(Duration::ZERO, Ok(doc("remote")))]);
        let store = MenuStore::with_fallback(source, doc("fallback"));
        let mut rx = store.subscribe();

        store.reload().await;
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().contains_category("remote"));
    }
}
