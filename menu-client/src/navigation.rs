//! Menu navigation state machine
//!
//! Tracks which main category and subcategory filter are selected and keeps
//! the route (`/menu/{id}`) in sync through a [`History`] implementation.
//! Slug tables (legacy ids, redirects, menus aliases, combined filters) are
//! configuration; the loaded document only decides which ids exist.

use crate::view::{
    SubcategoryFilter, filter_by_any_subcategory, filter_by_subcategory,
    products_for_main_category, subcategories_of, MenuItem,
};
use serde::{Deserialize, Serialize};
use crate::video::HOME_KEY;
use shared::{Category, Language, MenuDocument};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use tokio::time::Instant;

/// Route prefix of every menu page
pub const MENU_ROUTE: &str = "/menu";
/// How long reconciliation is suppressed after `back()`
pub const BACK_LOCK: Duration = Duration::from_millis(200);

/// Route side effects
pub trait History {
    fn push(&mut self, path: &str);
    fn replace(&mut self, path: &str);
}

/// In-memory history stack
#[derive(Debug, Clone, Default)]
pub struct MemoryHistory {
    entries: Vec<String>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&str> {
        self.entries.last().map(String::as_str)
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl History for MemoryHistory {
    fn push(&mut self, path: &str) {
        self.entries.push(path.to_string());
    }

    fn replace(&mut self, path: &str) {
        match self.entries.last_mut() {
            Some(last) => *last = path.to_string(),
            None => self.entries.push(path.to_string()),
        }
    }
}

/// `/menu/{id}`, or `/menu` for an empty id
pub fn menu_path(id: &str) -> String {
    if id.is_empty() {
        MENU_ROUTE.to_string()
    } else {
        format!("{}/{}", MENU_ROUTE, id)
    }
}

/// Lowercase, ASCII-alphanumeric runs joined by `-`
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

fn string_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Slug tables driving navigation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NavigationConfig {
    /// Numeric ids from old links, mapped to their slug
    pub legacy_ids: BTreeMap<String, String>,
    /// Main-menu tiles that open another route instead of themselves
    pub main_redirects: BTreeMap<String, String>,
    /// Route tokens rewritten before any lookup
    pub url_redirects: BTreeMap<String, String>,
    /// Tokens that open the menus overview; the first one is canonical
    pub menus_aliases: Vec<String>,
    /// Virtual filters that show several subcategories at once
    pub combined_filters: BTreeMap<String, Vec<String>>,
    /// Slugs with hard-wired meaning
    pub reserved: Vec<String>,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            legacy_ids: string_map(&[("1", "shisha"), ("2", "beverages"), ("3", "snacks")]),
            main_redirects: string_map(&[("drinks", "softdrinks"), ("shisha", "shisha-standard")]),
            url_redirects: string_map(&[
                ("drinks", "softdrinks"),
                ("cocktails", "cocktails-mocktails"),
                ("mocktails", "cocktails-mocktails"),
            ]),
            menus_aliases: vec!["safira-menus".to_string(), "menus".to_string()],
            combined_filters: BTreeMap::from([(
                "cocktails-mocktails".to_string(),
                vec!["cocktails".to_string(), "mocktails".to_string()],
            )]),
            reserved: ["drinks", "shisha", "snacks", "beverages", "cocktails", "mocktails"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl NavigationConfig {
    pub fn is_menus_alias(&self, token: &str) -> bool {
        self.menus_aliases.iter().any(|a| a == token)
    }

    fn menus_slug(&self) -> &str {
        self.menus_aliases
            .first()
            .map(String::as_str)
            .unwrap_or("safira-menus")
    }

    /// Every slug with configured meaning
    pub fn reserved_slugs(&self) -> BTreeSet<&str> {
        self.reserved
            .iter()
            .chain(&self.menus_aliases)
            .chain(self.combined_filters.keys())
            .chain(self.url_redirects.keys())
            .chain(self.main_redirects.keys())
            .map(String::as_str)
            .collect()
    }

    /// Category ids in `doc` that collide with a reserved slug
    pub fn reserved_collisions(&self, doc: &MenuDocument) -> Vec<String> {
        let reserved = self.reserved_slugs();
        doc.all_categories()
            .filter(|c| reserved.contains(c.id.as_str()))
            .map(|c| c.id.clone())
            .collect()
    }
}

/// Navigation state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NavState {
    #[default]
    MainMenu,
    MainCategory {
        main: String,
    },
    Subcategory {
        main: String,
        sub: String,
    },
    MenusOverview,
}

impl NavState {
    pub fn main_id(&self) -> Option<&str> {
        match self {
            NavState::MainCategory { main } | NavState::Subcategory { main, .. } => Some(main),
            _ => None,
        }
    }

    pub fn filter(&self) -> SubcategoryFilter {
        match self {
            NavState::Subcategory { sub, .. } => SubcategoryFilter::Only(sub.clone()),
            _ => SubcategoryFilter::All,
        }
    }
}

/// What `reconcile` did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// Within the back lock; nothing examined
    Locked,
    Unchanged,
    Updated,
    /// Route replaced with `/menu/{0}`; state untouched until it is reconciled
    Redirected(String),
}

/// Main category owning `id`, through nesting or `parentPage`
fn owner_of<'a>(doc: &'a MenuDocument, id: &str) -> Option<&'a str> {
    doc.categories.iter().find_map(|c| {
        if c.subcategories.iter().any(|s| s.id == id) {
            return Some(c.id.as_str());
        }
        if c.id == id {
            return c
                .parent_page
                .as_deref()
                .filter(|p| *p != id && doc.categories.iter().any(|m| m.id == *p));
        }
        None
    })
}

fn find_main<'a>(doc: &'a MenuDocument, token: &str) -> Option<&'a Category> {
    let mains = || doc.categories.iter().filter(|c| c.is_main_category);
    mains()
        .find(|c| c.id == token)
        .or_else(|| mains().find(|c| slugify(c.display_name(Language::En)) == token))
}

pub struct Navigator<H> {
    config: NavigationConfig,
    history: H,
    state: NavState,
    locked_until: Option<Instant>,
    collisions_checked: bool,
}

impl<H: History> Navigator<H> {
    pub fn new(history: H) -> Self {
        Self::with_config(history, NavigationConfig::default())
    }

    pub fn with_config(history: H, config: NavigationConfig) -> Self {
        Self {
            config,
            history,
            state: NavState::MainMenu,
            locked_until: None,
            collisions_checked: false,
        }
    }

    pub fn state(&self) -> &NavState {
        &self.state
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    pub fn config(&self) -> &NavigationConfig {
        &self.config
    }

    /// Main-menu tile selected
    pub fn select_main_category(&mut self, id: &str) {
        if self.config.is_menus_alias(id) {
            self.state = NavState::MenusOverview;
            let path = menu_path(self.config.menus_slug());
            self.history.push(&path);
            return;
        }
        if let Some(target) = self.config.main_redirects.get(id) {
            tracing::debug!(from = id, to = %target, "Main category redirected");
            let path = menu_path(target);
            self.history.push(&path);
            return;
        }
        self.state = NavState::MainCategory {
            main: id.to_string(),
        };
        self.history.push(&menu_path(id));
    }

    /// Subcategory tab selected; returns `false` when it already was
    pub fn select_subcategory(&mut self, id: &str) -> bool {
        let filter = SubcategoryFilter::parse(id);
        if self.state.filter() == filter {
            return false;
        }
        let main = self
            .state
            .main_id()
            .unwrap_or(id)
            .to_string();
        let path = match &filter {
            SubcategoryFilter::All => menu_path(&main),
            SubcategoryFilter::Only(sub) => menu_path(sub),
        };
        self.state = match filter {
            SubcategoryFilter::All => NavState::MainCategory { main },
            SubcategoryFilter::Only(sub) => NavState::Subcategory { main, sub },
        };
        self.history.replace(&path);
        true
    }

    /// Back to the main menu; URL reconciliation pauses briefly
    pub fn back(&mut self) {
        self.state = NavState::MainMenu;
        self.history.replace(MENU_ROUTE);
        self.locked_until = Some(Instant::now() + BACK_LOCK);
    }

    pub fn reset_to_main_menu(&mut self) {
        self.state = NavState::MainMenu;
        self.history.push(MENU_ROUTE);
    }

    pub fn is_locked(&self) -> bool {
        self.locked_until.is_some_and(|t| Instant::now() < t)
    }

    fn set_state(&mut self, next: NavState) -> Reconciliation {
        if self.state == next {
            Reconciliation::Unchanged
        } else {
            self.state = next;
            Reconciliation::Updated
        }
    }

    fn redirect(&mut self, target: &str) -> Reconciliation {
        self.history.replace(&menu_path(target));
        Reconciliation::Redirected(target.to_string())
    }

    /// Derive state from the route token (`/menu/{token}`)
    pub fn reconcile(&mut self, token: Option<&str>, doc: &MenuDocument) -> Reconciliation {
        if self.is_locked() {
            return Reconciliation::Locked;
        }
        self.locked_until = None;

        if !self.collisions_checked {
            self.collisions_checked = true;
            for id in self.config.reserved_collisions(doc) {
                tracing::warn!(%id, "Category id collides with a reserved navigation slug");
            }
        }

        let token = match token.map(str::trim).filter(|t| !t.is_empty()) {
            Some(t) => t,
            None => return self.set_state(NavState::MainMenu),
        };

        if let Some(slug) = self.config.legacy_ids.get(token).cloned() {
            return self.redirect(&slug);
        }
        if let Some(target) = self.config.url_redirects.get(token).cloned() {
            return self.redirect(&target);
        }
        if self.config.is_menus_alias(token) {
            return self.set_state(NavState::MenusOverview);
        }

        if let Some(members) = self.config.combined_filters.get(token) {
            if let Some(main) = members.iter().find_map(|m| owner_of(doc, m)) {
                let next = NavState::Subcategory {
                    main: main.to_string(),
                    sub: token.to_string(),
                };
                return self.set_state(next);
            }
        }

        if let Some(main) = owner_of(doc, token) {
            let next = NavState::Subcategory {
                main: main.to_string(),
                sub: token.to_string(),
            };
            return self.set_state(next);
        }

        if let Some(main) = find_main(doc, token) {
            let next = NavState::MainCategory {
                main: main.id.clone(),
            };
            return self.set_state(next);
        }

        if doc.contains_category(token) {
            tracing::debug!(%token, "Standalone category opened as main category");
            let next = NavState::MainCategory {
                main: token.to_string(),
            };
            return self.set_state(next);
        }

        tracing::warn!(%token, "Unknown category, returning to main menu");
        self.set_state(NavState::MainMenu)
    }

    /// Title of the selected subcategory, else of the main category
    pub fn current_title(&self, doc: &MenuDocument, lang: Language) -> Option<String> {
        let main = match &self.state {
            NavState::MainMenu => return None,
            NavState::MenusOverview => self.config.menus_slug(),
            NavState::MainCategory { main } => main,
            NavState::Subcategory { main, sub } => {
                if let Some(c) = doc.find_category(sub) {
                    return Some(c.display_name(lang).to_string());
                }
                main
            }
        };
        doc.find_category(main)
            .map(|c| c.display_name(lang).to_string())
    }

    /// Subcategory tabs of the selected main category
    pub fn current_subcategories<'a>(&self, doc: &'a MenuDocument) -> Vec<&'a Category> {
        match self.state.main_id() {
            Some(main) => subcategories_of(doc, main),
            None => Vec::new(),
        }
    }

    /// Products for the current selection and filter
    pub fn visible_products(&self, doc: &MenuDocument) -> Vec<MenuItem> {
        let Some(main) = self.state.main_id() else {
            return Vec::new();
        };
        let items = products_for_main_category(doc, main);
        match &self.state {
            NavState::Subcategory { sub, .. } => match self.config.combined_filters.get(sub) {
                Some(members) => {
                    let ids: Vec<&str> = members.iter().map(String::as_str).collect();
                    filter_by_any_subcategory(&items, &ids)
                }
                None => filter_by_subcategory(&items, &self.state.filter()),
            },
            _ => items,
        }
    }

    /// Key for the background video of the current page
    pub fn background_key(&self) -> String {
        match &self.state {
            NavState::MainMenu => HOME_KEY.to_string(),
            NavState::MenusOverview => self.config.menus_slug().to_string(),
            NavState::MainCategory { main } => main.clone(),
            NavState::Subcategory { sub, .. } => sub.clone(),
        }
    }
}
