//! Menu Client - menu data, views and navigation for the lounge menu
//!
//! Loads the menu document from menu-server (falling back to the bundled
//! copy), derives category/product views, watches the server for changes
//! and tracks navigation and windowed list state.

pub mod change_detector;
pub mod config;
pub mod error;
pub mod http;
pub mod navigation;
pub mod store;
pub mod video;
pub mod view;
pub mod virtual_list;

pub use change_detector::{ChangeDetector, ChangeHandler, CheckOutcome, version_token};
pub use config::{ChangeDetectorConfig, ClientConfig};
pub use error::{ClientError, ClientResult};
pub use http::{HttpClient, MenuSource, NetworkHttpClient, VersionSource};
pub use navigation::{History, MemoryHistory, NavState, NavigationConfig, Navigator, Reconciliation};
pub use store::{DataSource, LoadOutcome, MenuStore, bundled_menu};
pub use video::{VideoConfigBus, VideoConfigEvent, VideoMappingFile, VideoMappings};
pub use view::{MenuItem, SubcategoryFilter};
pub use virtual_list::{Align, VirtualGrid, VirtualWindow, WindowParams, WindowTracker};

// Re-export shared types for convenience
pub use shared::{ApiResponse, Language, LoginResponse, MenuDocument};
