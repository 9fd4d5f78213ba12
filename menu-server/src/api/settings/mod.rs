//! Settings API
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /api/settings/navigation | GET | none |
//! | /api/settings/navigation | PUT | admin |
//! | /api/settings/languages | GET | none |
//! | /api/settings/wifi | GET | none |
//! | /api/settings/social | GET | none |
//! | /api/settings/videos | PUT | admin |
//!
//! Video mappings are read through `/api/products?action=get_video_mappings`.

mod handler;

use axum::{
    Router,
    routing::{get, put},
};

use crate::core::ServerState;

pub(crate) use handler::video_mapping_list;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/settings", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route(
            "/navigation",
            get(handler::navigation).put(handler::update_navigation),
        )
        .route("/languages", get(handler::languages))
        .route("/wifi", get(handler::wifi))
        .route("/social", get(handler::social))
        .route("/videos", put(handler::replace_videos))
}
