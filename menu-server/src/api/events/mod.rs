//! Event API
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /api/events | GET | none |
//! | /api/events | POST | admin |
//! | /api/events/active | GET | none |
//! | /api/events/{id} | GET | none |
//! | /api/events/{id} | PUT, DELETE | admin |

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/events", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        // Before /{id} so "active" is not taken as an id
        .route("/active", get(handler::active))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
}
