//! Category API
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /api/categories | GET | none |
//! | /api/categories | POST | admin |
//! | /api/categories/{id} | GET | none |
//! | /api/categories/{id} | PUT, DELETE | admin |

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/categories", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
}
