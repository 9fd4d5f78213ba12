//! Product API
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /api/products | GET | none |
//! | /api/products?action=version_check | GET | none |
//! | /api/products?action=get_video_mappings | GET | none |
//! | /api/products | PUT | admin |
//! | /api/products/{category_id}/items | POST | admin |
//! | /api/products/{category_id}/items/{item_id} | PUT, DELETE | admin |
//! | /api/products/{category_id}/bulk-price | PUT | admin |
//! | /api/products/move/{from}/{item_id}/{to} | PUT | admin |

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub use handler::{BulkPriceRequest, BulkPriceResponse, ProductsQuery};

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/products", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::get_menu).put(handler::replace_menu))
        // Static segment, matched before the category routes below
        .route("/move/{from}/{item_id}/{to}", put(handler::move_product))
        .route("/{category_id}/items", post(handler::create))
        .route(
            "/{category_id}/items/{item_id}",
            put(handler::update).delete(handler::delete),
        )
        .route("/{category_id}/bulk-price", put(handler::bulk_price))
}
