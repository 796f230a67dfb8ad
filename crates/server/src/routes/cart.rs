//! Cart route handlers.
//!
//! Mounted at `/api/cart` behind [`cart_middleware`](crate::middleware::cart_middleware),
//! which resolves the session's pending order before any handler runs.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use cartwheel_core::ProductId;

use crate::error::{Result, add_breadcrumb};
use crate::middleware::ActiveCart;
use crate::models::{Item, NewItem, Order};
use crate::services::cart::CartService;
use crate::state::AppState;

/// The session cart with its items and their products.
///
/// # Route
///
/// `GET /api/cart`
pub async fn show(ActiveCart(cart): ActiveCart) -> Json<Order> {
    Json(cart)
}

/// Add an item to the session cart.
///
/// # Route
///
/// `POST /api/cart`
#[instrument(skip(state, cart, item), fields(order_id = %cart.id))]
pub async fn add(
    State(state): State<AppState>,
    ActiveCart(cart): ActiveCart,
    Json(item): Json<NewItem>,
) -> Result<Json<Item>> {
    let item = CartService::new(state.store()).add_item(cart.id, item).await?;

    add_breadcrumb(
        "cart",
        "Added item",
        &[
            ("product_id", item.product_id.to_string()),
            ("quantity", item.quantity.to_string()),
        ],
    );

    Ok(Json(item))
}

/// Remove every line for a product from the session cart.
///
/// Responds 204 whether or not anything was removed.
///
/// # Route
///
/// `DELETE /api/cart/{product_id}`
#[instrument(skip(state, cart), fields(order_id = %cart.id))]
pub async fn remove(
    State(state): State<AppState>,
    ActiveCart(cart): ActiveCart,
    Path(product_id): Path<ProductId>,
) -> Result<StatusCode> {
    CartService::new(state.store())
        .remove_product(cart.id, product_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
