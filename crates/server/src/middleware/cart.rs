//! Cart resolution middleware.
//!
//! Runs in front of every `/api/cart` route. Resolves the session's pending
//! order (creating one if needed), stores a new cart's ID in the session, and
//! hands the order to handlers through [`ActiveCart`].

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use tower_sessions::Session;

use cartwheel_core::OrderId;

use crate::error::AppError;
use crate::models::{Order, keys};
use crate::services::cart::CartService;
use crate::state::AppState;

/// The session's cart, as resolved for this request.
#[derive(Debug, Clone)]
pub struct ActiveCart(pub Order);

/// Resolve the session cart and attach it to the request.
///
/// # Errors
///
/// Returns `AppError` if the session or store fails.
pub async fn cart_middleware(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let cart_id: Option<OrderId> = session.get(keys::CART_ID).await?;
    let (order, created) = CartService::new(state.store()).resolve(cart_id).await?;

    if created {
        session.insert(keys::CART_ID, order.id).await?;
    }

    request.extensions_mut().insert(ActiveCart(order));
    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for ActiveCart
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(|| AppError::Internal("cart middleware not installed".to_string()))
    }
}
