//! Session cart operations.
//!
//! The cart is the pending [`Order`] whose ID the session holds. This
//! service resolves that order, edits its items, and hands it over to a user
//! on login or signup.

use rust_decimal::Decimal;
use thiserror::Error;

use cartwheel_core::{OrderId, OrderStatus, ProductId, UserId};

use crate::db::{RepositoryError, Store};
use crate::models::order::{Item, ItemRecord, NewItem, Order, ProductRef};

/// Largest price a `NUMERIC(12, 2)` column holds.
const MAX_PRICE: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The item request is malformed.
    #[error("invalid item: {0}")]
    InvalidItem(String),

    /// Repository/database error.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Cart service.
pub struct CartService<'a> {
    store: &'a dyn Store,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Load the session's cart, or create a new one.
    ///
    /// A new cart is created when the session has no cart ID, or when the
    /// stored ID points at an order that is gone or no longer pending.
    /// Returns the cart and whether it was just created.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if a store operation fails.
    pub async fn resolve(&self, cart_id: Option<OrderId>) -> Result<(Order, bool), CartError> {
        if let Some(id) = cart_id {
            match self.store.find_order(id).await? {
                Some(order) if order.status == OrderStatus::Pending => return Ok((order, false)),
                Some(_) => tracing::debug!(order_id = %id, "Session cart is no longer pending"),
                None => tracing::debug!(order_id = %id, "Session cart no longer exists"),
            }
        }

        let order = self.store.create_order().await?;
        tracing::debug!(order_id = %order.id, "Created cart");
        Ok((order, true))
    }

    /// Add an item to a cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidItem` if the request names no product,
    /// names both an existing and a new product, or carries a non-positive
    /// quantity, negative price, or empty title. A missing product surfaces
    /// as `RepositoryError::Rejected`.
    pub async fn add_item(&self, order_id: OrderId, item: NewItem) -> Result<Item, CartError> {
        let record = validate_item(item)?;
        Ok(self.store.insert_item(order_id, record).await?)
    }

    /// Remove every line for `product_id` from a cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the delete fails.
    pub async fn remove_product(
        &self,
        order_id: OrderId,
        product_id: ProductId,
    ) -> Result<u64, CartError> {
        let removed = self
            .store
            .delete_items_for_product(order_id, product_id)
            .await?;
        tracing::debug!(order_id = %order_id, product_id = %product_id, removed, "Removed items");
        Ok(removed)
    }

    /// Reconcile carts after a login.
    ///
    /// If the user already has a pending order it becomes the session cart
    /// and is returned. Otherwise the session's guest cart (if any, and only
    /// while pending) is assigned to the user and `None` is returned.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if a store operation fails.
    pub async fn adopt_on_login(
        &self,
        user_id: UserId,
        cart_id: Option<OrderId>,
    ) -> Result<Option<Order>, CartError> {
        if let Some(order) = self.store.find_pending_order(user_id).await? {
            return Ok(Some(order));
        }

        if let Some(id) = self.pending_cart_id(cart_id).await? {
            self.store.assign_order(id, user_id).await?;
        }
        Ok(None)
    }

    /// Assign the session's guest cart to a newly created user.
    ///
    /// Returns the updated cart, or `None` if the session had no cart, or it
    /// no longer exists or is no longer pending.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the update fails.
    pub async fn assign_guest_cart(
        &self,
        user_id: UserId,
        cart_id: Option<OrderId>,
    ) -> Result<Option<Order>, CartError> {
        match self.pending_cart_id(cart_id).await? {
            Some(id) => Ok(self.store.assign_order(id, user_id).await?),
            None => Ok(None),
        }
    }

    /// The session's cart ID, if it still names a pending order.
    async fn pending_cart_id(
        &self,
        cart_id: Option<OrderId>,
    ) -> Result<Option<OrderId>, CartError> {
        let Some(id) = cart_id else {
            return Ok(None);
        };
        match self.store.find_order(id).await? {
            Some(order) if order.status == OrderStatus::Pending => Ok(Some(order.id)),
            _ => {
                tracing::debug!(order_id = %id, "Session cart is not pending, not assigning");
                Ok(None)
            }
        }
    }
}

fn validate_item(item: NewItem) -> Result<ItemRecord, CartError> {
    if item.quantity < 1 {
        return Err(CartError::InvalidItem(
            "quantity must be at least 1".to_string(),
        ));
    }

    let product = match (item.product_id, item.product) {
        (Some(id), None) => ProductRef::Existing(id),
        (None, Some(product)) => {
            if product.title.trim().is_empty() {
                return Err(CartError::InvalidItem("product title is required".to_string()));
            }
            if product.price < Decimal::ZERO {
                return Err(CartError::InvalidItem(
                    "product price must not be negative".to_string(),
                ));
            }
            if product.price > MAX_PRICE {
                return Err(CartError::InvalidItem(format!(
                    "product price must not exceed {MAX_PRICE}"
                )));
            }
            if product.price.normalize().scale() > 2 {
                return Err(CartError::InvalidItem(
                    "product price must have at most two decimal places".to_string(),
                ));
            }
            ProductRef::New(product)
        }
        (Some(_), Some(_)) => {
            return Err(CartError::InvalidItem(
                "give either product_id or product, not both".to_string(),
            ));
        }
        (None, None) => {
            return Err(CartError::InvalidItem(
                "product_id or product is required".to_string(),
            ));
        }
    };

    Ok(ItemRecord {
        quantity: item.quantity,
        product,
    })
}
