//! Order, item, and product types.
//!
//! A session cart is an [`Order`] in `pending` status.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cartwheel_core::{ItemId, OrderId, OrderStatus, ProductId, UserId};

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub inventory: i32,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line in an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Item {
    pub id: ItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i32,
    /// Unit price copied from the product when the item was added.
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub product: Option<Product>,
}

/// An order with its items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub status: OrderStatus,
    pub user_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub items: Vec<Item>,
}

fn default_quantity() -> i32 {
    1
}

/// Request body for adding an item to the cart.
///
/// Either `product_id` references an existing product, or `product` carries
/// the data for a new one (created together with the item).
#[derive(Debug, Clone, Deserialize)]
pub struct NewItem {
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    pub product_id: Option<ProductId>,
    pub product: Option<NewProduct>,
}

/// Nested product data in a [`NewItem`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewProduct {
    pub title: String,
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub inventory: i32,
    pub image_url: Option<String>,
}

/// The product an item points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductRef {
    Existing(ProductId),
    New(NewProduct),
}

/// A validated item ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRecord {
    pub quantity: i32,
    pub product: ProductRef,
}
