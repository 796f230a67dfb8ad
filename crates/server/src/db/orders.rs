//! Order, item, and product queries for [`PgStore`].

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};

use cartwheel_core::{OrderId, ProductId, UserId};

use super::{OrderStore, PgStore, RepositoryError, map_write_error};
use crate::models::order::{Item, ItemRecord, NewProduct, Order, Product, ProductRef};

const ORDER_COLUMNS: &str = "id, status, user_id, created_at, updated_at";
const ITEM_COLUMNS: &str = "id, order_id, product_id, quantity, price, created_at, updated_at";
const PRODUCT_COLUMNS: &str =
    "id, title, description, price, inventory, image_url, created_at, updated_at";

/// Load an order's items, each with its product, in insertion order.
async fn load_items(pool: &PgPool, order_id: OrderId) -> Result<Vec<Item>, RepositoryError> {
    let mut items = sqlx::query_as::<_, Item>(&format!(
        "SELECT {ITEM_COLUMNS} FROM items WHERE order_id = $1 ORDER BY id"
    ))
    .bind(order_id)
    .fetch_all(pool)
    .await?;

    if items.is_empty() {
        return Ok(items);
    }

    let product_ids: Vec<i32> = items.iter().map(|i| i.product_id.as_i32()).collect();
    let products: HashMap<ProductId, Product> = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1)"
    ))
    .bind(product_ids)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|p| (p.id, p))
    .collect();

    for item in &mut items {
        item.product = products.get(&item.product_id).cloned();
    }
    Ok(items)
}

async fn with_items(pool: &PgPool, order: Option<Order>) -> Result<Option<Order>, RepositoryError> {
    match order {
        Some(mut order) => {
            order.items = load_items(pool, order.id).await?;
            Ok(Some(order))
        }
        None => Ok(None),
    }
}

async fn insert_product(
    conn: &mut PgConnection,
    product: NewProduct,
) -> Result<Product, RepositoryError> {
    sqlx::query_as::<_, Product>(&format!(
        "INSERT INTO products (title, description, price, inventory, image_url) \
         VALUES ($1, $2, $3, $4, $5) RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(product.title)
    .bind(product.description)
    .bind(product.price)
    .bind(product.inventory)
    .bind(product.image_url)
    .fetch_one(conn)
    .await
    .map_err(|e| map_write_error(e, "product"))
}

#[async_trait]
impl OrderStore for PgStore {
    async fn create_order(&self) -> Result<Order, RepositoryError> {
        Ok(sqlx::query_as::<_, Order>(&format!(
            "INSERT INTO orders (status) VALUES ('pending') RETURNING {ORDER_COLUMNS}"
        ))
        .fetch_one(&self.pool)
        .await?)
    }

    async fn find_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        with_items(&self.pool, order).await
    }

    async fn find_pending_order(&self, user_id: UserId) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE user_id = $1 AND status = 'pending' \
             ORDER BY updated_at DESC LIMIT 1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        with_items(&self.pool, order).await
    }

    async fn assign_order(
        &self,
        id: OrderId,
        user_id: UserId,
    ) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "UPDATE orders SET user_id = $2, updated_at = now() \
             WHERE id = $1 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "order"))?;

        with_items(&self.pool, order).await
    }

    async fn insert_item(
        &self,
        order_id: OrderId,
        item: ItemRecord,
    ) -> Result<Item, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let product = match item.product {
            ProductRef::New(new_product) => insert_product(&mut tx, new_product).await?,
            ProductRef::Existing(id) => sqlx::query_as::<_, Product>(&format!(
                "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
            ))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| RepositoryError::Rejected(format!("product {id} does not exist")))?,
        };

        let mut created = sqlx::query_as::<_, Item>(&format!(
            "INSERT INTO items (order_id, product_id, quantity, price) \
             VALUES ($1, $2, $3, $4) RETURNING {ITEM_COLUMNS}"
        ))
        .bind(order_id)
        .bind(product.id)
        .bind(item.quantity)
        .bind(product.price)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "item"))?;

        tx.commit().await?;

        created.product = Some(product);
        Ok(created)
    }

    async fn delete_items_for_product(
        &self,
        order_id: OrderId,
        product_id: ProductId,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM items WHERE order_id = $1 AND product_id = $2")
            .bind(order_id)
            .bind(product_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
