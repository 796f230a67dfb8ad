//! In-memory [`Store`] for tests.
//!
//! Mirrors the constraints the `PostgreSQL` schema enforces: unique emails,
//! unique `(provider, uid)` identities, and item references to existing
//! orders and products.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use cartwheel_core::{
    Email, ItemId, OAuthProvider, OrderId, OrderStatus, ProductId, UserId,
};

use super::{OAuthStore, OrderStore, RepositoryError, Store, UserStore};
use crate::models::oauth::NewOAuthAccount;
use crate::models::order::{Item, ItemRecord, Order, Product, ProductRef};
use crate::models::user::{User, UserChangesRecord, UserRecord};

#[derive(Default)]
struct State {
    next_id: i32,
    users: Vec<User>,
    orders: Vec<Order>,
    items: Vec<Item>,
    products: Vec<Product>,
    oauths: Vec<(NewOAuthAccount, UserId)>,
}

impl State {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn email_taken(&self, email: Option<&Email>, except: Option<UserId>) -> bool {
        email.is_some_and(|email| {
            self.users
                .iter()
                .any(|u| u.email.as_ref() == Some(email) && Some(u.id) != except)
        })
    }

    fn with_items(&self, order: &Order) -> Order {
        let mut order = order.clone();
        order.items = self
            .items
            .iter()
            .filter(|i| i.order_id == order.id)
            .map(|i| {
                let mut item = i.clone();
                item.product = self.products.iter().find(|p| p.id == i.product_id).cloned();
                item
            })
            .collect();
        order
    }
}

fn without_digest(user: &User) -> User {
    User {
        password_digest: None,
        ..user.clone()
    }
}

/// A [`Store`] backed by vectors behind a mutex.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Force an order's status (checkout is not part of the API).
    pub async fn set_status(&self, id: OrderId, status: OrderStatus) {
        let mut state = self.state.lock().await;
        if let Some(order) = state.orders.iter_mut().find(|o| o.id == id) {
            order.status = status;
        }
    }

    /// Number of orders ever created.
    pub async fn order_count(&self) -> usize {
        self.state.lock().await.orders.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: UserRecord) -> Result<User, RepositoryError> {
        let mut state = self.state.lock().await;
        if state.email_taken(user.email.as_ref(), None) {
            return Err(RepositoryError::Conflict("user already exists".to_string()));
        }

        let now = Utc::now();
        let created = User {
            id: UserId::new(state.next_id()),
            email: user.email,
            account_type: user.account_type,
            profile: user.profile,
            password_digest: user.password_digest,
            created_at: now,
            updated_at: now,
        };
        let returned = without_digest(&created);
        state.users.push(created);
        Ok(returned)
    }

    async fn update_user(
        &self,
        id: UserId,
        changes: UserChangesRecord,
    ) -> Result<Option<User>, RepositoryError> {
        let mut state = self.state.lock().await;
        if state.email_taken(changes.email.as_ref(), Some(id)) {
            return Err(RepositoryError::Conflict("user already exists".to_string()));
        }
        let Some(user) = state.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };

        let p = changes.profile;
        let profile = &mut user.profile;
        for (field, value) in [
            (&mut profile.name, p.name),
            (&mut profile.street_address, p.street_address),
            (&mut profile.city, p.city),
            (&mut profile.state, p.state),
            (&mut profile.zip, p.zip),
            (&mut profile.card_number, p.card_number),
            (&mut profile.exp_month, p.exp_month),
            (&mut profile.exp_year, p.exp_year),
            (&mut profile.card_type, p.card_type),
            (&mut profile.cvv, p.cvv),
        ] {
            if value.is_some() {
                *field = value;
            }
        }
        if changes.email.is_some() {
            user.email = changes.email;
        }
        if changes.password_digest.is_some() {
            user.password_digest = changes.password_digest;
        }
        user.updated_at = Utc::now();

        Ok(Some(without_digest(user)))
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|u| u.id == id).map(without_digest))
    }

    async fn find_user_for_login(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .iter()
            .find(|u| u.email.as_ref() == Some(email))
            .cloned())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn create_order(&self) -> Result<Order, RepositoryError> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let order = Order {
            id: OrderId::new(state.next_id()),
            status: OrderStatus::Pending,
            user_id: None,
            created_at: now,
            updated_at: now,
            items: Vec::new(),
        };
        state.orders.push(order.clone());
        Ok(order)
    }

    async fn find_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .orders
            .iter()
            .find(|o| o.id == id)
            .map(|o| state.with_items(o)))
    }

    async fn find_pending_order(&self, user_id: UserId) -> Result<Option<Order>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .orders
            .iter()
            .filter(|o| o.user_id == Some(user_id) && o.status == OrderStatus::Pending)
            .max_by_key(|o| o.updated_at)
            .map(|o| state.with_items(o)))
    }

    async fn assign_order(
        &self,
        id: OrderId,
        user_id: UserId,
    ) -> Result<Option<Order>, RepositoryError> {
        let mut state = self.state.lock().await;
        if !state.users.iter().any(|u| u.id == user_id) {
            return Err(RepositoryError::Rejected(
                "order references a missing record".to_string(),
            ));
        }
        let Some(order) = state.orders.iter_mut().find(|o| o.id == id) else {
            return Ok(None);
        };
        order.user_id = Some(user_id);
        order.updated_at = Utc::now();
        let order = order.clone();
        Ok(Some(state.with_items(&order)))
    }

    async fn insert_item(
        &self,
        order_id: OrderId,
        item: ItemRecord,
    ) -> Result<Item, RepositoryError> {
        let mut state = self.state.lock().await;
        if !state.orders.iter().any(|o| o.id == order_id) {
            return Err(RepositoryError::Rejected(
                "item references a missing record".to_string(),
            ));
        }

        let now = Utc::now();
        let product = match item.product {
            ProductRef::Existing(id) => state
                .products
                .iter()
                .find(|p| p.id == id)
                .cloned()
                .ok_or_else(|| RepositoryError::Rejected(format!("product {id} does not exist")))?,
            ProductRef::New(new) => {
                let product = Product {
                    id: ProductId::new(state.next_id()),
                    title: new.title,
                    description: new.description,
                    price: new.price,
                    inventory: new.inventory,
                    image_url: new.image_url,
                    created_at: now,
                    updated_at: now,
                };
                state.products.push(product.clone());
                product
            }
        };

        let created = Item {
            id: ItemId::new(state.next_id()),
            order_id,
            product_id: product.id,
            quantity: item.quantity,
            price: product.price,
            created_at: now,
            updated_at: now,
            product: None,
        };
        state.items.push(created.clone());

        Ok(Item {
            product: Some(product),
            ..created
        })
    }

    async fn delete_items_for_product(
        &self,
        order_id: OrderId,
        product_id: ProductId,
    ) -> Result<u64, RepositoryError> {
        let mut state = self.state.lock().await;
        let before = state.items.len();
        state
            .items
            .retain(|i| !(i.order_id == order_id && i.product_id == product_id));
        Ok(u64::try_from(before - state.items.len()).unwrap_or(u64::MAX))
    }
}

#[async_trait]
impl OAuthStore for MemoryStore {
    async fn find_user_by_oauth(
        &self,
        provider: OAuthProvider,
        uid: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let state = self.state.lock().await;
        let user_id = state
            .oauths
            .iter()
            .find(|(a, _)| a.provider == provider && a.uid == uid)
            .map(|(_, user_id)| *user_id);
        Ok(user_id.and_then(|id| {
            state
                .users
                .iter()
                .find(|u| u.id == id)
                .map(without_digest)
        }))
    }

    async fn insert_oauth_user(
        &self,
        user: UserRecord,
        account: NewOAuthAccount,
    ) -> Result<User, RepositoryError> {
        {
            let state = self.state.lock().await;
            if state
                .oauths
                .iter()
                .any(|(a, _)| a.provider == account.provider && a.uid == account.uid)
            {
                return Err(RepositoryError::Conflict(
                    "oauth identity already exists".to_string(),
                ));
            }
        }

        let created = self.insert_user(user).await?;
        self.state.lock().await.oauths.push((account, created.id));
        Ok(created)
    }

    async fn refresh_oauth_account(
        &self,
        account: NewOAuthAccount,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        if let Some(entry) = state
            .oauths
            .iter_mut()
            .find(|(a, _)| a.provider == account.provider && a.uid == account.uid)
        {
            entry.0 = account;
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
