use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        Category, InventoryRecord, NewOrderLine, Order, OrderStatus, Product, Review, User,
    },
    routes::params::{ProductSortBy, SortOrder},
};

pub mod db;
pub mod memory;

pub use db::DbStore;
pub use memory::MemoryStore;

/// Catalog listing filter, already normalized by the route layer.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub category: Option<Category>,
    pub featured: Option<bool>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub sort_by: Option<ProductSortBy>,
    pub sort_order: Option<SortOrder>,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    /// `None` lists every user's orders (admin listing).
    pub user_id: Option<Uuid>,
    pub status: Option<OrderStatus>,
    pub sort_order: Option<SortOrder>,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, Default)]
pub struct LedgerFilter {
    pub product_id: Option<Uuid>,
    pub limit: i64,
    pub offset: i64,
}

/// Order-creation input after request validation. Name/price snapshots and
/// the stock checks happen inside the store so they are atomic with the
/// decrement.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Uuid,
    pub lines: Vec<NewOrderLine>,
    pub payment_method: crate::models::PaymentMethod,
    pub contact_name: String,
    pub contact_phone: String,
    pub shipping_address: String,
    pub note: Option<String>,
}

/// Persistence seam. One implementation per storage mode, chosen at startup;
/// request handlers only ever see `dyn Store`.
///
/// Multi-step operations (`place_order`, `cancel_order`, `adjust_stock`)
/// must be atomic: either every stock mutation, ledger row and order row
/// lands, or none of them do.
#[async_trait]
pub trait Store: Send + Sync {
    // users
    async fn insert_user(&self, user: User) -> AppResult<User>;
    async fn user_by_id(&self, id: Uuid) -> AppResult<Option<User>>;
    async fn user_by_email(&self, email: &str) -> AppResult<Option<User>>;
    async fn user_by_reset_token(&self, token: &str) -> AppResult<Option<User>>;
    async fn update_user(&self, user: User) -> AppResult<User>;
    async fn list_users(&self, limit: i64, offset: i64) -> AppResult<(Vec<User>, i64)>;

    // products
    async fn insert_product(&self, product: Product, operator_id: Option<Uuid>)
    -> AppResult<Product>;
    async fn product_by_id(&self, id: Uuid) -> AppResult<Option<Product>>;
    async fn list_products(&self, filter: &ProductFilter) -> AppResult<(Vec<Product>, i64)>;
    /// Non-stock fields only; stock changes go through `adjust_stock`.
    async fn update_product(&self, product: Product) -> AppResult<Product>;
    async fn delete_product(&self, id: Uuid) -> AppResult<bool>;

    // reviews
    async fn insert_review(&self, review: Review) -> AppResult<Review>;
    async fn list_reviews(&self, product_id: Uuid) -> AppResult<Vec<Review>>;

    // orders
    async fn place_order(&self, new_order: NewOrder) -> AppResult<Order>;
    async fn order_by_id(&self, id: Uuid) -> AppResult<Option<Order>>;
    async fn list_orders(&self, filter: &OrderFilter) -> AppResult<(Vec<Order>, i64)>;
    /// Restores stock with compensating ledger rows; rejects orders past
    /// `pending`/`paid`.
    async fn cancel_order(&self, id: Uuid, operator_id: Option<Uuid>) -> AppResult<Order>;
    async fn set_order_status(&self, id: Uuid, status: OrderStatus) -> AppResult<Order>;
    /// Payment settlement: `pending` -> `paid` with `paid_at`.
    async fn mark_order_paid(&self, id: Uuid) -> AppResult<Order>;

    // inventory
    async fn adjust_stock(
        &self,
        product_id: Uuid,
        delta: i32,
        note: Option<String>,
        operator_id: Option<Uuid>,
    ) -> AppResult<(Product, InventoryRecord)>;
    async fn list_inventory(&self, filter: &LedgerFilter)
    -> AppResult<(Vec<InventoryRecord>, i64)>;
    async fn low_stock(
        &self,
        threshold: i32,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<Product>, i64)>;
}
