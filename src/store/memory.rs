use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        InventoryOp, InventoryRecord, Order, OrderItem, OrderStatus, Product, Review, User,
        build_order_number,
    },
    routes::params::{ProductSortBy, SortOrder},
    store::{LedgerFilter, NewOrder, OrderFilter, ProductFilter, Store},
};

#[derive(Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    products: HashMap<Uuid, Product>,
    reviews: Vec<Review>,
    orders: HashMap<Uuid, Order>,
    ledger: Vec<InventoryRecord>,
}

/// Process-local store used when no database is configured.
///
/// Every mutating operation holds the write guard for its whole critical
/// section and validates before touching state, so a failed operation leaves
/// nothing behind and concurrent placements cannot both pass the same stock
/// check.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn page<T: Clone>(items: &[T], limit: i64, offset: i64) -> Vec<T> {
    items
        .iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .cloned()
        .collect()
}

fn ledger_row(
    product: &Product,
    op: InventoryOp,
    quantity: i32,
    previous_stock: i32,
    note: Option<String>,
    operator_id: Option<Uuid>,
) -> InventoryRecord {
    InventoryRecord {
        id: Uuid::new_v4(),
        product_id: product.id,
        op,
        quantity,
        previous_stock,
        current_stock: product.stock,
        note,
        operator_id,
        created_at: Utc::now(),
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, user: User) -> AppResult<User> {
        let mut state = self.inner.write().await;
        if state.users.values().any(|u| u.email == user.email) {
            return Err(AppError::BadRequest("Email is already taken".into()));
        }
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn user_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let state = self.inner.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn user_by_reset_token(&self, token: &str) -> AppResult<Option<User>> {
        let state = self.inner.read().await;
        Ok(state
            .users
            .values()
            .find(|u| u.reset_token.as_deref() == Some(token))
            .cloned())
    }

    async fn update_user(&self, mut user: User) -> AppResult<User> {
        let mut state = self.inner.write().await;
        if !state.users.contains_key(&user.id) {
            return Err(AppError::NotFound);
        }
        user.updated_at = Utc::now();
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn list_users(&self, limit: i64, offset: i64) -> AppResult<(Vec<User>, i64)> {
        let state = self.inner.read().await;
        let mut users: Vec<User> = state.users.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = users.len() as i64;
        Ok((page(&users, limit, offset), total))
    }

    async fn insert_product(
        &self,
        product: Product,
        operator_id: Option<Uuid>,
    ) -> AppResult<Product> {
        let mut state = self.inner.write().await;
        if product.stock > 0 {
            state.ledger.push(ledger_row(
                &product,
                InventoryOp::Add,
                product.stock,
                0,
                Some("initial stock".into()),
                operator_id,
            ));
        }
        state.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn product_by_id(&self, id: Uuid) -> AppResult<Option<Product>> {
        Ok(self.inner.read().await.products.get(&id).cloned())
    }

    async fn list_products(&self, filter: &ProductFilter) -> AppResult<(Vec<Product>, i64)> {
        let state = self.inner.read().await;
        let needle = filter.search.as_ref().map(|s| s.to_lowercase());
        let mut items: Vec<Product> = state
            .products
            .values()
            .filter(|p| {
                if let Some(needle) = needle.as_ref() {
                    let in_name = p.name.to_lowercase().contains(needle);
                    let in_desc = p
                        .description
                        .as_ref()
                        .is_some_and(|d| d.to_lowercase().contains(needle));
                    if !in_name && !in_desc {
                        return false;
                    }
                }
                if let Some(category) = filter.category {
                    if p.category != category {
                        return false;
                    }
                }
                if let Some(featured) = filter.featured {
                    if p.featured != featured {
                        return false;
                    }
                }
                if let Some(min) = filter.min_price {
                    if p.price < min {
                        return false;
                    }
                }
                if let Some(max) = filter.max_price {
                    if p.price > max {
                        return false;
                    }
                }
                true
            })
            .cloned()
            .collect();

        let sort_by = filter.sort_by.unwrap_or(ProductSortBy::CreatedAt);
        items.sort_by(|a, b| match sort_by {
            ProductSortBy::CreatedAt => a.created_at.cmp(&b.created_at),
            ProductSortBy::Price => a.price.cmp(&b.price),
            ProductSortBy::Name => a.name.cmp(&b.name),
        });
        if matches!(filter.sort_order.unwrap_or(SortOrder::Desc), SortOrder::Desc) {
            items.reverse();
        }

        let total = items.len() as i64;
        Ok((page(&items, filter.limit, filter.offset), total))
    }

    async fn update_product(&self, product: Product) -> AppResult<Product> {
        let mut state = self.inner.write().await;
        let existing = state.products.get(&product.id).ok_or(AppError::NotFound)?;
        // stock and review stats are owned by their own operations
        let mut updated = product;
        updated.stock = existing.stock;
        updated.in_stock = existing.in_stock;
        updated.rating = existing.rating;
        updated.num_reviews = existing.num_reviews;
        updated.updated_at = Utc::now();
        state.products.insert(updated.id, updated.clone());
        Ok(updated)
    }

    async fn delete_product(&self, id: Uuid) -> AppResult<bool> {
        let mut state = self.inner.write().await;
        Ok(state.products.remove(&id).is_some())
    }

    async fn insert_review(&self, review: Review) -> AppResult<Review> {
        let mut state = self.inner.write().await;
        if !state.products.contains_key(&review.product_id) {
            return Err(AppError::NotFound);
        }
        let duplicate = state
            .reviews
            .iter()
            .any(|r| r.product_id == review.product_id && r.user_id == review.user_id);
        if duplicate {
            return Err(AppError::Conflict("Product already reviewed".into()));
        }
        state.reviews.push(review.clone());

        let (sum, count) = state
            .reviews
            .iter()
            .filter(|r| r.product_id == review.product_id)
            .fold((0i64, 0i64), |(sum, count), r| {
                (sum + r.rating as i64, count + 1)
            });
        let product = state
            .products
            .get_mut(&review.product_id)
            .ok_or(AppError::NotFound)?;
        product.rating = sum as f64 / count as f64;
        product.num_reviews = count as i32;
        product.updated_at = Utc::now();

        Ok(review)
    }

    async fn list_reviews(&self, product_id: Uuid) -> AppResult<Vec<Review>> {
        let state = self.inner.read().await;
        let mut reviews: Vec<Review> = state
            .reviews
            .iter()
            .filter(|r| r.product_id == product_id)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }

    async fn place_order(&self, new_order: NewOrder) -> AppResult<Order> {
        let mut state = self.inner.write().await;

        // Validate every line before mutating anything, so a late failure
        // cannot leave earlier decrements behind. Quantities are summed per
        // product first; a product repeated across lines must be covered in
        // total, not per line.
        let mut required: HashMap<Uuid, i32> = HashMap::new();
        for line in &new_order.lines {
            if line.quantity <= 0 {
                return Err(AppError::BadRequest("Quantity must be positive".into()));
            }
            *required.entry(line.product_id).or_insert(0) += line.quantity;
        }
        for (product_id, quantity) in &required {
            let product = state
                .products
                .get(product_id)
                .ok_or(AppError::NotFound)?;
            if product.stock < *quantity {
                return Err(AppError::BadRequest(format!(
                    "Insufficient stock for product {}",
                    product.id
                )));
            }
        }

        let order_id = Uuid::new_v4();
        let now = Utc::now();
        let mut items: Vec<OrderItem> = Vec::with_capacity(new_order.lines.len());
        let mut total_amount: i64 = 0;

        for line in &new_order.lines {
            let product = state
                .products
                .get_mut(&line.product_id)
                .ok_or(AppError::NotFound)?;
            let previous_stock = product.stock;
            product.stock -= line.quantity;
            product.in_stock = product.stock > 0;
            product.updated_at = now;

            items.push(OrderItem {
                product_id: product.id,
                name: product.name.clone(),
                price: product.price,
                quantity: line.quantity,
            });
            total_amount += product.price * line.quantity as i64;

            let row = ledger_row(
                product,
                InventoryOp::Remove,
                line.quantity,
                previous_stock,
                Some(format!("order {}", order_id)),
                None,
            );
            state.ledger.push(row);
        }

        let order = Order {
            id: order_id,
            order_number: build_order_number(order_id),
            user_id: new_order.user_id,
            items,
            total_amount,
            status: OrderStatus::Pending,
            payment_method: new_order.payment_method,
            contact_name: new_order.contact_name,
            contact_phone: new_order.contact_phone,
            shipping_address: new_order.shipping_address,
            note: new_order.note,
            paid_at: None,
            shipped_at: None,
            completed_at: None,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
        };
        state.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn order_by_id(&self, id: Uuid) -> AppResult<Option<Order>> {
        Ok(self.inner.read().await.orders.get(&id).cloned())
    }

    async fn list_orders(&self, filter: &OrderFilter) -> AppResult<(Vec<Order>, i64)> {
        let state = self.inner.read().await;
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|o| filter.user_id.is_none_or(|uid| o.user_id == uid))
            .filter(|o| filter.status.is_none_or(|s| o.status == s))
            .cloned()
            .collect();
        orders.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        if matches!(filter.sort_order.unwrap_or(SortOrder::Desc), SortOrder::Desc) {
            orders.reverse();
        }
        let total = orders.len() as i64;
        Ok((page(&orders, filter.limit, filter.offset), total))
    }

    async fn cancel_order(&self, id: Uuid, operator_id: Option<Uuid>) -> AppResult<Order> {
        let mut state = self.inner.write().await;
        let order = state.orders.get(&id).cloned().ok_or(AppError::NotFound)?;
        if !order.status.cancellable() {
            return Err(AppError::BadRequest(format!(
                "Order in status {} cannot be cancelled",
                order.status.as_str()
            )));
        }

        let now = Utc::now();
        for item in &order.items {
            // Products removed from the catalog since purchase get no
            // compensation row.
            let Some(product) = state.products.get_mut(&item.product_id) else {
                continue;
            };
            let previous_stock = product.stock;
            product.stock += item.quantity;
            product.in_stock = product.stock > 0;
            product.updated_at = now;
            let row = ledger_row(
                product,
                InventoryOp::Add,
                item.quantity,
                previous_stock,
                Some(format!("cancel order {}", order.id)),
                operator_id,
            );
            state.ledger.push(row);
        }

        let order = state.orders.get_mut(&id).ok_or(AppError::NotFound)?;
        order.status = OrderStatus::Cancelled;
        order.cancelled_at = Some(now);
        order.updated_at = now;
        Ok(order.clone())
    }

    async fn set_order_status(&self, id: Uuid, status: OrderStatus) -> AppResult<Order> {
        let mut state = self.inner.write().await;
        let order = state.orders.get_mut(&id).ok_or(AppError::NotFound)?;
        let now = Utc::now();
        order.status = status;
        match status {
            OrderStatus::Paid => order.paid_at = Some(now),
            OrderStatus::Shipped => order.shipped_at = Some(now),
            OrderStatus::Completed => order.completed_at = Some(now),
            OrderStatus::Cancelled => order.cancelled_at = Some(now),
            _ => {}
        }
        order.updated_at = now;
        Ok(order.clone())
    }

    async fn mark_order_paid(&self, id: Uuid) -> AppResult<Order> {
        let mut state = self.inner.write().await;
        let order = state.orders.get_mut(&id).ok_or(AppError::NotFound)?;
        if order.status != OrderStatus::Pending {
            return Err(AppError::BadRequest("Order is not payable".into()));
        }
        let now = Utc::now();
        order.status = OrderStatus::Paid;
        order.paid_at = Some(now);
        order.updated_at = now;
        Ok(order.clone())
    }

    async fn adjust_stock(
        &self,
        product_id: Uuid,
        delta: i32,
        note: Option<String>,
        operator_id: Option<Uuid>,
    ) -> AppResult<(Product, InventoryRecord)> {
        let mut state = self.inner.write().await;
        let product = state
            .products
            .get_mut(&product_id)
            .ok_or(AppError::NotFound)?;
        let previous_stock = product.stock;
        let new_stock = previous_stock + delta;
        if new_stock < 0 {
            return Err(AppError::BadRequest("stock cannot be negative".into()));
        }
        product.stock = new_stock;
        product.in_stock = new_stock > 0;
        product.updated_at = Utc::now();
        let row = ledger_row(
            product,
            InventoryOp::Adjust,
            delta,
            previous_stock,
            note,
            operator_id,
        );
        let product = product.clone();
        state.ledger.push(row.clone());
        Ok((product, row))
    }

    async fn list_inventory(
        &self,
        filter: &LedgerFilter,
    ) -> AppResult<(Vec<InventoryRecord>, i64)> {
        let state = self.inner.read().await;
        let mut records: Vec<InventoryRecord> = state
            .ledger
            .iter()
            .filter(|r| filter.product_id.is_none_or(|pid| r.product_id == pid))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = records.len() as i64;
        Ok((page(&records, filter.limit, filter.offset), total))
    }

    async fn low_stock(
        &self,
        threshold: i32,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<Product>, i64)> {
        let state = self.inner.read().await;
        let mut items: Vec<Product> = state
            .products
            .values()
            .filter(|p| p.stock <= threshold)
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            a.stock
                .cmp(&b.stock)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        let total = items.len() as i64;
        Ok((page(&items, limit, offset), total))
    }
}
