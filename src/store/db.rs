use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::sea_query::LockType;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use uuid::Uuid;

use crate::{
    db::DbPool,
    entity::{
        inventory_records::{
            ActiveModel as RecordActive, Column as RecordCol, Entity as InventoryRecords,
            Model as RecordModel,
        },
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{
            ActiveModel as ProductActive, Column as ProdCol, Entity as Products,
            Model as ProductModel,
        },
        reviews::{ActiveModel as ReviewActive, Column as ReviewCol, Entity as Reviews, Model as ReviewModel},
    },
    error::{AppError, AppResult},
    models::{
        Category, InventoryOp, InventoryRecord, Order, OrderItem, OrderStatus, PaymentMethod,
        Product, Review, User, build_order_number,
    },
    routes::params::{ProductSortBy, SortOrder},
    store::{LedgerFilter, NewOrder, OrderFilter, ProductFilter, Store},
};

/// PostgreSQL-backed store. User rows go through the sqlx pool, catalog and
/// order flows through SeaORM; the multi-step flows run inside a transaction
/// with `FOR UPDATE` row locks so concurrent placements against the same
/// product serialize instead of racing.
pub struct DbStore {
    pool: DbPool,
    orm: DatabaseConnection,
}

impl DbStore {
    pub fn new(pool: DbPool, orm: DatabaseConnection) -> Self {
        Self { pool, orm }
    }

    async fn write_ledger_row<C: ConnectionTrait>(
        conn: &C,
        product: &ProductModel,
        op: InventoryOp,
        quantity: i32,
        previous_stock: i32,
        note: Option<String>,
        operator_id: Option<Uuid>,
    ) -> AppResult<RecordModel> {
        let record = RecordActive {
            id: Set(Uuid::new_v4()),
            product_id: Set(product.id),
            op: Set(op.as_str().to_string()),
            quantity: Set(quantity),
            previous_stock: Set(previous_stock),
            current_stock: Set(product.stock),
            note: Set(note),
            operator_id: Set(operator_id),
            created_at: NotSet,
        }
        .insert(conn)
        .await?;
        Ok(record)
    }

    async fn order_items_for(&self, order_ids: &[Uuid]) -> AppResult<HashMap<Uuid, Vec<OrderItem>>> {
        let models = OrderItems::find()
            .filter(OrderItemCol::OrderId.is_in(order_ids.to_vec()))
            .all(&self.orm)
            .await?;
        let mut by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for model in models {
            by_order
                .entry(model.order_id)
                .or_default()
                .push(item_from_entity(model));
        }
        Ok(by_order)
    }
}

#[async_trait]
impl Store for DbStore {
    async fn insert_user(&self, user: User) -> AppResult<User> {
        let inserted: User = sqlx::query_as(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, phone, address, active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.role)
        .bind(&user.phone)
        .bind(&user.address)
        .bind(user.active)
        .fetch_one(&self.pool)
        .await?;
        Ok(inserted)
    }

    async fn user_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn user_by_reset_token(&self, token: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE reset_token = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn update_user(&self, user: User) -> AppResult<User> {
        let updated: Option<User> = sqlx::query_as(
            r#"
            UPDATE users
            SET name = $2, password_hash = $3, phone = $4, address = $5,
                reset_token = $6, reset_token_expires_at = $7, active = $8,
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(&user.phone)
        .bind(&user.address)
        .bind(&user.reset_token)
        .bind(user.reset_token_expires_at)
        .bind(user.active)
        .fetch_optional(&self.pool)
        .await?;
        updated.ok_or(AppError::NotFound)
    }

    async fn list_users(&self, limit: i64, offset: i64) -> AppResult<(Vec<User>, i64)> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        let total: (i64,) = sqlx::query_as("SELECT count(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok((users, total.0))
    }

    async fn insert_product(
        &self,
        product: Product,
        operator_id: Option<Uuid>,
    ) -> AppResult<Product> {
        let txn = self.orm.begin().await?;
        let model = ProductActive {
            id: Set(product.id),
            name: Set(product.name),
            description: Set(product.description),
            price: Set(product.price),
            category: Set(product.category.as_str().to_string()),
            stock: Set(product.stock),
            featured: Set(product.featured),
            rating: Set(0.0),
            num_reviews: Set(0),
            created_at: NotSet,
            updated_at: NotSet,
        }
        .insert(&txn)
        .await?;

        if model.stock > 0 {
            Self::write_ledger_row(
                &txn,
                &model,
                InventoryOp::Add,
                model.stock,
                0,
                Some("initial stock".into()),
                operator_id,
            )
            .await?;
        }
        txn.commit().await?;
        product_from_entity(model)
    }

    async fn product_by_id(&self, id: Uuid) -> AppResult<Option<Product>> {
        let model = Products::find_by_id(id).one(&self.orm).await?;
        model.map(product_from_entity).transpose()
    }

    async fn list_products(&self, filter: &ProductFilter) -> AppResult<(Vec<Product>, i64)> {
        let mut condition = Condition::all();

        if let Some(search) = filter.search.as_ref().filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", search);
            condition = condition.add(
                Condition::any()
                    .add(Expr::col(ProdCol::Name).ilike(pattern.clone()))
                    .add(Expr::col(ProdCol::Description).ilike(pattern)),
            );
        }
        if let Some(category) = filter.category {
            condition = condition.add(ProdCol::Category.eq(category.as_str()));
        }
        if let Some(featured) = filter.featured {
            condition = condition.add(ProdCol::Featured.eq(featured));
        }
        if let Some(min_price) = filter.min_price {
            condition = condition.add(ProdCol::Price.gte(min_price));
        }
        if let Some(max_price) = filter.max_price {
            condition = condition.add(ProdCol::Price.lte(max_price));
        }

        let sort_by = filter.sort_by.unwrap_or(ProductSortBy::CreatedAt);
        let sort_col = match sort_by {
            ProductSortBy::CreatedAt => ProdCol::CreatedAt,
            ProductSortBy::Price => ProdCol::Price,
            ProductSortBy::Name => ProdCol::Name,
        };

        let mut finder = Products::find().filter(condition);
        finder = match filter.sort_order.unwrap_or(SortOrder::Desc) {
            SortOrder::Asc => finder.order_by_asc(sort_col),
            SortOrder::Desc => finder.order_by_desc(sort_col),
        };

        let total = finder.clone().count(&self.orm).await? as i64;

        let items = finder
            .limit(filter.limit as u64)
            .offset(filter.offset as u64)
            .all(&self.orm)
            .await?
            .into_iter()
            .map(product_from_entity)
            .collect::<AppResult<Vec<_>>>()?;

        Ok((items, total))
    }

    async fn update_product(&self, product: Product) -> AppResult<Product> {
        let existing = Products::find_by_id(product.id).one(&self.orm).await?;
        let existing = match existing {
            Some(p) => p,
            None => return Err(AppError::NotFound),
        };

        let mut active: ProductActive = existing.into();
        active.name = Set(product.name);
        active.description = Set(product.description);
        active.price = Set(product.price);
        active.category = Set(product.category.as_str().to_string());
        active.featured = Set(product.featured);
        active.updated_at = Set(Utc::now().into());
        let model = active.update(&self.orm).await?;
        product_from_entity(model)
    }

    async fn delete_product(&self, id: Uuid) -> AppResult<bool> {
        let result = Products::delete_by_id(id).exec(&self.orm).await?;
        Ok(result.rows_affected > 0)
    }

    async fn insert_review(&self, review: Review) -> AppResult<Review> {
        let txn = self.orm.begin().await?;

        let product = Products::find_by_id(review.product_id)
            .lock(LockType::Update)
            .one(&txn)
            .await?;
        let product = match product {
            Some(p) => p,
            None => return Err(AppError::NotFound),
        };

        let duplicate = Reviews::find()
            .filter(
                Condition::all()
                    .add(ReviewCol::ProductId.eq(review.product_id))
                    .add(ReviewCol::UserId.eq(review.user_id)),
            )
            .count(&txn)
            .await?;
        if duplicate > 0 {
            return Err(AppError::Conflict("Product already reviewed".into()));
        }

        let inserted = ReviewActive {
            id: Set(review.id),
            product_id: Set(review.product_id),
            user_id: Set(review.user_id),
            rating: Set(review.rating),
            comment: Set(review.comment),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;

        let all = Reviews::find()
            .filter(ReviewCol::ProductId.eq(review.product_id))
            .all(&txn)
            .await?;
        let count = all.len() as i64;
        let sum: i64 = all.iter().map(|r| r.rating as i64).sum();

        let mut active: ProductActive = product.into();
        active.rating = Set(sum as f64 / count as f64);
        active.num_reviews = Set(count as i32);
        active.updated_at = Set(Utc::now().into());
        active.update(&txn).await?;

        txn.commit().await?;
        Ok(review_from_entity(inserted))
    }

    async fn list_reviews(&self, product_id: Uuid) -> AppResult<Vec<Review>> {
        let reviews = Reviews::find()
            .filter(ReviewCol::ProductId.eq(product_id))
            .order_by_desc(ReviewCol::CreatedAt)
            .all(&self.orm)
            .await?
            .into_iter()
            .map(review_from_entity)
            .collect();
        Ok(reviews)
    }

    async fn place_order(&self, new_order: NewOrder) -> AppResult<Order> {
        let txn = self.orm.begin().await?;

        let order_id = Uuid::new_v4();
        let mut total_amount: i64 = 0;
        let mut items: Vec<OrderItem> = Vec::with_capacity(new_order.lines.len());

        // Row locks serialize concurrent placements per product; any error
        // before commit rolls the whole transaction back.
        for line in &new_order.lines {
            if line.quantity <= 0 {
                return Err(AppError::BadRequest("Quantity must be positive".into()));
            }
            let product = Products::find_by_id(line.product_id)
                .lock(LockType::Update)
                .one(&txn)
                .await?;
            let product = match product {
                Some(p) => p,
                None => return Err(AppError::NotFound),
            };
            if product.stock < line.quantity {
                return Err(AppError::BadRequest(format!(
                    "Insufficient stock for product {}",
                    product.id
                )));
            }

            let previous_stock = product.stock;
            let mut active: ProductActive = product.clone().into();
            active.stock = Set(previous_stock - line.quantity);
            active.updated_at = Set(Utc::now().into());
            let updated = active.update(&txn).await?;

            Self::write_ledger_row(
                &txn,
                &updated,
                InventoryOp::Remove,
                line.quantity,
                previous_stock,
                Some(format!("order {}", order_id)),
                None,
            )
            .await?;

            total_amount += updated.price * line.quantity as i64;
            items.push(OrderItem {
                product_id: updated.id,
                name: updated.name.clone(),
                price: updated.price,
                quantity: line.quantity,
            });
        }

        let order = OrderActive {
            id: Set(order_id),
            order_number: Set(build_order_number(order_id)),
            user_id: Set(new_order.user_id),
            total_amount: Set(total_amount),
            status: Set(OrderStatus::Pending.as_str().to_string()),
            payment_method: Set(new_order.payment_method.as_str().to_string()),
            contact_name: Set(new_order.contact_name),
            contact_phone: Set(new_order.contact_phone),
            shipping_address: Set(new_order.shipping_address),
            note: Set(new_order.note),
            paid_at: Set(None),
            shipped_at: Set(None),
            completed_at: Set(None),
            cancelled_at: Set(None),
            created_at: NotSet,
            updated_at: NotSet,
        }
        .insert(&txn)
        .await?;

        for item in &items {
            OrderItemActive {
                id: Set(Uuid::new_v4()),
                order_id: Set(order.id),
                product_id: Set(item.product_id),
                name: Set(item.name.clone()),
                price: Set(item.price),
                quantity: Set(item.quantity),
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;
        order_from_entity(order, items)
    }

    async fn order_by_id(&self, id: Uuid) -> AppResult<Option<Order>> {
        let model = Orders::find_by_id(id).one(&self.orm).await?;
        let model = match model {
            Some(m) => m,
            None => return Ok(None),
        };
        let items = OrderItems::find()
            .filter(OrderItemCol::OrderId.eq(model.id))
            .all(&self.orm)
            .await?
            .into_iter()
            .map(item_from_entity)
            .collect();
        Ok(Some(order_from_entity(model, items)?))
    }

    async fn list_orders(&self, filter: &OrderFilter) -> AppResult<(Vec<Order>, i64)> {
        let mut condition = Condition::all();
        if let Some(user_id) = filter.user_id {
            condition = condition.add(OrderCol::UserId.eq(user_id));
        }
        if let Some(status) = filter.status {
            condition = condition.add(OrderCol::Status.eq(status.as_str()));
        }

        let mut finder = Orders::find().filter(condition);
        finder = match filter.sort_order.unwrap_or(SortOrder::Desc) {
            SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
            SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
        };

        let total = finder.clone().count(&self.orm).await? as i64;

        let models = finder
            .limit(filter.limit as u64)
            .offset(filter.offset as u64)
            .all(&self.orm)
            .await?;

        let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
        let mut by_order = self.order_items_for(&ids).await?;

        let orders = models
            .into_iter()
            .map(|m| {
                let items = by_order.remove(&m.id).unwrap_or_default();
                order_from_entity(m, items)
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok((orders, total))
    }

    async fn cancel_order(&self, id: Uuid, operator_id: Option<Uuid>) -> AppResult<Order> {
        let txn = self.orm.begin().await?;

        let order = Orders::find_by_id(id)
            .lock(LockType::Update)
            .one(&txn)
            .await?;
        let order = match order {
            Some(o) => o,
            None => return Err(AppError::NotFound),
        };
        let status = order_status(&order)?;
        if !status.cancellable() {
            return Err(AppError::BadRequest(format!(
                "Order in status {} cannot be cancelled",
                status.as_str()
            )));
        }

        let item_models = OrderItems::find()
            .filter(OrderItemCol::OrderId.eq(order.id))
            .all(&txn)
            .await?;

        for item in &item_models {
            let product = Products::find_by_id(item.product_id)
                .lock(LockType::Update)
                .one(&txn)
                .await?;
            // Products removed from the catalog since purchase get no
            // compensation row.
            let Some(product) = product else {
                continue;
            };
            let previous_stock = product.stock;
            let mut active: ProductActive = product.into();
            active.stock = Set(previous_stock + item.quantity);
            active.updated_at = Set(Utc::now().into());
            let updated = active.update(&txn).await?;

            Self::write_ledger_row(
                &txn,
                &updated,
                InventoryOp::Add,
                item.quantity,
                previous_stock,
                Some(format!("cancel order {}", order.id)),
                operator_id,
            )
            .await?;
        }

        let mut active: OrderActive = order.into();
        active.status = Set(OrderStatus::Cancelled.as_str().to_string());
        active.cancelled_at = Set(Some(Utc::now().into()));
        active.updated_at = Set(Utc::now().into());
        let order = active.update(&txn).await?;

        txn.commit().await?;
        order_from_entity(order, item_models.into_iter().map(item_from_entity).collect())
    }

    async fn set_order_status(&self, id: Uuid, status: OrderStatus) -> AppResult<Order> {
        let existing = Orders::find_by_id(id).one(&self.orm).await?;
        let existing = match existing {
            Some(o) => o,
            None => return Err(AppError::NotFound),
        };

        let now = Utc::now();
        let mut active: OrderActive = existing.into();
        active.status = Set(status.as_str().to_string());
        match status {
            OrderStatus::Paid => active.paid_at = Set(Some(now.into())),
            OrderStatus::Shipped => active.shipped_at = Set(Some(now.into())),
            OrderStatus::Completed => active.completed_at = Set(Some(now.into())),
            OrderStatus::Cancelled => active.cancelled_at = Set(Some(now.into())),
            _ => {}
        }
        active.updated_at = Set(now.into());
        let order = active.update(&self.orm).await?;

        let items = OrderItems::find()
            .filter(OrderItemCol::OrderId.eq(order.id))
            .all(&self.orm)
            .await?
            .into_iter()
            .map(item_from_entity)
            .collect();
        order_from_entity(order, items)
    }

    async fn mark_order_paid(&self, id: Uuid) -> AppResult<Order> {
        let txn = self.orm.begin().await?;

        let order = Orders::find_by_id(id)
            .lock(LockType::Update)
            .one(&txn)
            .await?;
        let order = match order {
            Some(o) => o,
            None => return Err(AppError::NotFound),
        };
        if order_status(&order)? != OrderStatus::Pending {
            return Err(AppError::BadRequest("Order is not payable".into()));
        }

        let now = Utc::now();
        let mut active: OrderActive = order.into();
        active.status = Set(OrderStatus::Paid.as_str().to_string());
        active.paid_at = Set(Some(now.into()));
        active.updated_at = Set(now.into());
        let order = active.update(&txn).await?;

        txn.commit().await?;

        let items = OrderItems::find()
            .filter(OrderItemCol::OrderId.eq(order.id))
            .all(&self.orm)
            .await?
            .into_iter()
            .map(item_from_entity)
            .collect();
        order_from_entity(order, items)
    }

    async fn adjust_stock(
        &self,
        product_id: Uuid,
        delta: i32,
        note: Option<String>,
        operator_id: Option<Uuid>,
    ) -> AppResult<(Product, InventoryRecord)> {
        let txn = self.orm.begin().await?;

        let product = Products::find_by_id(product_id)
            .lock(LockType::Update)
            .one(&txn)
            .await?;
        let product = match product {
            Some(p) => p,
            None => return Err(AppError::NotFound),
        };

        let previous_stock = product.stock;
        let new_stock = previous_stock + delta;
        if new_stock < 0 {
            return Err(AppError::BadRequest("stock cannot be negative".into()));
        }

        let mut active: ProductActive = product.into();
        active.stock = Set(new_stock);
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await?;

        let record = Self::write_ledger_row(
            &txn,
            &updated,
            InventoryOp::Adjust,
            delta,
            previous_stock,
            note,
            operator_id,
        )
        .await?;

        txn.commit().await?;
        Ok((product_from_entity(updated)?, record_from_entity(record)?))
    }

    async fn list_inventory(
        &self,
        filter: &LedgerFilter,
    ) -> AppResult<(Vec<InventoryRecord>, i64)> {
        let mut condition = Condition::all();
        if let Some(product_id) = filter.product_id {
            condition = condition.add(RecordCol::ProductId.eq(product_id));
        }

        let finder = InventoryRecords::find()
            .filter(condition)
            .order_by_desc(RecordCol::CreatedAt);

        let total = finder.clone().count(&self.orm).await? as i64;

        let records = finder
            .limit(filter.limit as u64)
            .offset(filter.offset as u64)
            .all(&self.orm)
            .await?
            .into_iter()
            .map(record_from_entity)
            .collect::<AppResult<Vec<_>>>()?;

        Ok((records, total))
    }

    async fn low_stock(
        &self,
        threshold: i32,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<Product>, i64)> {
        let finder = Products::find()
            .filter(ProdCol::Stock.lte(threshold))
            .order_by_asc(ProdCol::Stock)
            .order_by_desc(ProdCol::CreatedAt);

        let total = finder.clone().count(&self.orm).await? as i64;

        let items = finder
            .limit(limit as u64)
            .offset(offset as u64)
            .all(&self.orm)
            .await?
            .into_iter()
            .map(product_from_entity)
            .collect::<AppResult<Vec<_>>>()?;

        Ok((items, total))
    }
}

fn product_from_entity(model: ProductModel) -> AppResult<Product> {
    let category = Category::parse(&model.category).ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!("unknown category {}", model.category))
    })?;
    Ok(Product {
        id: model.id,
        name: model.name,
        description: model.description,
        price: model.price,
        category,
        stock: model.stock,
        in_stock: model.stock > 0,
        featured: model.featured,
        rating: model.rating,
        num_reviews: model.num_reviews,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

fn review_from_entity(model: ReviewModel) -> Review {
    Review {
        id: model.id,
        product_id: model.product_id,
        user_id: model.user_id,
        rating: model.rating,
        comment: model.comment,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        product_id: model.product_id,
        name: model.name,
        price: model.price,
        quantity: model.quantity,
    }
}

fn order_status(model: &OrderModel) -> AppResult<OrderStatus> {
    OrderStatus::parse(&model.status)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("unknown order status {}", model.status)))
}

fn order_from_entity(model: OrderModel, items: Vec<OrderItem>) -> AppResult<Order> {
    let status = order_status(&model)?;
    let payment_method = PaymentMethod::parse(&model.payment_method).ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!(
            "unknown payment method {}",
            model.payment_method
        ))
    })?;
    Ok(Order {
        id: model.id,
        order_number: model.order_number,
        user_id: model.user_id,
        items,
        total_amount: model.total_amount,
        status,
        payment_method,
        contact_name: model.contact_name,
        contact_phone: model.contact_phone,
        shipping_address: model.shipping_address,
        note: model.note,
        paid_at: model.paid_at.map(|dt| dt.with_timezone(&Utc)),
        shipped_at: model.shipped_at.map(|dt| dt.with_timezone(&Utc)),
        completed_at: model.completed_at.map(|dt| dt.with_timezone(&Utc)),
        cancelled_at: model.cancelled_at.map(|dt| dt.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

fn record_from_entity(model: RecordModel) -> AppResult<InventoryRecord> {
    let op = InventoryOp::parse(&model.op)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("unknown ledger op {}", model.op)))?;
    Ok(InventoryRecord {
        id: model.id,
        product_id: model.product_id,
        op,
        quantity: model.quantity,
        previous_stock: model.previous_stock,
        current_stock: model.current_stock,
        note: model.note,
        operator_id: model.operator_id,
        created_at: model.created_at.with_timezone(&Utc),
    })
}
