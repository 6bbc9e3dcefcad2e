use std::sync::Arc;

use chrono::Utc;
use coffeehouse_api::{
    config::AppConfig,
    dto::{
        orders::{CreateOrderRequest, UpdateOrderStatusRequest},
        products::CreateProductRequest,
    },
    error::AppError,
    middleware::auth::AuthUser,
    models::{Category, InventoryOp, NewOrderLine, OrderStatus, PaymentMethod, Product, User},
    routes::params::{LedgerQuery, Pagination, OrderListQuery},
    services::{inventory_service, order_service, payment_service, product_service},
    state::AppState,
    store::MemoryStore,
};
use uuid::Uuid;

fn memory_state() -> AppState {
    let config = AppConfig {
        database_url: None,
        use_memory_db: true,
        jwt_secret: "test-secret".into(),
        jwt_expiry_hours: 24,
        cors_origin: None,
        host: "127.0.0.1".into(),
        port: 0,
    };
    AppState::new(Arc::new(MemoryStore::new()), config)
}

async fn create_user(state: &AppState, role: &str, email: &str) -> anyhow::Result<AuthUser> {
    let now = Utc::now();
    let user = state
        .store
        .insert_user(User {
            id: Uuid::new_v4(),
            name: "Test Account".into(),
            email: email.into(),
            password_hash: "dummy".into(),
            role: role.into(),
            phone: None,
            address: None,
            reset_token: None,
            reset_token_expires_at: None,
            active: true,
            created_at: now,
            updated_at: now,
        })
        .await?;
    Ok(AuthUser {
        user_id: user.id,
        role: role.into(),
    })
}

async fn create_product(
    state: &AppState,
    admin: &AuthUser,
    name: &str,
    price: i64,
    stock: i32,
) -> anyhow::Result<Product> {
    let resp = product_service::create_product(
        state,
        admin,
        CreateProductRequest {
            name: name.into(),
            description: Some("A product for testing".into()),
            price,
            category: Category::Beans,
            stock,
            featured: false,
        },
    )
    .await?;
    Ok(resp.data.expect("product"))
}

fn order_request(lines: Vec<NewOrderLine>) -> CreateOrderRequest {
    CreateOrderRequest {
        items: lines,
        payment_method: PaymentMethod::Card,
        contact_name: "Sam Roaster".into(),
        contact_phone: "555-0100".into(),
        shipping_address: "1 Bean St".into(),
        note: None,
    }
}

fn wide_ledger_query(product_id: Uuid) -> LedgerQuery {
    LedgerQuery {
        pagination: Pagination {
            page: Some(1),
            per_page: Some(100),
        },
        product_id: Some(product_id),
    }
}

#[tokio::test]
async fn placing_an_order_decrements_stock_and_writes_one_ledger_row() -> anyhow::Result<()> {
    let state = memory_state();
    let user = create_user(&state, "user", "user@example.com").await?;
    let admin = create_user(&state, "admin", "admin@example.com").await?;
    let product = create_product(&state, &admin, "Test Beans", 1000, 5).await?;

    let resp = order_service::create_order(
        &state,
        &user,
        order_request(vec![NewOrderLine {
            product_id: product.id,
            quantity: 3,
        }]),
    )
    .await?;
    let order = resp.data.expect("order");

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total_amount, 3000);
    assert!(order.order_number.starts_with("ORD-"));

    // total always equals the sum of the line snapshots
    let line_sum: i64 = order
        .items
        .iter()
        .map(|i| i.price * i.quantity as i64)
        .sum();
    assert_eq!(line_sum, order.total_amount);

    let after = product_service::get_product(&state, product.id)
        .await?
        .data
        .expect("product");
    assert_eq!(after.stock, 2);
    assert!(after.in_stock);

    let ledger = inventory_service::list_ledger(&state, &admin, wide_ledger_query(product.id))
        .await?
        .data
        .expect("ledger")
        .items;
    let removes: Vec<_> = ledger
        .iter()
        .filter(|r| r.op == InventoryOp::Remove)
        .collect();
    assert_eq!(removes.len(), 1);
    assert_eq!(removes[0].quantity, 3);
    assert_eq!(removes[0].previous_stock, 5);
    assert_eq!(removes[0].current_stock, 2);

    Ok(())
}

#[tokio::test]
async fn failed_orders_leave_no_partial_state() -> anyhow::Result<()> {
    let state = memory_state();
    let user = create_user(&state, "user", "user@example.com").await?;
    let admin = create_user(&state, "admin", "admin@example.com").await?;
    let first = create_product(&state, &admin, "First", 500, 10).await?;
    let second = create_product(&state, &admin, "Second", 700, 1).await?;

    // second line exceeds stock; the first line must not be decremented
    let err = order_service::create_order(
        &state,
        &user,
        order_request(vec![
            NewOrderLine {
                product_id: first.id,
                quantity: 2,
            },
            NewOrderLine {
                product_id: second.id,
                quantity: 5,
            },
        ]),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = order_service::create_order(
        &state,
        &user,
        order_request(vec![NewOrderLine {
            product_id: Uuid::new_v4(),
            quantity: 1,
        }]),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    for product in [&first, &second] {
        let current = product_service::get_product(&state, product.id)
            .await?
            .data
            .expect("product");
        assert_eq!(current.stock, product.stock);

        let ledger = inventory_service::list_ledger(&state, &admin, wide_ledger_query(product.id))
            .await?
            .data
            .expect("ledger")
            .items;
        // only the opening-stock row
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].op, InventoryOp::Add);
    }

    let orders = order_service::list_my_orders(
        &state,
        &user,
        OrderListQuery {
            pagination: Pagination {
                page: Some(1),
                per_page: Some(20),
            },
            status: None,
            sort_order: None,
        },
    )
    .await?
    .data
    .expect("orders")
    .items;
    assert!(orders.is_empty());

    Ok(())
}

#[tokio::test]
async fn cancelling_restores_stock_with_compensating_rows() -> anyhow::Result<()> {
    let state = memory_state();
    let user = create_user(&state, "user", "user@example.com").await?;
    let admin = create_user(&state, "admin", "admin@example.com").await?;
    let product = create_product(&state, &admin, "Test Beans", 1000, 5).await?;

    let order = order_service::create_order(
        &state,
        &user,
        order_request(vec![NewOrderLine {
            product_id: product.id,
            quantity: 3,
        }]),
    )
    .await?
    .data
    .expect("order");

    let cancelled = order_service::cancel_order(&state, &user, order.id)
        .await?
        .data
        .expect("order");
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert!(cancelled.cancelled_at.is_some());

    let after = product_service::get_product(&state, product.id)
        .await?
        .data
        .expect("product");
    assert_eq!(after.stock, 5);

    let ledger = inventory_service::list_ledger(&state, &admin, wide_ledger_query(product.id))
        .await?
        .data
        .expect("ledger")
        .items;
    let adds: Vec<_> = ledger
        .iter()
        .filter(|r| r.op == InventoryOp::Add && r.note.as_deref() != Some("initial stock"))
        .collect();
    assert_eq!(adds.len(), 1);
    assert_eq!(adds[0].quantity, 3);
    assert_eq!(adds[0].previous_stock, 2);
    assert_eq!(adds[0].current_stock, 5);

    // a cancelled order cannot be cancelled again
    let err = order_service::cancel_order(&state, &user, order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    Ok(())
}

#[tokio::test]
async fn cancellation_is_rejected_once_fulfilment_started() -> anyhow::Result<()> {
    let state = memory_state();
    let user = create_user(&state, "user", "user@example.com").await?;
    let admin = create_user(&state, "admin", "admin@example.com").await?;
    let product = create_product(&state, &admin, "Test Beans", 1000, 5).await?;

    for status in ["completed", "refunded"] {
        let order = order_service::create_order(
            &state,
            &user,
            order_request(vec![NewOrderLine {
                product_id: product.id,
                quantity: 1,
            }]),
        )
        .await?
        .data
        .expect("order");

        order_service::update_status(
            &state,
            &admin,
            order.id,
            UpdateOrderStatusRequest {
                status: status.into(),
            },
        )
        .await?;

        let err = order_service::cancel_order(&state, &user, order.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)), "status {status}");
    }

    Ok(())
}

#[tokio::test]
async fn admin_status_updates_are_unrestricted_but_validated() -> anyhow::Result<()> {
    let state = memory_state();
    let user = create_user(&state, "user", "user@example.com").await?;
    let admin = create_user(&state, "admin", "admin@example.com").await?;
    let product = create_product(&state, &admin, "Test Beans", 1000, 5).await?;

    let order = order_service::create_order(
        &state,
        &user,
        order_request(vec![NewOrderLine {
            product_id: product.id,
            quantity: 1,
        }]),
    )
    .await?
    .data
    .expect("order");

    let shipped = order_service::update_status(
        &state,
        &admin,
        order.id,
        UpdateOrderStatusRequest {
            status: "shipped".into(),
        },
    )
    .await?
    .data
    .expect("order");
    assert_eq!(shipped.status, OrderStatus::Shipped);
    assert!(shipped.shipped_at.is_some());

    // no transition table: jumping backwards is allowed
    let reopened = order_service::update_status(
        &state,
        &admin,
        order.id,
        UpdateOrderStatusRequest {
            status: "pending".into(),
        },
    )
    .await?
    .data
    .expect("order");
    assert_eq!(reopened.status, OrderStatus::Pending);

    let err = order_service::update_status(
        &state,
        &admin,
        order.id,
        UpdateOrderStatusRequest {
            status: "misplaced".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    // non-admins cannot touch statuses
    let err = order_service::update_status(
        &state,
        &user,
        order.id,
        UpdateOrderStatusRequest {
            status: "paid".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    Ok(())
}

#[tokio::test]
async fn payment_intent_and_settlement() -> anyhow::Result<()> {
    let state = memory_state();
    let user = create_user(&state, "user", "user@example.com").await?;
    let admin = create_user(&state, "admin", "admin@example.com").await?;
    let product = create_product(&state, &admin, "Test Beans", 1500, 5).await?;

    let order = order_service::create_order(
        &state,
        &user,
        order_request(vec![NewOrderLine {
            product_id: product.id,
            quantity: 2,
        }]),
    )
    .await?
    .data
    .expect("order");

    let intent = payment_service::create_intent(&state, &user, order.id)
        .await?
        .data
        .expect("intent");
    assert_eq!(intent.amount, 3000);
    assert!(intent.payment_id.starts_with("PAY-"));

    let paid = state.store.mark_order_paid(order.id).await?;
    assert_eq!(paid.status, OrderStatus::Paid);
    assert!(paid.paid_at.is_some());

    // settled orders are neither payable again...
    let err = payment_service::create_intent(&state, &user, order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    let err = state.store.mark_order_paid(order.id).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    // ...but still cancellable
    let cancelled = order_service::cancel_order(&state, &user, order.id)
        .await?
        .data
        .expect("order");
    assert_eq!(cancelled.status, OrderStatus::Cancelled);

    Ok(())
}

#[tokio::test]
async fn orders_are_scoped_to_their_owner() -> anyhow::Result<()> {
    let state = memory_state();
    let user = create_user(&state, "user", "user@example.com").await?;
    let other = create_user(&state, "user", "other@example.com").await?;
    let admin = create_user(&state, "admin", "admin@example.com").await?;
    let product = create_product(&state, &admin, "Test Beans", 1000, 5).await?;

    let order = order_service::create_order(
        &state,
        &user,
        order_request(vec![NewOrderLine {
            product_id: product.id,
            quantity: 1,
        }]),
    )
    .await?
    .data
    .expect("order");

    let err = order_service::get_order(&state, &other, order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    // admins can see and list everything
    let fetched = order_service::get_order(&state, &admin, order.id).await?;
    assert_eq!(fetched.data.expect("order").id, order.id);

    let all = order_service::list_all_orders(
        &state,
        &admin,
        OrderListQuery {
            pagination: Pagination {
                page: Some(1),
                per_page: Some(20),
            },
            status: None,
            sort_order: None,
        },
    )
    .await?
    .data
    .expect("orders")
    .items;
    assert_eq!(all.len(), 1);

    let err = order_service::list_all_orders(
        &state,
        &other,
        OrderListQuery {
            pagination: Pagination {
                page: Some(1),
                per_page: Some(20),
            },
            status: None,
            sort_order: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    Ok(())
}
