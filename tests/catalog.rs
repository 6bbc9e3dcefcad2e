use std::sync::Arc;

use chrono::Utc;
use coffeehouse_api::{
    config::AppConfig,
    dto::{
        inventory::AdjustStockRequest,
        orders::CreateOrderRequest,
        products::{CreateProductRequest, CreateReviewRequest, UpdateProductRequest},
    },
    error::AppError,
    middleware::auth::AuthUser,
    models::{Category, InventoryOp, NewOrderLine, OrderStatus, PaymentMethod, Product, User},
    routes::params::{
        LedgerQuery, LowStockQuery, Pagination, ProductQuery, ProductSortBy, SortOrder,
    },
    services::{inventory_service, order_service, product_service},
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
    category: Category,
    price: i64,
    stock: i32,
    featured: bool,
) -> anyhow::Result<Product> {
    let resp = product_service::create_product(
        state,
        admin,
        CreateProductRequest {
            name: name.into(),
            description: Some(format!("{name} from the test roastery")),
            price,
            category,
            stock,
            featured,
        },
    )
    .await?;
    Ok(resp.data.expect("product"))
}

fn product_query() -> ProductQuery {
    ProductQuery {
        pagination: Pagination {
            page: Some(1),
            per_page: Some(50),
        },
        q: None,
        category: None,
        featured: None,
        min_price: None,
        max_price: None,
        sort_by: None,
        sort_order: None,
    }
}

#[tokio::test]
async fn listing_filters_and_sorts_the_catalog() -> anyhow::Result<()> {
    let state = memory_state();
    let admin = create_user(&state, "admin", "admin@example.com").await?;

    create_product(&state, &admin, "House Blend", Category::Beans, 1890, 50, true).await?;
    create_product(&state, &admin, "Yirgacheffe", Category::Beans, 1450, 30, false).await?;
    create_product(&state, &admin, "Cold Brew", Category::Drinks, 550, 100, false).await?;
    create_product(&state, &admin, "Dripper", Category::Equipment, 2400, 10, false).await?;

    let beans = product_service::list_products(
        &state,
        ProductQuery {
            category: Some(Category::Beans),
            ..product_query()
        },
    )
    .await?;
    assert_eq!(beans.data.expect("products").items.len(), 2);
    assert_eq!(beans.meta.expect("meta").total, Some(2));

    let found = product_service::list_products(
        &state,
        ProductQuery {
            q: Some("yirga".into()),
            ..product_query()
        },
    )
    .await?
    .data
    .expect("products")
    .items;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Yirgacheffe");

    let featured = product_service::list_products(
        &state,
        ProductQuery {
            featured: Some(true),
            ..product_query()
        },
    )
    .await?
    .data
    .expect("products")
    .items;
    assert_eq!(featured.len(), 1);
    assert_eq!(featured[0].name, "House Blend");

    let cheap_first = product_service::list_products(
        &state,
        ProductQuery {
            min_price: Some(500),
            max_price: Some(2000),
            sort_by: Some(ProductSortBy::Price),
            sort_order: Some(SortOrder::Asc),
            ..product_query()
        },
    )
    .await?
    .data
    .expect("products")
    .items;
    let prices: Vec<i64> = cheap_first.iter().map(|p| p.price).collect();
    assert_eq!(prices, vec![550, 1450, 1890]);

    Ok(())
}

#[tokio::test]
async fn creating_a_product_writes_its_opening_ledger_row() -> anyhow::Result<()> {
    let state = memory_state();
    let admin = create_user(&state, "admin", "admin@example.com").await?;
    let product =
        create_product(&state, &admin, "House Blend", Category::Beans, 1890, 50, false).await?;

    let ledger = inventory_service::list_ledger(
        &state,
        &admin,
        LedgerQuery {
            pagination: Pagination {
                page: Some(1),
                per_page: Some(10),
            },
            product_id: Some(product.id),
        },
    )
    .await?
    .data
    .expect("ledger")
    .items;

    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].op, InventoryOp::Add);
    assert_eq!(ledger[0].quantity, 50);
    assert_eq!(ledger[0].previous_stock, 0);
    assert_eq!(ledger[0].current_stock, 50);

    Ok(())
}

#[tokio::test]
async fn stock_edits_through_the_catalog_land_in_the_ledger() -> anyhow::Result<()> {
    let state = memory_state();
    let admin = create_user(&state, "admin", "admin@example.com").await?;
    let product =
        create_product(&state, &admin, "House Blend", Category::Beans, 1890, 50, false).await?;

    let updated = product_service::update_product(
        &state,
        &admin,
        product.id,
        UpdateProductRequest {
            name: None,
            description: None,
            price: Some(1990),
            category: None,
            featured: Some(true),
            stock: Some(40),
        },
    )
    .await?
    .data
    .expect("product");
    assert_eq!(updated.price, 1990);
    assert!(updated.featured);
    assert_eq!(updated.stock, 40);

    let ledger = inventory_service::list_ledger(
        &state,
        &admin,
        LedgerQuery {
            pagination: Pagination {
                page: Some(1),
                per_page: Some(10),
            },
            product_id: Some(product.id),
        },
    )
    .await?
    .data
    .expect("ledger")
    .items;
    let adjusts: Vec<_> = ledger
        .iter()
        .filter(|r| r.op == InventoryOp::Adjust)
        .collect();
    assert_eq!(adjusts.len(), 1);
    assert_eq!(adjusts[0].quantity, -10);
    assert_eq!(adjusts[0].previous_stock, 50);
    assert_eq!(adjusts[0].current_stock, 40);

    Ok(())
}

#[tokio::test]
async fn stock_adjustments_are_guarded() -> anyhow::Result<()> {
    let state = memory_state();
    let admin = create_user(&state, "admin", "admin@example.com").await?;
    let user = create_user(&state, "user", "user@example.com").await?;
    let product =
        create_product(&state, &admin, "House Blend", Category::Beans, 1890, 5, false).await?;

    let err = inventory_service::adjust(
        &state,
        &admin,
        product.id,
        AdjustStockRequest {
            delta: 0,
            note: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = inventory_service::adjust(
        &state,
        &admin,
        product.id,
        AdjustStockRequest {
            delta: -10,
            note: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = inventory_service::adjust(
        &state,
        &user,
        product.id,
        AdjustStockRequest {
            delta: 1,
            note: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    // stock is untouched after the failed attempts
    let current = product_service::get_product(&state, product.id)
        .await?
        .data
        .expect("product");
    assert_eq!(current.stock, 5);

    Ok(())
}

#[tokio::test]
async fn low_stock_respects_the_threshold() -> anyhow::Result<()> {
    let state = memory_state();
    let admin = create_user(&state, "admin", "admin@example.com").await?;
    create_product(&state, &admin, "Nearly Gone", Category::Beans, 1890, 2, false).await?;
    create_product(&state, &admin, "Well Stocked", Category::Beans, 1450, 80, false).await?;

    let low = inventory_service::list_low_stock(
        &state,
        &admin,
        LowStockQuery {
            pagination: Pagination {
                page: Some(1),
                per_page: Some(20),
            },
            threshold: Some(5),
        },
    )
    .await?
    .data
    .expect("products")
    .items;

    assert_eq!(low.len(), 1);
    assert_eq!(low[0].name, "Nearly Gone");

    Ok(())
}

#[tokio::test]
async fn reviews_update_the_average_rating_once_per_user() -> anyhow::Result<()> {
    let state = memory_state();
    let admin = create_user(&state, "admin", "admin@example.com").await?;
    let first = create_user(&state, "user", "first@example.com").await?;
    let second = create_user(&state, "user", "second@example.com").await?;
    let product =
        create_product(&state, &admin, "House Blend", Category::Beans, 1890, 50, false).await?;

    let err = product_service::add_review(
        &state,
        &first,
        product.id,
        CreateReviewRequest {
            rating: 6,
            comment: "off the scale".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    product_service::add_review(
        &state,
        &first,
        product.id,
        CreateReviewRequest {
            rating: 4,
            comment: "Solid daily driver".into(),
        },
    )
    .await?;
    product_service::add_review(
        &state,
        &second,
        product.id,
        CreateReviewRequest {
            rating: 5,
            comment: "Best blend in town".into(),
        },
    )
    .await?;

    let rated = product_service::get_product(&state, product.id)
        .await?
        .data
        .expect("product");
    assert_eq!(rated.num_reviews, 2);
    assert!((rated.rating - 4.5).abs() < f64::EPSILON);

    let err = product_service::add_review(
        &state,
        &first,
        product.id,
        CreateReviewRequest {
            rating: 1,
            comment: "changed my mind".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let reviews = product_service::list_reviews(&state, product.id)
        .await?
        .data
        .expect("reviews")
        .items;
    assert_eq!(reviews.len(), 2);

    Ok(())
}

#[tokio::test]
async fn cancelling_after_product_deletion_skips_compensation() -> anyhow::Result<()> {
    let state = memory_state();
    let admin = create_user(&state, "admin", "admin@example.com").await?;
    let user = create_user(&state, "user", "user@example.com").await?;
    let product =
        create_product(&state, &admin, "House Blend", Category::Beans, 1890, 5, false).await?;

    let order = order_service::create_order(
        &state,
        &user,
        CreateOrderRequest {
            items: vec![NewOrderLine {
                product_id: product.id,
                quantity: 2,
            }],
            payment_method: PaymentMethod::Card,
            contact_name: "Sam Roaster".into(),
            contact_phone: "555-0100".into(),
            shipping_address: "1 Bean St".into(),
            note: None,
        },
    )
    .await?
    .data
    .expect("order");

    product_service::delete_product(&state, &admin, product.id).await?;

    // the order still cancels; the vanished product is skipped silently
    let cancelled = order_service::cancel_order(&state, &user, order.id)
        .await?
        .data
        .expect("order");
    assert_eq!(cancelled.status, OrderStatus::Cancelled);

    let ledger = inventory_service::list_ledger(
        &state,
        &admin,
        LedgerQuery {
            pagination: Pagination {
                page: Some(1),
                per_page: Some(20),
            },
            product_id: Some(product.id),
        },
    )
    .await?
    .data
    .expect("ledger")
    .items;
    // opening stock + order decrement, but no compensation row
    assert_eq!(ledger.len(), 2);
    let cancel_note = format!("cancel order {}", order.id);
    assert!(
        !ledger
            .iter()
            .any(|r| r.note.as_deref() == Some(cancel_note.as_str()))
    );

    Ok(())
}
