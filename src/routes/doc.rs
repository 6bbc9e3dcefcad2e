use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginResponse, ResetTokenResponse},
        inventory::{LedgerList, StockAdjustment},
        orders::OrderList,
        payments::{PaymentIntent, PaymentOutcome, PaymentResult},
        products::{ProductList, ReviewList},
        users::UserList,
    },
    models::{
        Category, InventoryOp, InventoryRecord, Order, OrderItem, OrderStatus, PaymentMethod,
        Product, Review, User,
    },
    response::{ApiResponse, Meta},
    routes::{health, inventory, orders, params, payments, products, users},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        users::signup,
        users::login,
        users::forgot_password,
        users::reset_password,
        users::me,
        users::update_profile,
        users::update_password,
        users::deactivate,
        users::list_users,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        products::list_reviews,
        products::add_review,
        orders::create_order,
        orders::list_my_orders,
        orders::list_all_orders,
        orders::get_order,
        orders::cancel_order,
        orders::update_status,
        payments::create_intent,
        payments::verify,
        inventory::list_ledger,
        inventory::list_low_stock,
        inventory::adjust_stock
    ),
    components(
        schemas(
            User,
            Product,
            Review,
            Order,
            OrderItem,
            InventoryRecord,
            Category,
            OrderStatus,
            PaymentMethod,
            InventoryOp,
            PaymentIntent,
            PaymentOutcome,
            PaymentResult,
            LoginResponse,
            ResetTokenResponse,
            UserList,
            ProductList,
            ReviewList,
            OrderList,
            LedgerList,
            StockAdjustment,
            params::Pagination,
            params::SortOrder,
            params::ProductSortBy,
            params::ProductQuery,
            params::OrderListQuery,
            params::LedgerQuery,
            params::LowStockQuery,
            Meta,
            ApiResponse<User>,
            ApiResponse<Product>,
            ApiResponse<Order>,
            ApiResponse<ProductList>,
            ApiResponse<OrderList>,
            ApiResponse<LedgerList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Users", description = "Account and authentication endpoints"),
        (name = "Products", description = "Catalog and review endpoints"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Payments", description = "Simulated payment endpoints"),
        (name = "Inventory", description = "Stock ledger endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
