use axum::Router;

use crate::state::AppState;

pub mod doc;
pub mod health;
pub mod inventory;
pub mod orders;
pub mod params;
pub mod payments;
pub mod products;
pub mod users;

// Build the API router without binding state; it is provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/users", users::router())
        .nest("/products", products::router())
        .nest("/orders", orders::router())
        .nest("/payments", payments::router())
        .nest("/inventory", inventory::router())
}
