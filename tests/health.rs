use std::sync::Arc;

use axum::extract::State;
use coffeehouse_api::{
    config::AppConfig, routes::health::health_check, state::AppState, store::MemoryStore,
};

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

#[tokio::test]
async fn health_check_reports_storage_mode() {
    let response = health_check(State(memory_state())).await;
    assert_eq!(response.0.message, "Health check");

    let data = response.0.data.expect("health data");
    assert_eq!(data.status, "ok");
    assert_eq!(data.storage, "memory");
}
