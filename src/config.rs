use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    Memory,
    Postgres,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub use_memory_db: bool,
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub cors_origin: Option<String>,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").ok();
        let use_memory_db = env::var("USE_MEMORY_DB")
            .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        let jwt_secret = env::var("JWT_SECRET")?;
        let jwt_expiry_hours = env::var("JWT_EXPIRY_HOURS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(24);
        let cors_origin = env::var("CORS_ORIGIN").ok().filter(|v| !v.is_empty());
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        Ok(Self {
            database_url,
            use_memory_db,
            jwt_secret,
            jwt_expiry_hours,
            cors_origin,
            host,
            port,
        })
    }

    /// Falls back to the in-memory store whenever no database is configured.
    pub fn storage_mode(&self) -> StorageMode {
        if self.use_memory_db || self.database_url.is_none() {
            StorageMode::Memory
        } else {
            StorageMode::Postgres
        }
    }
}
