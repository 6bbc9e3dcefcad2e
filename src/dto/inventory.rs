use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{InventoryRecord, Product};

#[derive(Debug, Deserialize, ToSchema)]
pub struct AdjustStockRequest {
    pub delta: i32,
    pub note: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StockAdjustment {
    pub product: Product,
    pub record: InventoryRecord,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LedgerList {
    pub items: Vec<InventoryRecord>,
}
