use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub password_hash: String,
    pub role: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub reset_token: Option<String>,
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub reset_token_expires_at: Option<DateTime<Utc>>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Beans,
    Drinks,
    Equipment,
    Merch,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Beans => "beans",
            Category::Drinks => "drinks",
            Category::Equipment => "equipment",
            Category::Merch => "merch",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "beans" => Some(Category::Beans),
            "drinks" => Some(Category::Drinks),
            "equipment" => Some(Category::Equipment),
            "merch" => Some(Category::Merch),
            _ => None,
        }
    }
}

/// Catalog product. `in_stock` is derived from `stock` and maintained at
/// every write point; `rating`/`num_reviews` are denormalized from reviews.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub category: Category,
    pub stock: i32,
    pub in_stock: bool,
    pub featured: bool,
    pub rating: f64,
    pub num_reviews: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Review {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Uuid,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InventoryOp {
    Add,
    Remove,
    Adjust,
}

impl InventoryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            InventoryOp::Add => "add",
            InventoryOp::Remove => "remove",
            InventoryOp::Adjust => "adjust",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "add" => Some(InventoryOp::Add),
            "remove" => Some(InventoryOp::Remove),
            "adjust" => Some(InventoryOp::Adjust),
            _ => None,
        }
    }
}

/// Append-only audit row for a single stock change. `quantity` is the
/// magnitude for `add`/`remove` and the signed delta for `adjust`; the
/// before/after snapshots are authoritative either way.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InventoryRecord {
    pub id: Uuid,
    pub product_id: Uuid,
    pub op: InventoryOp,
    pub quantity: i32,
    pub previous_stock: i32,
    pub current_stock: i32,
    pub note: Option<String>,
    pub operator_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Paid,
    Processing,
    Shipped,
    Completed,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "paid" => Some(OrderStatus::Paid),
            "processing" => Some(OrderStatus::Processing),
            "shipped" => Some(OrderStatus::Shipped),
            "completed" => Some(OrderStatus::Completed),
            "cancelled" => Some(OrderStatus::Cancelled),
            "refunded" => Some(OrderStatus::Refunded),
            _ => None,
        }
    }

    /// Cancellation is only reachable before fulfilment starts.
    pub fn cancellable(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Paid)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    Wallet,
    Cash,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::Wallet => "wallet",
            PaymentMethod::Cash => "cash",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "card" => Some(PaymentMethod::Card),
            "wallet" => Some(PaymentMethod::Wallet),
            "cash" => Some(PaymentMethod::Cash),
            _ => None,
        }
    }
}

/// A requested line as the client sends it; validated and priced at
/// placement time.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewOrderLine {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Line item with name/price copied from the product at purchase time, so
/// later catalog edits never rewrite order history.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub product_id: Uuid,
    pub name: String,
    pub price: i64,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Uuid,
    pub items: Vec<OrderItem>,
    pub total_amount: i64,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub contact_name: String,
    pub contact_phone: String,
    pub shipping_address: String,
    pub note: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `ORD-YYYYMMDD-<first 8 uuid hex>`. The uuid prefix keeps numbers unique
/// without a counter since the same uuid keys the row.
pub fn build_order_number(order_id: Uuid) -> String {
    let date = Utc::now().format("%Y%m%d");
    let id = order_id.simple().to_string();
    format!("ORD-{}-{}", date, &id[..8])
}
