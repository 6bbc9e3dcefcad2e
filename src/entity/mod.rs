pub mod inventory_records;
pub mod order_items;
pub mod orders;
pub mod products;
pub mod reviews;

pub use inventory_records::Entity as InventoryRecords;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use reviews::Entity as Reviews;
