// Core models
pub mod category;
pub mod item;
pub mod vendor;

pub use category::{category_name, Category, UNCATEGORIZED};
pub use item::{CostEntry, DeliveryRecord, ExpiryStatus, Item, SaleRecord};
pub use vendor::{vendor_name, Vendor, UNREGISTERED_VENDOR};
