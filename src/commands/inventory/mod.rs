//! Operational ledger: deliveries, sales and stock adjustments.

pub mod adjust_stock_command;
pub mod record_delivery_command;
pub mod record_sale_command;

use crate::{errors::ServiceError, models::Item, state::Inventory};

pub(crate) fn find_item_mut<'a>(
    inventory: &'a mut Inventory,
    item_id: &str,
) -> Result<&'a mut Item, ServiceError> {
    inventory
        .item_mut(item_id)
        .ok_or_else(|| ServiceError::NotFound(format!("Item {} not found", item_id)))
}
