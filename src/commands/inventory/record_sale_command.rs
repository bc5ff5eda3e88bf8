use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use validator::Validate;

use super::find_item_mut;
use crate::{
    commands::{line_total, Command, CommandContext},
    errors::ServiceError,
    models::SaleRecord,
    state::Inventory,
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RecordSaleCommand {
    pub item_id: String,
    #[validate(range(min = 1, message = "Sale quantity must be at least 1"))]
    pub quantity: u32,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl Command for RecordSaleCommand {
    type Result = SaleRecord;

    /// Revenue uses the item's price at the time of recording. Selling more
    /// than is on hand floors the quantity at zero.
    #[instrument(skip(self, inventory, ctx), fields(item_id = %self.item_id, quantity = self.quantity))]
    fn execute(
        self,
        inventory: &mut Inventory,
        ctx: &CommandContext,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()?;
        let item = find_item_mut(inventory, &self.item_id)?;

        let record = SaleRecord {
            date: self.date.unwrap_or_else(|| ctx.today()),
            quantity: self.quantity,
            revenue: line_total(item.price, self.quantity)?,
        };
        item.quantity = item.quantity.saturating_sub(self.quantity);
        item.sales_history.push(record.clone());

        info!(new_quantity = item.quantity, revenue = %record.revenue, "Sale recorded");
        Ok(record)
    }
}
