use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use validator::Validate;

use super::find_item_mut;
use crate::{
    commands::{blank_to_none, check_amount, line_total, unit_cost_from_case, Command, CommandContext},
    errors::ServiceError,
    models::{CostEntry, DeliveryRecord},
    state::Inventory,
};

/// Receives stock from a vendor.
///
/// The unit cost is taken from `unit_cost` when given, otherwise from the
/// case price split over the case quantity, otherwise the item's current
/// cost is assumed.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RecordDeliveryCommand {
    pub item_id: String,
    #[validate(range(min = 1, message = "Delivery quantity must be at least 1"))]
    pub quantity: u32,
    #[serde(default)]
    pub unit_cost: Option<Decimal>,
    #[serde(default)]
    pub case_price: Option<Decimal>,
    #[serde(default)]
    pub case_quantity: Option<u32>,
    #[serde(default)]
    pub vendor_id: Option<String>,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub note: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl Command for RecordDeliveryCommand {
    type Result = DeliveryRecord;

    #[instrument(skip(self, inventory, ctx), fields(item_id = %self.item_id, quantity = self.quantity))]
    fn execute(
        self,
        inventory: &mut Inventory,
        ctx: &CommandContext,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()?;
        check_amount(self.unit_cost, "Unit cost")?;
        check_amount(self.case_price, "Case price")?;

        let current_cost = find_item_mut(inventory, &self.item_id)?.cost;
        let unit_cost = self
            .unit_cost
            .or_else(|| unit_cost_from_case(self.case_price, self.case_quantity))
            .unwrap_or(current_cost);
        let total_cost = line_total(unit_cost, self.quantity)?;

        let delivery_id = inventory.next_local_id("d", ctx.now);
        let item = find_item_mut(inventory, &self.item_id)?;
        let date = self.date.unwrap_or_else(|| ctx.today());
        let record = DeliveryRecord {
            id: delivery_id,
            date,
            quantity: self.quantity,
            vendor_id: blank_to_none(self.vendor_id),
            unit_cost,
            total_cost,
            note: self.note,
        };

        item.add_stock(self.quantity);
        if unit_cost > Decimal::ZERO {
            item.cost = unit_cost;
            item.cost_history.push(CostEntry {
                date,
                cost: unit_cost,
                case_price: self.case_price,
                case_quantity: self.case_quantity.filter(|q| *q > 0),
            });
        }
        item.delivery_history.push(record.clone());

        info!(
            delivery_id = %record.id,
            new_quantity = item.quantity,
            total_cost = %record.total_cost,
            "Delivery recorded"
        );
        Ok(record)
    }
}
