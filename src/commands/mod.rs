use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::{errors::ServiceError, events::Event, state::Inventory};

pub mod categories;
pub mod inventory;
pub mod items;
pub mod vendors;

pub use categories::AddCategoryCommand;
pub use inventory::{
    adjust_stock_command::{AdjustStockCommand, AdjustStockResult},
    record_delivery_command::RecordDeliveryCommand,
    record_sale_command::RecordSaleCommand,
};
pub use items::{
    add_item_command::AddItemCommand, delete_item_command::DeleteItemCommand,
    edit_item_command::EditItemCommand, ItemFields,
};
pub use vendors::{AddVendorCommand, DeleteVendorCommand, EditVendorCommand, VendorFields};

/// Command trait for implementing the Command Pattern
///
/// A command validates its own input and then mutates the inventory
/// aggregate. Validation failures leave the aggregate untouched.
pub trait Command {
    /// The return type of the command when executed successfully
    type Result;

    fn execute(
        self,
        inventory: &mut Inventory,
        ctx: &CommandContext,
    ) -> Result<Self::Result, ServiceError>;
}

/// Ambient inputs to a command, fixed for the duration of one execution.
#[derive(Debug, Clone, Copy)]
pub struct CommandContext {
    pub now: DateTime<Utc>,
}

impl CommandContext {
    pub fn now() -> Self {
        Self { now: Utc::now() }
    }

    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    pub fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }
}

/// One user operation against the inventory, as submitted from a form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InventoryCommand {
    AddItem(AddItemCommand),
    EditItem(EditItemCommand),
    DeleteItem(DeleteItemCommand),
    RecordSale(RecordSaleCommand),
    RecordDelivery(RecordDeliveryCommand),
    AdjustStock(AdjustStockCommand),
    AddVendor(AddVendorCommand),
    EditVendor(EditVendorCommand),
    DeleteVendor(DeleteVendorCommand),
    AddCategory(AddCategoryCommand),
}

impl InventoryCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddItem(_) => "add_item",
            Self::EditItem(_) => "edit_item",
            Self::DeleteItem(_) => "delete_item",
            Self::RecordSale(_) => "record_sale",
            Self::RecordDelivery(_) => "record_delivery",
            Self::AdjustStock(_) => "adjust_stock",
            Self::AddVendor(_) => "add_vendor",
            Self::EditVendor(_) => "edit_vendor",
            Self::DeleteVendor(_) => "delete_vendor",
            Self::AddCategory(_) => "add_category",
        }
    }

    /// Runs the command and describes what changed.
    pub fn execute(
        self,
        inventory: &mut Inventory,
        ctx: &CommandContext,
    ) -> Result<Event, ServiceError> {
        let event = match self {
            Self::AddItem(cmd) => {
                let item = cmd.execute(inventory, ctx)?;
                Event::ItemAdded {
                    item_id: item.id,
                    name: item.name,
                }
            }
            Self::EditItem(cmd) => {
                let item = cmd.execute(inventory, ctx)?;
                Event::ItemUpdated {
                    item_id: item.id,
                    name: item.name,
                }
            }
            Self::DeleteItem(cmd) => {
                let item = cmd.execute(inventory, ctx)?;
                Event::ItemDeleted { item_id: item.id }
            }
            Self::RecordSale(cmd) => {
                let item_id = cmd.item_id.clone();
                let sale = cmd.execute(inventory, ctx)?;
                Event::SaleRecorded {
                    item_id,
                    quantity: sale.quantity,
                    revenue: sale.revenue,
                }
            }
            Self::RecordDelivery(cmd) => {
                let item_id = cmd.item_id.clone();
                let delivery = cmd.execute(inventory, ctx)?;
                Event::DeliveryRecorded {
                    item_id,
                    delivery_id: delivery.id,
                    quantity: delivery.quantity,
                    total_cost: delivery.total_cost,
                }
            }
            Self::AdjustStock(cmd) => {
                let item_id = cmd.item_id.clone();
                let note = cmd.note.clone();
                let result = cmd.execute(inventory, ctx)?;
                Event::StockAdjusted {
                    item_id,
                    delta: result.delta,
                    previous_quantity: result.previous_quantity,
                    new_quantity: result.new_quantity,
                    note,
                }
            }
            Self::AddVendor(cmd) => {
                let vendor = cmd.execute(inventory, ctx)?;
                Event::VendorAdded {
                    vendor_id: vendor.id,
                    name: vendor.name,
                }
            }
            Self::EditVendor(cmd) => {
                let vendor = cmd.execute(inventory, ctx)?;
                Event::VendorUpdated {
                    vendor_id: vendor.id,
                    name: vendor.name,
                }
            }
            Self::DeleteVendor(cmd) => {
                let vendor = cmd.execute(inventory, ctx)?;
                Event::VendorDeleted {
                    vendor_id: vendor.id,
                }
            }
            Self::AddCategory(cmd) => {
                let category = cmd.execute(inventory, ctx)?;
                Event::CategoryAdded {
                    category_id: category.id,
                    name: category.name,
                }
            }
        };
        Ok(event)
    }
}

/// Parses a whole-unit quantity typed into a form.
pub fn parse_quantity(input: &str) -> Result<u32, ServiceError> {
    input
        .trim()
        .parse::<u32>()
        .map_err(|_| ServiceError::validation(format!("Invalid quantity: '{}'", input.trim())))
}

/// Parses a signed stock adjustment such as `-3` or `+5`.
pub fn parse_delta(input: &str) -> Result<i64, ServiceError> {
    let trimmed = input.trim();
    trimmed
        .strip_prefix('+')
        .unwrap_or(trimmed)
        .parse::<i64>()
        .map_err(|_| ServiceError::validation(format!("Invalid adjustment: '{}'", trimmed)))
}

/// Largest price or cost accepted from user input.
pub const MAX_AMOUNT: Decimal = dec!(1000000000000);

/// Parses a non-negative amount in major currency units.
pub fn parse_money(input: &str) -> Result<Decimal, ServiceError> {
    let amount = Decimal::from_str(input.trim())
        .map_err(|_| ServiceError::validation(format!("Invalid amount: '{}'", input.trim())))?;
    check_amount(Some(amount), "Amount")?;
    Ok(amount)
}

/// Unit cost implied by a case purchase, e.g. 24 units for 36.00 is 1.50.
pub fn unit_cost_from_case(case_price: Option<Decimal>, case_quantity: Option<u32>) -> Option<Decimal> {
    match (case_price, case_quantity) {
        (Some(price), Some(quantity)) if quantity > 0 => {
            Some((price / Decimal::from(quantity)).round_dp(4))
        }
        _ => None,
    }
}

pub(crate) fn check_amount(amount: Option<Decimal>, what: &str) -> Result<(), ServiceError> {
    match amount {
        Some(value) if value.is_sign_negative() && !value.is_zero() => Err(
            ServiceError::validation(format!("{} cannot be negative", what)),
        ),
        Some(value) if value > MAX_AMOUNT => Err(ServiceError::validation(format!(
            "{} cannot exceed {}",
            what, MAX_AMOUNT
        ))),
        _ => Ok(()),
    }
}

/// `unit * quantity`, rejected instead of overflowing.
pub(crate) fn line_total(unit: Decimal, quantity: u32) -> Result<Decimal, ServiceError> {
    unit.checked_mul(Decimal::from(quantity))
        .ok_or_else(|| ServiceError::validation("Amount is too large"))
}

pub(crate) fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Item;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn parse_helpers_reject_garbage() {
        assert_eq!(parse_quantity(" 12 ").unwrap(), 12);
        assert!(parse_quantity("").unwrap_err().is_validation());
        assert!(parse_quantity("-2").is_err());

        assert_eq!(parse_delta("+5").unwrap(), 5);
        assert_eq!(parse_delta("-3").unwrap(), -3);
        assert!(parse_delta("three").is_err());

        assert_eq!(parse_money("3.99").unwrap(), dec!(3.99));
        assert!(parse_money("-1").is_err());
        assert!(parse_money("abc").is_err());
        assert!(parse_money("1000000000000.01").unwrap_err().is_validation());
    }

    #[test]
    fn line_total_rejects_overflow() {
        assert_eq!(line_total(dec!(2.50), 4).unwrap(), dec!(10.00));
        assert!(line_total(Decimal::MAX, 2).unwrap_err().is_validation());
    }

    #[test]
    fn case_price_splits_into_unit_cost() {
        assert_eq!(unit_cost_from_case(Some(dec!(36)), Some(24)), Some(dec!(1.5)));
        assert_eq!(unit_cost_from_case(Some(dec!(36)), Some(0)), None);
        assert_eq!(unit_cost_from_case(None, Some(24)), None);
    }

    #[test]
    fn tagged_requests_deserialize_by_type() {
        let cmd: InventoryCommand = serde_json::from_value(json!({
            "type": "record_sale",
            "item_id": "itm1",
            "quantity": 2
        }))
        .unwrap();
        assert_eq!(cmd.name(), "record_sale");

        let cmd: InventoryCommand = serde_json::from_value(json!({
            "type": "add_item",
            "name": "Bagels",
            "price": "4.50"
        }))
        .unwrap();
        assert!(matches!(cmd, InventoryCommand::AddItem(_)));
    }

    #[test]
    fn execute_maps_results_to_events() {
        let mut inventory = Inventory::new(
            vec![{
                let mut item = Item::new("itm1", "Milk", dec!(3.99));
                item.quantity = 10;
                item
            }],
            Vec::new(),
            Vec::new(),
        );
        let ctx = CommandContext::now();

        let event = InventoryCommand::RecordSale(RecordSaleCommand {
            item_id: "itm1".into(),
            quantity: 2,
            date: None,
        })
        .execute(&mut inventory, &ctx)
        .unwrap();

        assert_eq!(
            event,
            Event::SaleRecorded {
                item_id: "itm1".into(),
                quantity: 2,
                revenue: dec!(7.98),
            }
        );
    }
}
