use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use validator::Validate;

use super::ItemFields;
use crate::{
    commands::{check_amount, Command, CommandContext},
    errors::ServiceError,
    models::{CostEntry, Item},
    state::Inventory,
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddItemCommand {
    #[serde(flatten)]
    #[validate]
    pub fields: ItemFields,
    #[serde(default)]
    pub case_price: Option<Decimal>,
    #[serde(default)]
    pub case_quantity: Option<u32>,
}

impl AddItemCommand {
    pub fn new(fields: ItemFields) -> Self {
        Self {
            fields,
            case_price: None,
            case_quantity: None,
        }
    }
}

impl Command for AddItemCommand {
    type Result = Item;

    /// Creates a local item. Its cost history starts with one entry dated
    /// today holding the entered cost.
    #[instrument(skip(self, inventory, ctx), fields(name = %self.fields.name))]
    fn execute(
        self,
        inventory: &mut Inventory,
        ctx: &CommandContext,
    ) -> Result<Self::Result, ServiceError> {
        self.fields.check()?;
        check_amount(self.case_price, "Case price")?;

        let id = inventory.next_local_id("itm", ctx.now);
        let mut item = Item::new(id, self.fields.name.clone(), self.fields.price);
        self.fields.apply_to(&mut item);
        item.cost_history.push(CostEntry {
            date: ctx.today(),
            cost: item.cost,
            case_price: self.case_price,
            case_quantity: self.case_quantity.filter(|q| *q > 0),
        });

        inventory.push_item(item.clone());
        info!(item_id = %item.id, "Item added");
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn added_item_gets_initial_cost_entry() {
        let mut inventory = Inventory::default();
        let mut fields = ItemFields::new("Sourdough", dec!(6.50));
        fields.cost = Some(dec!(2.75));
        fields.quantity = Some(8);

        let ctx = CommandContext::now();
        let item = AddItemCommand::new(fields)
            .execute(&mut inventory, &ctx)
            .unwrap();

        assert!(item.id.starts_with("itm"));
        assert_eq!(item.quantity, 8);
        assert_eq!(item.cost_history.len(), 1);
        assert_eq!(item.cost_history[0].cost, dec!(2.75));
        assert_eq!(item.cost_history[0].date, ctx.today());
        assert_eq!(inventory.items().len(), 1);
    }

    #[test]
    fn missing_name_or_price_is_rejected() {
        let mut inventory = Inventory::default();
        let ctx = CommandContext::now();

        let no_name = AddItemCommand::new(ItemFields::new("", dec!(1)));
        assert!(no_name.execute(&mut inventory, &ctx).unwrap_err().is_validation());

        let no_price = AddItemCommand::new(ItemFields::new("Cheese", Decimal::ZERO));
        assert!(no_price.execute(&mut inventory, &ctx).unwrap_err().is_validation());

        assert!(inventory.items().is_empty());
    }

    #[test]
    fn out_of_range_amounts_are_rejected() {
        let mut inventory = Inventory::default();
        let ctx = CommandContext::now();

        let huge_price = AddItemCommand::new(ItemFields::new("Caviar", Decimal::MAX));
        assert!(huge_price.execute(&mut inventory, &ctx).unwrap_err().is_validation());

        let mut fields = ItemFields::new("Caviar", dec!(90));
        fields.cost = Some(Decimal::MAX);
        assert!(AddItemCommand::new(fields)
            .execute(&mut inventory, &ctx)
            .unwrap_err()
            .is_validation());

        assert!(inventory.items().is_empty());
    }
}
