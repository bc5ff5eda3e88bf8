use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use validator::Validate;

use super::ItemFields;
use crate::{
    commands::{inventory::find_item_mut, Command, CommandContext},
    errors::ServiceError,
    models::Item,
    state::Inventory,
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EditItemCommand {
    pub item_id: String,
    #[serde(flatten)]
    #[validate]
    pub fields: ItemFields,
}

impl Command for EditItemCommand {
    type Result = Item;

    #[instrument(skip(self, inventory, _ctx), fields(item_id = %self.item_id))]
    fn execute(
        self,
        inventory: &mut Inventory,
        _ctx: &CommandContext,
    ) -> Result<Self::Result, ServiceError> {
        self.fields.check()?;
        let item = find_item_mut(inventory, &self.item_id)?;
        self.fields.apply_to(item);

        info!("Item updated");
        Ok(item.clone())
    }
}
