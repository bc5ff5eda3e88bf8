use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    commands::{Command, CommandContext},
    errors::ServiceError,
    models::Item,
    state::Inventory,
};

/// Removes an item locally. The POS catalog is not told; the item comes
/// back on the next sync if it still exists there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteItemCommand {
    pub item_id: String,
}

impl Command for DeleteItemCommand {
    type Result = Item;

    fn execute(
        self,
        inventory: &mut Inventory,
        _ctx: &CommandContext,
    ) -> Result<Self::Result, ServiceError> {
        let item = inventory
            .remove_item(&self.item_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Item {} not found", self.item_id)))?;
        info!(item_id = %item.id, "Item deleted");
        Ok(item)
    }
}
