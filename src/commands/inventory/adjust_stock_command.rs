use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use validator::Validate;

use super::find_item_mut;
use crate::{
    commands::{Command, CommandContext},
    errors::ServiceError,
    state::Inventory,
};

/// Corrects on-hand stock by a signed amount, e.g. after a count or for
/// spoilage. No history entry is written; the note travels on the event.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AdjustStockCommand {
    pub item_id: String,
    pub delta: i64,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub note: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AdjustStockResult {
    pub delta: i64,
    pub previous_quantity: u32,
    pub new_quantity: u32,
}

impl Command for AdjustStockCommand {
    type Result = AdjustStockResult;

    #[instrument(skip(self, inventory, _ctx), fields(item_id = %self.item_id, delta = self.delta))]
    fn execute(
        self,
        inventory: &mut Inventory,
        _ctx: &CommandContext,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()?;
        if self.delta == 0 {
            return Err(ServiceError::validation("Adjustment must not be zero"));
        }

        let item = find_item_mut(inventory, &self.item_id)?;
        let previous_quantity = item.quantity;
        item.apply_delta(self.delta);

        info!(previous_quantity, new_quantity = item.quantity, "Stock adjusted");
        Ok(AdjustStockResult {
            delta: self.delta,
            previous_quantity,
            new_quantity: item.quantity,
        })
    }
}
