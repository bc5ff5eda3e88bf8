use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::{
    commands::{Command, CommandContext},
    errors::ServiceError,
    models::Category,
    state::Inventory,
};

/// Adds a local category. While connected, the next catalog sync replaces
/// the whole category list, including categories added here.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddCategoryCommand {
    #[validate(length(min = 1, max = 100, message = "Category name is required"))]
    pub name: String,
}

impl Command for AddCategoryCommand {
    type Result = Category;

    fn execute(
        self,
        inventory: &mut Inventory,
        ctx: &CommandContext,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()?;
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::validation("Category name is required"));
        }

        let category = Category {
            id: inventory.next_local_id("cat", ctx.now),
            name,
        };
        inventory.push_category(category.clone());
        info!(category_id = %category.id, "Category added");
        Ok(category)
    }
}
