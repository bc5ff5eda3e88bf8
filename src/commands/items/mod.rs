pub mod add_item_command;
pub mod delete_item_command;
pub mod edit_item_command;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    commands::{blank_to_none, check_amount},
    errors::ServiceError,
    models::Item,
};

/// Editable item attributes shared by the add and edit forms.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ItemFields {
    #[validate(length(min = 1, max = 200, message = "Item name is required"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 64))]
    pub sku: String,
    pub price: Decimal,
    #[serde(default)]
    pub cost: Option<Decimal>,
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
    #[serde(default)]
    pub barcode: Option<String>,
}

impl ItemFields {
    pub fn new(name: impl Into<String>, price: Decimal) -> Self {
        Self {
            name: name.into(),
            sku: String::new(),
            price,
            cost: None,
            quantity: None,
            category_id: None,
            expiry_date: None,
            barcode: None,
        }
    }

    pub(crate) fn check(&self) -> Result<(), ServiceError> {
        self.validate()?;
        if self.name.trim().is_empty() {
            return Err(ServiceError::validation("Item name is required"));
        }
        if self.price <= Decimal::ZERO {
            return Err(ServiceError::validation("Item price must be greater than zero"));
        }
        check_amount(Some(self.price), "Price")?;
        check_amount(self.cost, "Cost")
    }

    /// Writes the form values onto `item`. Histories are untouched.
    pub(crate) fn apply_to(self, item: &mut Item) {
        item.name = self.name.trim().to_string();
        item.sku = self.sku.trim().to_string();
        item.price = self.price;
        item.cost = self.cost.unwrap_or(Decimal::ZERO);
        item.quantity = self.quantity.unwrap_or(0);
        item.category_id = blank_to_none(self.category_id);
        item.expiry_date = self.expiry_date;
        item.barcode = blank_to_none(self.barcode);
    }
}
