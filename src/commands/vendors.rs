use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use validator::{Validate, ValidationError};

use crate::{
    commands::{Command, CommandContext},
    errors::ServiceError,
    models::Vendor,
    state::Inventory,
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VendorFields {
    #[validate(length(min = 1, max = 200, message = "Vendor name is required"))]
    pub name: String,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    #[validate(custom = "validate_optional_email")]
    pub email: String,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub note: String,
}

fn validate_optional_email(email: &str) -> Result<(), ValidationError> {
    if email.trim().is_empty() || validator::validate_email(email.trim()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("email");
        err.message = Some("Must be a valid email address".into());
        Err(err)
    }
}

impl VendorFields {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contact: String::new(),
            phone: String::new(),
            email: String::new(),
            note: String::new(),
        }
    }

    fn check(&self) -> Result<(), ServiceError> {
        self.validate()?;
        if self.name.trim().is_empty() {
            return Err(ServiceError::validation("Vendor name is required"));
        }
        Ok(())
    }

    fn into_vendor(self, id: String) -> Vendor {
        Vendor {
            id,
            name: self.name.trim().to_string(),
            contact: self.contact,
            phone: self.phone,
            email: self.email.trim().to_string(),
            note: self.note,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddVendorCommand {
    #[serde(flatten)]
    #[validate]
    pub fields: VendorFields,
}

impl Command for AddVendorCommand {
    type Result = Vendor;

    #[instrument(skip(self, inventory, ctx), fields(name = %self.fields.name))]
    fn execute(
        self,
        inventory: &mut Inventory,
        ctx: &CommandContext,
    ) -> Result<Self::Result, ServiceError> {
        self.fields.check()?;
        let id = inventory.next_local_id("ven", ctx.now);
        let vendor = self.fields.into_vendor(id);
        inventory.push_vendor(vendor.clone());

        info!(vendor_id = %vendor.id, "Vendor added");
        Ok(vendor)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EditVendorCommand {
    pub vendor_id: String,
    #[serde(flatten)]
    #[validate]
    pub fields: VendorFields,
}

impl Command for EditVendorCommand {
    type Result = Vendor;

    #[instrument(skip(self, inventory, _ctx), fields(vendor_id = %self.vendor_id))]
    fn execute(
        self,
        inventory: &mut Inventory,
        _ctx: &CommandContext,
    ) -> Result<Self::Result, ServiceError> {
        self.fields.check()?;
        let vendor = inventory.vendor_mut(&self.vendor_id).ok_or_else(|| {
            ServiceError::NotFound(format!("Vendor {} not found", self.vendor_id))
        })?;
        *vendor = self.fields.into_vendor(self.vendor_id);

        info!("Vendor updated");
        Ok(vendor.clone())
    }
}

/// Removes a vendor. Deliveries that reference it keep the dangling id and
/// display as an unregistered vendor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteVendorCommand {
    pub vendor_id: String,
}

impl Command for DeleteVendorCommand {
    type Result = Vendor;

    fn execute(
        self,
        inventory: &mut Inventory,
        _ctx: &CommandContext,
    ) -> Result<Self::Result, ServiceError> {
        let vendor = inventory.remove_vendor(&self.vendor_id).ok_or_else(|| {
            ServiceError::NotFound(format!("Vendor {} not found", self.vendor_id))
        })?;
        info!(vendor_id = %vendor.id, "Vendor deleted");
        Ok(vendor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{Command, RecordDeliveryCommand};
    use crate::models::{vendor_name, Item, UNREGISTERED_VENDOR};
    use rust_decimal_macros::dec;

    #[test]
    fn vendor_lifecycle() {
        let mut inventory = Inventory::default();
        let ctx = CommandContext::now();

        let mut fields = VendorFields::new("Fresh Farms");
        fields.email = "orders@freshfarms.example".into();
        let vendor = AddVendorCommand { fields }
            .execute(&mut inventory, &ctx)
            .unwrap();
        assert!(vendor.id.starts_with("ven"));

        let edited = EditVendorCommand {
            vendor_id: vendor.id.clone(),
            fields: VendorFields::new("Fresh Farms Co."),
        }
        .execute(&mut inventory, &ctx)
        .unwrap();
        assert_eq!(edited.id, vendor.id);
        assert_eq!(inventory.vendors()[0].name, "Fresh Farms Co.");
    }

    #[test]
    fn blank_name_and_bad_email_are_rejected() {
        let mut inventory = Inventory::default();
        let ctx = CommandContext::now();

        let blank = AddVendorCommand {
            fields: VendorFields::new("   "),
        };
        assert!(blank.execute(&mut inventory, &ctx).unwrap_err().is_validation());

        let mut fields = VendorFields::new("Acme");
        fields.email = "not-an-email".into();
        assert!(AddVendorCommand { fields }
            .execute(&mut inventory, &ctx)
            .unwrap_err()
            .is_validation());
        assert!(inventory.vendors().is_empty());
    }

    #[test]
    fn deleting_a_vendor_leaves_deliveries_dangling() {
        let mut inventory = Inventory::new(
            vec![Item::new("itm1", "Milk", dec!(3.99))],
            Vec::new(),
            Vec::new(),
        );
        let ctx = CommandContext::now();
        let vendor = AddVendorCommand {
            fields: VendorFields::new("Dairy Direct"),
        }
        .execute(&mut inventory, &ctx)
        .unwrap();

        RecordDeliveryCommand {
            item_id: "itm1".into(),
            quantity: 6,
            unit_cost: Some(dec!(2)),
            case_price: None,
            case_quantity: None,
            vendor_id: Some(vendor.id.clone()),
            note: String::new(),
            date: None,
        }
        .execute(&mut inventory, &ctx)
        .unwrap();

        DeleteVendorCommand {
            vendor_id: vendor.id.clone(),
        }
        .execute(&mut inventory, &ctx)
        .unwrap();

        let item = inventory.item("itm1").unwrap();
        assert_eq!(item.last_vendor_id(), Some(vendor.id.as_str()));
        assert_eq!(vendor_name(inventory.vendors(), &vendor.id), UNREGISTERED_VENDOR);
    }
}
