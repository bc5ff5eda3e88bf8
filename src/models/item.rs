use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A stocked product.
///
/// Catalog-owned fields (`name`, `price`, `quantity`) are overwritten by each
/// catalog reconciliation. The three history sequences are owned locally and
/// only ever appended to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub sku: String,
    /// Sale price in major currency units.
    pub price: Decimal,
    /// Current unit cost in major currency units.
    #[serde(default)]
    pub cost: Decimal,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub sales_history: Vec<SaleRecord>,
    #[serde(default)]
    pub delivery_history: Vec<DeliveryRecord>,
    #[serde(default)]
    pub cost_history: Vec<CostEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRecord {
    pub date: NaiveDate,
    pub quantity: u32,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryRecord {
    pub id: String,
    pub date: NaiveDate,
    pub quantity: u32,
    /// Dangling references are allowed; vendors are deleted without cascade.
    pub vendor_id: Option<String>,
    pub unit_cost: Decimal,
    pub total_cost: Decimal,
    #[serde(default)]
    pub note: String,
}

/// One observed unit cost. Case price and case quantity record where the unit
/// cost came from when it was derived from a case purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostEntry {
    pub date: NaiveDate,
    pub cost: Decimal,
    #[serde(default)]
    pub case_price: Option<Decimal>,
    #[serde(default)]
    pub case_quantity: Option<u32>,
}

/// Expiry urgency, from most to least pressing.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ExpiryStatus {
    Expired,
    Critical,
    Warning,
    Ok,
}

impl ExpiryStatus {
    /// Critical and warning items count as "expiring".
    pub fn is_expiring(self) -> bool {
        matches!(self, Self::Critical | Self::Warning)
    }
}

impl Item {
    /// Creates an item with empty histories.
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            sku: String::new(),
            price,
            cost: Decimal::ZERO,
            quantity: 0,
            category_id: None,
            expiry_date: None,
            barcode: None,
            sales_history: Vec::new(),
            delivery_history: Vec::new(),
            cost_history: Vec::new(),
        }
    }

    /// Vendor of the most recent delivery, used to prefill the next delivery.
    pub fn last_vendor_id(&self) -> Option<&str> {
        self.delivery_history
            .last()
            .and_then(|d| d.vendor_id.as_deref())
    }

    pub fn units_sold(&self) -> u64 {
        self.sales_history.iter().map(|s| u64::from(s.quantity)).sum()
    }

    pub fn revenue(&self) -> Decimal {
        self.sales_history
            .iter()
            .fold(Decimal::ZERO, |acc, s| acc.saturating_add(s.revenue))
    }

    /// Adds to on-hand stock, saturating at `u32::MAX`.
    pub(crate) fn add_stock(&mut self, quantity: u32) {
        self.quantity = self.quantity.saturating_add(quantity);
    }

    /// Applies a signed change, flooring the result at zero.
    pub(crate) fn apply_delta(&mut self, delta: i64) {
        let next = i64::from(self.quantity)
            .saturating_add(delta)
            .clamp(0, i64::from(u32::MAX));
        self.quantity = next as u32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn apply_delta_floors_at_zero() {
        let mut item = Item::new("itm1", "Milk", dec!(3.99));
        item.quantity = 4;
        item.apply_delta(-10);
        assert_eq!(item.quantity, 0);

        item.apply_delta(7);
        assert_eq!(item.quantity, 7);
    }

    #[test]
    fn apply_delta_saturates_on_extreme_values() {
        let mut item = Item::new("itm1", "Milk", dec!(3.99));
        item.quantity = 5;
        item.apply_delta(i64::MAX);
        assert_eq!(item.quantity, u32::MAX);

        item.apply_delta(i64::MIN);
        assert_eq!(item.quantity, 0);
    }

    #[test]
    fn last_vendor_comes_from_latest_delivery() {
        let mut item = Item::new("itm1", "Milk", dec!(3.99));
        assert_eq!(item.last_vendor_id(), None);

        for (id, vendor) in [("d1", "ven1"), ("d2", "ven3")] {
            item.delivery_history.push(DeliveryRecord {
                id: id.into(),
                date: NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
                quantity: 1,
                vendor_id: Some(vendor.into()),
                unit_cost: dec!(1),
                total_cost: dec!(1),
                note: String::new(),
            });
        }
        assert_eq!(item.last_vendor_id(), Some("ven3"));
    }

    #[test]
    fn expiry_status_round_trips_through_strings() {
        assert_eq!(ExpiryStatus::Critical.to_string(), "critical");
        assert_eq!("warning".parse::<ExpiryStatus>().unwrap(), ExpiryStatus::Warning);
        assert!(ExpiryStatus::Warning.is_expiring());
        assert!(!ExpiryStatus::Expired.is_expiring());
    }
}
