//! Property-based tests for the operational ledger and derived metrics.

use chrono::{TimeZone, Utc};
use clover_inventory::{
    commands::{AdjustStockCommand, Command, CommandContext, RecordDeliveryCommand, RecordSaleCommand},
    models::{CostEntry, Item},
    services::analytics::{average_cost, dashboard_metrics},
    Inventory,
};
use proptest::prelude::*;
use rust_decimal::Decimal;

fn money_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..100_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn inventory_with(quantity: u32, price: Decimal) -> Inventory {
    let mut item = Item::new("itm1", "Test item", price);
    item.quantity = quantity;
    Inventory::new(vec![item], Vec::new(), Vec::new())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn delivery_adds_quantity_and_records_cost(
        start in 0u32..10_000,
        quantity in 1u32..10_000,
        unit_cost in money_strategy(),
    ) {
        let mut inventory = inventory_with(start, Decimal::new(999, 2));
        let record = RecordDeliveryCommand {
            item_id: "itm1".into(),
            quantity,
            unit_cost: Some(unit_cost),
            case_price: None,
            case_quantity: None,
            vendor_id: None,
            note: String::new(),
            date: None,
        }
        .execute(&mut inventory, &CommandContext::now())
        .unwrap();

        let item = inventory.item("itm1").unwrap();
        prop_assert_eq!(item.quantity, start + quantity);
        prop_assert_eq!(record.total_cost, unit_cost * Decimal::from(quantity));
        prop_assert_eq!(item.delivery_history.len(), 1);
        prop_assert_eq!(item.cost_history.last().map(|e| e.cost), Some(unit_cost));
        prop_assert_eq!(item.cost, unit_cost);
    }

    #[test]
    fn sale_never_goes_negative(
        start in 0u32..1_000,
        sold in 1u32..2_000,
        price in money_strategy(),
    ) {
        let mut inventory = inventory_with(start, price);
        let record = RecordSaleCommand {
            item_id: "itm1".into(),
            quantity: sold,
            date: None,
        }
        .execute(&mut inventory, &CommandContext::now())
        .unwrap();

        let item = inventory.item("itm1").unwrap();
        prop_assert_eq!(item.quantity, start.saturating_sub(sold));
        prop_assert_eq!(record.revenue, price * Decimal::from(sold));
        prop_assert_eq!(item.sales_history.len(), 1);
    }

    #[test]
    fn adjustment_clamps_at_zero(start in 0u32..1_000, delta in -2_000i64..2_000) {
        prop_assume!(delta != 0);
        let mut inventory = inventory_with(start, Decimal::ONE);
        AdjustStockCommand {
            item_id: "itm1".into(),
            delta,
            note: String::new(),
        }
        .execute(&mut inventory, &CommandContext::now())
        .unwrap();

        let expected = (i64::from(start) + delta).max(0) as u32;
        prop_assert_eq!(inventory.item("itm1").unwrap().quantity, expected);
    }

    #[test]
    fn average_cost_lies_between_extremes(costs in prop::collection::vec(money_strategy(), 1..20)) {
        let mut item = Item::new("itm1", "Test item", Decimal::ONE);
        item.cost_history = costs
            .iter()
            .map(|c| CostEntry {
                date: chrono::NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                cost: *c,
                case_price: None,
                case_quantity: None,
            })
            .collect();

        let avg = average_cost(&item);
        let min = costs.iter().copied().min().unwrap();
        let max = costs.iter().copied().max().unwrap();
        prop_assert!(avg >= min && avg <= max, "{} not within [{}, {}]", avg, min, max);
    }

    #[test]
    fn rollups_are_idempotent(quantities in prop::collection::vec(0u32..500, 0..10)) {
        let items = quantities
            .iter()
            .enumerate()
            .map(|(i, q)| {
                let mut item = Item::new(format!("itm{}", i), format!("Item {}", i), Decimal::new(250, 2));
                item.quantity = *q;
                item
            })
            .collect();
        let inventory = Inventory::new(items, Vec::new(), Vec::new());
        let now = Utc.with_ymd_and_hms(2025, 2, 20, 12, 0, 0).unwrap();

        let first = dashboard_metrics(&inventory, now, 5);
        let second = dashboard_metrics(&inventory, now, 5);
        prop_assert_eq!(&first, &second);

        let expected_value: Decimal = quantities.iter().map(|q| Decimal::new(250, 2) * Decimal::from(*q)).sum();
        prop_assert_eq!(first.inventory.total_value, expected_value);
        prop_assert_eq!(
            first.inventory.low_stock_count,
            quantities.iter().filter(|q| **q <= 5).count()
        );
    }
}
