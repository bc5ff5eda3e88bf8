//! Offline demo data: a small grocery with three vendors and four items.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::models::{Category, CostEntry, DeliveryRecord, Item, SaleRecord, Vendor};

fn date(s: &str) -> NaiveDate {
    // Literals below are well-formed.
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap_or_default()
}

fn vendor(id: &str, name: &str, contact: &str, phone: &str, email: &str, note: &str) -> Vendor {
    Vendor {
        id: id.into(),
        name: name.into(),
        contact: contact.into(),
        phone: phone.into(),
        email: email.into(),
        note: note.into(),
    }
}

fn category(id: &str, name: &str) -> Category {
    Category {
        id: id.into(),
        name: name.into(),
    }
}

fn sale(day: &str, quantity: u32, revenue: Decimal) -> SaleRecord {
    SaleRecord {
        date: date(day),
        quantity,
        revenue,
    }
}

fn cost(day: &str, value: Decimal) -> CostEntry {
    CostEntry {
        date: date(day),
        cost: value,
        case_price: None,
        case_quantity: None,
    }
}

fn delivery(id: &str, day: &str, quantity: u32, vendor_id: &str, unit_cost: Decimal, note: &str) -> DeliveryRecord {
    DeliveryRecord {
        id: id.into(),
        date: date(day),
        quantity,
        vendor_id: Some(vendor_id.into()),
        unit_cost,
        total_cost: unit_cost * Decimal::from(quantity),
        note: note.into(),
    }
}

#[allow(clippy::too_many_arguments)]
fn item(
    id: &str,
    name: &str,
    sku: &str,
    price: Decimal,
    cost: Decimal,
    quantity: u32,
    category_id: &str,
    expiry: &str,
    barcode: &str,
) -> Item {
    let mut item = Item::new(id, name, price);
    item.sku = sku.into();
    item.cost = cost;
    item.quantity = quantity;
    item.category_id = Some(category_id.into());
    item.expiry_date = Some(date(expiry));
    item.barcode = Some(barcode.into());
    item
}

pub fn vendors() -> Vec<Vendor> {
    vec![
        vendor("ven1", "Fresh Farms Co.", "John Smith", "604-555-0101", "orders@freshfarms.com", "Delivers Mon/Wed/Fri"),
        vendor("ven2", "Metro Wholesale", "Amy Lee", "604-555-0202", "amy@metrowholesale.com", "Delivers Tue/Thu"),
        vendor("ven3", "Dairy Direct", "Mike Chen", "604-555-0303", "mike@dairydirect.ca", "Daily early-morning delivery"),
    ]
}

pub fn categories() -> Vec<Category> {
    vec![
        category("cat1", "Beverages"),
        category("cat2", "Dairy"),
        category("cat3", "Bakery"),
        category("cat4", "Produce"),
    ]
}

pub fn items() -> Vec<Item> {
    let mut milk = item("itm1", "Whole Milk 1L", "MLK001", dec!(3.99), dec!(2.10), 42, "cat2", "2025-03-10", "1234567890");
    milk.sales_history = vec![
        sale("2025-02-01", 8, dec!(31.92)),
        sale("2025-02-10", 12, dec!(47.88)),
        sale("2025-02-20", 6, dec!(23.94)),
    ];
    milk.cost_history = vec![cost("2025-01-15", dec!(2.00)), cost("2025-02-01", dec!(2.10))];
    milk.delivery_history = vec![
        delivery("d1", "2025-01-15", 48, "ven3", dec!(2.00), "Regular order"),
        delivery("d2", "2025-02-01", 36, "ven3", dec!(2.10), ""),
    ];

    let mut bread = item("itm2", "Sourdough Bread", "BRD002", dec!(6.50), dec!(3.20), 15, "cat3", "2025-02-28", "9876543210");
    bread.sales_history = vec![
        sale("2025-02-05", 5, dec!(32.50)),
        sale("2025-02-15", 9, dec!(58.50)),
    ];
    bread.cost_history = vec![cost("2025-02-01", dec!(3.20))];
    bread.delivery_history = vec![delivery("d3", "2025-02-01", 20, "ven1", dec!(3.20), "Tuesday standing order")];

    let mut juice = item("itm3", "Orange Juice 500ml", "OJ003", dec!(4.25), dec!(1.90), 60, "cat1", "2025-04-15", "1122334455");
    juice.sales_history = vec![
        sale("2025-02-08", 20, dec!(85.00)),
        sale("2025-02-18", 15, dec!(63.75)),
    ];
    juice.cost_history = vec![cost("2025-01-10", dec!(1.80)), cost("2025-02-05", dec!(1.90))];
    juice.delivery_history = vec![
        delivery("d4", "2025-01-10", 72, "ven2", dec!(1.80), "6 cases"),
        delivery("d5", "2025-02-05", 48, "ven2", dec!(1.90), ""),
    ];

    let mut tomatoes = item("itm4", "Cherry Tomatoes 250g", "TOM004", dec!(2.99), dec!(1.40), 30, "cat4", "2025-02-27", "5544332211");
    tomatoes.sales_history = vec![sale("2025-02-20", 10, dec!(29.90))];
    tomatoes.cost_history = vec![cost("2025-02-01", dec!(1.40))];
    tomatoes.delivery_history = vec![delivery("d6", "2025-02-20", 40, "ven1", dec!(1.40), "Fresh produce")];

    vec![milk, bread, juice, tomatoes]
}
