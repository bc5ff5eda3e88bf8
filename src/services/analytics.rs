//! Derived metrics. Everything here is a pure function of the current
//! inventory; nothing is cached and nothing is mutated.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use strum::{Display, EnumString};

use crate::{
    models::{category_name, vendor_name, Category, DeliveryRecord, ExpiryStatus, Item, Vendor},
    state::Inventory,
};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Unweighted mean of the recorded unit costs, or the current cost when
/// nothing has been recorded.
pub fn average_cost(item: &Item) -> Decimal {
    if item.cost_history.is_empty() {
        return item.cost;
    }
    let sum = item
        .cost_history
        .iter()
        .fold(Decimal::ZERO, |acc, e| acc.saturating_add(e.cost));
    sum / Decimal::from(item.cost_history.len())
}

/// Whole days from `now` until the start of `expiry` (UTC), rounded up.
/// A date earlier today counts as 0, yesterday as -1.
pub fn days_until_expiry(expiry: NaiveDate, now: DateTime<Utc>) -> i64 {
    let expiry_start = expiry.and_time(chrono::NaiveTime::MIN).and_utc();
    let diff = expiry_start.timestamp_millis() - now.timestamp_millis();
    -((-diff).div_euclid(MILLIS_PER_DAY))
}

pub fn classify_days(days: i64) -> ExpiryStatus {
    match days {
        d if d < 0 => ExpiryStatus::Expired,
        0..=3 => ExpiryStatus::Critical,
        4..=7 => ExpiryStatus::Warning,
        _ => ExpiryStatus::Ok,
    }
}

/// Items without an expiry date never expire.
pub fn expiry_status(expiry: Option<NaiveDate>, now: DateTime<Utc>) -> ExpiryStatus {
    expiry
        .map(|date| classify_days(days_until_expiry(date, now)))
        .unwrap_or(ExpiryStatus::Ok)
}

fn stock_value(item: &Item) -> Decimal {
    item.price.saturating_mul(Decimal::from(item.quantity))
}

/// Gross margin against the average cost. `None` when the item has no price
/// or the ratio is out of range.
pub fn margin_percent(item: &Item) -> Option<Decimal> {
    if item.price.is_zero() {
        return None;
    }
    (item.price - average_cost(item))
        .checked_div(item.price)?
        .checked_mul(Decimal::ONE_HUNDRED)
}

pub fn is_low_stock(item: &Item, threshold: u32) -> bool {
    item.quantity <= threshold
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryMetrics {
    pub item_count: usize,
    /// Σ price × quantity
    pub total_value: Decimal,
    /// Σ average cost × quantity
    pub total_cost: Decimal,
    /// Items in the critical or warning expiry window
    pub expiring_count: usize,
    pub expired_count: usize,
    pub low_stock_count: usize,
}

pub fn inventory_metrics(items: &[Item], now: DateTime<Utc>, low_stock_threshold: u32) -> InventoryMetrics {
    let mut metrics = InventoryMetrics {
        item_count: items.len(),
        total_value: Decimal::ZERO,
        total_cost: Decimal::ZERO,
        expiring_count: 0,
        expired_count: 0,
        low_stock_count: 0,
    };

    for item in items {
        let quantity = Decimal::from(item.quantity);
        metrics.total_value = metrics
            .total_value
            .saturating_add(item.price.saturating_mul(quantity));
        metrics.total_cost = metrics
            .total_cost
            .saturating_add(average_cost(item).saturating_mul(quantity));

        match expiry_status(item.expiry_date, now) {
            status if status.is_expiring() => metrics.expiring_count += 1,
            ExpiryStatus::Expired => metrics.expired_count += 1,
            _ => {}
        }
        if is_low_stock(item, low_stock_threshold) {
            metrics.low_stock_count += 1;
        }
    }

    metrics
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorStats {
    pub vendor_id: String,
    pub vendor_name: String,
    pub delivery_count: usize,
    pub total_quantity: u64,
    pub total_spend: Decimal,
    pub last_delivery: Option<NaiveDate>,
}

/// Rollup over every item's deliveries that reference `vendor_id`.
pub fn vendor_stats_for(vendor: &Vendor, items: &[Item]) -> VendorStats {
    let mut stats = VendorStats {
        vendor_id: vendor.id.clone(),
        vendor_name: vendor.name.clone(),
        delivery_count: 0,
        total_quantity: 0,
        total_spend: Decimal::ZERO,
        last_delivery: None,
    };

    let deliveries = items
        .iter()
        .flat_map(|item| item.delivery_history.iter())
        .filter(|d| d.vendor_id.as_deref() == Some(vendor.id.as_str()));
    for delivery in deliveries {
        stats.delivery_count += 1;
        stats.total_quantity += u64::from(delivery.quantity);
        stats.total_spend = stats.total_spend.saturating_add(delivery.total_cost);
        stats.last_delivery = stats.last_delivery.max(Some(delivery.date));
    }

    stats
}

pub fn vendor_stats(vendors: &[Vendor], items: &[Item]) -> Vec<VendorStats> {
    vendors.iter().map(|v| vendor_stats_for(v, items)).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub category_id: String,
    pub name: String,
    pub item_count: usize,
    pub total_value: Decimal,
}

pub fn category_stats(categories: &[Category], items: &[Item]) -> Vec<CategoryStats> {
    categories
        .iter()
        .map(|category| {
            let members = items
                .iter()
                .filter(|i| i.category_id.as_deref() == Some(category.id.as_str()));
            let (item_count, total_value) = members.fold((0, Decimal::ZERO), |(n, v), item| {
                (n + 1, v.saturating_add(stock_value(item)))
            });
            CategoryStats {
                category_id: category.id.clone(),
                name: category.name.clone(),
                item_count,
                total_value,
            }
        })
        .collect()
}

/// Everything the dashboard header and side panels show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardMetrics {
    pub inventory: InventoryMetrics,
    pub vendors: Vec<VendorStats>,
    pub categories: Vec<CategoryStats>,
    pub last_synced: Option<DateTime<Utc>>,
    pub generated_at: DateTime<Utc>,
}

pub fn dashboard_metrics(
    inventory: &Inventory,
    now: DateTime<Utc>,
    low_stock_threshold: u32,
) -> DashboardMetrics {
    DashboardMetrics {
        inventory: inventory_metrics(inventory.items(), now, low_stock_threshold),
        vendors: vendor_stats(inventory.vendors(), inventory.items()),
        categories: category_stats(inventory.categories(), inventory.items()),
        last_synced: inventory.last_synced(),
        generated_at: now,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesSummary {
    pub item_id: String,
    pub name: String,
    pub units_sold: u64,
    pub revenue: Decimal,
    /// Units sold at today's average cost.
    pub cost: Decimal,
    pub profit: Decimal,
}

/// One row per item that has sold at least once.
pub fn sales_summary(items: &[Item]) -> Vec<SalesSummary> {
    items
        .iter()
        .filter(|i| !i.sales_history.is_empty())
        .map(|item| {
            let units_sold = item.units_sold();
            let revenue = item.revenue();
            let cost = Decimal::from(units_sold).saturating_mul(average_cost(item));
            SalesSummary {
                item_id: item.id.clone(),
                name: item.name.clone(),
                units_sold,
                revenue,
                cost,
                profit: revenue.saturating_sub(cost),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryLogEntry {
    pub item_id: String,
    pub item_name: String,
    pub item_sku: String,
    /// `None` when the delivery named no vendor.
    pub vendor_name: Option<String>,
    pub delivery: DeliveryRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryDay {
    pub date: NaiveDate,
    pub total_cost: Decimal,
    pub entries: Vec<DeliveryLogEntry>,
}

/// All deliveries across all items, newest day first.
pub fn delivery_log(items: &[Item], vendors: &[Vendor]) -> Vec<DeliveryDay> {
    let mut entries: Vec<DeliveryLogEntry> = items
        .iter()
        .flat_map(|item| {
            item.delivery_history.iter().map(move |d| DeliveryLogEntry {
                item_id: item.id.clone(),
                item_name: item.name.clone(),
                item_sku: item.sku.clone(),
                vendor_name: d
                    .vendor_id
                    .as_deref()
                    .map(|id| vendor_name(vendors, id).to_string()),
                delivery: d.clone(),
            })
        })
        .collect();
    entries.sort_by(|a, b| b.delivery.date.cmp(&a.delivery.date));

    let mut days: Vec<DeliveryDay> = Vec::new();
    for entry in entries {
        match days.last_mut() {
            Some(day) if day.date == entry.delivery.date => {
                day.total_cost = day.total_cost.saturating_add(entry.delivery.total_cost);
                day.entries.push(entry);
            }
            _ => days.push(DeliveryDay {
                date: entry.delivery.date,
                total_cost: entry.delivery.total_cost,
                entries: vec![entry],
            }),
        }
    }
    days
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ExpiryFilter {
    #[default]
    All,
    /// Critical or warning
    Expiring,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SortKey {
    #[default]
    Name,
    /// Highest quantity first
    Quantity,
    /// Highest price first
    Price,
    /// Soonest expiry first; undated items last
    Expiry,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemQuery {
    /// Case-insensitive match on name or SKU, substring match on barcode.
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub expiry: ExpiryFilter,
    #[serde(default)]
    pub sort: SortKey,
}

impl ItemQuery {
    fn matches(&self, item: &Item, now: DateTime<Utc>) -> bool {
        if let Some(term) = self.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let lower = term.to_lowercase();
            let hit = item.name.to_lowercase().contains(&lower)
                || item.sku.to_lowercase().contains(&lower)
                || item.barcode.as_deref().is_some_and(|b| b.contains(term));
            if !hit {
                return false;
            }
        }

        if let Some(category_id) = &self.category_id {
            if item.category_id.as_ref() != Some(category_id) {
                return false;
            }
        }

        match self.expiry {
            ExpiryFilter::All => true,
            ExpiryFilter::Expiring => expiry_status(item.expiry_date, now).is_expiring(),
            ExpiryFilter::Expired => expiry_status(item.expiry_date, now) == ExpiryStatus::Expired,
        }
    }

    fn compare(&self, a: &Item, b: &Item) -> Ordering {
        match self.sort {
            SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            SortKey::Quantity => b.quantity.cmp(&a.quantity),
            SortKey::Price => b.price.cmp(&a.price),
            SortKey::Expiry => match (a.expiry_date, b.expiry_date) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        }
    }

    pub fn apply<'a>(&self, items: &'a [Item], now: DateTime<Utc>) -> Vec<&'a Item> {
        let mut matched: Vec<&Item> = items.iter().filter(|i| self.matches(i, now)).collect();
        matched.sort_by(|a, b| self.compare(a, b));
        matched
    }
}

/// Per-item drill-down, including the prefill for the next delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDetail {
    pub item_id: String,
    pub name: String,
    pub category: String,
    pub quantity: u32,
    pub price: Decimal,
    pub average_cost: Decimal,
    pub margin_percent: Option<Decimal>,
    pub expiry_status: ExpiryStatus,
    pub days_until_expiry: Option<i64>,
    pub units_sold: u64,
    pub revenue: Decimal,
    pub stock_value: Decimal,
    pub low_stock: bool,
    pub suggested_vendor_id: Option<String>,
    pub suggested_unit_cost: Decimal,
}

pub fn item_detail(
    item: &Item,
    categories: &[Category],
    now: DateTime<Utc>,
    low_stock_threshold: u32,
) -> ItemDetail {
    ItemDetail {
        item_id: item.id.clone(),
        name: item.name.clone(),
        category: category_name(categories, item.category_id.as_deref()).to_string(),
        quantity: item.quantity,
        price: item.price,
        average_cost: average_cost(item),
        margin_percent: margin_percent(item),
        expiry_status: expiry_status(item.expiry_date, now),
        days_until_expiry: item.expiry_date.map(|d| days_until_expiry(d, now)),
        units_sold: item.units_sold(),
        revenue: item.revenue(),
        stock_value: stock_value(item),
        low_stock: is_low_stock(item, low_stock_threshold),
        suggested_vendor_id: item.last_vendor_id().map(str::to_string),
        suggested_unit_cost: item.cost,
    }
}
