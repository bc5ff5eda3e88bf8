use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Collection envelope used by every catalog list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub elements: Vec<T>,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            elements: Vec::new(),
        }
    }
}

/// An item as returned by the POS inventory endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Price in minor currency units (cents).
    #[serde(default)]
    pub price: Option<i64>,
    #[serde(default)]
    pub sku: Option<String>,
    /// Product code; the POS stores UPC/EAN barcodes here.
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default, alias = "stockCount")]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub item_stock: Option<ItemStock>,
    #[serde(default)]
    pub categories: Option<Page<CatalogCategory>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemStock {
    #[serde(default)]
    pub quantity: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogCategory {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Both collections of one fetch. A snapshot only exists if both calls succeeded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogSnapshot {
    pub items: Vec<CatalogItem>,
    pub categories: Vec<CatalogCategory>,
}

impl CatalogItem {
    /// Price converted to major units, e.g. `399` becomes `3.99`.
    pub fn price_major(&self) -> Option<Decimal> {
        self.price.map(|cents| Decimal::new(cents, 2))
    }

    /// On-hand quantity, clamped into the local non-negative range.
    pub fn stock_quantity(&self) -> Option<u32> {
        self.quantity
            .or_else(|| self.item_stock.as_ref().and_then(|s| s.quantity))
            .filter(|q| q.is_finite())
            .map(|q| q.round().clamp(0.0, f64::from(u32::MAX)) as u32)
    }

    /// First category association, if the item was fetched with categories expanded.
    pub fn primary_category_id(&self) -> Option<&str> {
        self.categories
            .as_ref()
            .and_then(|page| page.elements.first())
            .map(|c| c.id.as_str())
    }
}
