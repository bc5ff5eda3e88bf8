use serde::{Deserialize, Serialize};

pub const UNREGISTERED_VENDOR: &str = "Unregistered vendor";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vendor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    /// Free text, typically delivery days and order minimums.
    #[serde(default)]
    pub note: String,
}

/// Resolves a vendor reference to a display name.
pub fn vendor_name<'a>(vendors: &'a [Vendor], id: &str) -> &'a str {
    vendors
        .iter()
        .find(|v| v.id == id)
        .map(|v| v.name.as_str())
        .unwrap_or(UNREGISTERED_VENDOR)
}
