//! The single application-state aggregate.
//!
//! All mutation goes through [`Inventory`] methods or commands executed
//! against it. Readers get shared references or cloned snapshots.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::models::{Category, Item, Vendor};

/// Identifies one sync attempt. A response is applied only while its token
/// is still the newest one issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SyncToken(u64);

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Inventory {
    items: Vec<Item>,
    vendors: Vec<Vendor>,
    categories: Vec<Category>,
    connected: bool,
    demo_mode: bool,
    last_synced: Option<DateTime<Utc>>,
    #[serde(skip)]
    sync_generation: u64,
    #[serde(skip)]
    last_local_id: i64,
}

impl Inventory {
    pub fn new(items: Vec<Item>, vendors: Vec<Vendor>, categories: Vec<Category>) -> Self {
        Self {
            items,
            vendors,
            categories,
            ..Self::default()
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn vendors(&self) -> &[Vendor] {
        &self.vendors
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn item(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn vendor(&self, id: &str) -> Option<&Vendor> {
        self.vendors.iter().find(|v| v.id == id)
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn is_demo(&self) -> bool {
        self.demo_mode
    }

    pub fn last_synced(&self) -> Option<DateTime<Utc>> {
        self.last_synced
    }

    pub(crate) fn item_mut(&mut self, id: &str) -> Option<&mut Item> {
        self.items.iter_mut().find(|i| i.id == id)
    }

    pub(crate) fn vendor_mut(&mut self, id: &str) -> Option<&mut Vendor> {
        self.vendors.iter_mut().find(|v| v.id == id)
    }

    pub(crate) fn push_item(&mut self, item: Item) {
        self.items.push(item);
    }

    pub(crate) fn remove_item(&mut self, id: &str) -> Option<Item> {
        let index = self.items.iter().position(|i| i.id == id)?;
        Some(self.items.remove(index))
    }

    pub(crate) fn push_vendor(&mut self, vendor: Vendor) {
        self.vendors.push(vendor);
    }

    pub(crate) fn remove_vendor(&mut self, id: &str) -> Option<Vendor> {
        let index = self.vendors.iter().position(|v| v.id == id)?;
        Some(self.vendors.remove(index))
    }

    pub(crate) fn push_category(&mut self, category: Category) {
        self.categories.push(category);
    }

    /// Hands the current items to a merge, leaving the list empty until
    /// [`Inventory::replace_catalog`] puts the merged list back.
    pub(crate) fn take_items(&mut self) -> Vec<Item> {
        std::mem::take(&mut self.items)
    }

    pub(crate) fn replace_catalog(
        &mut self,
        items: Vec<Item>,
        categories: Vec<Category>,
        synced_at: DateTime<Utc>,
    ) {
        self.items = items;
        self.categories = categories;
        self.last_synced = Some(synced_at);
    }

    /// Swaps in a complete data set, e.g. demo data. In-flight syncs are
    /// invalidated so they cannot overwrite it.
    pub(crate) fn load(&mut self, items: Vec<Item>, vendors: Vec<Vendor>, categories: Vec<Category>) {
        self.items = items;
        self.vendors = vendors;
        self.categories = categories;
        self.invalidate_syncs();
    }

    pub(crate) fn mark_connected(&mut self, demo: bool) {
        self.connected = true;
        self.demo_mode = demo;
    }

    pub(crate) fn mark_disconnected(&mut self) {
        self.connected = false;
        self.demo_mode = false;
        self.sync_generation += 1;
    }

    pub(crate) fn touch_synced(&mut self, at: DateTime<Utc>) {
        self.last_synced = Some(at);
    }

    /// Issues a fresh token, superseding every earlier one.
    pub(crate) fn begin_sync(&mut self) -> SyncToken {
        self.sync_generation += 1;
        SyncToken(self.sync_generation)
    }

    /// Invalidates in-flight syncs without starting a new one.
    pub(crate) fn invalidate_syncs(&mut self) {
        self.sync_generation += 1;
    }

    pub fn is_current(&self, token: SyncToken) -> bool {
        token.0 == self.sync_generation
    }

    /// Timestamp-derived id such as `itm1719830400123`, unique within this
    /// process even when two records are created in the same millisecond.
    pub(crate) fn next_local_id(&mut self, prefix: &str, now: DateTime<Utc>) -> String {
        let millis = now.timestamp_millis().max(self.last_local_id + 1);
        self.last_local_id = millis;
        format!("{}{}", prefix, millis)
    }
}

/// Shared handle to the aggregate. Cloning shares the same state.
#[derive(Clone, Default)]
pub struct InventoryStore {
    inner: Arc<RwLock<Inventory>>,
}

impl InventoryStore {
    pub fn new(inventory: Inventory) -> Self {
        Self {
            inner: Arc::new(RwLock::new(inventory)),
        }
    }

    /// Read-only view of the current state.
    pub async fn read(&self) -> RwLockReadGuard<'_, Inventory> {
        self.inner.read().await
    }

    /// Owned copy of the current state.
    pub async fn snapshot(&self) -> Inventory {
        self.inner.read().await.clone()
    }

    pub(crate) async fn write(&self) -> RwLockWriteGuard<'_, Inventory> {
        self.inner.write().await
    }

    pub async fn begin_sync(&self) -> SyncToken {
        self.inner.write().await.begin_sync()
    }

    pub async fn invalidate_syncs(&self) {
        self.inner.write().await.invalidate_syncs();
    }
}
