use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, instrument, warn};

use crate::{
    errors::ServiceError,
    events::{Event, EventSender},
    models::{Category, Item},
    pos::{CatalogCategory, CatalogItem, CatalogSource},
    state::InventoryStore,
};

/// Whether a sync was requested by the user or by the scheduler. Silent
/// syncs are logged but never shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    Manual,
    Silent,
}

impl SyncMode {
    pub fn is_manual(self) -> bool {
        matches!(self, Self::Manual)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The snapshot was merged into local state.
    Applied {
        item_count: usize,
        category_count: usize,
    },
    /// Demo data is in use; nothing was fetched.
    Demo,
    /// A newer sync started (or polling stopped) while this one was in flight.
    Discarded,
}

/// Builds a fresh local item from a catalog record. Histories start empty.
pub fn hydrate_item(external: CatalogItem) -> Item {
    let price = external.price_major().unwrap_or(Decimal::ZERO);
    let quantity = external.stock_quantity().unwrap_or(0);
    let category_id = external.primary_category_id().map(str::to_string);

    let mut item = Item::new(external.id, external.name, price);
    item.quantity = quantity;
    item.sku = external.sku.unwrap_or_default();
    item.barcode = external.code.filter(|c| !c.trim().is_empty());
    item.category_id = category_id;
    item
}

/// Overwrites the catalog-owned fields of `item`, leaving local history alone.
fn apply_catalog_fields(item: &mut Item, external: &CatalogItem) {
    item.name = external.name.clone();
    if let Some(quantity) = external.stock_quantity() {
        item.quantity = quantity;
    }
    // A zero catalog price means unpriced, not free.
    if let Some(price) = external.price_major().filter(|p| !p.is_zero()) {
        item.price = price;
    }
    if let Some(category_id) = external.primary_category_id() {
        item.category_id = Some(category_id.to_string());
    }
}

/// Merges a catalog listing into the previous local items.
///
/// The catalog decides membership: the result holds exactly one item per
/// distinct catalog id, in catalog order. Local items missing from the
/// catalog are dropped.
pub fn merge_catalog(previous: Vec<Item>, external: Vec<CatalogItem>) -> Vec<Item> {
    let mut local: HashMap<String, Item> = previous
        .into_iter()
        .map(|item| (item.id.clone(), item))
        .collect();
    let mut seen = HashSet::with_capacity(external.len());
    let mut merged = Vec::with_capacity(external.len());

    for record in external {
        if !seen.insert(record.id.clone()) {
            continue;
        }
        match local.remove(&record.id) {
            Some(mut item) => {
                apply_catalog_fields(&mut item, &record);
                merged.push(item);
            }
            None => merged.push(hydrate_item(record)),
        }
    }

    merged
}

pub fn convert_categories(external: Vec<CatalogCategory>) -> Vec<Category> {
    external
        .into_iter()
        .map(|c| Category {
            id: c.id,
            name: c.name,
        })
        .collect()
}

/// Keeps local state in step with the POS catalog.
pub struct CatalogSyncService {
    store: InventoryStore,
    source: RwLock<Option<Arc<dyn CatalogSource>>>,
    events: EventSender,
}

impl CatalogSyncService {
    pub fn new(store: InventoryStore, events: EventSender) -> Self {
        Self {
            store,
            source: RwLock::new(None),
            events,
        }
    }

    pub fn store(&self) -> &InventoryStore {
        &self.store
    }

    fn current_source(&self) -> Option<Arc<dyn CatalogSource>> {
        self.source
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_source(&self, source: Option<Arc<dyn CatalogSource>>) {
        *self.source.write().unwrap_or_else(PoisonError::into_inner) = source;
    }

    /// Fetches the full catalog and replaces local items with it.
    ///
    /// On failure nothing changes: the previous items, categories and
    /// connection status stay as they were.
    #[instrument(skip(self, source))]
    pub async fn connect(&self, source: Arc<dyn CatalogSource>) -> Result<usize, ServiceError> {
        let token = self.store.begin_sync().await;

        let snapshot = match source.fetch_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Connecting to the POS catalog failed: {}", e);
                self.events
                    .publish(Event::ConnectionFailed {
                        reason: e.to_string(),
                    })
                    .await;
                return Err(e.into());
            }
        };

        let item_count = snapshot.items.len();
        let category_count = snapshot.categories.len();
        {
            let mut inventory = self.store.write().await;
            if !inventory.is_current(token) {
                debug!("Connection superseded before the catalog arrived");
                return Err(ServiceError::Internal(
                    "connection attempt was superseded".to_string(),
                ));
            }
            let items = snapshot.items.into_iter().map(hydrate_item).collect();
            inventory.replace_catalog(items, convert_categories(snapshot.categories), Utc::now());
            inventory.mark_connected(false);
        }
        self.set_source(Some(source));

        info!(item_count, category_count, "Connected to POS catalog");
        self.events
            .publish(Event::Connected {
                item_count,
                category_count,
            })
            .await;
        Ok(item_count)
    }

    /// Forgets the catalog source and invalidates in-flight syncs.
    pub async fn disconnect(&self) {
        self.set_source(None);
        self.store.write().await.mark_disconnected();
        info!("Disconnected from POS catalog");
    }

    /// Reconciles local state with a fresh catalog snapshot.
    ///
    /// Every call takes a new generation token; the snapshot is merged only
    /// if no later sync has started and polling was not stopped meanwhile.
    #[instrument(skip(self))]
    pub async fn sync(&self, mode: SyncMode) -> Result<SyncOutcome, ServiceError> {
        {
            let mut inventory = self.store.write().await;
            if inventory.is_demo() {
                inventory.touch_synced(Utc::now());
                drop(inventory);
                debug!(?mode, "Demo mode, skipping catalog fetch");
                self.events.publish(Event::DemoSyncSkipped { mode }).await;
                return Ok(SyncOutcome::Demo);
            }
        }

        let source = self.current_source().ok_or(ServiceError::NotConnected)?;
        let token = self.store.begin_sync().await;

        let result = source.fetch_snapshot().await;

        let mut inventory = self.store.write().await;
        if !inventory.is_current(token) {
            drop(inventory);
            debug!(?mode, "Discarding stale catalog response");
            self.events.publish(Event::StaleSyncDiscarded { mode }).await;
            return Ok(SyncOutcome::Discarded);
        }

        let snapshot = match result {
            Ok(snapshot) => snapshot,
            Err(e) => {
                drop(inventory);
                warn!(?mode, "Catalog sync failed: {}", e);
                self.events
                    .publish(Event::SyncFailed {
                        mode,
                        reason: e.to_string(),
                    })
                    .await;
                return Err(e.into());
            }
        };

        let category_count = snapshot.categories.len();
        let previous = inventory.take_items();
        let merged = merge_catalog(previous, snapshot.items);
        let item_count = merged.len();
        inventory.replace_catalog(merged, convert_categories(snapshot.categories), Utc::now());
        drop(inventory);

        info!(?mode, item_count, category_count, "Catalog synced");
        self.events
            .publish(Event::CatalogSynced {
                mode,
                item_count,
                category_count,
            })
            .await;
        Ok(SyncOutcome::Applied {
            item_count,
            category_count,
        })
    }
}
