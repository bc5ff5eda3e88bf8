use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::{
    commands::{CommandContext, InventoryCommand},
    config::AppConfig,
    demo,
    errors::ServiceError,
    events::{Event, EventSender},
    models::Item,
    pos::{CatalogSource, CloverClient, ConnectionSettings},
    scheduler::{PollingScheduler, RefreshInterval},
    services::{
        analytics::{self, DashboardMetrics, DeliveryDay, ItemDetail, ItemQuery, SalesSummary},
        catalog_sync::{CatalogSyncService, SyncOutcome},
    },
    state::{Inventory, InventoryStore},
};

/// Owns the application state and is the only way to change it.
///
/// Readers get snapshots or computed views; writers go through
/// [`Dashboard::apply`], the connection methods, or a sync.
pub struct Dashboard {
    config: AppConfig,
    store: InventoryStore,
    sync: Arc<CatalogSyncService>,
    scheduler: PollingScheduler,
    events: EventSender,
}

impl Dashboard {
    pub fn new(config: AppConfig, events: EventSender) -> Self {
        let store = InventoryStore::default();
        let sync = Arc::new(CatalogSyncService::new(store.clone(), events.clone()));
        let scheduler = PollingScheduler::new(sync.clone(), config.refresh_interval(), config.auto_refresh);

        Self {
            config,
            store,
            sync,
            scheduler,
            events,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &PollingScheduler {
        &self.scheduler
    }

    /// Owned copy of the current state.
    pub async fn snapshot(&self) -> Inventory {
        self.store.snapshot().await
    }

    /// Connects to the Clover catalog with the given credentials.
    #[instrument(skip(self), fields(merchant_id = %settings.merchant_id, sandbox = settings.sandbox))]
    pub async fn connect(&self, settings: ConnectionSettings) -> Result<usize, ServiceError> {
        if let Err(e) = settings.validate() {
            let err = ServiceError::from(e);
            self.events
                .publish(Event::ConnectionFailed {
                    reason: err.to_string(),
                })
                .await;
            return Err(err);
        }
        let client = CloverClient::new(&settings, self.config.client_options())?;
        self.connect_with(Arc::new(client)).await
    }

    /// Connects to an arbitrary catalog source and starts polling it.
    pub async fn connect_with(&self, source: Arc<dyn CatalogSource>) -> Result<usize, ServiceError> {
        let item_count = self.sync.connect(source).await?;
        self.scheduler.set_connected(true).await;
        Ok(item_count)
    }

    /// Replaces all data with the offline demo set.
    pub async fn load_demo(&self) {
        {
            let mut inventory = self.store.write().await;
            inventory.load(demo::items(), demo::vendors(), demo::categories());
            inventory.mark_connected(true);
            inventory.touch_synced(Utc::now());
        }
        info!("Demo data loaded");
        self.events.publish(Event::DemoLoaded).await;
        self.scheduler.set_connected(true).await;
    }

    pub async fn disconnect(&self) {
        self.scheduler.set_connected(false).await;
        self.sync.disconnect().await;
    }

    /// User-triggered sync; failures are reported.
    pub async fn sync_now(&self) -> Result<SyncOutcome, ServiceError> {
        self.scheduler.sync_now().await
    }

    pub async fn set_refresh_interval(&self, interval: RefreshInterval) {
        self.scheduler.set_interval(interval).await;
    }

    pub async fn set_auto_refresh(&self, enabled: bool) {
        self.scheduler.set_auto_refresh(enabled).await;
    }

    /// Executes one user operation. On failure nothing changes and a
    /// rejection event carries the message back to the user.
    pub async fn apply(&self, command: InventoryCommand) -> Result<Event, ServiceError> {
        let name = command.name();
        let ctx = CommandContext::now();
        let result = {
            let mut inventory = self.store.write().await;
            command.execute(&mut inventory, &ctx)
        };

        match result {
            Ok(event) => {
                self.events.publish(event.clone()).await;
                Ok(event)
            }
            Err(e) => {
                warn!(command = name, "Command rejected: {}", e);
                self.events
                    .publish(Event::CommandRejected {
                        message: e.to_string(),
                    })
                    .await;
                Err(e)
            }
        }
    }

    pub async fn metrics(&self) -> DashboardMetrics {
        let inventory = self.store.read().await;
        analytics::dashboard_metrics(&inventory, Utc::now(), self.config.low_stock_threshold)
    }

    pub async fn items(&self, query: &ItemQuery) -> Vec<Item> {
        let inventory = self.store.read().await;
        query
            .apply(inventory.items(), Utc::now())
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn item_detail(&self, item_id: &str) -> Result<ItemDetail, ServiceError> {
        let inventory = self.store.read().await;
        let item = inventory
            .item(item_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Item {} not found", item_id)))?;
        Ok(analytics::item_detail(
            item,
            inventory.categories(),
            Utc::now(),
            self.config.low_stock_threshold,
        ))
    }

    pub async fn delivery_log(&self) -> Vec<DeliveryDay> {
        let inventory = self.store.read().await;
        analytics::delivery_log(inventory.items(), inventory.vendors())
    }

    pub async fn sales_summary(&self) -> Vec<SalesSummary> {
        analytics::sales_summary(self.store.read().await.items())
    }
}
