//! Polling scheduler: a catalog fetch task and a one-second countdown task,
//! both bound to the same refresh interval.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use strum::{Display, EnumString};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::services::catalog_sync::{CatalogSyncService, SyncMode, SyncOutcome};
use crate::errors::ServiceError;

/// The supported refresh periods.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
pub enum RefreshInterval {
    #[strum(serialize = "15s")]
    Secs15,
    #[default]
    #[strum(serialize = "30s")]
    Secs30,
    #[strum(serialize = "1m")]
    Minute1,
    #[strum(serialize = "2m")]
    Minute2,
    #[strum(serialize = "5m")]
    Minute5,
}

impl RefreshInterval {
    pub const ALL: [RefreshInterval; 5] = [
        Self::Secs15,
        Self::Secs30,
        Self::Minute1,
        Self::Minute2,
        Self::Minute5,
    ];

    pub fn from_secs(secs: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|i| i.as_secs() == secs)
    }

    pub fn as_secs(self) -> u64 {
        match self {
            Self::Secs15 => 15,
            Self::Secs30 => 30,
            Self::Minute1 => 60,
            Self::Minute2 => 120,
            Self::Minute5 => 300,
        }
    }

    pub fn duration(self) -> Duration {
        Duration::from_secs(self.as_secs())
    }

    fn countdown_start(self) -> u32 {
        self.as_secs() as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[strum(serialize_all = "lowercase")]
pub enum SchedulerState {
    Idle,
    Active,
}

struct ArmedTasks {
    fetch: JoinHandle<()>,
    countdown: JoinHandle<()>,
}

impl ArmedTasks {
    fn abort(self) {
        self.fetch.abort();
        self.countdown.abort();
    }
}

struct SchedulerInner {
    interval: RefreshInterval,
    connected: bool,
    auto_refresh: bool,
    tasks: Option<ArmedTasks>,
}

impl SchedulerInner {
    fn wants_polling(&self) -> bool {
        self.connected && self.auto_refresh
    }
}

/// Drives silent catalog syncs while connected with auto-refresh on.
pub struct PollingScheduler {
    sync: Arc<CatalogSyncService>,
    inner: Mutex<SchedulerInner>,
    countdown: Arc<watch::Sender<u32>>,
}

impl PollingScheduler {
    pub fn new(sync: Arc<CatalogSyncService>, interval: RefreshInterval, auto_refresh: bool) -> Self {
        let (countdown, _) = watch::channel(interval.countdown_start());
        Self {
            sync,
            inner: Mutex::new(SchedulerInner {
                interval,
                connected: false,
                auto_refresh,
                tasks: None,
            }),
            countdown: Arc::new(countdown),
        }
    }

    pub async fn state(&self) -> SchedulerState {
        if self.inner.lock().await.tasks.is_some() {
            SchedulerState::Active
        } else {
            SchedulerState::Idle
        }
    }

    pub async fn interval(&self) -> RefreshInterval {
        self.inner.lock().await.interval
    }

    pub async fn auto_refresh(&self) -> bool {
        self.inner.lock().await.auto_refresh
    }

    /// Seconds until the next scheduled sync.
    pub fn countdown(&self) -> watch::Receiver<u32> {
        self.countdown.subscribe()
    }

    pub async fn set_connected(&self, connected: bool) {
        let mut inner = self.inner.lock().await;
        inner.connected = connected;
        self.reconcile(&mut inner).await;
    }

    pub async fn set_auto_refresh(&self, enabled: bool) {
        let mut inner = self.inner.lock().await;
        inner.auto_refresh = enabled;
        self.reconcile(&mut inner).await;
    }

    /// Switches the refresh period. While active both tasks are re-armed from
    /// now, so the next fetch is a full new period away.
    pub async fn set_interval(&self, interval: RefreshInterval) {
        let mut inner = self.inner.lock().await;
        inner.interval = interval;
        self.countdown.send_replace(interval.countdown_start());

        if let Some(tasks) = inner.tasks.take() {
            tasks.abort();
            self.sync.store().invalidate_syncs().await;
            inner.tasks = Some(self.arm(interval));
        }
        info!(%interval, "Refresh interval changed");
    }

    /// User-triggered sync. Allowed in any state; the countdown is left alone.
    pub async fn sync_now(&self) -> Result<SyncOutcome, ServiceError> {
        self.sync.sync(SyncMode::Manual).await
    }

    async fn reconcile(&self, inner: &mut SchedulerInner) {
        match (inner.wants_polling(), inner.tasks.is_some()) {
            (true, false) => {
                self.countdown.send_replace(inner.interval.countdown_start());
                inner.tasks = Some(self.arm(inner.interval));
                info!(interval = %inner.interval, "Polling started");
            }
            (false, true) => {
                if let Some(tasks) = inner.tasks.take() {
                    tasks.abort();
                }
                self.sync.store().invalidate_syncs().await;
                info!("Polling stopped");
            }
            _ => {}
        }
    }

    fn arm(&self, interval: RefreshInterval) -> ArmedTasks {
        let start = Instant::now();
        let period = interval.duration();
        let full = interval.countdown_start();

        let fetch = {
            let sync = self.sync.clone();
            tokio::spawn(async move {
                let mut ticker = time::interval_at(start + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    match sync.sync(SyncMode::Silent).await {
                        Ok(outcome) => debug!(?outcome, "Scheduled sync finished"),
                        Err(e) => debug!("Scheduled sync failed: {}", e),
                    }
                }
            })
        };

        let countdown = {
            let countdown = self.countdown.clone();
            let second = Duration::from_secs(1);
            tokio::spawn(async move {
                let mut ticker = time::interval_at(start + second, second);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    let now = ticker.tick().await;
                    countdown.send_replace(seconds_left(start, now, full));
                }
            })
        };

        ArmedTasks { fetch, countdown }
    }
}

/// Countdown value at `now` for a cycle armed at `start`. Reads the full
/// period on every fetch boundary.
fn seconds_left(start: Instant, now: Instant, full: u32) -> u32 {
    let elapsed = (now.saturating_duration_since(start).as_millis() + 500) / 1000;
    let full_u128 = u128::from(full.max(1));
    (full_u128 - elapsed % full_u128) as u32
}

impl Drop for PollingScheduler {
    fn drop(&mut self) {
        if let Some(tasks) = self.inner.get_mut().tasks.take() {
            tasks.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventSender;
    use crate::pos::{CatalogCategory, CatalogError, CatalogItem, CatalogSource};
    use crate::state::InventoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingSource {
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl CatalogSource for CountingSource {
        async fn fetch_items(&self) -> Result<Vec<CatalogItem>, CatalogError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn fetch_categories(&self) -> Result<Vec<CatalogCategory>, CatalogError> {
            Ok(Vec::new())
        }
    }

    async fn connected_scheduler(
        interval: RefreshInterval,
    ) -> (PollingScheduler, Arc<CountingSource>) {
        let (events, rx) = EventSender::channel(64);
        // Drain so publishing never waits on a full channel.
        tokio::spawn(crate::events::process_events(rx, |_| {}));

        let sync = Arc::new(CatalogSyncService::new(InventoryStore::default(), events));
        let source = Arc::new(CountingSource::default());
        sync.connect(source.clone()).await.unwrap();
        source.fetches.store(0, Ordering::SeqCst);

        let scheduler = PollingScheduler::new(sync, interval, true);
        scheduler.set_connected(true).await;
        (scheduler, source)
    }

    #[test]
    fn only_listed_intervals_are_accepted() {
        assert_eq!(RefreshInterval::from_secs(60), Some(RefreshInterval::Minute1));
        assert_eq!(RefreshInterval::from_secs(45), None);
        assert_eq!(RefreshInterval::default().as_secs(), 30);
        assert_eq!(RefreshInterval::Minute5.to_string(), "5m");
    }

    #[test]
    fn countdown_reads_full_period_on_fetch_boundaries() {
        let start = Instant::now();
        let at = |secs: u64| seconds_left(start, start + Duration::from_secs(secs), 30);
        assert_eq!(at(1), 29);
        assert_eq!(at(29), 1);
        assert_eq!(at(30), 30);
        assert_eq!(at(31), 29);
        assert_eq!(at(60), 30);
        assert_eq!(seconds_left(start, start + Duration::from_millis(30_004), 30), 30);
    }

    #[tokio::test(start_paused = true)]
    async fn fetches_once_per_interval_and_wraps_countdown() {
        let (scheduler, source) = connected_scheduler(RefreshInterval::Secs30).await;
        assert_eq!(scheduler.state().await, SchedulerState::Active);
        assert_eq!(*scheduler.countdown().borrow(), 30);

        time::sleep(Duration::from_millis(29_500)).await;
        assert_eq!(source.fetches.load(Ordering::SeqCst), 0);
        assert_eq!(*scheduler.countdown().borrow(), 1);

        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(*scheduler.countdown().borrow(), 30);

        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(*scheduler.countdown().borrow(), 29);

        time::sleep(Duration::from_secs(28)).await;
        assert_eq!(*scheduler.countdown().borrow(), 1);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);

        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
        assert_eq!(*scheduler.countdown().borrow(), 30);
    }

    #[tokio::test(start_paused = true)]
    async fn interval_change_rearms_both_timers() {
        let (scheduler, source) = connected_scheduler(RefreshInterval::Secs30).await;

        time::sleep(Duration::from_secs(20)).await;
        scheduler.set_interval(RefreshInterval::Secs15).await;
        assert_eq!(*scheduler.countdown().borrow(), 15);

        // The old fetch timer would have fired at 30s.
        time::sleep(Duration::from_millis(14_500)).await;
        assert_eq!(source.fetches.load(Ordering::SeqCst), 0);
        assert_eq!(*scheduler.countdown().borrow(), 1);

        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(*scheduler.countdown().borrow(), 15);
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_and_auto_refresh_toggle_stop_polling() {
        let (scheduler, source) = connected_scheduler(RefreshInterval::Secs15).await;

        scheduler.set_auto_refresh(false).await;
        assert_eq!(scheduler.state().await, SchedulerState::Idle);
        time::sleep(Duration::from_secs(60)).await;
        assert_eq!(source.fetches.load(Ordering::SeqCst), 0);

        scheduler.set_auto_refresh(true).await;
        assert_eq!(scheduler.state().await, SchedulerState::Active);
        scheduler.set_connected(false).await;
        assert_eq!(scheduler.state().await, SchedulerState::Idle);
        time::sleep(Duration::from_secs(60)).await;
        assert_eq!(source.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_sync_leaves_countdown_alone() {
        let (scheduler, source) = connected_scheduler(RefreshInterval::Secs30).await;

        time::sleep(Duration::from_millis(10_500)).await;
        let before = *scheduler.countdown().borrow();
        scheduler.sync_now().await.unwrap();

        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(*scheduler.countdown().borrow(), before);
        assert_eq!(before, 20);
    }
}
