//! Per-business dashboard feeds driven by Postgres change notifications.
//!
//! Each [`DashboardFeed`] owns one `LISTEN` task. On any order or
//! notification event for its business it re-runs the full fetch→aggregate
//! pipeline and swaps the new summary into a watch channel; it never applies
//! incremental updates. Feeds are scoped resources: dropping the last strong
//! reference aborts the listener task, so no callback fires after teardown.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, OnceLock, Weak};

use serde::Deserialize;
use sqlx::postgres::PgListener;
use sqlx::PgPool;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use uuid::Uuid;

use reachdb_metrics::types::DashboardSummary;

use crate::refresh::load_summary;

const ORDERS_CHANNEL: &str = "reachdb_orders";
const NOTIFICATIONS_CHANNEL: &str = "reachdb_notifications";

/// Payload emitted by the `orders_notify` trigger.
#[derive(Debug, Deserialize)]
struct OrderChangeEvent {
    business_id: Uuid,
    order_id: Uuid,
    op: String,
    status: String,
    old_status: Option<String>,
}

/// Payload emitted by the `notifications_notify` trigger.
#[derive(Debug, Deserialize)]
struct NotificationEvent {
    business_id: Uuid,
}

#[derive(Default)]
struct GateState {
    running: bool,
    pending: bool,
}

/// Single-flight refresh guard.
///
/// While a refresh is in flight, further triggers coalesce into exactly one
/// trailing run instead of racing the shared summary state.
pub(crate) struct RefreshGate {
    state: Mutex<GateState>,
}

impl RefreshGate {
    fn new() -> Self {
        Self {
            state: Mutex::new(GateState::default()),
        }
    }

    async fn run<F, Fut>(&self, mut job: F)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ()>,
    {
        {
            let mut state = self.state.lock().await;
            if state.running {
                state.pending = true;
                return;
            }
            state.running = true;
        }

        loop {
            job().await;

            let mut state = self.state.lock().await;
            if state.pending {
                state.pending = false;
            } else {
                state.running = false;
                return;
            }
        }
    }
}

/// Live dashboard state for one business.
pub struct DashboardFeed {
    business: Uuid,
    pool: PgPool,
    gate: RefreshGate,
    tx: watch::Sender<Option<DashboardSummary>>,
    listener: OnceLock<JoinHandle<()>>,
}

impl DashboardFeed {
    /// Start listening for this business and return the running feed.
    ///
    /// The channel starts at `None` until the first successful refresh.
    ///
    /// # Errors
    ///
    /// Returns [`sqlx::Error`] if the listener connection cannot be set up.
    pub async fn spawn(pool: PgPool, business: Uuid) -> Result<Arc<Self>, sqlx::Error> {
        let mut listener = PgListener::connect_with(&pool).await?;
        listener
            .listen_all([ORDERS_CHANNEL, NOTIFICATIONS_CHANNEL])
            .await?;

        let (tx, _rx) = watch::channel(None);
        let feed = Arc::new(Self {
            business,
            pool,
            gate: RefreshGate::new(),
            tx,
            listener: OnceLock::new(),
        });

        // The task holds only a weak reference so the last subscriber
        // dropping the feed actually ends the subscription.
        let task = tokio::spawn(listen_loop(listener, Arc::downgrade(&feed)));
        let _ = feed.listener.set(task);
        Ok(feed)
    }

    /// Subscribe to summary updates. The current value may still be `None`.
    pub fn subscribe(&self) -> watch::Receiver<Option<DashboardSummary>> {
        self.tx.subscribe()
    }

    /// Re-run the full fetch→aggregate pipeline and publish the result.
    ///
    /// The new summary is constructed completely before the single atomic
    /// swap; on failure the previous value is kept and the error is logged.
    pub async fn refresh(&self) {
        self.gate
            .run(|| async {
                match load_summary(&self.pool, self.business).await {
                    Ok(summary) => {
                        self.tx.send_replace(Some(summary));
                    }
                    Err(e) => {
                        tracing::error!(
                            business = %self.business,
                            error = %e,
                            "dashboard refresh failed; keeping stale summary"
                        );
                    }
                }
            })
            .await;
    }
}

impl Drop for DashboardFeed {
    fn drop(&mut self) {
        if let Some(task) = self.listener.get() {
            task.abort();
        }
    }
}

async fn listen_loop(mut listener: PgListener, feed: Weak<DashboardFeed>) {
    loop {
        let notification = match listener.recv().await {
            Ok(n) => n,
            Err(e) => {
                // The client library re-establishes the connection itself;
                // we only surface the gap and avoid spinning while it does.
                tracing::warn!(error = %e, "listen connection interrupted");
                tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                continue;
            }
        };

        let Some(feed) = feed.upgrade() else { return };

        match notification.channel() {
            ORDERS_CHANNEL => handle_order_event(&feed, notification.payload()).await,
            NOTIFICATIONS_CHANNEL => {
                handle_notification_event(&feed, notification.payload()).await;
            }
            other => tracing::debug!(channel = other, "ignoring notification channel"),
        }
    }
}

async fn handle_order_event(feed: &DashboardFeed, payload: &str) {
    let event: OrderChangeEvent = match serde_json::from_str(payload) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(error = %e, "malformed order change payload");
            return;
        }
    };

    if event.business_id != feed.business {
        return;
    }

    if event.op == "UPDATE" {
        if let Some(old_status) = &event.old_status {
            if *old_status != event.status {
                toast_status_change(feed, &event).await;
            }
        }
    }

    feed.refresh().await;
}

/// Record the user-visible status-change notification.
async fn toast_status_change(feed: &DashboardFeed, event: &OrderChangeEvent) {
    tracing::info!(
        business = %event.business_id,
        order = %event.order_id,
        status = %event.status,
        "order status changed"
    );

    let message = format!("Order {} is now {}", event.order_id, event.status);
    if let Err(e) = reachdb_db::insert_notification(
        &feed.pool,
        event.business_id,
        Some(event.order_id),
        "order_status",
        &message,
    )
    .await
    {
        tracing::warn!(error = %e, "failed to record status notification");
    }
}

async fn handle_notification_event(feed: &DashboardFeed, payload: &str) {
    let event: NotificationEvent = match serde_json::from_str(payload) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(error = %e, "malformed notification payload");
            return;
        }
    };

    if event.business_id == feed.business {
        feed.refresh().await;
    }
}

/// Feeds keyed by business, held weakly.
///
/// The strong references live in the SSE streams, so a feed's listener task
/// ends when its last subscriber disconnects.
#[derive(Clone, Default)]
pub struct FeedRegistry {
    feeds: Arc<Mutex<HashMap<Uuid, Weak<DashboardFeed>>>>,
}

impl FeedRegistry {
    /// Return the live feed for a business, spawning one if needed.
    ///
    /// # Errors
    ///
    /// Returns [`sqlx::Error`] if a new feed's listener cannot be set up.
    pub async fn get_or_spawn(
        &self,
        pool: &PgPool,
        business: Uuid,
    ) -> Result<Arc<DashboardFeed>, sqlx::Error> {
        let mut feeds = self.feeds.lock().await;
        feeds.retain(|_, weak| weak.strong_count() > 0);

        if let Some(feed) = feeds.get(&business).and_then(Weak::upgrade) {
            return Ok(feed);
        }

        let feed = DashboardFeed::spawn(pool.clone(), business).await?;
        feeds.insert(business, Arc::downgrade(&feed));
        Ok(feed)
    }
}
