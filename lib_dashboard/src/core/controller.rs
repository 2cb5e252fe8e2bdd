//! # Session Controller
//!
//! Owner of one dashboard session: the connection manager, the view-state,
//! the notification hub and the command gateway. It starts the event
//! channel, seeds the statistics once, and exposes the two user commands.
//!
//! Commands never touch the view optimistically. `submit_order` leaves the
//! history alone (the outcome arrives later on the orders topic) and
//! `reset_statistics` clears local state only after the server confirmed.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::config::SessionConfig;
use crate::core::codec::MessageCodec;
use crate::core::connection::{ConnectionManager, ConnectionSignal, ConnectionState, Connector};
use crate::core::model::{OrderAccepted, OrderRequest, StatisticsSnapshot};
use crate::core::notify::{Notification, NotificationHub};
use crate::core::router::SubscriptionRouter;
use crate::core::view::{DashboardView, ViewStore};
use crate::error::CommandError;

const NOTIFICATION_CAPACITY: usize = 64;

/// Request/response surface of the backend.
pub trait CommandGateway: Send + Sync + 'static {
    /// Current aggregate snapshot.
    fn fetch_statistics(&self) -> impl Future<Output = Result<StatisticsSnapshot, CommandError>> + Send;

    /// Submits one order. Success means "accepted for processing".
    fn submit_order(&self, request: &OrderRequest)
    -> impl Future<Output = Result<OrderAccepted, CommandError>> + Send;

    /// Asks the backend to zero its counters.
    fn reset_statistics(&self) -> impl Future<Output = Result<(), CommandError>> + Send;
}

/// One live dashboard session.
pub struct SessionController<C: Connector, G: CommandGateway> {
    connection: ConnectionManager<C>,
    view: Arc<ViewStore>,
    gateway: G,
    notifications: NotificationHub,
    lifetime: CancellationToken,
    started: AtomicBool,
}

impl<C: Connector, G: CommandGateway> SessionController<C, G> {
    /// Wires the router, view-state and connection manager. Nothing connects
    /// until `start()`.
    pub fn new(config: &SessionConfig, connector: C, gateway: G) -> Self {
        let view = Arc::new(ViewStore::new());
        let notifications = NotificationHub::new(NOTIFICATION_CAPACITY);
        let router = SubscriptionRouter::dashboard(
            &config.topics,
            MessageCodec::new(config.strict_reason),
            Arc::clone(&view),
            notifications.clone(),
        );
        let connection = ConnectionManager::new(connector, Arc::new(router), config.reconnect_delay);

        Self {
            connection,
            view,
            gateway,
            notifications,
            lifetime: CancellationToken::new(),
            started: AtomicBool::new(false),
        }
    }

    /// Connects the event channel and seeds the statistics once over HTTP.
    /// Calling it again is a no-op.
    pub async fn start(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }

        self.spawn_signal_forwarder();
        self.connection.connect();

        match self.gateway.fetch_statistics().await {
            Ok(snapshot) => {
                if self.view.seed_statistics(snapshot) {
                    log::info!("Seeded statistics: {} orders", snapshot.total_orders);
                } else {
                    log::debug!("Startup statistics discarded, a push arrived first");
                }
            }
            Err(e) => log::warn!("Could not fetch initial statistics: {}", e),
        }
    }

    /// Validates and submits an order. The history is left alone: the
    /// outcome arrives later on the orders topic.
    pub async fn submit_order(
        &self,
        product_name: &str,
        price: f64,
        quantity: u32,
    ) -> Result<OrderAccepted, CommandError> {
        let request = match OrderRequest::new(product_name, price, quantity) {
            Ok(request) => request,
            Err(detail) => {
                let error = CommandError::Invalid(detail);
                self.notifications.publish(Notification::error(error.to_string()));
                return Err(error);
            }
        };

        match self.gateway.submit_order(&request).await {
            Ok(accepted) => {
                log::info!("Order {} accepted ({} x{})", accepted.order_id, request.product_name, request.quantity);
                self.notifications.publish(Notification::info(format!(
                    "Order {}... created and sent to the pipeline",
                    accepted.short_id()
                )));
                Ok(accepted)
            }
            Err(e) => {
                log::warn!("Order submission failed: {}", e);
                self.notifications.publish(Notification::error(e.to_string()));
                Err(e)
            }
        }
    }

    /// Asks the backend to reset; on success zeroes the statistics and empties
    /// the history. On failure nothing local changes.
    pub async fn reset_statistics(&self) -> Result<(), CommandError> {
        match self.gateway.reset_statistics().await {
            Ok(()) => {
                self.view.reset();
                log::info!("Statistics reset");
                self.notifications.publish(Notification::success("Statistics reset successfully"));
                Ok(())
            }
            Err(e) => {
                log::warn!("Statistics reset failed: {}", e);
                self.notifications.publish(Notification::error(e.to_string()));
                Err(e)
            }
        }
    }

    /// Consolidated read. Statistics and history come from one locked snapshot;
    /// connection state is read alongside it and may be one transition behind.
    pub fn view(&self) -> DashboardView {
        let (statistics, orders) = self.view.snapshot();
        DashboardView {
            connection: self.connection.state(),
            statistics,
            orders,
        }
    }

    /// Receiver that changes whenever statistics or history change.
    pub fn watch_view(&self) -> watch::Receiver<u64> {
        self.view.subscribe()
    }

    /// Receiver following connection state transitions.
    pub fn watch_connection(&self) -> watch::Receiver<ConnectionState> {
        self.connection.watch_state()
    }

    /// Hub every user-facing notification is published on.
    pub fn notifications(&self) -> &NotificationHub {
        &self.notifications
    }

    /// The underlying connection manager.
    pub fn connection(&self) -> &ConnectionManager<C> {
        &self.connection
    }

    /// Ends the session: stops the event channel and any scheduled reconnect.
    pub fn shutdown(&self) {
        self.lifetime.cancel();
        self.connection.shutdown();
        log::info!("Session shut down");
    }

    fn spawn_signal_forwarder(&self) {
        let mut signals = self.connection.signals();
        let hub = self.notifications.clone();
        let lifetime = self.lifetime.clone();

        tokio::spawn(async move {
            loop {
                let signal = tokio::select! {
                    _ = lifetime.cancelled() => break,
                    signal = signals.recv() => signal,
                };
                match signal {
                    Ok(ConnectionSignal::Connected) => hub.publish(Notification::success("Connected to order pipeline")),
                    Ok(ConnectionSignal::Disconnected { reason }) => {
                        log::debug!("Disconnected: {}", reason);
                        hub.publish(Notification::error("Failed to connect to backend"));
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        log::warn!("Skipped {} connection signals", skipped);
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }
}

impl<C: Connector, G: CommandGateway> Drop for SessionController<C, G> {
    fn drop(&mut self) {
        self.lifetime.cancel();
        self.connection.shutdown();
    }
}
