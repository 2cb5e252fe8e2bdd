//! # Connection Manager
//!
//! Owns the event-channel session and is the only writer of
//! `ConnectionState`.
//!
//! ```text
//! DISCONNECTED --connect()--> CONNECTING --ack--> CONNECTED
//!      ^                          |                   |
//!      +-------- failure ---------+-------------------+
//!      |
//!      +-- reconnect timer (fixed delay) --> connect()
//! ```
//!
//! Every failure of an attempt or of a live session schedules exactly one
//! reconnect after `reconnect_delay`; there is no backoff and no retry cap.
//! `disconnect()` tears the session down but leaves an already scheduled
//! timer alone. `shutdown()` is the explicit teardown that also stops timers.
//!
//! Each attempt is tagged with an epoch. Results from an attempt that was
//! superseded by `disconnect()` are ignored, so a late failure can never
//! clobber a newer session.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;

use crate::core::router::SubscriptionRouter;
use crate::error::TransportError;

/// State of the event channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// No session and no attempt in flight.
    Disconnected,
    /// An attempt is in flight.
    Connecting,
    /// The broker acknowledged the session.
    Connected,
}

/// Lifecycle signal for the session owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionSignal {
    /// A session was established and subscriptions are being registered.
    Connected,
    /// An attempt failed or a live session was lost; a reconnect is scheduled.
    Disconnected {
        /// Human readable cause.
        reason: String,
    },
}

/// One message received on a subscribed topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Destination the message was published to.
    pub topic: String,
    /// Raw payload.
    pub payload: String,
}

/// An established event-channel session.
pub trait EventSession: Send + 'static {
    /// Registers interest in `topic`.
    fn subscribe(&mut self, topic: &str) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Waits for the next topic message. `Ok(None)` means the remote side
    /// ended the session.
    fn next_message(&mut self) -> impl Future<Output = Result<Option<InboundMessage>, TransportError>> + Send;

    /// Ends the session and releases the underlying transport.
    fn close(self) -> impl Future<Output = ()> + Send;
}

/// Factory of event-channel sessions.
pub trait Connector: Send + Sync + 'static {
    /// Session type produced on success.
    type Session: EventSession;

    /// Establishes a new session.
    fn connect(&self) -> impl Future<Output = Result<Self::Session, TransportError>> + Send;
}

struct Attempt {
    epoch: u64,
    /// Cancels the in-flight attempt or live session.
    session: Option<CancellationToken>,
}

struct Inner<C> {
    connector: C,
    router: Arc<SubscriptionRouter>,
    reconnect_delay: Duration,
    state: watch::Sender<ConnectionState>,
    signals: broadcast::Sender<ConnectionSignal>,
    attempt: Mutex<Attempt>,
    pending_reconnects: AtomicUsize,
    shutdown: CancellationToken,
}

/// Connect / fail / reconnect state machine around a `Connector`.
pub struct ConnectionManager<C: Connector> {
    inner: Arc<Inner<C>>,
}

impl<C: Connector> Clone for ConnectionManager<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Connector> ConnectionManager<C> {
    /// Creates a manager in `Disconnected` state. Nothing happens until `connect()`.
    pub fn new(connector: C, router: Arc<SubscriptionRouter>, reconnect_delay: Duration) -> Self {
        let (signals, _) = broadcast::channel(32);
        Self {
            inner: Arc::new(Inner {
                connector,
                router,
                reconnect_delay,
                state: watch::Sender::new(ConnectionState::Disconnected),
                signals,
                attempt: Mutex::new(Attempt {
                    epoch: 0,
                    session: None,
                }),
                pending_reconnects: AtomicUsize::new(0),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Starts an attempt. No-op while `Connecting` or `Connected`, and after `shutdown()`.
    pub fn connect(&self) {
        if self.inner.shutdown.is_cancelled() {
            log::debug!("connect() ignored after shutdown");
            return;
        }

        let (epoch, token) = {
            let mut attempt = self.lock_attempt();
            let current = *self.inner.state.borrow();
            if current != ConnectionState::Disconnected {
                log::debug!("connect() ignored while {:?}", current);
                return;
            }
            attempt.epoch += 1;
            let token = self.inner.shutdown.child_token();
            attempt.session = Some(token.clone());
            self.inner.state.send_replace(ConnectionState::Connecting);
            (attempt.epoch, token)
        };

        let manager = self.clone();
        tokio::spawn(async move {
            manager.run_session(epoch, token).await;
        });
    }

    /// Tears down the active session or in-flight attempt. A reconnect that
    /// is already scheduled still fires.
    pub fn disconnect(&self) {
        let mut attempt = self.lock_attempt();
        let Some(token) = attempt.session.take() else {
            return;
        };
        attempt.epoch += 1;
        token.cancel();
        self.inner.state.send_replace(ConnectionState::Disconnected);
        log::info!("Event channel disconnected on request");
    }

    /// Disconnects and cancels every scheduled reconnect. The manager
    /// refuses to connect again afterwards.
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
        self.disconnect();
    }

    /// Current state.
    pub fn state(&self) -> ConnectionState {
        *self.inner.state.borrow()
    }

    /// Receiver following every state transition.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    /// Receiver of lifecycle signals emitted from now on.
    pub fn signals(&self) -> broadcast::Receiver<ConnectionSignal> {
        self.inner.signals.subscribe()
    }

    /// Reconnect timers that have been scheduled and have not fired yet.
    pub fn pending_reconnects(&self) -> usize {
        self.inner.pending_reconnects.load(Ordering::SeqCst)
    }

    /// Fixed delay between a failure and the next attempt.
    pub fn reconnect_delay(&self) -> Duration {
        self.inner.reconnect_delay
    }

    async fn run_session(&self, epoch: u64, token: CancellationToken) {
        let established = tokio::select! {
            _ = token.cancelled() => {
                log::debug!("Connection attempt {} cancelled", epoch);
                return;
            }
            result = self.inner.connector.connect() => result,
        };

        let mut session = match established {
            Ok(session) => session,
            Err(e) => {
                self.fail(epoch, e.to_string());
                return;
            }
        };

        if !self.mark_connected(epoch) {
            session.close().await;
            return;
        }
        log::info!("Event channel connected");
        self.emit(ConnectionSignal::Connected);

        for topic in self.inner.router.topics() {
            if let Err(e) = session.subscribe(topic).await {
                self.fail(epoch, format!("subscribing to {topic}: {e}"));
                return;
            }
            log::debug!("Subscribed to {}", topic);
        }

        loop {
            let next = tokio::select! {
                _ = token.cancelled() => None,
                next = session.next_message() => Some(next),
            };

            match next {
                None => {
                    session.close().await;
                    return;
                }
                Some(Ok(Some(message))) => {
                    // Failures are reported by the router; the session carries on.
                    let _ = self.inner.router.dispatch(&message.topic, &message.payload);
                }
                Some(Ok(None)) => {
                    self.fail(epoch, "session closed by remote host".to_string());
                    return;
                }
                Some(Err(e)) => {
                    self.fail(epoch, e.to_string());
                    return;
                }
            }
        }
    }

    fn mark_connected(&self, epoch: u64) -> bool {
        let attempt = self.lock_attempt();
        if attempt.epoch != epoch || attempt.session.is_none() {
            log::debug!("Attempt {} established after being superseded", epoch);
            return false;
        }
        self.inner.state.send_replace(ConnectionState::Connected);
        true
    }

    fn fail(&self, epoch: u64, reason: String) {
        {
            let mut attempt = self.lock_attempt();
            if attempt.epoch != epoch || attempt.session.is_none() {
                log::debug!("Ignoring failure of superseded attempt {}: {}", epoch, reason);
                return;
            }
            attempt.session = None;
            self.inner.state.send_replace(ConnectionState::Disconnected);
        }

        log::warn!(
            "Event channel lost: {}. Reconnecting in {}s",
            reason,
            self.inner.reconnect_delay.as_secs_f64()
        );
        self.emit(ConnectionSignal::Disconnected { reason });
        self.schedule_reconnect();
    }

    fn schedule_reconnect(&self) {
        if self.inner.shutdown.is_cancelled() {
            return;
        }
        self.inner.pending_reconnects.fetch_add(1, Ordering::SeqCst);

        let manager = self.clone();
        let shutdown = self.inner.shutdown.clone();
        let delay = self.inner.reconnect_delay;
        tokio::spawn(async move {
            let fired = tokio::select! {
                _ = shutdown.cancelled() => false,
                _ = tokio::time::sleep(delay) => true,
            };
            manager.inner.pending_reconnects.fetch_sub(1, Ordering::SeqCst);
            if fired {
                log::info!("Reconnect timer fired");
                manager.connect();
            }
        });
    }

    fn emit(&self, signal: ConnectionSignal) {
        // Nobody listening is fine.
        let _ = self.inner.signals.send(signal);
    }

    fn lock_attempt(&self) -> MutexGuard<'_, Attempt> {
        self.inner.attempt.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
