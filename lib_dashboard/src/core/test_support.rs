//! In-memory doubles for the transport and the command gateway.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;

use crate::core::connection::{Connector, EventSession, InboundMessage};
use crate::core::controller::CommandGateway;
use crate::core::model::{OrderAccepted, OrderRequest, StatisticsSnapshot};
use crate::error::{CommandError, TransportError};

pub(crate) type Feed = mpsc::UnboundedSender<Result<InboundMessage, TransportError>>;

enum Outcome {
    Fail,
    Accept(mpsc::UnboundedReceiver<Result<InboundMessage, TransportError>>),
    Hang,
}

#[derive(Default)]
struct ScriptState {
    outcomes: Mutex<VecDeque<Outcome>>,
    attempts: AtomicUsize,
    closed: AtomicUsize,
    subscriptions: Mutex<Vec<String>>,
}

/// Test-side handle deciding how the next connect attempts end.
#[derive(Clone)]
pub(crate) struct Script {
    state: Arc<ScriptState>,
}

impl Script {
    pub(crate) fn fail_next(&self) {
        self.push(Outcome::Fail);
    }

    pub(crate) fn hang_next(&self) {
        self.push(Outcome::Hang);
    }

    /// The next attempt succeeds; messages sent on the returned feed are
    /// delivered to the session, dropping it ends the session.
    pub(crate) fn accept_next(&self) -> Feed {
        let (tx, rx) = mpsc::unbounded_channel();
        self.push(Outcome::Accept(rx));
        tx
    }

    pub(crate) fn attempts(&self) -> usize {
        self.state.attempts.load(Ordering::SeqCst)
    }

    pub(crate) fn closed(&self) -> usize {
        self.state.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn subscriptions(&self) -> Vec<String> {
        self.state.subscriptions.lock().unwrap().clone()
    }

    fn push(&self, outcome: Outcome) {
        self.state.outcomes.lock().unwrap().push_back(outcome);
    }
}

/// Connector replaying scripted outcomes; unscripted attempts fail.
pub(crate) struct ScriptedConnector {
    state: Arc<ScriptState>,
}

impl ScriptedConnector {
    pub(crate) fn new() -> (Self, Script) {
        let state = Arc::new(ScriptState::default());
        (
            Self {
                state: Arc::clone(&state),
            },
            Script { state },
        )
    }
}

impl Connector for ScriptedConnector {
    type Session = MockSession;

    async fn connect(&self) -> Result<MockSession, TransportError> {
        self.state.attempts.fetch_add(1, Ordering::SeqCst);
        let outcome = self.state.outcomes.lock().unwrap().pop_front();
        match outcome {
            Some(Outcome::Accept(feed)) => Ok(MockSession {
                feed,
                state: Arc::clone(&self.state),
            }),
            Some(Outcome::Hang) => std::future::pending().await,
            Some(Outcome::Fail) | None => Err(TransportError::Connect("connection refused".to_string())),
        }
    }
}

pub(crate) struct MockSession {
    feed: mpsc::UnboundedReceiver<Result<InboundMessage, TransportError>>,
    state: Arc<ScriptState>,
}

impl EventSession for MockSession {
    async fn subscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        self.state.subscriptions.lock().unwrap().push(topic.to_string());
        Ok(())
    }

    async fn next_message(&mut self) -> Result<Option<InboundMessage>, TransportError> {
        match self.feed.recv().await {
            Some(Ok(message)) => Ok(Some(message)),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }

    async fn close(self) {
        self.state.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Call counters shared between a `MockGateway` and the test.
#[derive(Default)]
pub(crate) struct GatewayCalls {
    pub(crate) fetch: AtomicUsize,
    pub(crate) submit: AtomicUsize,
    pub(crate) reset: AtomicUsize,
}

/// Gateway answering every command with a canned result.
pub(crate) struct MockGateway {
    pub(crate) statistics: Result<StatisticsSnapshot, CommandError>,
    pub(crate) order: Result<OrderAccepted, CommandError>,
    pub(crate) reset: Result<(), CommandError>,
    pub(crate) calls: Arc<GatewayCalls>,
}

impl MockGateway {
    pub(crate) fn healthy() -> Self {
        Self {
            statistics: Ok(StatisticsSnapshot::ZERO),
            order: Ok(OrderAccepted {
                order_id: "5c6d7e8f-0000-1111-2222-333344445555".to_string(),
                message: Some("Order created and sent to Kafka".to_string()),
                status: Some("PENDING".to_string()),
            }),
            reset: Ok(()),
            calls: Arc::new(GatewayCalls::default()),
        }
    }
}

impl CommandGateway for MockGateway {
    async fn fetch_statistics(&self) -> Result<StatisticsSnapshot, CommandError> {
        self.calls.fetch.fetch_add(1, Ordering::SeqCst);
        self.statistics.clone()
    }

    async fn submit_order(&self, _request: &OrderRequest) -> Result<OrderAccepted, CommandError> {
        self.calls.submit.fetch_add(1, Ordering::SeqCst);
        self.order.clone()
    }

    async fn reset_statistics(&self) -> Result<(), CommandError> {
        self.calls.reset.fetch_add(1, Ordering::SeqCst);
        self.reset.clone()
    }
}

/// Polls `condition` on a 1 ms cadence; panics if it never holds.
pub(crate) async fn eventually(condition: impl Fn() -> bool) {
    for _ in 0..10_000 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("condition not met in time");
}
