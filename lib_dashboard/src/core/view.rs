//! # View State
//!
//! `StatisticsStore` and `OrderHistoryBuffer` live behind one mutex so that a
//! reader always sees a pair that was current at the same instant, and every
//! replace/append/clear is atomic with respect to that read. Each mutation
//! bumps a revision counter published on a `watch` channel.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use crate::core::connection::ConnectionState;
use crate::core::history::OrderHistoryBuffer;
use crate::core::model::{OrderEvent, StatisticsSnapshot};
use crate::core::statistics::StatisticsStore;

/// Consolidated read for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    /// Event channel state at read time.
    pub connection: ConnectionState,
    /// Latest statistics snapshot.
    pub statistics: StatisticsSnapshot,
    /// Recent order outcomes, newest first.
    pub orders: Vec<OrderEvent>,
}

#[derive(Debug, Default)]
struct ViewState {
    statistics: StatisticsStore,
    history: OrderHistoryBuffer,
    /// Set once any snapshot (seed or push) has been applied.
    statistics_received: bool,
}

/// Shared owner of the statistics store and the order history.
#[derive(Debug)]
pub struct ViewStore {
    state: Mutex<ViewState>,
    revision: watch::Sender<u64>,
}

impl Default for ViewStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewStore {
    /// Empty history, zero statistics, revision 0.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ViewState::default()),
            revision: watch::Sender::new(0),
        }
    }

    /// Replaces the statistics snapshot with a pushed one.
    pub fn replace_statistics(&self, snapshot: StatisticsSnapshot) {
        self.update(|state| {
            state.statistics.replace(snapshot);
            state.statistics_received = true;
        });
    }

    /// Applies a startup snapshot unless a snapshot already arrived; a seed
    /// fetched over HTTP must never overwrite a newer push.
    pub fn seed_statistics(&self, snapshot: StatisticsSnapshot) -> bool {
        let applied = {
            let mut state = self.lock();
            if state.statistics_received {
                false
            } else {
                state.statistics.replace(snapshot);
                state.statistics_received = true;
                true
            }
        };
        if applied {
            self.bump();
        }
        applied
    }

    /// Prepends an order outcome to the history.
    pub fn record_order(&self, event: OrderEvent) {
        self.update(|state| state.history.append(event));
    }

    /// Zeroes the statistics and empties the history in one step.
    pub fn reset(&self) {
        self.update(|state| {
            state.statistics.reset();
            state.history.clear();
        });
    }

    /// Current statistics and history contents.
    pub fn snapshot(&self) -> (StatisticsSnapshot, Vec<OrderEvent>) {
        let state = self.lock();
        (state.statistics.current(), state.history.to_vec())
    }

    /// Current statistics only.
    pub fn statistics(&self) -> StatisticsSnapshot {
        self.lock().statistics.current()
    }

    /// Number of held order outcomes.
    pub fn history_len(&self) -> usize {
        self.lock().history.len()
    }

    /// Receiver that changes whenever the view is mutated.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Current revision.
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    fn update<R>(&self, f: impl FnOnce(&mut ViewState) -> R) -> R {
        let result = {
            let mut state = self.lock();
            f(&mut state)
        };
        self.bump();
        result
    }

    fn bump(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }

    fn lock(&self) -> MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::OrderStatus;

    fn stats(total: u64) -> StatisticsSnapshot {
        StatisticsSnapshot {
            total_orders: total,
            running_average: 10.0,
            total_revenue: 10.0 * total as f64,
            successful_orders: total,
            failed_orders: 0,
        }
    }

    #[test]
    fn test_mutations_bump_revision() {
        let view = ViewStore::new();
        let rx = view.subscribe();
        assert_eq!(view.revision(), 0);

        view.replace_statistics(stats(1));
        view.record_order(OrderEvent {
            order_id: "x".to_string(),
            product_name: "Tablet".to_string(),
            price: Some(300.0),
            quantity: Some(1),
            status: OrderStatus::Success,
            running_average: Some(300.0),
            reason: None,
        });
        view.reset();

        assert_eq!(view.revision(), 3);
        assert!(rx.has_changed().unwrap());
        assert_eq!(view.snapshot(), (StatisticsSnapshot::ZERO, Vec::new()));
    }

    #[test]
    fn test_seed_does_not_overwrite_push() {
        let view = ViewStore::new();
        view.replace_statistics(stats(7));
        assert!(!view.seed_statistics(stats(2)));
        assert_eq!(view.statistics(), stats(7));

        let fresh = ViewStore::new();
        assert!(fresh.seed_statistics(stats(2)));
        assert_eq!(fresh.statistics(), stats(2));
        assert!(!fresh.seed_statistics(stats(3)));
    }
}
