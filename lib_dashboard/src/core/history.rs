//! # Order History Buffer
//!
//! A display aid, not a store: the last `HISTORY_CAPACITY` order outcomes,
//! newest first. Events that arrive while the session is down are never
//! back-filled.

use std::collections::VecDeque;

use crate::core::model::OrderEvent;

/// Number of order outcomes kept for display.
pub const HISTORY_CAPACITY: usize = 20;

/// Newest-first bounded sequence of order outcomes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OrderHistoryBuffer {
    events: VecDeque<OrderEvent>,
}

impl OrderHistoryBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self {
            events: VecDeque::with_capacity(HISTORY_CAPACITY + 1),
        }
    }

    /// Inserts `event` at index 0, evicting the oldest entry on overflow.
    pub fn append(&mut self, event: OrderEvent) {
        self.events.push_front(event);
        if self.events.len() > HISTORY_CAPACITY {
            self.events.pop_back();
        }
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Number of held events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True when nothing is held.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Event at `index`, 0 being the newest.
    pub fn get(&self, index: usize) -> Option<&OrderEvent> {
        self.events.get(index)
    }

    /// Iterates newest to oldest.
    pub fn iter(&self) -> impl Iterator<Item = &OrderEvent> {
        self.events.iter()
    }

    /// Copies the contents out, newest first.
    pub fn to_vec(&self) -> Vec<OrderEvent> {
        self.events.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::OrderStatus;

    fn event(n: usize) -> OrderEvent {
        OrderEvent {
            order_id: format!("order-{n}"),
            product_name: "Keyboard".to_string(),
            price: Some(10.0 + n as f64),
            quantity: Some(1),
            status: OrderStatus::Success,
            running_average: None,
            reason: None,
        }
    }

    #[test]
    fn test_append_is_newest_first() {
        let mut history = OrderHistoryBuffer::new();
        history.append(event(1));
        history.append(event(2));
        history.append(event(3));

        let ids: Vec<_> = history.iter().map(|e| e.order_id.as_str()).collect();
        assert_eq!(ids, ["order-3", "order-2", "order-1"]);
    }

    #[test]
    fn test_twenty_first_event_evicts_oldest() {
        let mut history = OrderHistoryBuffer::new();
        for n in 1..=HISTORY_CAPACITY {
            history.append(event(n));
        }
        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert_eq!(history.get(19).unwrap().order_id, "order-1");

        history.append(event(21));

        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert_eq!(history.get(0).unwrap().order_id, "order-21");
        assert!(history.iter().all(|e| e.order_id != "order-1"));
        assert_eq!(history.get(19).unwrap().order_id, "order-2");
    }

    #[test]
    fn test_size_never_exceeds_capacity() {
        let mut history = OrderHistoryBuffer::new();
        for n in 0..250 {
            history.append(event(n));
            assert!(history.len() <= HISTORY_CAPACITY);
        }
        let ids: Vec<usize> = history
            .iter()
            .map(|e| e.order_id.trim_start_matches("order-").parse().unwrap())
            .collect();
        assert!(ids.windows(2).all(|w| w[0] > w[1]));
        assert_eq!(ids[0], 249);
    }

    #[test]
    fn test_clear() {
        let mut history = OrderHistoryBuffer::new();
        history.append(event(1));
        history.clear();
        assert!(history.is_empty());
        history.clear();
        assert!(history.is_empty());
    }
}
