//! # Core Session Module
//!
//! The real-time event session and the view-state it maintains. Everything
//! here is transport agnostic: the event channel is reached through the
//! `Connector` / `EventSession` traits and commands go through
//! `CommandGateway`, so the whole state machine runs against in-memory doubles
//! in tests.
//!
//! ## Core Components:
//!
//! - **`codec`**: turns raw topic payloads into `StatisticsSnapshot` and
//!   `OrderEvent` values and enforces their invariants.
//! - **`history`**: newest-first ring of the last 20 order outcomes.
//! - **`statistics`**: the single authoritative aggregate snapshot, replaced
//!   wholesale on every push.
//! - **`notify`**: classification of order outcomes into notification levels
//!   and the broadcast hub the presentation layer listens on.
//! - **`view`**: the mutex-guarded pair of store and history plus the revision
//!   counter that tells renderers when to redraw.
//! - **`router`**: topic name to handler map.
//! - **`connection`**: connect / fail / reconnect state machine.
//! - **`controller`**: `SessionController`, the owner of all of the above.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Payload decoding and validation.
pub mod codec;
/// Connection lifecycle state machine and transport traits.
pub mod connection;
/// Top-level session owner and command surface.
pub mod controller;
/// Bounded newest-first history of order outcomes.
pub mod history;
/// Wire-level domain types.
pub mod model;
/// Notification levels, classification and fan-out.
pub mod notify;
/// Topic to handler dispatch.
pub mod router;
/// Holder of the authoritative statistics snapshot.
pub mod statistics;
/// Shared view-state and its revision signal.
pub mod view;

#[cfg(test)]
pub(crate) mod test_support;

// --- Public API Re-exports ---
pub use codec::MessageCodec;
pub use connection::{ConnectionManager, ConnectionSignal, ConnectionState, Connector, EventSession, InboundMessage};
pub use controller::{CommandGateway, SessionController};
pub use history::{OrderHistoryBuffer, HISTORY_CAPACITY};
pub use model::{OrderAccepted, OrderEvent, OrderRequest, OrderStatus, StatisticsSnapshot};
pub use notify::{Notification, NotificationClassifier, NotificationHub, NotificationLevel};
pub use router::{SubscriptionRouter, TopicHandler};
pub use statistics::StatisticsStore;
pub use view::{DashboardView, ViewStore};
