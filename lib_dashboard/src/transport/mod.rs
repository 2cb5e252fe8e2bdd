//! # Event Channel Transport
//!
//! STOMP 1.2 carried over a raw WebSocket. `stomp` is the frame codec,
//! `session` the `Connector` / `EventSession` pair the connection manager
//! drives.

pub mod session;
pub mod stomp;

pub use session::{StompConnector, StompSession};
pub use stomp::{HeartBeat, StompFrame};
