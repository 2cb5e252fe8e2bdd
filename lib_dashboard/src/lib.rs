//! # lib_dashboard
//!
//! Core of the live order-pipeline dashboard. It keeps a persistent event
//! session with the backend broker, folds the pushed statistics and order
//! outcomes into a locally held view, and forwards user commands to the
//! request/response API.
//!
//! ## Modules:
//!
//! - **`core`**: codec, bounded history, statistics store, notification
//!   classification, topic routing, the connection state machine and the
//!   `SessionController` that ties them together.
//! - **`transport`** (feature `transport`): STOMP 1.2 over WebSocket, the
//!   production `Connector` for the event channel.
//! - **`retrieve`** (feature `retrieve`): the HTTP `ApiClient` and the
//!   `HttpGateway` that implements the command side.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

pub mod config;
pub mod core;
pub mod error;

#[cfg(feature = "retrieve")]
pub mod retrieve;
#[cfg(feature = "transport")]
pub mod transport;

pub use config::{SessionConfig, TopicConfig};
pub use error::{CommandError, DecodeError, FrameError, TransportError};
