//! Runtime settings shared by the session, the transport and the gateway.

use std::time::Duration;

/// Broker destinations the dashboard listens on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicConfig {
    pub statistics: String,
    pub orders: String,
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            statistics: "/topic/statistics".to_string(),
            orders: "/topic/orders".to_string(),
        }
    }
}

/// Configuration for one dashboard session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// WebSocket endpoint of the STOMP broker.
    pub event_url: String,
    /// Base URL of the request/response API. Paths are joined onto it.
    pub api_base_url: String,
    pub topics: TopicConfig,
    /// Fixed delay between a lost session and the next attempt.
    pub reconnect_delay: Duration,
    /// Upper bound for the socket handshake and the STOMP CONNECTED frame.
    pub connect_timeout: Duration,
    /// Heart-beat interval offered to the broker in both directions.
    /// `Duration::ZERO` disables heart-beating.
    pub heartbeat: Duration,
    /// Timeout applied to every HTTP request.
    pub request_timeout: Duration,
    /// Reject order events whose `reason` does not match their `status`.
    pub strict_reason: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            event_url: "ws://localhost:8080/ws/websocket".to_string(),
            api_base_url: "http://localhost:8080/".to_string(),
            topics: TopicConfig::default(),
            reconnect_delay: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(10),
            heartbeat: Duration::from_secs(10),
            request_timeout: Duration::from_secs(10),
            strict_reason: true,
        }
    }
}
