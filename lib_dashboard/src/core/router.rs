//! # Subscription Router
//!
//! Explicit topic name to handler map. The map is built once, when the
//! session is created; the connection manager walks `topics()` after every
//! successful connect to re-issue the broker subscriptions.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::TopicConfig;
use crate::core::codec::MessageCodec;
use crate::core::notify::{Notification, NotificationClassifier, NotificationHub};
use crate::core::view::ViewStore;
use crate::error::DecodeError;

/// Consumer of raw payloads for one topic.
pub trait TopicHandler: Send + Sync {
    /// Decodes `payload` and applies it. On error nothing has been applied.
    fn handle(&self, payload: &str) -> Result<(), DecodeError>;
}

impl<F> TopicHandler for F
where
    F: Fn(&str) -> Result<(), DecodeError> + Send + Sync,
{
    fn handle(&self, payload: &str) -> Result<(), DecodeError> {
        self(payload)
    }
}

/// Statistics topic: decode, then replace the held snapshot.
pub struct StatisticsHandler {
    codec: MessageCodec,
    view: Arc<ViewStore>,
}

impl StatisticsHandler {
    /// Handler writing into `view`.
    pub fn new(codec: MessageCodec, view: Arc<ViewStore>) -> Self {
        Self { codec, view }
    }
}

impl TopicHandler for StatisticsHandler {
    fn handle(&self, payload: &str) -> Result<(), DecodeError> {
        let snapshot = self.codec.decode_statistics(payload)?;
        self.view.replace_statistics(snapshot);
        Ok(())
    }
}

/// Orders topic: decode, prepend to history, classify, notify.
pub struct OrdersHandler {
    codec: MessageCodec,
    view: Arc<ViewStore>,
    notifications: NotificationHub,
}

impl OrdersHandler {
    /// Handler writing into `view` and announcing on `notifications`.
    pub fn new(codec: MessageCodec, view: Arc<ViewStore>, notifications: NotificationHub) -> Self {
        Self {
            codec,
            view,
            notifications,
        }
    }
}

impl TopicHandler for OrdersHandler {
    fn handle(&self, payload: &str) -> Result<(), DecodeError> {
        let event = self.codec.decode_order(payload)?;
        let notification = NotificationClassifier::classify(&event);
        log::info!(
            "Order {} ({}) -> {:?}",
            event.order_id,
            event.product_name,
            event.status
        );
        self.view.record_order(event);
        self.notifications.publish(notification);
        Ok(())
    }
}

/// Topic to handler dispatch table.
#[derive(Default)]
pub struct SubscriptionRouter {
    handlers: BTreeMap<String, Arc<dyn TopicHandler>>,
    reporter: Option<NotificationHub>,
}

impl SubscriptionRouter {
    /// Empty router with no failure reporting.
    pub fn new() -> Self {
        Self::default()
    }

    /// The dashboard's two topics wired to `view`, reporting decode failures on `notifications`.
    pub fn dashboard(
        topics: &TopicConfig,
        codec: MessageCodec,
        view: Arc<ViewStore>,
        notifications: NotificationHub,
    ) -> Self {
        let mut router = Self::new().with_reporter(notifications.clone());
        router.register_topic(&topics.statistics, StatisticsHandler::new(codec, Arc::clone(&view)));
        router.register_topic(&topics.orders, OrdersHandler::new(codec, view, notifications));
        router
    }

    /// Publishes a warning on `hub` for every payload that fails to decode.
    pub fn with_reporter(mut self, hub: NotificationHub) -> Self {
        self.reporter = Some(hub);
        self
    }

    /// Associates `topic` with `handler`. A topic has exactly one handler, so
    /// registering again replaces the previous one.
    pub fn register_topic(&mut self, topic: impl Into<String>, handler: impl TopicHandler + 'static) {
        let topic = topic.into();
        if self.handlers.insert(topic.clone(), Arc::new(handler)).is_some() {
            log::warn!("Handler for topic {} replaced", topic);
        }
    }

    /// Registered topic names, in a stable order.
    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Number of registered topics.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// True when no topic is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Hands `payload` to the handler of `topic`. A payload that fails to
    /// decode is dropped and reported; it never partially applies.
    pub fn dispatch(&self, topic: &str, payload: &str) -> Result<(), DecodeError> {
        let result = match self.handlers.get(topic) {
            Some(handler) => handler.handle(payload),
            None => Err(DecodeError::UnknownTopic(topic.to_string())),
        };

        if let Err(e) = &result {
            log::warn!("Dropped message on {}: {}", topic, e);
            if let Some(hub) = &self.reporter {
                hub.publish(Notification::warning(format!("Dropped malformed message on {topic}: {e}")));
            }
        }
        result
    }
}
