//! # STOMP over WebSocket session
//!
//! `StompConnector` opens the socket, performs the CONNECT/CONNECTED exchange
//! and negotiates heart-beats. `StompSession` then yields MESSAGE frames as
//! `InboundMessage`s, sends heart-beats on schedule and fails with
//! `TransportError::Timeout` when the broker stays silent for two agreed
//! intervals.

use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::{timeout, Instant};
use tokio_tungstenite::tungstenite::{self, protocol::Message as WsMessage};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::config::SessionConfig;
use crate::core::connection::{Connector, EventSession, InboundMessage};
use crate::error::TransportError;
use crate::transport::stomp::{HeartBeat, StompFrame};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Opens STOMP sessions against one broker endpoint.
#[derive(Debug, Clone)]
pub struct StompConnector {
    url: Url,
    host: String,
    connect_timeout: Duration,
    heartbeat: Duration,
}

impl StompConnector {
    /// Connector for `config.event_url`.
    pub fn from_config(config: &SessionConfig) -> Result<Self, TransportError> {
        let url = Url::parse(&config.event_url)
            .map_err(|e| TransportError::Connect(format!("invalid event url {}: {}", config.event_url, e)))?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(TransportError::Connect(format!(
                "event url must use ws:// or wss://, got {}",
                config.event_url
            )));
        }
        let host = url.host_str().unwrap_or("localhost").to_string();
        Ok(Self {
            url,
            host,
            connect_timeout: config.connect_timeout,
            heartbeat: config.heartbeat,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl Connector for StompConnector {
    type Session = StompSession;

    async fn connect(&self) -> Result<StompSession, TransportError> {
        log::info!("Connecting to event channel: {}", self.url);

        let (ws, _) = timeout(self.connect_timeout, connect_async(self.url.as_str()))
            .await
            .map_err(|_| TransportError::Timeout)?
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        let (mut write, mut read) = ws.split();

        let offer = HeartBeat::symmetric(self.heartbeat);
        let connect = StompFrame::connect(&self.host, offer);
        write
            .send(WsMessage::Text(connect.encode().into()))
            .await
            .map_err(ws_error)?;

        let connected = timeout(self.connect_timeout, await_connected(&mut read))
            .await
            .map_err(|_| TransportError::Timeout)??;

        let server = connected
            .get("heart-beat")
            .map(HeartBeat::parse)
            .transpose()?
            .unwrap_or_default();
        let (send_every, expect_every) = HeartBeat::negotiate(offer, server);
        log::debug!(
            "STOMP session established (version {}, send every {:?}, expect every {:?})",
            connected.get("version").unwrap_or("?"),
            send_every,
            expect_every
        );

        let now = Instant::now();
        Ok(StompSession {
            write,
            read,
            next_subscription: 0,
            send_every,
            expect_every,
            last_sent: now,
            last_received: now,
        })
    }
}

async fn await_connected(read: &mut SplitStream<WsStream>) -> Result<StompFrame, TransportError> {
    while let Some(message) = read.next().await {
        let text = match message.map_err(ws_error)? {
            WsMessage::Text(text) => text.as_str().to_owned(),
            WsMessage::Binary(data) => String::from_utf8_lossy(&data).into_owned(),
            WsMessage::Close(_) => break,
            _ => continue,
        };
        let Some(frame) = StompFrame::parse(&text)? else {
            continue;
        };
        match frame.command.as_str() {
            "CONNECTED" => return Ok(frame),
            "ERROR" => return Err(broker_error(&frame)),
            other => {
                return Err(TransportError::Handshake(format!("expected CONNECTED, got {other}")));
            }
        }
    }
    Err(TransportError::Handshake("socket closed before CONNECTED".to_string()))
}

/// An established STOMP session.
pub struct StompSession {
    write: SplitSink<WsStream, WsMessage>,
    read: SplitStream<WsStream>,
    next_subscription: u64,
    send_every: Option<Duration>,
    expect_every: Option<Duration>,
    last_sent: Instant,
    last_received: Instant,
}

enum Step {
    Inbound(Option<Result<WsMessage, tungstenite::Error>>),
    Beat,
    Silent,
}

impl StompSession {
    async fn send_frame(&mut self, frame: &StompFrame) -> Result<(), TransportError> {
        self.write
            .send(WsMessage::Text(frame.encode().into()))
            .await
            .map_err(ws_error)?;
        self.last_sent = Instant::now();
        Ok(())
    }

    /// `Ok(None)` when the text was a heart-beat, a frame the client ignores,
    /// or a malformed frame. One WebSocket message carries one frame, so a
    /// bad frame is dropped without ending the session.
    fn accept_text(&mut self, text: &str) -> Result<Option<InboundMessage>, TransportError> {
        let frame = match StompFrame::parse(text) {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                log::trace!("Heart-beat from broker");
                return Ok(None);
            }
            Err(e) => {
                log::warn!("Dropping malformed frame: {}", e);
                return Ok(None);
            }
        };

        match frame.command.as_str() {
            "MESSAGE" => {
                let Some(topic) = frame.get("destination").map(str::to_string) else {
                    log::warn!("Dropping MESSAGE without destination");
                    return Ok(None);
                };
                Ok(Some(InboundMessage {
                    topic,
                    payload: frame.body,
                }))
            }
            "ERROR" => Err(broker_error(&frame)),
            other => {
                log::debug!("Ignoring {} frame", other);
                Ok(None)
            }
        }
    }
}

impl EventSession for StompSession {
    async fn subscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        let id = format!("sub-{}", self.next_subscription);
        self.next_subscription += 1;
        self.send_frame(&StompFrame::subscribe(&id, topic)).await
    }

    async fn next_message(&mut self) -> Result<Option<InboundMessage>, TransportError> {
        loop {
            let beat_at = self.send_every.map(|every| self.last_sent + every);
            let silent_at = self.expect_every.map(|every| self.last_received + every * 2);

            let step = tokio::select! {
                message = self.read.next() => Step::Inbound(message),
                _ = deadline(beat_at) => Step::Beat,
                _ = deadline(silent_at) => Step::Silent,
            };

            match step {
                Step::Inbound(Some(Ok(message))) => {
                    self.last_received = Instant::now();
                    let accepted = match message {
                        WsMessage::Text(text) => self.accept_text(text.as_str())?,
                        WsMessage::Binary(data) => self.accept_text(&String::from_utf8_lossy(&data))?,
                        WsMessage::Close(frame) => {
                            log::info!("Broker closed the socket: {:?}", frame);
                            return Ok(None);
                        }
                        _ => None,
                    };
                    if let Some(message) = accepted {
                        return Ok(Some(message));
                    }
                }
                Step::Inbound(Some(Err(e))) => return Err(ws_error(e)),
                Step::Inbound(None) => return Ok(None),
                Step::Beat => {
                    self.write
                        .send(WsMessage::Text("\n".into()))
                        .await
                        .map_err(ws_error)?;
                    self.last_sent = Instant::now();
                }
                Step::Silent => {
                    log::warn!("No frame or heart-beat from broker within two intervals");
                    return Err(TransportError::Timeout);
                }
            }
        }
    }

    async fn close(mut self) {
        if let Err(e) = self.send_frame(&StompFrame::disconnect()).await {
            log::debug!("DISCONNECT not delivered: {}", e);
        }
        let _ = self.write.close().await;
    }
}

async fn deadline(at: Option<Instant>) {
    match at {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

fn broker_error(frame: &StompFrame) -> TransportError {
    let message = frame
        .get("message")
        .map(str::to_string)
        .unwrap_or_else(|| frame.body.trim().to_string());
    TransportError::Broker(message)
}

fn ws_error(e: tungstenite::Error) -> TransportError {
    match e {
        tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => TransportError::Closed,
        other => TransportError::WebSocket(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_defaults() {
        let connector = StompConnector::from_config(&SessionConfig::default()).unwrap();
        assert_eq!(connector.url().as_str(), "ws://localhost:8080/ws/websocket");
        assert_eq!(connector.host, "localhost");
    }

    #[test]
    fn test_from_config_rejects_http_scheme() {
        let config = SessionConfig {
            event_url: "http://localhost:8080/ws".to_string(),
            ..SessionConfig::default()
        };
        assert!(matches!(StompConnector::from_config(&config), Err(TransportError::Connect(_))));
    }

    #[test]
    fn test_broker_error_prefers_message_header() {
        let frame = StompFrame::new("ERROR").header("message", "Access denied").with_body("details");
        assert_eq!(broker_error(&frame).to_string(), "broker reported an error: Access denied");
        let bare = StompFrame::new("ERROR").with_body(" details \n");
        assert_eq!(broker_error(&bare).to_string(), "broker reported an error: details");
    }
}
