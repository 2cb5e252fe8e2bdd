//! # STOMP 1.2 Frames
//!
//! One WebSocket text message carries exactly one frame, or a bare EOL when
//! the peer is only heart-beating.
//!
//! ```text
//! COMMAND EOL
//! (name:value EOL)*
//! EOL
//! body NUL
//! ```

use std::time::Duration;

use crate::error::FrameError;

/// Protocol versions offered in CONNECT, newest first.
pub const ACCEPT_VERSIONS: &str = "1.2,1.1,1.0";

/// A single STOMP frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StompFrame {
    pub command: String,
    /// Headers in wire order; lookups return the first occurrence.
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl StompFrame {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Value of the first header named `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }

    /// CONNECT frame offering `ACCEPT_VERSIONS` and the given heart-beat.
    pub fn connect(host: &str, heart_beat: HeartBeat) -> Self {
        Self::new("CONNECT")
            .header("accept-version", ACCEPT_VERSIONS)
            .header("host", host)
            .header("heart-beat", heart_beat.to_string())
    }

    /// SUBSCRIBE with automatic acknowledgement.
    pub fn subscribe(id: &str, destination: &str) -> Self {
        Self::new("SUBSCRIBE")
            .header("id", id)
            .header("destination", destination)
            .header("ack", "auto")
    }

    pub fn disconnect() -> Self {
        Self::new("DISCONNECT")
    }

    /// Serializes the frame including the trailing NUL.
    pub fn encode(&self) -> String {
        let raw_headers = escapes_disabled(&self.command);
        let mut out = String::with_capacity(self.command.len() + self.body.len() + 64);
        out.push_str(&self.command);
        out.push('\n');
        for (name, value) in &self.headers {
            if raw_headers {
                out.push_str(name);
                out.push(':');
                out.push_str(value);
            } else {
                escape_into(&mut out, name);
                out.push(':');
                escape_into(&mut out, value);
            }
            out.push('\n');
        }
        if !self.body.is_empty() && self.get("content-length").is_none() {
            out.push_str(&format!("content-length:{}\n", self.body.len()));
        }
        out.push('\n');
        out.push_str(&self.body);
        out.push('\0');
        out
    }

    /// Parses one frame. `Ok(None)` is a heart-beat.
    pub fn parse(raw: &str) -> Result<Option<StompFrame>, FrameError> {
        let raw = raw.trim_start_matches(['\r', '\n']);
        if raw.is_empty() {
            return Ok(None);
        }

        let (command, mut rest) = split_line(raw).ok_or(FrameError::UnterminatedBody)?;
        if command.is_empty() {
            return Err(FrameError::MissingCommand);
        }
        let raw_headers = escapes_disabled(command);

        let mut headers = Vec::new();
        loop {
            let (line, tail) = split_line(rest).ok_or(FrameError::UnterminatedBody)?;
            rest = tail;
            if line.is_empty() {
                break;
            }
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| FrameError::MalformedHeader(line.to_string()))?;
            if raw_headers {
                headers.push((name.to_string(), value.to_string()));
            } else {
                headers.push((unescape(name)?, unescape(value)?));
            }
        }

        let content_length = headers
            .iter()
            .find(|(n, _)| n == "content-length")
            .map(|(_, v)| v.trim().parse::<usize>().map_err(|_| FrameError::BadContentLength(v.clone())))
            .transpose()?;

        let body = match content_length {
            Some(len) => {
                let body = rest
                    .get(..len)
                    .ok_or_else(|| FrameError::BadContentLength(len.to_string()))?;
                if !rest[len..].starts_with('\0') {
                    return Err(FrameError::BadContentLength(len.to_string()));
                }
                body
            }
            None => {
                let end = rest.find('\0').ok_or(FrameError::UnterminatedBody)?;
                &rest[..end]
            }
        };

        Ok(Some(StompFrame {
            command: command.to_string(),
            headers,
            body: body.to_string(),
        }))
    }
}

/// Heart-beat intervals in milliseconds, as carried in the `heart-beat` header.
/// Zero means "cannot" / "do not want".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeartBeat {
    /// Smallest interval at which this side can send.
    pub outgoing_ms: u64,
    /// Desired interval at which this side wants to receive.
    pub incoming_ms: u64,
}

impl HeartBeat {
    pub fn symmetric(interval: Duration) -> Self {
        let ms = interval.as_millis() as u64;
        Self {
            outgoing_ms: ms,
            incoming_ms: ms,
        }
    }

    pub fn parse(value: &str) -> Result<Self, FrameError> {
        let bad = || FrameError::BadHeartBeat(value.to_string());
        let (out, inc) = value.split_once(',').ok_or_else(bad)?;
        Ok(Self {
            outgoing_ms: out.trim().parse().map_err(|_| bad())?,
            incoming_ms: inc.trim().parse().map_err(|_| bad())?,
        })
    }

    /// Agreed `(send_every, expect_every)` given our offer and the server's
    /// answer. `None` disables that direction.
    pub fn negotiate(client: HeartBeat, server: HeartBeat) -> (Option<Duration>, Option<Duration>) {
        let agreed = |ours: u64, theirs: u64| {
            (ours != 0 && theirs != 0).then(|| Duration::from_millis(ours.max(theirs)))
        };
        (
            agreed(client.outgoing_ms, server.incoming_ms),
            agreed(client.incoming_ms, server.outgoing_ms),
        )
    }
}

impl std::fmt::Display for HeartBeat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.outgoing_ms, self.incoming_ms)
    }
}

fn escapes_disabled(command: &str) -> bool {
    command == "CONNECT" || command == "CONNECTED"
}

fn split_line(input: &str) -> Option<(&str, &str)> {
    let idx = input.find('\n')?;
    let line = input[..idx].strip_suffix('\r').unwrap_or(&input[..idx]);
    Some((line, &input[idx + 1..]))
}

fn escape_into(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            ':' => out.push_str("\\c"),
            other => out.push(other),
        }
    }
}

fn unescape(value: &str) -> Result<String, FrameError> {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some('c') => out.push(':'),
            _ => return Err(FrameError::InvalidEscape(value.to_string())),
        }
    }
    Ok(out)
}
