use clap::Parser;
use lib_dashboard::SessionConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE_NAME: &str = "dashboard_client.conf";

#[derive(Parser, Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[clap(about = "Console dashboard for the order pipeline", version)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[clap(long, env = "DASHBOARD_CONFIG_PATH", help = "Path to the JSON configuration file.")]
    pub config_path: Option<PathBuf>,

    #[clap(long, env = "DASHBOARD_LOG_DIR", help = "Directory for log files.")]
    pub log_dir: Option<PathBuf>,

    #[clap(long, env = "DASHBOARD_LOG_LEVEL", help = "Logging level (trace, debug, info, warn, error).")]
    pub log_level: Option<String>,

    #[clap(long, env = "DASHBOARD_EVENT_URL", help = "WebSocket URL of the STOMP broker.")]
    pub event_url: Option<String>,

    #[clap(long, env = "DASHBOARD_API_URL", help = "Base URL of the order service HTTP API.")]
    pub api_base_url: Option<String>,

    #[clap(long, env = "DASHBOARD_STATISTICS_TOPIC", help = "Destination carrying statistics snapshots.")]
    pub statistics_topic: Option<String>,

    #[clap(long, env = "DASHBOARD_ORDERS_TOPIC", help = "Destination carrying order outcomes.")]
    pub orders_topic: Option<String>,

    #[clap(long, env = "DASHBOARD_RECONNECT_DELAY_MS", help = "Fixed delay in milliseconds before reconnecting the event channel.")]
    pub reconnect_delay_ms: Option<u64>,

    #[clap(long, env = "DASHBOARD_CONNECT_TIMEOUT_MS", help = "Milliseconds to wait for the broker handshake.")]
    pub connect_timeout_ms: Option<u64>,

    #[clap(long, env = "DASHBOARD_HEARTBEAT_MS", help = "STOMP heart-beat interval in milliseconds, 0 to disable.")]
    pub heartbeat_ms: Option<u64>,

    #[clap(long, env = "DASHBOARD_REQUEST_TIMEOUT_MS", help = "Timeout in milliseconds for HTTP requests.")]
    pub request_timeout_ms: Option<u64>,

    #[clap(long, env = "DASHBOARD_STRICT_REASON", help = "Drop order events whose reason does not match their status.")]
    pub strict_reason: Option<bool>,
}

impl Config {
    // 'other' overrides 'self' for Some values
    fn merge(self, other: Config) -> Config {
        Config {
            config_path: other.config_path.or(self.config_path),
            log_dir: other.log_dir.or(self.log_dir),
            log_level: other.log_level.or(self.log_level),
            event_url: other.event_url.or(self.event_url),
            api_base_url: other.api_base_url.or(self.api_base_url),
            statistics_topic: other.statistics_topic.or(self.statistics_topic),
            orders_topic: other.orders_topic.or(self.orders_topic),
            reconnect_delay_ms: other.reconnect_delay_ms.or(self.reconnect_delay_ms),
            connect_timeout_ms: other.connect_timeout_ms.or(self.connect_timeout_ms),
            heartbeat_ms: other.heartbeat_ms.or(self.heartbeat_ms),
            request_timeout_ms: other.request_timeout_ms.or(self.request_timeout_ms),
            strict_reason: other.strict_reason.or(self.strict_reason),
        }
    }

    fn defaults() -> Config {
        let session = SessionConfig::default();
        Config {
            log_dir: Some(PathBuf::from("./logs")),
            log_level: Some("info".to_string()),
            event_url: Some(session.event_url),
            api_base_url: Some(session.api_base_url),
            statistics_topic: Some(session.topics.statistics),
            orders_topic: Some(session.topics.orders),
            reconnect_delay_ms: Some(session.reconnect_delay.as_millis() as u64),
            connect_timeout_ms: Some(session.connect_timeout.as_millis() as u64),
            heartbeat_ms: Some(session.heartbeat.as_millis() as u64),
            request_timeout_ms: Some(session.request_timeout.as_millis() as u64),
            strict_reason: Some(session.strict_reason),
            ..Default::default()
        }
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(|| PathBuf::from("./logs"))
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    /// Library settings; unset fields keep the library defaults.
    pub fn session_config(&self) -> SessionConfig {
        let mut session = SessionConfig::default();
        if let Some(url) = &self.event_url {
            session.event_url = url.clone();
        }
        if let Some(url) = &self.api_base_url {
            session.api_base_url = with_trailing_slash(url);
        }
        if let Some(topic) = &self.statistics_topic {
            session.topics.statistics = topic.clone();
        }
        if let Some(topic) = &self.orders_topic {
            session.topics.orders = topic.clone();
        }
        match self.reconnect_delay_ms {
            Some(0) => log::warn!(
                "reconnect_delay_ms must be positive, keeping {} ms",
                session.reconnect_delay.as_millis()
            ),
            Some(ms) => session.reconnect_delay = Duration::from_millis(ms),
            None => {}
        }
        if let Some(ms) = self.connect_timeout_ms {
            session.connect_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.heartbeat_ms {
            session.heartbeat = Duration::from_millis(ms);
        }
        if let Some(ms) = self.request_timeout_ms {
            session.request_timeout = Duration::from_millis(ms);
        }
        if let Some(strict) = self.strict_reason {
            session.strict_reason = strict;
        }
        session
    }
}

// Url::join drops the last path segment of a base without a trailing slash.
fn with_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    }
}

fn default_config_path() -> PathBuf {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return local;
    }
    dirs::config_dir()
        .map(|dir| dir.join("order-dashboard").join(CONFIG_FILE_NAME))
        .filter(|path| path.exists())
        .unwrap_or(local)
}

fn read_config_file(path: &Path) -> Option<Config> {
    if !path.exists() {
        log::info!("Config file not found at {}. Using defaults and environment/CLI variables.", path.display());
        return None;
    }
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            log::warn!("Failed to read config file {}: {}", path.display(), e);
            return None;
        }
    };
    match serde_json::from_str::<Config>(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            log::warn!("Failed to parse config file {}: {}", path.display(), e);
            None
        }
    }
}

/// Defaults, then the JSON config file, then environment and CLI.
pub fn load_config() -> Config {
    let cli = Config::parse();
    let path = cli.config_path.clone().unwrap_or_else(default_config_path);

    let mut config = Config::defaults();
    if let Some(file_config) = read_config_file(&path) {
        config = config.merge(file_config);
    }
    config.merge(cli)
}
