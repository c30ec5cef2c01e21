//! Runtime configuration.
//!
//! Values come from, in increasing precedence: built-in defaults, the optional
//! JSON file at `<config dir>/gymtrack/config.json` (or `GYMTRACK_CONFIG`), and
//! `GYMTRACK_*` environment variables. CLI flags are applied last by `main`.

use std::path::{Path, PathBuf};

use chrono::{FixedOffset, Local, NaiveDate, NaiveTime, Offset, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const APP_NAME: &str = "gymtrack";
const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_PORT: u16 = 7777;
pub const DEFAULT_CLIENT_URL: &str = "http://localhost:7777/api";
pub const DEFAULT_VISION_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_VISION_MODEL: &str = "meta-llama/llama-4-scout-17b-16e-instruct";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {key}: {value}")]
    Invalid { key: &'static str, value: String },

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Settings for the food-image analyzer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisionConfig {
    /// Analysis is disabled without a key.
    pub api_key: Option<String>,
    pub url: String,
    pub model: String,
}

/// Settings for the daily reminder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderConfig {
    /// Local time of day the check runs.
    pub time: NaiveTime,
    pub recipient: Option<String>,
    /// When set, reminders are POSTed here instead of logged.
    pub webhook: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind: String,
    pub port: u16,
    pub db_path: Option<PathBuf>,
    /// Shared password for `/api/auth/verify`. Unset means nobody gets in.
    pub password: Option<String>,
    /// Login attempts allowed per IP per minute.
    pub auth_rate_limit: u32,
    /// Take the client IP from `X-Forwarded-For`/`X-Real-IP`. Only safe behind
    /// a reverse proxy that overwrites those headers.
    pub trust_proxy: bool,
    /// The single timezone used for "today".
    pub utc_offset: FixedOffset,
    pub vision: VisionConfig,
    pub reminder: ReminderConfig,
    /// API base URL used by `train` and `stats`.
    pub client_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            db_path: None,
            password: None,
            auth_rate_limit: 10,
            trust_proxy: false,
            utc_offset: Local::now().offset().fix(),
            vision: VisionConfig {
                api_key: None,
                url: DEFAULT_VISION_URL.to_string(),
                model: DEFAULT_VISION_MODEL.to_string(),
            },
            reminder: ReminderConfig {
                time: NaiveTime::from_hms_opt(20, 0, 0).unwrap_or(NaiveTime::MIN),
                recipient: None,
                webhook: None,
            },
            client_url: DEFAULT_CLIENT_URL.to_string(),
        }
    }
}

/// On-disk overrides. Every field is optional.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct FileConfig {
    pub bind: Option<String>,
    pub port: Option<u16>,
    pub db_path: Option<PathBuf>,
    pub password: Option<String>,
    pub auth_rate_limit: Option<u32>,
    pub trust_proxy: Option<bool>,
    pub utc_offset: Option<String>,
    pub groq_api_key: Option<String>,
    pub vision_url: Option<String>,
    pub vision_model: Option<String>,
    pub reminder_time: Option<String>,
    pub reminder_to: Option<String>,
    pub reminder_webhook: Option<String>,
    pub client_url: Option<String>,
}

impl AppConfig {
    /// Load defaults, then the config file, then the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("GYMTRACK_CONFIG")
            .ok()
            .map(PathBuf::from)
            .or_else(default_config_path);

        let file = match path {
            Some(ref p) if p.exists() => Some(FileConfig::read(p)?),
            _ => None,
        };

        Self::resolve(file, |key| std::env::var(key).ok())
    }

    /// Apply a file and an environment lookup on top of the defaults.
    pub fn resolve(
        file: Option<FileConfig>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(file) = file {
            config.apply(Source::from_file(file))?;
        }
        config.apply(Source::from_env(&env))?;
        Ok(config)
    }

    fn apply(&mut self, source: Source) -> Result<(), ConfigError> {
        if let Some(bind) = source.bind {
            self.bind = bind;
        }
        if let Some(port) = source.port {
            self.port = port
                .parse()
                .map_err(|_| invalid("GYMTRACK_PORT", &port))?;
        }
        if let Some(path) = source.db_path {
            self.db_path = Some(path);
        }
        if let Some(password) = source.password {
            self.password = Some(password);
        }
        if let Some(limit) = source.auth_rate_limit {
            self.auth_rate_limit = limit
                .parse()
                .map_err(|_| invalid("GYMTRACK_AUTH_RATE_LIMIT", &limit))?;
        }
        if let Some(trust) = source.trust_proxy {
            self.trust_proxy = parse_flag(&trust).ok_or_else(|| invalid("GYMTRACK_TRUST_PROXY", &trust))?;
        }
        if let Some(offset) = source.utc_offset {
            self.utc_offset = parse_offset(&offset)?;
        }
        if let Some(key) = source.groq_api_key {
            self.vision.api_key = Some(key);
        }
        if let Some(url) = source.vision_url {
            self.vision.url = url;
        }
        if let Some(model) = source.vision_model {
            self.vision.model = model;
        }
        if let Some(time) = source.reminder_time {
            self.reminder.time = NaiveTime::parse_from_str(&time, "%H:%M")
                .map_err(|_| invalid("GYMTRACK_REMINDER_TIME", &time))?;
        }
        if let Some(to) = source.reminder_to {
            self.reminder.recipient = Some(to);
        }
        if let Some(webhook) = source.reminder_webhook {
            self.reminder.webhook = Some(webhook);
        }
        if let Some(url) = source.client_url {
            self.client_url = url;
        }
        Ok(())
    }

    /// Today's calendar date in the configured timezone.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.utc_offset).date_naive()
    }
}

impl FileConfig {
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Raw string values from either the file or the environment.
#[derive(Default)]
struct Source {
    bind: Option<String>,
    port: Option<String>,
    db_path: Option<PathBuf>,
    password: Option<String>,
    auth_rate_limit: Option<String>,
    trust_proxy: Option<String>,
    utc_offset: Option<String>,
    groq_api_key: Option<String>,
    vision_url: Option<String>,
    vision_model: Option<String>,
    reminder_time: Option<String>,
    reminder_to: Option<String>,
    reminder_webhook: Option<String>,
    client_url: Option<String>,
}

impl Source {
    fn from_file(file: FileConfig) -> Self {
        Self {
            bind: file.bind,
            port: file.port.map(|p| p.to_string()),
            db_path: file.db_path,
            password: file.password,
            auth_rate_limit: file.auth_rate_limit.map(|l| l.to_string()),
            trust_proxy: file.trust_proxy.map(|t| t.to_string()),
            utc_offset: file.utc_offset,
            groq_api_key: file.groq_api_key,
            vision_url: file.vision_url,
            vision_model: file.vision_model,
            reminder_time: file.reminder_time,
            reminder_to: file.reminder_to,
            reminder_webhook: file.reminder_webhook,
            client_url: file.client_url,
        }
    }

    fn from_env(env: &impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| env(key).filter(|v| !v.trim().is_empty());
        Self {
            bind: get("GYMTRACK_BIND"),
            port: get("GYMTRACK_PORT"),
            db_path: get("GYMTRACK_DB_PATH").map(PathBuf::from),
            password: get("GYMTRACK_PASSWORD"),
            auth_rate_limit: get("GYMTRACK_AUTH_RATE_LIMIT"),
            trust_proxy: get("GYMTRACK_TRUST_PROXY"),
            utc_offset: get("GYMTRACK_UTC_OFFSET"),
            groq_api_key: get("GYMTRACK_GROQ_API_KEY"),
            vision_url: get("GYMTRACK_VISION_URL"),
            vision_model: get("GYMTRACK_VISION_MODEL"),
            reminder_time: get("GYMTRACK_REMINDER_TIME"),
            reminder_to: get("GYMTRACK_REMINDER_TO"),
            reminder_webhook: get("GYMTRACK_REMINDER_WEBHOOK"),
            client_url: get("GYMTRACK_URL"),
        }
    }
}

fn invalid(key: &'static str, value: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_NAME).join(CONFIG_FILE))
}

/// Parse `+HH:MM`, `-HH:MM`, `Z` or `UTC`.
pub fn parse_offset(value: &str) -> Result<FixedOffset, ConfigError> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("z") || value.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).ok_or_else(|| invalid("GYMTRACK_UTC_OFFSET", value));
    }

    let (sign, rest) = if let Some(rest) = value.strip_prefix('+') {
        (1, rest)
    } else if let Some(rest) = value.strip_prefix('-') {
        (-1, rest)
    } else {
        return Err(invalid("GYMTRACK_UTC_OFFSET", value));
    };

    let (hours, minutes) = rest
        .split_once(':')
        .ok_or_else(|| invalid("GYMTRACK_UTC_OFFSET", value))?;
    let hours: i32 = hours
        .parse()
        .map_err(|_| invalid("GYMTRACK_UTC_OFFSET", value))?;
    let minutes: i32 = minutes
        .parse()
        .map_err(|_| invalid("GYMTRACK_UTC_OFFSET", value))?;
    if !(0..60).contains(&minutes) {
        return Err(invalid("GYMTRACK_UTC_OFFSET", value));
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .ok_or_else(|| invalid("GYMTRACK_UTC_OFFSET", value))
}
