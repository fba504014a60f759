//! Runtime configuration loaded from the environment (and `.env`).

use std::env;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_LOGO_FILE: &str = "rps.png";
const DEFAULT_FOOTER_FILE: &str = "handf.png";
const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";
const DEFAULT_MAIL_FROM: &str = "reports@rps.local";
const DEFAULT_MAX_CONNECTIONS: u32 = 20;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be a valid {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Where rendered documents are sent for the operational mailbox.
#[derive(Debug, Clone, PartialEq)]
pub struct MailRelayConfig {
    pub endpoint: String,
    pub token: Option<String>,
    pub from: String,
    pub recipient: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Postgres URL; `None` runs on in-memory stores.
    pub database_url: Option<String>,
    pub bind_address: String,
    pub port: u16,
    pub assets_dir: PathBuf,
    pub logo_file: String,
    pub footer_file: String,
    pub allowed_origins: Vec<String>,
    pub mail_relay: Option<MailRelayConfig>,
    pub max_connections: u32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let port = match get("PORT") {
            Some(value) => value.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                expected: "port number",
                value,
            })?,
            None => DEFAULT_PORT,
        };

        let max_connections = match get("DB_MAX_CONNECTIONS") {
            Some(value) => value
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::Invalid {
                    name: "DB_MAX_CONNECTIONS",
                    expected: "positive integer",
                    value,
                })?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let allowed_origins = get("ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGIN.to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let mail_relay = match (get("MAIL_RELAY_URL"), get("DEFAULT_NOTIFICATION_EMAIL")) {
            (Some(endpoint), Some(recipient)) => Some(MailRelayConfig {
                endpoint,
                token: get("MAIL_RELAY_TOKEN"),
                from: get("MAIL_FROM").unwrap_or_else(|| DEFAULT_MAIL_FROM.to_string()),
                recipient,
            }),
            (Some(_), None) => {
                log::warn!("MAIL_RELAY_URL is set but DEFAULT_NOTIFICATION_EMAIL is not; document dispatch disabled");
                None
            }
            _ => None,
        };

        Ok(Self {
            database_url: get("DATABASE_URL"),
            bind_address: get("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            port,
            assets_dir: get("ASSETS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(default_assets_dir),
            logo_file: get("LOGO_FILE").unwrap_or_else(|| DEFAULT_LOGO_FILE.to_string()),
            footer_file: get("FOOTER_FILE").unwrap_or_else(|| DEFAULT_FOOTER_FILE.to_string()),
            allowed_origins,
            mail_relay,
            max_connections,
        })
    }

    pub fn logo_path(&self) -> PathBuf {
        self.assets_dir.join(&self.logo_file)
    }

    pub fn footer_path(&self) -> PathBuf {
        self.assets_dir.join(&self.footer_file)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        // The empty lookup cannot produce an invalid value.
        Self::from_lookup(|_| None).unwrap_or_else(|_| unreachable!())
    }
}

/// Letterhead images shipped with the crate.
pub fn default_assets_dir() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/static/img"))
}
