//! Server configuration loaded from environment variables

use crate::error::ConfigError;
use serde::Serialize;
use std::env;

/// Origins always allowed to call the server, for local client development
const DEFAULT_ORIGINS: [&str; 2] = ["http://localhost:5173", "http://localhost:3000"];

/// Public address-only relay servers handed to clients
const DEFAULT_STUN_URLS: [&str; 2] = [
    "stun:stun.l.google.com:19302",
    "stun:stun1.l.google.com:19302",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Server host (default: 0.0.0.0)
    pub host: String,
    /// Server port (default: 3000)
    pub port: u16,
    /// CORS allowed origins
    pub cors_origins: Vec<String>,
    /// Address-only relay servers (at least two)
    pub stun_urls: Vec<String>,
    /// Credentialed relay server, when fully configured
    pub turn: Option<TurnServer>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnServer {
    pub url: String,
    pub username: String,
    pub credential: String,
}

/// Body of `GET /relay-config`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayConfig {
    pub relay_servers: Vec<RelayServer>,
}

/// One entry of [`RelayConfig`], shaped like an `RTCIceServer`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelayServer {
    pub urls: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let host = var("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match var("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidPort(raw))?,
            None => 3000,
        };

        let mut cors_origins: Vec<String> = DEFAULT_ORIGINS.iter().map(|s| s.to_string()).collect();
        if let Some(client_url) = var("CLIENT_URL") {
            if client_url == "*" {
                return Err(ConfigError::WildcardOrigin);
            }
            cors_origins.push(client_url);
        }

        let mut stun_urls: Vec<String> = var("STUN_URLS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        // Clients always get at least two address-only servers.
        for default in DEFAULT_STUN_URLS {
            if stun_urls.len() >= 2 {
                break;
            }
            if !stun_urls.iter().any(|url| url == default) {
                stun_urls.push(default.to_string());
            }
        }

        let turn = match (var("TURN_URL"), var("TURN_USERNAME"), var("TURN_CREDENTIAL")) {
            (Some(url), Some(username), Some(credential)) => Some(TurnServer {
                url,
                username,
                credential,
            }),
            _ => None,
        };

        Ok(Config {
            host,
            port,
            cors_origins,
            stun_urls,
            turn,
        })
    }

    /// Get the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Relay servers to hand to clients
    pub fn relay_config(&self) -> RelayConfig {
        let mut relay_servers: Vec<RelayServer> = self
            .stun_urls
            .iter()
            .map(|url| RelayServer {
                urls: url.clone(),
                username: None,
                credential: None,
            })
            .collect();
        if let Some(turn) = &self.turn {
            relay_servers.push(RelayServer {
                urls: turn.url.clone(),
                username: Some(turn.username.clone()),
                credential: Some(turn.credential.clone()),
            });
        }
        RelayConfig { relay_servers }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_origins: DEFAULT_ORIGINS.iter().map(|s| s.to_string()).collect(),
            stun_urls: DEFAULT_STUN_URLS.iter().map(|s| s.to_string()).collect(),
            turn: None,
        }
    }
}
