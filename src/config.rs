//! Application configuration
//!
//! Centralized configuration management with environment variable support
//! and sensible defaults.

use crate::state::FileStore;
use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Persistence configuration
    pub persistence: PersistenceConfig,
    /// Chat endpoint configuration
    pub chat: ChatConfig,
    /// Embed configuration
    pub embed: EmbedConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind the server to
    pub port: u16,
    /// Host address to bind to
    pub host: String,
}

/// Persistence configuration
#[derive(Debug, Clone)]
pub struct PersistenceConfig {
    /// Directory holding the agent storage slot
    pub data_dir: String,
}

/// Chat endpoint configuration
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// URL chat requests are posted to
    pub endpoint: String,
    /// Request timeout in seconds (None = wait indefinitely)
    pub timeout_secs: Option<u64>,
}

/// Embed configuration
#[derive(Debug, Clone)]
pub struct EmbedConfig {
    /// Public origin used in embed snippets (e.g. "https://agents.example.com")
    pub public_origin: String,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            server: ServerConfig {
                port: lookup("PORT")
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8080),
                host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            },
            persistence: PersistenceConfig {
                data_dir: lookup("DATA_DIR").unwrap_or_else(|| {
                    FileStore::default_dir().to_string_lossy().into_owned()
                }),
            },
            chat: ChatConfig {
                endpoint: lookup("CHAT_ENDPOINT")
                    .unwrap_or_else(|| "http://127.0.0.1:3000/api/chat".to_string()),
                timeout_secs: lookup("CHAT_TIMEOUT_SECS")
                    .and_then(|t| t.parse().ok())
                    .filter(|t| *t > 0),
            },
            embed: EmbedConfig {
                public_origin: lookup("PUBLIC_ORIGIN")
                    .unwrap_or_else(|| "http://localhost:8080".to_string()),
            },
        }
    }

    /// Get the server address as a string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
