use std::net::SocketAddr;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} is not a valid socket address: {value}")]
    InvalidAddr { name: &'static str, value: String },

    #[error("{name} must be one of {expected}, got {value}")]
    InvalidChoice {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Redis,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub store_backend: StoreBackend,
    pub redis_url: String,
    pub enforce_board_ownership: bool,
}

impl Config {
    /// Reads `BIND_ADDR`, `STORE_BACKEND`, `REDIS_URL` and `ENFORCE_BOARD_OWNERSHIP`,
    /// after loading a `.env` file when one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| "[::]:3000".to_string());
        let bind_addr: SocketAddr = bind_addr
            .parse()
            .map_err(|_| ConfigError::InvalidAddr {
                name: "BIND_ADDR",
                value: bind_addr.clone(),
            })?;

        let store_backend = match lookup("STORE_BACKEND").as_deref() {
            None | Some("redis") => StoreBackend::Redis,
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(ConfigError::InvalidChoice {
                    name: "STORE_BACKEND",
                    expected: "redis, memory",
                    value: other.to_string(),
                })
            }
        };

        let enforce_board_ownership = match lookup("ENFORCE_BOARD_OWNERSHIP").as_deref() {
            None | Some("") | Some("false") | Some("0") => false,
            Some("true") | Some("1") => true,
            Some(other) => {
                return Err(ConfigError::InvalidChoice {
                    name: "ENFORCE_BOARD_OWNERSHIP",
                    expected: "true, false, 1, 0",
                    value: other.to_string(),
                })
            }
        };

        Ok(Config {
            bind_addr,
            store_backend,
            redis_url: lookup("REDIS_URL").unwrap_or_else(|| "redis://localhost:6379".to_string()),
            enforce_board_ownership,
        })
    }
}
