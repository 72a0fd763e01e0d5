//! Configuration loading and representation.
//!
//! Everything comes from environment variables:
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `BOMLEDGER_BIND_ADDR` | `0.0.0.0:8080` | HTTP listen address |
//! | `DATABASE_URL` | unset | Postgres when set, in-memory stores otherwise |
//! | `BOMLEDGER_DB_MAX_CONNECTIONS` | `10` | Postgres pool size |
//! | `BOMLEDGER_CATALOG_SEED` | unset | JSON item list loaded into the in-memory catalog |
//! | `BOMLEDGER_SHIPMENT_POLICY` | `assembly_and_components` | which ledgers a shipment drains |

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;
use tracing::warn;

use bomledger_production::ShipmentPolicy;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {message}")]
    Invalid { var: &'static str, message: String },
}

impl ConfigError {
    fn invalid(var: &'static str, message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            var,
            message: message.into(),
        }
    }
}

/// Where the stores live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    InMemory { catalog_seed: Option<PathBuf> },
    Postgres { database_url: String, max_connections: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub backend: StoreBackend,
    pub shipment_policy: ShipmentPolicy,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = match get("BOMLEDGER_BIND_ADDR") {
            Some(raw) => raw
                .parse()
                .map_err(|e| ConfigError::invalid("BOMLEDGER_BIND_ADDR", format!("{raw}: {e}")))?,
            None => {
                warn!("BOMLEDGER_BIND_ADDR not set; using {DEFAULT_BIND_ADDR}");
                DEFAULT_BIND_ADDR
                    .parse()
                    .map_err(|e| ConfigError::invalid("BOMLEDGER_BIND_ADDR", format!("{e}")))?
            }
        };

        let shipment_policy = match get("BOMLEDGER_SHIPMENT_POLICY") {
            Some(raw) => raw
                .parse()
                .map_err(|e| ConfigError::invalid("BOMLEDGER_SHIPMENT_POLICY", format!("{e}")))?,
            None => ShipmentPolicy::default(),
        };

        let backend = match get("DATABASE_URL") {
            Some(database_url) => {
                let max_connections = match get("BOMLEDGER_DB_MAX_CONNECTIONS") {
                    Some(raw) => match raw.parse::<u32>() {
                        Ok(n) if n > 0 => n,
                        _ => {
                            return Err(ConfigError::invalid(
                                "BOMLEDGER_DB_MAX_CONNECTIONS",
                                format!("expected a positive integer, got '{raw}'"),
                            ));
                        }
                    },
                    None => DEFAULT_MAX_CONNECTIONS,
                };
                StoreBackend::Postgres {
                    database_url,
                    max_connections,
                }
            }
            None => {
                warn!("DATABASE_URL not set; using in-memory stores (data is lost on restart)");
                StoreBackend::InMemory {
                    catalog_seed: get("BOMLEDGER_CATALOG_SEED").map(PathBuf::from),
                }
            }
        };

        Ok(Self {
            bind_addr,
            backend,
            shipment_policy,
        })
    }
}
