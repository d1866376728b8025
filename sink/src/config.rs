use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::{env, net::SocketAddr};

use crate::db::DriverKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    pub driver: DriverKind,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub bind_addr: SocketAddr,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, so it can be exercised without
    /// touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| anyhow!("{} must be set", key))
        };

        let host = required("DATABASE_HOST")?;
        let username = required("DATABASE_USERNAME")?;
        let password = required("DATABASE_PASSWORD")?;

        let database = lookup("DATABASE_NAME").unwrap_or_else(|| "postgres".to_string());

        let port = lookup("DATABASE_PORT")
            .map(|value| value.parse::<u16>())
            .transpose()
            .context("Invalid DATABASE_PORT value")?
            .unwrap_or(5432);

        let driver = lookup("DATABASE_DRIVER")
            .map(|value| value.parse::<DriverKind>().map_err(|err| anyhow!(err)))
            .transpose()?
            .unwrap_or(DriverKind::Pooled);

        let max_connections = lookup("DATABASE_MAX_CONNECTIONS")
            .and_then(|value| value.parse().ok())
            .unwrap_or(10);

        let connect_timeout_secs = lookup("DATABASE_CONNECT_TIMEOUT_SECS")
            .and_then(|value| value.parse().ok())
            .unwrap_or(5);

        let bind_addr_value = lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_addr: SocketAddr = bind_addr_value
            .parse()
            .map_err(|_| anyhow!("Invalid BIND_ADDR value: {}", bind_addr_value))?;

        Ok(Config {
            database: DatabaseConfig {
                host,
                port,
                username,
                password,
                database,
                driver,
                max_connections,
                connect_timeout_secs,
            },
            bind_addr,
        })
    }
}
