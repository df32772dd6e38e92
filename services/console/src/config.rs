//! Console configuration.
//!
//! Values come from `GATEHOUSE_*` environment variables; an optional YAML file
//! named by `GATEHOUSE_CONFIG` overrides them field by field.
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::str::FromStr;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const DEFAULT_MAX_PAGE_SIZE: u32 = 100;
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;
pub const MAX_TOKEN_TTL_SECS: u64 = 30 * 24 * 3600;
pub const DEFAULT_PG_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_PG_CONNECT_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_PG_ACQUIRE_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Postgres,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            other => bail!("unknown storage backend: {other}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_ms: u64,
    pub acquire_timeout_ms: u64,
}

#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    pub enabled: bool,
    pub bind_addr: SocketAddr,
    pub token: Option<String>,
}

/// HS256 secret and lifetime for console bearer tokens.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub secret: String,
    pub ttl_secs: u64,
}

#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    pub bind_addr: SocketAddr,
    pub metrics_bind: SocketAddr,
    pub storage: StorageBackend,
    pub postgres: Option<PostgresConfig>,
    pub default_page_size: u32,
    pub max_page_size: u32,
    pub token: TokenConfig,
    pub bootstrap: BootstrapConfig,
}

#[derive(Debug, Default, Deserialize)]
struct ConsoleConfigOverride {
    bind_addr: Option<String>,
    metrics_bind: Option<String>,
    storage: Option<String>,
    postgres_url: Option<String>,
    pg_max_connections: Option<u32>,
    pg_connect_timeout_ms: Option<u64>,
    pg_acquire_timeout_ms: Option<u64>,
    token_secret: Option<String>,
    token_ttl_secs: Option<u64>,
    default_page_size: Option<u32>,
    max_page_size: Option<u32>,
    bootstrap_enabled: Option<bool>,
    bootstrap_bind: Option<String>,
    bootstrap_token: Option<String>,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|err| anyhow::anyhow!("parse {key}: {err}")),
        Err(_) => Ok(default),
    }
}

impl ConsoleConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = env_or("GATEHOUSE_BIND", "0.0.0.0:8443")
            .parse()
            .with_context(|| "parse GATEHOUSE_BIND")?;
        let metrics_bind = env_or("GATEHOUSE_METRICS_BIND", "0.0.0.0:8080")
            .parse()
            .with_context(|| "parse GATEHOUSE_METRICS_BIND")?;
        let storage = env_or("GATEHOUSE_STORAGE", "memory")
            .parse()
            .with_context(|| "parse GATEHOUSE_STORAGE")?;
        let postgres = match std::env::var("GATEHOUSE_POSTGRES_URL") {
            Ok(url) => Some(PostgresConfig {
                url,
                max_connections: env_parse(
                    "GATEHOUSE_PG_MAX_CONNECTIONS",
                    DEFAULT_PG_MAX_CONNECTIONS,
                )?,
                connect_timeout_ms: env_parse(
                    "GATEHOUSE_PG_CONNECT_TIMEOUT_MS",
                    DEFAULT_PG_CONNECT_TIMEOUT_MS,
                )?,
                acquire_timeout_ms: env_parse(
                    "GATEHOUSE_PG_ACQUIRE_TIMEOUT_MS",
                    DEFAULT_PG_ACQUIRE_TIMEOUT_MS,
                )?,
            }),
            Err(_) => None,
        };
        let token = TokenConfig {
            secret: std::env::var("GATEHOUSE_TOKEN_SECRET").unwrap_or_default(),
            ttl_secs: env_parse("GATEHOUSE_TOKEN_TTL_SECS", DEFAULT_TOKEN_TTL_SECS)?,
        };
        let bootstrap = BootstrapConfig {
            enabled: env_parse("GATEHOUSE_BOOTSTRAP_ENABLED", false)?,
            bind_addr: env_or("GATEHOUSE_BOOTSTRAP_BIND", "127.0.0.1:9443")
                .parse()
                .with_context(|| "parse GATEHOUSE_BOOTSTRAP_BIND")?,
            token: std::env::var("GATEHOUSE_BOOTSTRAP_TOKEN").ok(),
        };
        Ok(Self {
            bind_addr,
            metrics_bind,
            storage,
            postgres,
            default_page_size: env_parse("GATEHOUSE_DEFAULT_PAGE_SIZE", DEFAULT_PAGE_SIZE)?,
            max_page_size: env_parse("GATEHOUSE_MAX_PAGE_SIZE", DEFAULT_MAX_PAGE_SIZE)?,
            token,
            bootstrap,
        })
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("GATEHOUSE_CONFIG") {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("read GATEHOUSE_CONFIG: {path}"))?;
            let override_cfg: ConsoleConfigOverride =
                serde_yaml::from_str(&contents).with_context(|| "parse console config yaml")?;
            config.apply(override_cfg)?;
        }
        config.validate()?;
        Ok(config)
    }

    fn apply(&mut self, cfg: ConsoleConfigOverride) -> Result<()> {
        if let Some(value) = cfg.bind_addr {
            self.bind_addr = value.parse().with_context(|| "parse bind_addr")?;
        }
        if let Some(value) = cfg.metrics_bind {
            self.metrics_bind = value.parse().with_context(|| "parse metrics_bind")?;
        }
        if let Some(value) = cfg.storage {
            self.storage = value.parse().with_context(|| "parse storage")?;
        }
        if let Some(url) = cfg.postgres_url {
            let pg = self.postgres.get_or_insert_with(|| PostgresConfig {
                url: String::new(),
                max_connections: DEFAULT_PG_MAX_CONNECTIONS,
                connect_timeout_ms: DEFAULT_PG_CONNECT_TIMEOUT_MS,
                acquire_timeout_ms: DEFAULT_PG_ACQUIRE_TIMEOUT_MS,
            });
            pg.url = url;
        }
        if let Some(pg) = self.postgres.as_mut() {
            if let Some(value) = cfg.pg_max_connections {
                pg.max_connections = value;
            }
            if let Some(value) = cfg.pg_connect_timeout_ms {
                pg.connect_timeout_ms = value;
            }
            if let Some(value) = cfg.pg_acquire_timeout_ms {
                pg.acquire_timeout_ms = value;
            }
        }
        if let Some(value) = cfg.token_secret {
            self.token.secret = value;
        }
        if let Some(value) = cfg.token_ttl_secs {
            self.token.ttl_secs = value;
        }
        if let Some(value) = cfg.default_page_size {
            self.default_page_size = value;
        }
        if let Some(value) = cfg.max_page_size {
            self.max_page_size = value;
        }
        if let Some(value) = cfg.bootstrap_enabled {
            self.bootstrap.enabled = value;
        }
        if let Some(value) = cfg.bootstrap_bind {
            self.bootstrap.bind_addr = value.parse().with_context(|| "parse bootstrap_bind")?;
        }
        if let Some(value) = cfg.bootstrap_token {
            self.bootstrap.token = Some(value);
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.token.secret.trim().is_empty() {
            bail!("GATEHOUSE_TOKEN_SECRET must be set");
        }
        if self.token.ttl_secs == 0 || self.token.ttl_secs > MAX_TOKEN_TTL_SECS {
            bail!("GATEHOUSE_TOKEN_TTL_SECS must be between 1 and {MAX_TOKEN_TTL_SECS}");
        }
        if self.default_page_size == 0 || self.max_page_size < self.default_page_size {
            bail!("page sizes must satisfy 0 < default_page_size <= max_page_size");
        }
        if self.bootstrap.enabled
            && self
                .bootstrap
                .token
                .as_deref()
                .is_none_or(|token| token.trim().is_empty())
        {
            bail!("GATEHOUSE_BOOTSTRAP_TOKEN must be set when bootstrap is enabled");
        }
        Ok(())
    }
}
