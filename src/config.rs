//! Connection and pool configuration
//!
//! Configuration comes from environment variables, a JSON document, or both
//! (JSON first, environment on top):
//!
//! | variable                    | meaning                               | default   |
//! |-----------------------------|---------------------------------------|-----------|
//! | `DATABASE_DSN`              | DSN of the connection named `default` |           |
//! | `DATABASE_DSN_<NAME>`       | DSN of the connection `<name>`        |           |
//! | `DBUTIL_DEFAULT_CONNECTION` | name used when none is given          | `default` |
//! | `DB_MAX_CONNECTIONS`        | pool size cap                         | 10        |
//! | `DB_MIN_CONNECTIONS`        | connections kept warm                 | 1         |
//! | `DB_ACQUIRE_TIMEOUT_SECS`   | wait for a pooled connection          | 30        |
//! | `DB_IDLE_TIMEOUT_SECS`      | idle connection lifetime              | 600       |
//! | `DB_MAX_LIFETIME_SECS`      | absolute connection lifetime          | 1800      |
//! | `DB_STATEMENT_TIMEOUT_SECS` | client-side statement timeout         | none      |

use anyhow::{Context, Result, bail};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::dsn::validate_dsn;

pub const DEFAULT_CONNECTION: &str = "default";

const DSN_VAR: &str = "DATABASE_DSN";
const NAMED_DSN_PREFIX: &str = "DATABASE_DSN_";

/// One named connection
#[derive(Debug, Deserialize)]
pub struct ConnectionConfig {
    #[serde(deserialize_with = "deserialize_secret")]
    pub dsn: SecretString,
}

impl ConnectionConfig {
    pub fn new(dsn: impl Into<String>) -> Self {
        Self {
            dsn: SecretString::from(dsn.into()),
        }
    }
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

/// Pool tuning shared by every connection
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
        }
    }
}

impl PoolSettings {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_lifetime_secs)
    }
}

/// Complete configuration for a [`crate::connection::PoolRegistry`]
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DbUtilConfig {
    /// Name resolved when an operation is given no connection name
    pub default_connection: String,

    /// Named connections
    pub connections: BTreeMap<String, ConnectionConfig>,

    pub pool: PoolSettings,

    /// Client-side statement timeout; unset waits for the server
    pub statement_timeout_secs: Option<u64>,
}

impl Default for DbUtilConfig {
    fn default() -> Self {
        Self {
            default_connection: DEFAULT_CONNECTION.to_string(),
            connections: BTreeMap::new(),
            pool: PoolSettings::default(),
            statement_timeout_secs: None,
        }
    }
}

impl DbUtilConfig {
    /// Build configuration from the process environment
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_vars(std::env::vars())?;
        Ok(config)
    }

    /// Parse a JSON document
    ///
    /// ```rust
    /// # use kodegen_tools_dbutil::config::DbUtilConfig;
    /// # fn main() -> anyhow::Result<()> {
    /// let config = DbUtilConfig::from_json(r#"{
    ///     "connections": { "default": { "dsn": "mysql://app@localhost/shop" } },
    ///     "pool": { "max_connections": 4 }
    /// }"#)?;
    /// assert_eq!(config.pool.max_connections, 4);
    /// assert_eq!(config.pool.min_connections, 1);
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).context("Invalid configuration JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
        Self::from_json(&json)
    }

    /// Overlay `(name, value)` pairs using the environment variable names
    ///
    /// Unrelated variables are ignored.
    pub fn apply_vars<I, K, V>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let (key, value) = (key.as_ref(), value.as_ref());
            match key {
                DSN_VAR => self.add_connection(DEFAULT_CONNECTION, value),
                "DBUTIL_DEFAULT_CONNECTION" => self.default_connection = value.to_lowercase(),
                "DB_MAX_CONNECTIONS" => self.pool.max_connections = parse_number(key, value)?,
                "DB_MIN_CONNECTIONS" => self.pool.min_connections = parse_number(key, value)?,
                "DB_ACQUIRE_TIMEOUT_SECS" => {
                    self.pool.acquire_timeout_secs = parse_number(key, value)?
                }
                "DB_IDLE_TIMEOUT_SECS" => self.pool.idle_timeout_secs = parse_number(key, value)?,
                "DB_MAX_LIFETIME_SECS" => self.pool.max_lifetime_secs = parse_number(key, value)?,
                "DB_STATEMENT_TIMEOUT_SECS" => {
                    self.statement_timeout_secs = Some(parse_number(key, value)?)
                }
                _ => {
                    if let Some(name) = key.strip_prefix(NAMED_DSN_PREFIX)
                        && !name.is_empty()
                    {
                        self.add_connection(&name.to_lowercase(), value);
                    }
                }
            }
        }
        self.validate()
    }

    /// Register or replace a named connection
    pub fn add_connection(&mut self, name: &str, dsn: &str) {
        self.connections
            .insert(name.to_string(), ConnectionConfig::new(dsn));
    }

    pub fn statement_timeout(&self) -> Option<Duration> {
        self.statement_timeout_secs.map(Duration::from_secs)
    }

    /// Check DSNs and pool bounds
    pub fn validate(&self) -> Result<()> {
        for (name, connection) in &self.connections {
            validate_dsn(connection.dsn.expose_secret())
                .with_context(|| format!("Invalid DSN for connection '{}'", name))?;
        }

        if self.pool.max_connections == 0 {
            bail!("max_connections must be at least 1");
        }

        if self.pool.min_connections > self.pool.max_connections {
            bail!(
                "min_connections ({}) exceeds max_connections ({})",
                self.pool.min_connections,
                self.pool.max_connections
            );
        }

        if self.statement_timeout_secs == Some(0) {
            bail!("statement_timeout_secs must be at least 1");
        }

        Ok(())
    }
}

fn parse_number<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("{} must be a non-negative integer, got '{}'", key, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<DbUtilConfig> {
        let mut config = DbUtilConfig::default();
        config.apply_vars(pairs.iter().copied())?;
        Ok(config)
    }

    #[test]
    fn defaults_without_variables() {
        let config = from_pairs(&[]).expect("empty config is valid");
        assert_eq!(config.default_connection, "default");
        assert!(config.connections.is_empty());
        assert_eq!(config.pool, PoolSettings::default());
        assert_eq!(config.statement_timeout(), None);
    }

    #[test]
    fn named_connections_are_lowercased() {
        let config = from_pairs(&[
            ("DATABASE_DSN", "mysql://app@localhost/shop"),
            ("DATABASE_DSN_REPORTING", "mariadb://ro@replica/shop"),
            ("DBUTIL_DEFAULT_CONNECTION", "Reporting"),
            ("PATH", "/usr/bin"),
        ])
        .expect("valid config");

        let names: Vec<&str> = config.connections.keys().map(String::as_str).collect();
        assert_eq!(names, ["default", "reporting"]);
        assert_eq!(config.default_connection, "reporting");
    }

    #[test]
    fn pool_overrides() {
        let config = from_pairs(&[
            ("DB_MAX_CONNECTIONS", "4"),
            ("DB_MIN_CONNECTIONS", "2"),
            ("DB_STATEMENT_TIMEOUT_SECS", "5"),
        ])
        .expect("valid config");
        assert_eq!(config.pool.max_connections, 4);
        assert_eq!(config.pool.min_connections, 2);
        assert_eq!(config.statement_timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(from_pairs(&[("DB_MAX_CONNECTIONS", "many")]).is_err());
        assert!(from_pairs(&[("DB_MAX_CONNECTIONS", "0")]).is_err());
        assert!(from_pairs(&[("DB_MIN_CONNECTIONS", "20")]).is_err());
        assert!(from_pairs(&[("DB_STATEMENT_TIMEOUT_SECS", "0")]).is_err());
        assert!(from_pairs(&[("DATABASE_DSN", "postgres://localhost/db")]).is_err());
    }

    #[test]
    fn json_with_env_overlay() {
        let mut config = DbUtilConfig::from_json(
            r#"{"connections": {"default": {"dsn": "mysql://app@localhost/shop"}}}"#,
        )
        .expect("valid json");
        config
            .apply_vars([("DB_STATEMENT_TIMEOUT_SECS", "3")])
            .expect("valid overlay");

        assert_eq!(config.connections.len(), 1);
        assert_eq!(config.statement_timeout_secs, Some(3));
        assert!(!format!("{:?}", config).contains("mysql://app@localhost"));
    }
}
