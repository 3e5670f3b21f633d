//! Environment-driven configuration
//!
//! Variables (required unless noted):
//!   DB_TYPE       # postgres | mysql (optional, default: postgres)
//!   DB_HOST
//!   DB_PORT       # integer
//!   DB_NAME
//!   DB_USER
//!   DB_PASSWORD   # optional, default: empty
//!
//! A `.env` file in the working directory (or a parent) is loaded by
//! [`load_dotenv`]; variables already present in the process win.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::ConfigError;

/// Name reported by the HTTP layer
pub const APP_NAME: &str = "simple-api";

/// Supported database backends
///
/// Serializes as its `DB_TYPE` spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DbKind {
    #[default]
    Postgres,
    Mysql,
}

impl DbKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Mysql => "mysql",
        }
    }

    /// Bind placeholder for the 1-based parameter `index`.
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Self::Postgres => format!("${index}"),
            Self::Mysql => "?".to_string(),
        }
    }
}

impl fmt::Display for DbKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DbKind {
    type Err = ConfigError;

    /// Case-insensitive, exact match. "post" is not "postgres".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" => Ok(Self::Postgres),
            "mysql" => Ok(Self::Mysql),
            _ => Err(ConfigError::UnsupportedBackend {
                value: s.trim().to_string(),
            }),
        }
    }
}

/// Resolved connection settings.
///
/// Built once at startup and passed by value to whatever needs it.
#[derive(Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub kind: DbKind,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("kind", &self.kind)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl DbConfig {
    /// Resolve from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve from an arbitrary variable source.
    ///
    /// The backend kind is validated first, so an unsupported DB_TYPE is
    /// reported even when other variables are also missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvReader { lookup };

        let kind = match env.optional("DB_TYPE", "") {
            value if value.is_empty() => DbKind::default(),
            value => value.parse()?,
        };

        let host = env.required("DB_HOST")?;
        let port = parse_port("DB_PORT", &env.required("DB_PORT")?)?;
        let database = env.required("DB_NAME")?;
        let user = env.required("DB_USER")?;
        let password = env.optional("DB_PASSWORD", "");

        Ok(Self {
            kind,
            host,
            port,
            database,
            user,
            password,
        })
    }
}

struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Trimmed value; absent or blank is an error naming the variable.
    fn required(&self, name: &'static str) -> Result<String, ConfigError> {
        match (self.lookup)(name) {
            Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
            _ => Err(ConfigError::Missing { name }),
        }
    }

    /// Trimmed value, or `default` when absent. Never fails.
    fn optional(&self, name: &str, default: &str) -> String {
        match (self.lookup)(name) {
            Some(value) => value.trim().to_string(),
            None => default.to_string(),
        }
    }
}

fn parse_port(name: &'static str, value: &str) -> Result<u16, ConfigError> {
    match value.parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(ConfigError::InvalidPort {
            name,
            value: value.to_string(),
        }),
    }
}

/// Load `.env` into the process environment, if one exists.
///
/// Returns the path that was loaded. Missing files are not an error.
pub fn load_dotenv() -> Option<PathBuf> {
    match dotenvy::dotenv() {
        Ok(path) => {
            debug!("Loaded .env from {}", path.display());
            Some(path)
        }
        Err(err) if err.not_found() => {
            debug!("No .env file found, using environment variables only");
            None
        }
        Err(err) => {
            warn!("Failed to load .env: {}", err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    const BASE: &[(&str, &str)] = &[
        ("DB_HOST", "localhost"),
        ("DB_PORT", "5432"),
        ("DB_NAME", "shop"),
        ("DB_USER", "app"),
    ];

    fn with(extra: &[(&'static str, &'static str)]) -> Vec<(&'static str, &'static str)> {
        let mut pairs: Vec<_> = BASE.to_vec();
        for (k, v) in extra {
            pairs.retain(|(name, _)| name != k);
            pairs.push((*k, *v));
        }
        pairs
    }

    #[test]
    fn defaults_to_postgres_with_empty_password() {
        let config = DbConfig::from_lookup(lookup(BASE)).unwrap();
        assert_eq!(config.kind, DbKind::Postgres);
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 5432);
        assert_eq!(config.database, "shop");
        assert_eq!(config.user, "app");
        assert_eq!(config.password, "");
    }

    #[test]
    fn db_type_is_case_insensitive() {
        let config = DbConfig::from_lookup(lookup(&with(&[("DB_TYPE", " MySQL ")]))).unwrap();
        assert_eq!(config.kind, DbKind::Mysql);
    }

    #[test]
    fn blank_db_type_falls_back_to_postgres() {
        let config = DbConfig::from_lookup(lookup(&with(&[("DB_TYPE", "  ")]))).unwrap();
        assert_eq!(config.kind, DbKind::Postgres);
    }

    #[test]
    fn unknown_db_type_is_rejected() {
        let err = DbConfig::from_lookup(lookup(&with(&[("DB_TYPE", "oracle")]))).unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnsupportedBackend {
                value: "oracle".into()
            }
        );
    }

    #[test]
    fn prefix_of_postgres_is_rejected() {
        for value in ["p", "post", "postgre", "my"] {
            let result = DbConfig::from_lookup(lookup(&with(&[("DB_TYPE", value)])));
            assert!(
                matches!(result, Err(ConfigError::UnsupportedBackend { .. })),
                "{value} should be rejected"
            );
        }
    }

    #[test]
    fn unsupported_backend_wins_over_missing_variables() {
        let err = DbConfig::from_lookup(lookup(&[("DB_TYPE", "oracle")])).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedBackend { .. }));
    }

    #[test]
    fn each_required_variable_is_named_when_missing() {
        for name in ["DB_HOST", "DB_PORT", "DB_NAME", "DB_USER"] {
            let pairs: Vec<_> = BASE.iter().copied().filter(|(k, _)| *k != name).collect();
            let err = DbConfig::from_lookup(lookup(&pairs)).unwrap_err();
            assert_eq!(err, ConfigError::Missing { name });
        }
    }

    #[test]
    fn blank_required_variable_counts_as_missing() {
        let err = DbConfig::from_lookup(lookup(&with(&[("DB_HOST", "   ")]))).unwrap_err();
        assert_eq!(err, ConfigError::Missing { name: "DB_HOST" });
    }

    #[test]
    fn values_are_trimmed() {
        let config = DbConfig::from_lookup(lookup(&with(&[
            ("DB_HOST", "  db.internal "),
            ("DB_PORT", " 3306 "),
            ("DB_PASSWORD", " secret "),
        ])))
        .unwrap();
        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, 3306);
        assert_eq!(config.password, "secret");
    }

    #[test]
    fn non_numeric_port_is_rejected() {
        for value in ["abc", "0", "70000", "-1"] {
            let err = DbConfig::from_lookup(lookup(&with(&[("DB_PORT", value)]))).unwrap_err();
            assert_eq!(
                err,
                ConfigError::InvalidPort {
                    name: "DB_PORT",
                    value: value.to_string()
                }
            );
        }
    }

    #[test]
    fn debug_redacts_password() {
        let config =
            DbConfig::from_lookup(lookup(&with(&[("DB_PASSWORD", "hunter2")]))).unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn kind_serializes_as_db_type_value() {
        for kind in [DbKind::Postgres, DbKind::Mysql] {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, kind.as_str());
            assert_eq!(json.as_str().unwrap().parse::<DbKind>().unwrap(), kind);
        }
    }

    #[test]
    fn placeholders_follow_backend() {
        assert_eq!(DbKind::Postgres.placeholder(3), "$3");
        assert_eq!(DbKind::Mysql.placeholder(3), "?");
    }
}
