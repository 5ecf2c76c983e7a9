use std::env;

use crate::error::ConfigError;

const DEFAULT_SERVER_ADDRESS: &str = "0.0.0.0:8080";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    MySql { database_url: String, max_connections: u32 },
    Memory { seed_file: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub server_address: String,
    pub backend: StoreBackend,
}

impl AppConfig {
    /// Reads the process environment. Call `dotenv().ok()` first to pick up `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_address = lookup("SERVER_ADDRESS").unwrap_or_else(|| DEFAULT_SERVER_ADDRESS.to_string());

        let backend = match lookup("STORE_BACKEND").as_deref().unwrap_or("mysql") {
            "mysql" => {
                let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
                let max_connections = match lookup("DB_MAX_CONNECTIONS") {
                    Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                        name: "DB_MAX_CONNECTIONS",
                        value,
                    })?,
                    None => DEFAULT_MAX_CONNECTIONS,
                };
                StoreBackend::MySql { database_url, max_connections }
            }
            "memory" => StoreBackend::Memory { seed_file: lookup("SEED_FILE") },
            other => {
                return Err(ConfigError::Invalid {
                    name: "STORE_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self { server_address, backend })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn mysql_backend_requires_database_url() {
        let err = AppConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DATABASE_URL")));
    }

    #[test]
    fn mysql_defaults_are_applied() {
        let config = AppConfig::from_lookup(lookup_from(&[("DATABASE_URL", "mysql://localhost/tasks")])).unwrap();
        assert_eq!(config.server_address, "0.0.0.0:8080");
        assert_eq!(
            config.backend,
            StoreBackend::MySql {
                database_url: "mysql://localhost/tasks".into(),
                max_connections: 5,
            }
        );
    }

    #[test]
    fn memory_backend_takes_optional_seed() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("STORE_BACKEND", "memory"),
            ("SEED_FILE", "seed.json"),
            ("SERVER_ADDRESS", "127.0.0.1:9000"),
        ]))
        .unwrap();
        assert_eq!(config.server_address, "127.0.0.1:9000");
        assert_eq!(config.backend, StoreBackend::Memory { seed_file: Some("seed.json".into()) });
    }

    #[test]
    fn bad_values_are_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[("STORE_BACKEND", "redis")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "STORE_BACKEND", .. }));

        let err = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "mysql://x"),
            ("DB_MAX_CONNECTIONS", "many"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "DB_MAX_CONNECTIONS", .. }));
    }
}
