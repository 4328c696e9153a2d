//! Environment-driven configuration.
//!
//! Every value has a default so the service can start with zero
//! configuration against a local Postgres/Kafka. No configuration value
//! affects core semantics beyond connectivity (spec §6).

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub postgres: PostgresConfig,
    pub broker: BrokerConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: String,
}

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub db_name: String,
    pub sslmode: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl PostgresConfig {
    /// libpq-style connection URL for `sqlx::PgPool`.
    pub fn url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            self.user, self.password, self.host, self.port, self.db_name, self.sslmode
        )
    }
}

#[derive(Debug, Clone)]
pub struct BrokerConfig {
    pub bootstrap_brokers: Vec<String>,
}

/// Load `.env` (optional, logged if absent) then read `Config` from the
/// environment, falling back to defaults for anything unset.
pub fn load() -> Config {
    if dotenvy::dotenv().is_err() {
        tracing::debug!(".env file not found (optional)");
    }

    Config {
        server: ServerConfig {
            port: env_parsed("SERVER_PORT", 8080),
        },
        log: LogConfig {
            level: env_or("LOG_LEVEL", "info"),
        },
        postgres: PostgresConfig {
            host: env_or("POSTGRES_HOST", "localhost"),
            port: env_parsed("POSTGRES_PORT", 5432),
            user: env_or("POSTGRES_USER", "postgres"),
            password: env_or("POSTGRES_PASSWORD", "postgres"),
            db_name: env_or("POSTGRES_DB", "tps"),
            sslmode: env_or("POSTGRES_SSLMODE", "disable"),
            max_connections: env_parsed("POSTGRES_MAX_OPEN_CONNS", 25),
            acquire_timeout: Duration::from_secs(env_parsed("POSTGRES_ACQUIRE_TIMEOUT_SECS", 5)),
        },
        broker: BrokerConfig {
            bootstrap_brokers: env_or("KAFKA_BROKERS", "localhost:9092")
                .split(',')
                .map(str::to_string)
                .collect(),
        },
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(val) => val.parse().unwrap_or_else(|_| {
            tracing::warn!(key, val, "invalid value for env var, using default");
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn postgres_url_format() {
        let cfg = PostgresConfig {
            host: "db".into(),
            port: 5432,
            user: "u".into(),
            password: "p".into(),
            db_name: "tps".into(),
            sslmode: "disable".into(),
            max_connections: 10,
            acquire_timeout: Duration::from_secs(5),
        };
        assert_eq!(cfg.url(), "postgres://u:p@db:5432/tps?sslmode=disable");
    }
}
