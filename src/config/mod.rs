use anyhow::Result;
use dotenvy::dotenv;
use secrecy::Secret;
use serde::Deserialize;
use std::env;

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub service_name: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    pub db_name: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: Secret<String>,
    /// Session and access-token lifetime.
    pub session_ttl_minutes: i64,
    /// Inactive sessions older than this are eligible for purge.
    pub session_retention_days: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let host = env::var("MARKET_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("MARKET_SERVICE_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()?;

        let db_url = env::var("MARKET_DATABASE_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
        let db_name = env::var("MARKET_DATABASE_NAME").unwrap_or_else(|_| "market_db".to_string());

        let jwt_secret = env::var("MARKET_JWT_SECRET").expect("MARKET_JWT_SECRET must be set");
        let session_ttl_minutes = env::var("MARKET_SESSION_TTL_MINUTES")
            .unwrap_or_else(|_| "720".to_string())
            .parse()?;
        let session_retention_days = env::var("MARKET_SESSION_RETENTION_DAYS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()?;

        Ok(Self {
            server: ServerConfig { host, port },
            database: DatabaseConfig {
                url: Secret::new(db_url),
                db_name,
            },
            auth: AuthConfig {
                jwt_secret: Secret::new(jwt_secret),
                session_ttl_minutes,
                session_retention_days,
            },
            service_name: "market-service".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn config_deserializes_with_wrapped_secrets() {
        let config: Config = serde_json::from_value(serde_json::json!({
            "server": { "host": "127.0.0.1", "port": 3000 },
            "database": { "url": "mongodb://localhost:27017", "db_name": "market_db" },
            "auth": {
                "jwt_secret": "s3cret",
                "session_ttl_minutes": 720,
                "session_retention_days": 30
            },
            "service_name": "market-service"
        }))
        .expect("config deserialization failed");

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.db_name, "market_db");
        assert_eq!(config.auth.jwt_secret.expose_secret(), "s3cret");
    }
}
