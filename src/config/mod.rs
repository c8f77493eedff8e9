use anyhow::Context;
use serde::{Deserialize, Serialize};

/// `mode=rwc` lets SQLite create the file on first start.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://./report_builder.db?mode=rwc";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api_server: ServerConfig,
    pub warehouse: WarehouseConfig,
    pub client: ClientConfig,
    /// Seed the demo catalog when the warehouse is empty
    pub seed_demo: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Sqlite,
    #[serde(alias = "postgresql")]
    Postgres,
}

/// Where the warehouse connection settings came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialSource {
    /// `WAREHOUSE_CREDENTIALS_JSON`
    Explicit,
    /// `DATABASE_*` variables and their defaults
    Ambient,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseConfig {
    pub backend: DatabaseBackend,
    pub url: String,
    pub max_connections: u32,
    pub source: CredentialSource,
}

/// Shape of the `WAREHOUSE_CREDENTIALS_JSON` blob.
#[derive(Debug, Clone, Deserialize)]
pub struct WarehouseCredentials {
    pub backend: DatabaseBackend,
    pub url: String,
    #[serde(default)]
    pub max_connections: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of a running query API, used by `report-cli`
    pub api_url: String,
}

impl WarehouseConfig {
    /// Prefer the explicit credential blob, falling back to ambient discovery when it
    /// is absent or malformed. A malformed blob is logged, never echoed.
    pub fn resolve(credentials_json: Option<&str>, ambient: WarehouseConfig) -> WarehouseConfig {
        let Some(raw) = credentials_json.filter(|raw| !raw.trim().is_empty()) else {
            return ambient;
        };

        match serde_json::from_str::<WarehouseCredentials>(raw) {
            Ok(credentials) => WarehouseConfig {
                backend: credentials.backend,
                url: credentials.url,
                max_connections: credentials
                    .max_connections
                    .unwrap_or(ambient.max_connections),
                source: CredentialSource::Explicit,
            },
            Err(e) => {
                tracing::warn!(
                    "Failed to parse WAREHOUSE_CREDENTIALS_JSON (line {}, column {}), falling back to default credential discovery",
                    e.line(),
                    e.column()
                );
                ambient
            }
        }
    }
}

fn parse_port(raw: &str) -> anyhow::Result<u16> {
    raw.trim()
        .parse()
        .with_context(|| format!("API_PORT must be a valid port, got '{raw}'"))
}

fn parse_max_connections(raw: &str) -> anyhow::Result<u32> {
    raw.trim().parse().with_context(|| {
        format!("DATABASE_MAX_CONNECTIONS must be a non-negative integer, got '{raw}'")
    })
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let api_host = std::env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let api_port = parse_port(&std::env::var("API_PORT").unwrap_or_else(|_| "8080".to_string()))?;

        let backend_str =
            std::env::var("DATABASE_BACKEND").unwrap_or_else(|_| "sqlite".to_string());

        let backend = match backend_str.to_lowercase().as_str() {
            "postgres" | "postgresql" => DatabaseBackend::Postgres,
            "sqlite" => DatabaseBackend::Sqlite,
            other => {
                tracing::warn!(
                    "Unknown DATABASE_BACKEND '{other}', falling back to 'sqlite'. Supported values: sqlite, postgres"
                );
                DatabaseBackend::Sqlite
            }
        };

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

        let max_connections = parse_max_connections(
            &std::env::var("DATABASE_MAX_CONNECTIONS").unwrap_or_else(|_| "5".to_string()),
        )?;

        let ambient = WarehouseConfig {
            backend,
            url: database_url,
            max_connections,
            source: CredentialSource::Ambient,
        };

        let credentials_json = std::env::var("WAREHOUSE_CREDENTIALS_JSON").ok();
        let warehouse = WarehouseConfig::resolve(credentials_json.as_deref(), ambient);

        let seed_demo = std::env::var("WAREHOUSE_SEED_DEMO")
            .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false);

        let api_url = std::env::var("REPORT_API_URL")
            .unwrap_or_else(|_| format!("http://{api_host}:{api_port}"));

        Ok(Config {
            api_server: ServerConfig {
                host: api_host,
                port: api_port,
            },
            warehouse,
            client: ClientConfig { api_url },
            seed_demo,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ambient() -> WarehouseConfig {
        WarehouseConfig {
            backend: DatabaseBackend::Sqlite,
            url: "sqlite::memory:".to_string(),
            max_connections: 5,
            source: CredentialSource::Ambient,
        }
    }

    #[test]
    fn test_numeric_settings_name_their_variable() {
        assert_eq!(parse_port("8080").unwrap(), 8080);
        assert_eq!(parse_max_connections(" 10 ").unwrap(), 10);

        let err = parse_port("eighty").unwrap_err();
        assert!(err.to_string().contains("API_PORT"));
        let err = parse_port("70000").unwrap_err();
        assert!(err.to_string().contains("API_PORT"));

        let err = parse_max_connections("-1").unwrap_err();
        assert!(err.to_string().contains("DATABASE_MAX_CONNECTIONS"));
    }

    #[test]
    fn test_default_database_url_creates_sqlite_file() {
        assert!(DEFAULT_DATABASE_URL.starts_with("sqlite://./report_builder.db"));
        assert!(DEFAULT_DATABASE_URL.ends_with("?mode=rwc"));
    }

    #[test]
    fn test_resolve_without_credentials_uses_ambient() {
        assert_eq!(WarehouseConfig::resolve(None, ambient()), ambient());
        assert_eq!(WarehouseConfig::resolve(Some("  "), ambient()), ambient());
    }

    #[test]
    fn test_resolve_explicit_credentials() {
        let resolved = WarehouseConfig::resolve(
            Some(r#"{"backend": "postgresql", "url": "postgres://reports@warehouse/reports"}"#),
            ambient(),
        );

        assert_eq!(resolved.backend, DatabaseBackend::Postgres);
        assert_eq!(resolved.url, "postgres://reports@warehouse/reports");
        assert_eq!(resolved.max_connections, 5);
        assert_eq!(resolved.source, CredentialSource::Explicit);
    }

    #[test]
    fn test_resolve_malformed_credentials_falls_back() {
        let resolved = WarehouseConfig::resolve(Some("{\"backend\": \"postgres\""), ambient());
        assert_eq!(resolved, ambient());

        let resolved = WarehouseConfig::resolve(Some(r#"{"backend": "bigtable", "url": "x"}"#), ambient());
        assert_eq!(resolved.source, CredentialSource::Ambient);
    }
}
