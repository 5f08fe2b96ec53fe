use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE_PATH: &str = "/api";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub cors: CorsConfig,
    pub api: ApiConfig,
    pub ide: IdeConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub address: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub json_format: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    pub base_path: String,
    pub enable_swagger: bool,
}

/// Knobs for the IDE session lifecycle manager.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IdeConfig {
    /// Ceiling on concurrently active sessions across the whole system.
    pub max_sessions: u32,
    /// Minimum seconds between a persistent-storage session ending and its
    /// owner starting a new one, so the home volume has time to unmount.
    pub volume_cooldown_seconds: u64,
    /// TTL for the poll cache. Clients poll at sub-minute intervals while
    /// orchestrator queries are comparatively expensive.
    pub poll_cache_ttl_seconds: u64,
    /// Base URL of the orchestrator platform's internal API.
    pub orchestrator_url: String,
    /// Public base URL of the IDE proxy, used to build redirect targets.
    pub proxy_url: String,
    /// Sessions active longer than this are stopped by the reaper binary.
    pub max_session_age_hours: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/devhub".to_string(),
            max_connections: 16,
            min_connections: 4,
            acquire_timeout: 5,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            address: "127.0.0.1".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allow_credentials: false,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_path: DEFAULT_API_BASE_PATH.to_string(),
            enable_swagger: false,
        }
    }
}

impl Default for IdeConfig {
    fn default() -> Self {
        Self {
            max_sessions: 150,
            volume_cooldown_seconds: 60,
            poll_cache_ttl_seconds: 5,
            orchestrator_url: "http://orchestrator.internal".to_string(),
            proxy_url: "https://ide.localhost".to_string(),
            max_session_age_hours: 6,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            cors: CorsConfig::default(),
            api: ApiConfig::default(),
            ide: IdeConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from multiple sources in priority order:
    /// 1. Devhub.toml (base configuration file)
    /// 2. Environment variables (prefixed with DEVHUB_)
    /// 3. DATABASE_URL and THEIA_VOLUME_COOLDOWN_SECONDS for compatibility
    ///    with existing deployments
    pub fn load() -> Result<Self, figment::Error> {
        let figment = Figment::new()
            // Start with defaults
            .merge(Toml::string(&toml::to_string(&Config::default()).unwrap()).nested())
            // Layer on Devhub.toml if it exists
            .merge(Toml::file("Devhub.toml").nested())
            // Layer on environment variables (e.g., DEVHUB_DATABASE_URL)
            .merge(Env::prefixed("DEVHUB_").split("_"))
            .merge(Env::raw().only(&["DATABASE_URL"]).map(|_| "database.url".into()))
            .merge(
                Env::raw()
                    .only(&["THEIA_VOLUME_COOLDOWN_SECONDS"])
                    .map(|_| "ide.volume_cooldown_seconds".into()),
            );

        figment.extract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.api.base_path, DEFAULT_API_BASE_PATH);
        assert!(config.ide.max_sessions > 0);
        assert!(config.ide.poll_cache_ttl_seconds > 0);
        assert!(config.ide.volume_cooldown_seconds > 0);
    }

    #[test]
    fn defaults_round_trip_through_toml() {
        let serialized = toml::to_string(&Config::default()).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.ide.max_sessions, Config::default().ide.max_sessions);
        assert_eq!(parsed.database.url, Config::default().database.url);
    }
}
