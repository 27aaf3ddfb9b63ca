use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use validator::{Validate, ValidationError};

const DEFAULT_SERVER_ADDRESS: &str = "0.0.0.0:8080";
const DEFAULT_LOG_LEVEL: &str = "debug";
const DEFAULT_DB_HOST: &str = "localhost";
const DEFAULT_DB_PORT: u16 = 5432;
const DEFAULT_DB_USER: &str = "postgres";
const DEFAULT_DB_PASSWORD: &str = "postgres";
const DEFAULT_DB_NAME: &str = "marketplace";
const DEFAULT_DB_SSL_MODE: &str = "disable";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppMode {
    #[default]
    Debug,
    Release,
    /// Serves the embedded mock dataset instead of PostgreSQL.
    Test,
}

impl FromStr for AppMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(AppMode::Debug),
            "release" => Ok(AppMode::Release),
            "test" => Ok(AppMode::Test),
            other => Err(format!("unknown mode '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Validate)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    #[validate(length(min = 1))]
    pub host: String,
    #[validate(range(min = 1))]
    pub port: u16,
    #[validate(length(min = 1))]
    pub user: String,
    pub password: String,
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub ssl_mode: String,
    #[validate(range(min = 1, max = 100))]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: DEFAULT_DB_HOST.to_string(),
            port: DEFAULT_DB_PORT,
            user: DEFAULT_DB_USER.to_string(),
            password: DEFAULT_DB_PASSWORD.to_string(),
            name: DEFAULT_DB_NAME.to_string(),
            ssl_mode: DEFAULT_DB_SSL_MODE.to_string(),
            max_connections: DEFAULT_DB_MAX_CONNECTIONS,
        }
    }
}

impl DatabaseConfig {
    /// `DATABASE_URL` wins; otherwise the URL is assembled from the individual parts.
    pub fn connection_url(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!(
                "postgres://{}:{}@{}:{}/{}?sslmode={}",
                self.user, self.password, self.host, self.port, self.name, self.ssl_mode
            ),
        }
    }
}

#[derive(Debug, Clone, Validate)]
pub struct Config {
    #[validate(length(min = 1))]
    pub server_address: String,
    pub mode: AppMode,
    pub logger: LoggerConfig,
    #[validate(nested)]
    pub database: DatabaseConfig,
    #[validate(length(min = 1), custom(function = "validate_cors_origins"))]
    pub cors_allowed_origins: Vec<String>,
}

/// Same values `from_env` falls back to when nothing is set.
impl Default for Config {
    fn default() -> Self {
        Self {
            server_address: DEFAULT_SERVER_ADDRESS.to_string(),
            mode: AppMode::default(),
            logger: LoggerConfig::default(),
            database: DatabaseConfig::default(),
            cors_allowed_origins: split_list(DEFAULT_CORS_ORIGINS),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let config = Self {
            server_address: get_env_or("SERVER_ADDRESS", DEFAULT_SERVER_ADDRESS),
            mode: get_env_parse_or("APP_MODE", AppMode::Debug)?,
            logger: LoggerConfig {
                level: get_env_or("LOG_LEVEL", DEFAULT_LOG_LEVEL),
                format: get_env_parse_or("LOG_FORMAT", LogFormat::Text)?,
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
                host: get_env_or("DB_HOST", DEFAULT_DB_HOST),
                port: get_env_parse_or("DB_PORT", DEFAULT_DB_PORT)?,
                user: get_env_or("DB_USER", DEFAULT_DB_USER),
                password: get_env_or("DB_PASSWORD", DEFAULT_DB_PASSWORD),
                name: get_env_or("DB_NAME", DEFAULT_DB_NAME),
                ssl_mode: get_env_or("DB_SSL_MODE", DEFAULT_DB_SSL_MODE),
                max_connections: get_env_parse_or("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?,
            },
            cors_allowed_origins: split_list(&get_env_or(
                "CORS_ALLOWED_ORIGINS",
                DEFAULT_CORS_ORIGINS,
            )),
        };

        config.validate()?;
        Ok(config)
    }
}

/// Credentials are allowed, so every origin must be listed explicitly.
fn validate_cors_origins(origins: &[String]) -> std::result::Result<(), ValidationError> {
    if origins.iter().any(|origin| origin == "*") {
        let mut err = ValidationError::new("wildcard_origin");
        err.message = Some("wildcard origin '*' cannot be combined with credentials".into());
        return Err(err);
    }
    Ok(())
}

fn get_env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => parse_value(name, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(name: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e)))
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}
