use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_INSTRUCTIONS: &str =
    "You are an IT Service Desk voice assistant. Use tools for knowledge retrieval and ticket operations.";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub realtime: RealtimeConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct RealtimeConfig {
    pub enabled: bool,
    pub api_key: SecretString,
    pub url: String,
    pub model: String,
    pub instructions: String,
    pub tool_timeout_secs: u64,
    pub max_frame_bytes: usize,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub realtime_enabled: Option<bool>,
    pub realtime_api_key: Option<String>,
    pub realtime_url: Option<String>,
    pub realtime_model: Option<String>,
    pub realtime_tool_timeout_secs: Option<u64>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error(
        "realtime.api_key is required to open the voice connection (set DESKVOICE_REALTIME_API_KEY or GROK_API_KEY)"
    )]
    MissingRealtimeCredential,
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://itsd.db?mode=rwc".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            realtime: RealtimeConfig {
                enabled: false,
                api_key: String::new().into(),
                url: "wss://api.x.ai/v1/realtime".to_string(),
                model: "grok-voice".to_string(),
                instructions: DEFAULT_INSTRUCTIONS.to_string(),
                tool_timeout_secs: 15,
                max_frame_bytes: 8 * 1024 * 1024,
            },
            server: ServerConfig { bind_address: "127.0.0.1".to_string(), port: 8000 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl RealtimeConfig {
    /// The voice API credential; an empty key means the bridge must not connect.
    pub fn credential(&self) -> Result<&SecretString, ConfigError> {
        if self.api_key.expose_secret().trim().is_empty() {
            return Err(ConfigError::MissingRealtimeCredential);
        }
        Ok(&self.api_key)
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("deskvoice.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn realtime_credential(&self) -> Result<&SecretString, ConfigError> {
        self.realtime.credential()
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(realtime) = patch.realtime {
            if let Some(enabled) = realtime.enabled {
                self.realtime.enabled = enabled;
            }
            if let Some(realtime_api_key_value) = realtime.api_key {
                self.realtime.api_key = secret_value(realtime_api_key_value);
            }
            if let Some(url) = realtime.url {
                self.realtime.url = url;
            }
            if let Some(model) = realtime.model {
                self.realtime.model = model;
            }
            if let Some(instructions) = realtime.instructions {
                self.realtime.instructions = instructions;
            }
            if let Some(tool_timeout_secs) = realtime.tool_timeout_secs {
                self.realtime.tool_timeout_secs = tool_timeout_secs;
            }
            if let Some(max_frame_bytes) = realtime.max_frame_bytes {
                self.realtime.max_frame_bytes = max_frame_bytes;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("DESKVOICE_DATABASE_URL").or_else(|| read_env("DATABASE_URL"))
        {
            self.database.url = value;
        }
        if let Some(value) = read_env("DESKVOICE_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_u32("DESKVOICE_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("DESKVOICE_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("DESKVOICE_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("DESKVOICE_REALTIME_ENABLED") {
            self.realtime.enabled = parse_bool("DESKVOICE_REALTIME_ENABLED", &value)?;
        }
        let api_key = read_env("DESKVOICE_REALTIME_API_KEY").or_else(|| read_env("GROK_API_KEY"));
        if let Some(value) = api_key {
            self.realtime.api_key = secret_value(value);
        }
        let url = read_env("DESKVOICE_REALTIME_URL").or_else(|| read_env("GROK_REALTIME_URL"));
        if let Some(value) = url {
            self.realtime.url = value;
        }
        let model = read_env("DESKVOICE_REALTIME_MODEL").or_else(|| read_env("GROK_MODEL"));
        if let Some(value) = model {
            self.realtime.model = value;
        }
        if let Some(value) = read_env("DESKVOICE_REALTIME_TOOL_TIMEOUT_SECS") {
            self.realtime.tool_timeout_secs =
                parse_u64("DESKVOICE_REALTIME_TOOL_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("DESKVOICE_REALTIME_MAX_FRAME_BYTES") {
            self.realtime.max_frame_bytes =
                parse_usize("DESKVOICE_REALTIME_MAX_FRAME_BYTES", &value)?;
        }

        if let Some(value) = read_env("DESKVOICE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("DESKVOICE_SERVER_PORT") {
            self.server.port = parse_u16("DESKVOICE_SERVER_PORT", &value)?;
        }

        let log_level =
            read_env("DESKVOICE_LOGGING_LEVEL").or_else(|| read_env("DESKVOICE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("DESKVOICE_LOGGING_FORMAT").or_else(|| read_env("DESKVOICE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(enabled) = overrides.realtime_enabled {
            self.realtime.enabled = enabled;
        }
        if let Some(realtime_api_key) = overrides.realtime_api_key {
            self.realtime.api_key = secret_value(realtime_api_key);
        }
        if let Some(url) = overrides.realtime_url {
            self.realtime.url = url;
        }
        if let Some(model) = overrides.realtime_model {
            self.realtime.model = model;
        }
        if let Some(tool_timeout_secs) = overrides.realtime_tool_timeout_secs {
            self.realtime.tool_timeout_secs = tool_timeout_secs;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_realtime(&self.realtime)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("deskvoice.toml"), PathBuf::from("config/deskvoice.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_realtime(realtime: &RealtimeConfig) -> Result<(), ConfigError> {
    let url = realtime.url.trim();
    if !url.starts_with("ws://") && !url.starts_with("wss://") {
        return Err(ConfigError::Validation(
            "realtime.url must start with ws:// or wss://".to_string(),
        ));
    }

    if realtime.model.trim().is_empty() {
        return Err(ConfigError::Validation("realtime.model must not be empty".to_string()));
    }

    if realtime.tool_timeout_secs == 0 || realtime.tool_timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "realtime.tool_timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if realtime.max_frame_bytes < 1024 {
        return Err(ConfigError::Validation(
            "realtime.max_frame_bytes must be at least 1024".to_string(),
        ));
    }

    if realtime.enabled && realtime.api_key.expose_secret().trim().is_empty() {
        return Err(ConfigError::MissingRealtimeCredential);
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address must not be empty".to_string()));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    realtime: Option<RealtimePatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct RealtimePatch {
    enabled: Option<bool>,
    api_key: Option<String>,
    url: Option<String>,
    model: Option<String>,
    instructions: Option<String>,
    tool_timeout_secs: Option<u64>,
    max_frame_bytes: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
