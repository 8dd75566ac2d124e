//! Server configuration loading from file and environment variables.

use pai_parts::PartsConfig;
use pai_render::RenderConfig;
use serde::Deserialize;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Static client bundle.
    #[serde(default)]
    pub client: ClientConfig,

    /// Ephemeral realtime session tokens.
    #[serde(default)]
    pub realtime: RealtimeConfig,

    /// Local diagram toolchain.
    #[serde(default)]
    pub render: RenderConfig,

    /// Parts catalog. Lookups are disabled without credentials.
    #[serde(default)]
    pub parts: PartsConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,

    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "pai_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Directory holding the built client; `index.html` is the SPA fallback.
    #[serde(default = "default_client_dir")]
    pub dir: PathBuf,
}

#[derive(Clone, Deserialize)]
pub struct RealtimeConfig {
    /// API key used to mint session tokens. Never sent to the browser.
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_sessions_url")]
    pub sessions_url: String,

    #[serde(default = "default_realtime_model")]
    pub model: String,

    #[serde(default = "default_realtime_voice")]
    pub voice: String,

    #[serde(default = "default_realtime_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl RealtimeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl fmt::Debug for RealtimeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RealtimeConfig")
            .field("api_key", &"[REDACTED]")
            .field("sessions_url", &self.sessions_url)
            .field("model", &self.model)
            .field("voice", &self.voice)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_client_dir() -> PathBuf {
    PathBuf::from("client/dist")
}

fn default_sessions_url() -> String {
    "https://api.openai.com/v1/realtime/sessions".to_string()
}

fn default_realtime_model() -> String {
    "gpt-4o-realtime-preview-2024-12-17".to_string()
}

fn default_realtime_voice() -> String {
    "ballad".to_string()
}

fn default_realtime_timeout_seconds() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            dir: default_client_dir(),
        }
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            sessions_url: default_sessions_url(),
            model: default_realtime_model(),
            voice: default_realtime_voice(),
            timeout_seconds: default_realtime_timeout_seconds(),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults, then
/// applies environment overrides.
///
/// Environment variable overrides:
/// - `PAI_HOST`, `PAI_PORT` override `server.host` and `server.port`
/// - `PAI_LOG_LEVEL` overrides `logging.level`
/// - `PAI_LOG_JSON` overrides `logging.json` (set to "true" to enable)
/// - `PAI_CLIENT_DIR` overrides `client.dir`
/// - `OPENAI_API_KEY` overrides `realtime.api_key`
/// - `PAI_REALTIME_MODEL`, `PAI_REALTIME_VOICE` override the session model and voice
/// - `PAI_LATEX_BINARY`, `PAI_RASTERIZER_BINARY`, `PAI_MERMAID_BINARY` override
///   the toolchain binaries
/// - `PAI_RENDER_DENSITY` overrides `render.density`
/// - `NEXAR_CLIENT_ID`, `NEXAR_CLIENT_SECRET` override the catalog credentials
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let config = read_config_file(path)?;
    Ok(apply_env_overrides(config, |key| std::env::var(key).ok()))
}

/// Parses the TOML file at `path`; a missing file yields the defaults.
fn read_config_file(path: Option<&str>) -> Result<Config, ConfigError> {
    let Some(p) = path else {
        return Ok(Config::default());
    };
    match std::fs::read_to_string(p) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(path = p, "config file not found, using defaults");
            Ok(Config::default())
        }
        Err(e) => Err(ConfigError::FileRead(e)),
    }
}

/// Applies overrides from `lookup`, which maps a variable name to its value.
fn apply_env_overrides(mut config: Config, lookup: impl Fn(&str) -> Option<String>) -> Config {
    if let Some(parsed) = lookup("PAI_HOST").and_then(|v| v.parse().ok()) {
        config.server.host = parsed;
    }
    if let Some(parsed) = lookup("PAI_PORT").and_then(|v| v.parse().ok()) {
        config.server.port = parsed;
    }
    if let Some(level) = lookup("PAI_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = lookup("PAI_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    if let Some(dir) = lookup("PAI_CLIENT_DIR") {
        config.client.dir = PathBuf::from(dir);
    }
    if let Some(key) = lookup("OPENAI_API_KEY") {
        config.realtime.api_key = key;
    }
    if let Some(model) = lookup("PAI_REALTIME_MODEL") {
        config.realtime.model = model;
    }
    if let Some(voice) = lookup("PAI_REALTIME_VOICE") {
        config.realtime.voice = voice;
    }
    if let Some(path) = lookup("PAI_LATEX_BINARY") {
        config.render.latex_binary = PathBuf::from(path);
    }
    if let Some(path) = lookup("PAI_RASTERIZER_BINARY") {
        config.render.rasterizer_binary = PathBuf::from(path);
    }
    if let Some(path) = lookup("PAI_MERMAID_BINARY") {
        config.render.mermaid_binary = PathBuf::from(path);
    }
    if let Some(parsed) = lookup("PAI_RENDER_DENSITY").and_then(|v| v.parse().ok()) {
        config.render.density = parsed;
    }
    if let Some(id) = lookup("NEXAR_CLIENT_ID") {
        config.parts.client_id = id;
    }
    if let Some(secret) = lookup("NEXAR_CLIENT_SECRET") {
        config.parts.client_secret = secret;
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn parses_sections_with_defaults() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 8080

            [render]
            density = 150

            [parts]
            client_id = "abc"
            client_secret = "xyz"
            preferred_seller = "Mouser"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.render.density, 150);
        assert_eq!(config.render.latex_binary, PathBuf::from("pdflatex"));
        assert!(config.parts.has_credentials());
        assert_eq!(config.parts.preferred_seller.as_deref(), Some("Mouser"));
        assert_eq!(config.realtime.voice, "ballad");
        assert_eq!(config.client.dir, PathBuf::from("client/dist"));
    }

    #[test]
    fn env_overrides_win() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("PAI_PORT", "9000"),
            ("PAI_PORT_IGNORED", "1"),
            ("PAI_LOG_JSON", "1"),
            ("OPENAI_API_KEY", "sk-test"),
            ("PAI_RENDER_DENSITY", "not-a-number"),
            ("NEXAR_CLIENT_ID", "id"),
            ("NEXAR_CLIENT_SECRET", "secret"),
        ]);
        let config = apply_env_overrides(Config::default(), |key| {
            env.get(key).map(|v| v.to_string())
        });

        assert_eq!(config.server.port, 9000);
        assert!(config.logging.json);
        assert_eq!(config.realtime.api_key, "sk-test");
        assert_eq!(config.render.density, 300);
        assert!(config.parts.has_credentials());
    }

    #[test]
    fn missing_file_uses_defaults() {
        let config = read_config_file(Some("/nonexistent/pai-config.toml")).unwrap();
        let config = apply_env_overrides(config, |_| None);
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn realtime_debug_redacts_key() {
        let config = RealtimeConfig {
            api_key: "sk-secret".into(),
            ..RealtimeConfig::default()
        };
        assert!(!format!("{:?}", config).contains("sk-secret"));
    }
}
