use chatwire_client::ClientConfig;
use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_BASE_URL: &str = "http://localhost:9000/api";

/// Selects the `config/{profile}` file layered over the defaults
pub const PROFILE_VAR: &str = "CHATWIRE_ENV";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub client: ClientConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Per-turn defaults the caller applies before handing a request to the client
#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_doc_type")]
    pub doc_type_id: String,
    /// Use the event-stream endpoint instead of the synchronous one
    #[serde(default = "default_stream")]
    pub stream: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            doc_type_id: default_doc_type(),
            stream: default_stream(),
        }
    }
}

fn default_doc_type() -> String {
    "general".to_string()
}

fn default_stream() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
        }
    }
}

fn default_level() -> String {
    "warn".to_string()
}

fn default_format() -> String {
    "pretty".to_string()
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. built-in defaults
    /// 2. config/default.toml
    /// 3. config/{CHATWIRE_ENV}.toml (profile defaults to "dev")
    /// 4. Environment variables: CHATWIRE__CLIENT__BASE_URL, CHATWIRE__LOGGING__LEVEL, ...
    /// 5. The file passed with --config
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let env = profile_name(std::env::var(PROFILE_VAR).ok());

        let mut builder = ConfigLoader::builder()
            .set_default("client.base_url", DEFAULT_BASE_URL)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("CHATWIRE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path));
        }

        builder.build()?.try_deserialize()
    }

}

fn profile_name(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "dev".to_string())
}
