use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Base name of the optional configuration file in the working directory
pub const DEFAULT_CONFIG_NAME: &str = "rbf-chain-lab";

/// Application configuration loaded from rbf-chain-lab.toml or environment variables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub node: NodeConfig,
    pub logging: LoggingConfig,
}

/// Connection parameters for the Bitcoin node's JSON-RPC interface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub timeout_seconds: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 18443,
            username: "bitcoin".to_string(),
            password: "bitcoin".to_string(),
            timeout_seconds: 10,
        }
    }
}

impl NodeConfig {
    /// Build a config from explicit credentials, keeping the default timeout
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        host: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    /// HTTP endpoint of the node (credentials travel as basic auth, not in the URL)
    pub fn url(&self) -> String {
        format!("http://{}:{}/", self.host, self.port)
    }

    /// `host:port` pair used in connection error messages
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Reject settings the node client cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_seconds == 0 {
            return Err(ConfigError::Message(
                "node.timeout_seconds must be greater than zero".to_string(),
            ));
        }
        if self.host.trim().is_empty() {
            return Err(ConfigError::Message("node.host must not be empty".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive; `RUST_LOG` takes precedence
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from rbf-chain-lab.toml (if present) and environment variables
    /// Environment variables take precedence over file configuration
    pub fn load() -> Result<Self, ConfigError> {
        Self::build(None)
    }

    /// Load configuration from an explicit file, which must exist
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        Self::build(Some(path))
    }

    fn build(path: Option<&Path>) -> Result<Self, ConfigError> {
        let node = NodeConfig::default();
        let logging = LoggingConfig::default();

        let file_source = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };

        let config = Config::builder()
            .set_default("node.host", node.host)?
            .set_default("node.port", node.port as i64)?
            .set_default("node.username", node.username)?
            .set_default("node.password", node.password)?
            .set_default("node.timeout_seconds", node.timeout_seconds)?
            .set_default("logging.filter", logging.filter)?
            .add_source(file_source)
            // RBF__NODE__HOST, RBF__NODE__PORT, RBF__LOGGING__FILTER, ...
            .add_source(
                Environment::with_prefix("RBF")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut app_config: AppConfig = config.try_deserialize()?;

        // Keeps the password out of shell history and config files
        if let Ok(password) = env::var("RBF_NODE_PASSWORD") {
            app_config.node.password = password;
        }

        app_config.node.validate()?;

        Ok(app_config)
    }

    /// Get config values for CLI argument defaults
    ///
    /// Built-in defaults apply when rbf-chain-lab.toml is absent; a malformed
    /// file or environment variable is reported, never replaced by defaults.
    pub fn get_defaults() -> Result<Self, ConfigError> {
        Self::load()
    }

    /// Render the effective configuration as TOML with the password masked
    pub fn to_masked_toml(&self) -> Result<String, toml::ser::Error> {
        let mut masked = self.clone();
        if !masked.node.password.is_empty() {
            masked.node.password = "********".to_string();
        }
        toml::to_string_pretty(&masked)
    }
}
