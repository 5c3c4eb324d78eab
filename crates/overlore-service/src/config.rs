//! Configuration loading and typed config structures for the ingestion
//! service.
//!
//! The canonical configuration lives in `overlore-config.yaml` (or the file
//! named by `OVERLORE_CONFIG`). Every section is optional; missing values
//! fall back to the defaults below. Loading happens in three steps:
//!
//! 1. [`ServiceConfig::from_file`] parses the YAML.
//! 2. [`load_env_file`] reads `.env.production` or `.env.development`
//!    depending on `mode.prod`.
//! 3. [`ServiceConfig::apply_env_overrides`] lets the environment replace
//!    feed endpoints and file paths, then [`ServiceConfig::validate`]
//!    checks the result.

use std::path::{Path, PathBuf};
use std::time::Duration;

use overlore_db::SqliteConfig;
use overlore_events::{COMBAT_OUTCOME_SELECTOR, EventSelectors, ORDER_ACCEPTED_SELECTOR};
use serde::Deserialize;

/// Default config file name, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "overlore-config.yaml";

/// Environment variable naming an alternative config file.
pub const CONFIG_PATH_ENV: &str = "OVERLORE_CONFIG";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// Failed to read the mode's `.env` file.
    #[error("failed to load {file}: {source}")]
    EnvFile {
        /// The env file name.
        file: &'static str,
        /// The underlying dotenv error.
        source: dotenvy::Error,
    },

    /// A required setting is absent after env overrides.
    #[error("missing required setting {0}")]
    Missing(&'static str),

    /// A setting has an unusable value.
    #[error("invalid setting {field}: {reason}")]
    Invalid {
        /// Dotted name of the setting.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level service configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ServiceConfig {
    /// Websocket listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Event store settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Realm registry source.
    #[serde(default)]
    pub realms: RealmsConfig,

    /// Event selector table.
    #[serde(default)]
    pub selectors: SelectorConfig,

    /// Upstream feed endpoints.
    #[serde(default)]
    pub feed: FeedConfig,

    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Deployment mode.
    #[serde(default)]
    pub mode: ModeConfig,
}

impl ServiceConfig {
    /// Load configuration from a YAML file.
    ///
    /// Environment overrides are not applied here; see
    /// [`ServiceConfig::apply_env_overrides`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Override settings with environment variables when set.
    ///
    /// - `TORII_WS` overrides `feed.torii_ws`
    /// - `TORII_GRAPHQL` overrides `feed.torii_graphql`
    /// - `KATANA_URL` overrides `feed.katana_url`
    /// - `EVENTS_DB` overrides `database.path`
    /// - `REALMS_FILE` overrides `realms.path`
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Override settings from an arbitrary variable lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("TORII_WS") {
            self.feed.torii_ws = Some(val);
        }
        if let Some(val) = lookup("TORII_GRAPHQL") {
            self.feed.torii_graphql = Some(val);
        }
        if let Some(val) = lookup("KATANA_URL") {
            self.feed.katana_url = Some(val);
        }
        if let Some(val) = lookup("EVENTS_DB") {
            self.database.path = PathBuf::from(val);
        }
        if let Some(val) = lookup("REALMS_FILE") {
            self.realms.path = PathBuf::from(val);
        }
    }

    /// Check that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] if a feed endpoint is absent, or
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feed.torii_ws.as_deref().is_none_or(str::is_empty) {
            return Err(ConfigError::Missing("feed.torii_ws"));
        }
        if self.feed.torii_graphql.as_deref().is_none_or(str::is_empty) {
            return Err(ConfigError::Missing("feed.torii_graphql"));
        }
        if self.database.lock_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "database.lock_timeout_ms",
                reason: "must be greater than zero".to_owned(),
            });
        }
        for (field, value) in [
            ("selectors.combat_outcome", &self.selectors.combat_outcome),
            ("selectors.trade_accepted", &self.selectors.trade_accepted),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "selector is empty".to_owned(),
                });
            }
        }
        Ok(())
    }
}

/// Load the `.env` file for the configured mode into the process
/// environment.
///
/// Returns the path that was loaded, or `None` if the file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::EnvFile`] if the file exists but cannot be parsed.
pub fn load_env_file(mode: ModeConfig) -> Result<Option<PathBuf>, ConfigError> {
    let file = mode.env_file();
    match dotenvy::from_filename(file) {
        Ok(path) => Ok(Some(path)),
        Err(source) if source.not_found() => Ok(None),
        Err(source) => Err(ConfigError::EnvFile { file, source }),
    }
}

/// Websocket listener settings.
///
/// The listener itself is a separate collaborator; these values are
/// carried so a single config file serves both.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_address")]
    pub address: String,

    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
        }
    }
}

/// Event store settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatabaseConfig {
    /// Backing file, or `:memory:`.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    /// Bound on waiting for the connection lock.
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,

    /// `SpatiaLite` extension to load, e.g. `mod_spatialite`.
    #[serde(default)]
    pub spatialite_extension: Option<String>,
}

impl DatabaseConfig {
    /// Build the store's connection settings.
    pub fn to_sqlite_config(&self) -> SqliteConfig {
        let config = SqliteConfig::new(self.path.clone())
            .with_lock_timeout(Duration::from_millis(self.lock_timeout_ms));
        match &self.spatialite_extension {
            Some(extension) => config.with_spatialite(extension.as_str()),
            None => config,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            lock_timeout_ms: default_lock_timeout_ms(),
            spatialite_extension: None,
        }
    }
}

/// Realm registry source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RealmsConfig {
    /// JSON file of realm positions.
    #[serde(default = "default_realms_path")]
    pub path: PathBuf,
}

impl Default for RealmsConfig {
    fn default() -> Self {
        Self {
            path: default_realms_path(),
        }
    }
}

/// Selector words identifying each event kind.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SelectorConfig {
    /// Selector of `CombatOutcome`.
    #[serde(default = "default_combat_selector")]
    pub combat_outcome: String,

    /// Selector of `OrderAccepted`.
    #[serde(default = "default_trade_selector")]
    pub trade_accepted: String,
}

impl SelectorConfig {
    /// Build the decoder's selector table.
    pub fn to_selectors(&self) -> EventSelectors {
        EventSelectors::new(&self.combat_outcome, &self.trade_accepted)
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            combat_outcome: default_combat_selector(),
            trade_accepted: default_trade_selector(),
        }
    }
}

/// Upstream endpoints and the local replay source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FeedConfig {
    /// Indexer websocket endpoint.
    #[serde(default)]
    pub torii_ws: Option<String>,

    /// Indexer GraphQL endpoint.
    #[serde(default)]
    pub torii_graphql: Option<String>,

    /// Sequencer RPC endpoint.
    #[serde(default)]
    pub katana_url: Option<String>,

    /// NDJSON file of envelopes to ingest instead of stdin.
    #[serde(default)]
    pub replay_file: Option<PathBuf>,
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Append logs to this file in addition to stdout.
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
            json: false,
        }
    }
}

/// Deployment mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ModeConfig {
    /// Production mode.
    #[serde(default)]
    pub prod: bool,
}

impl ModeConfig {
    /// The `.env` file for this mode.
    pub const fn env_file(self) -> &'static str {
        if self.prod {
            ".env.production"
        } else {
            ".env.development"
        }
    }
}

// =============================================================================
// Defaults
// =============================================================================

fn default_address() -> String {
    "localhost".to_owned()
}

const fn default_port() -> u16 {
    8766
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./events.db")
}

const fn default_lock_timeout_ms() -> u64 {
    1000
}

fn default_realms_path() -> PathBuf {
    PathBuf::from("./data/realms.json")
}

fn default_combat_selector() -> String {
    COMBAT_OUTCOME_SELECTOR.to_owned()
}

fn default_trade_selector() -> String {
    ORDER_ACCEPTED_SELECTOR.to_owned()
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::collections::BTreeMap;

    use super::*;

    fn with_feed() -> ServiceConfig {
        ServiceConfig {
            feed: FeedConfig {
                torii_ws: Some("ws://localhost:8080/graphql/ws".to_owned()),
                torii_graphql: Some("http://localhost:8080/graphql".to_owned()),
                ..FeedConfig::default()
            },
            ..ServiceConfig::default()
        }
    }

    #[test]
    fn defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.server.address, "localhost");
        assert_eq!(config.server.port, 8766);
        assert_eq!(config.database.path, PathBuf::from("./events.db"));
        assert_eq!(config.database.lock_timeout_ms, 1000);
        assert_eq!(config.realms.path, PathBuf::from("./data/realms.json"));
        assert_eq!(config.selectors.combat_outcome, COMBAT_OUTCOME_SELECTOR);
        assert_eq!(config.logging.level, "info");
        assert!(!config.mode.prod);
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
server:
  address: "0.0.0.0"
  port: 9000

database:
  path: "/var/lib/overlore/events.db"
  lock_timeout_ms: 250
  spatialite_extension: "mod_spatialite"

realms:
  path: "/etc/overlore/realms.json"

feed:
  torii_ws: "ws://torii:8080/graphql/ws"
  torii_graphql: "http://torii:8080/graphql"
  katana_url: "http://katana:5050"
  replay_file: "./events.ndjson"

logging:
  level: "debug"
  file: "./overlore.log"
  json: true

mode:
  prod: true
"#;
        let config = ServiceConfig::parse(yaml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.database.lock_timeout_ms, 250);
        assert_eq!(
            config.database.spatialite_extension.as_deref(),
            Some("mod_spatialite")
        );
        assert_eq!(
            config.feed.replay_file,
            Some(PathBuf::from("./events.ndjson"))
        );
        assert!(config.logging.json);
        assert!(config.mode.prod);
        // Omitted section keeps its defaults.
        assert_eq!(config.selectors.trade_accepted, ORDER_ACCEPTED_SELECTOR);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_partial_yaml_uses_defaults() {
        let config = ServiceConfig::parse("database:\n  path: \":memory:\"\n").unwrap();
        assert_eq!(config.database.path, PathBuf::from(":memory:"));
        assert_eq!(config.database.lock_timeout_ms, 1000);
        assert_eq!(config.server, ServerConfig::default());
    }

    #[test]
    fn invalid_yaml_is_rejected() {
        assert!(matches!(
            ServiceConfig::parse("server: [unclosed"),
            Err(ConfigError::Yaml { .. })
        ));
    }

    #[test]
    fn env_overrides_replace_values() {
        let vars: BTreeMap<&str, &str> = [
            ("TORII_WS", "ws://override/ws"),
            ("TORII_GRAPHQL", "http://override/graphql"),
            ("EVENTS_DB", "/tmp/other.db"),
            ("REALMS_FILE", "/tmp/realms.json"),
        ]
        .into_iter()
        .collect();

        let mut config = ServiceConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| (*v).to_owned()));

        assert_eq!(config.feed.torii_ws.as_deref(), Some("ws://override/ws"));
        assert_eq!(config.database.path, PathBuf::from("/tmp/other.db"));
        assert_eq!(config.realms.path, PathBuf::from("/tmp/realms.json"));
        assert!(config.feed.katana_url.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_feed_endpoints_fail_validation() {
        assert!(matches!(
            ServiceConfig::default().validate(),
            Err(ConfigError::Missing("feed.torii_ws"))
        ));

        let mut config = with_feed();
        config.feed.torii_graphql = None;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing("feed.torii_graphql"))
        ));
    }

    #[test]
    fn zero_lock_timeout_fails_validation() {
        let mut config = with_feed();
        config.database.lock_timeout_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "database.lock_timeout_ms",
                ..
            })
        ));
    }

    #[test]
    fn mode_selects_env_file() {
        assert_eq!(ModeConfig { prod: true }.env_file(), ".env.production");
        assert_eq!(ModeConfig::default().env_file(), ".env.development");
    }

    #[test]
    fn database_section_builds_store_config() {
        let database = DatabaseConfig {
            lock_timeout_ms: 40,
            spatialite_extension: Some("mod_spatialite".to_owned()),
            ..DatabaseConfig::default()
        };
        let sqlite = database.to_sqlite_config();
        assert_eq!(sqlite.lock_timeout, Duration::from_millis(40));
        assert_eq!(
            sqlite.spatialite_extension.as_deref(),
            Some("mod_spatialite")
        );
        assert_eq!(sqlite.path, PathBuf::from("./events.db"));
    }

    #[test]
    fn from_file_reads_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overlore-config.yaml");
        std::fs::write(&path, "server:\n  port: 7000\n").unwrap();
        let config = ServiceConfig::from_file(&path).unwrap();
        assert_eq!(config.server.port, 7000);

        assert!(matches!(
            ServiceConfig::from_file(&dir.path().join("absent.yaml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
