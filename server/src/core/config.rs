use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::utils::file::expand_path;

use super::cli::CliConfig;
use super::constants::{
    APP_DOT_FOLDER, CONFIG_FILE_NAME, DEFAULT_DRAIN_TIMEOUT_MS, DEFAULT_FLUSH_INTERVAL_MS,
    DEFAULT_FLUSH_LIMIT, DEFAULT_HOST, DEFAULT_INFLUXDB_DATABASE, DEFAULT_INFLUXDB_PASSWORD,
    DEFAULT_INFLUXDB_TIMEOUT_SECS, DEFAULT_INFLUXDB_URL, DEFAULT_INFLUXDB_USERNAME,
    DEFAULT_MAX_PACKET_SIZE, DEFAULT_PORT, DEFAULT_TYPESDB, MAX_PACKET_SIZE_LIMIT,
};

// =============================================================================
// Naming Mode Enum
// =============================================================================

/// How points are named in InfluxDB
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NamingMode {
    /// `plugin_label` measurement with host/instance/type tags
    #[default]
    Measurement,
    /// Legacy column layout: measurement is the full series label
    /// (`host.plugin.type`), host only becomes a tag with `hostname_as_column`
    Series,
}

impl fmt::Display for NamingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamingMode::Measurement => write!(f, "measurement"),
            NamingMode::Series => write!(f, "series"),
        }
    }
}

// =============================================================================
// Measurement Label Enum
// =============================================================================

/// Which part of the catalog data source names the measurement suffix
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementLabel {
    /// Data source kind (`cpu_derive`, `load_gauge`)
    #[default]
    Kind,
    /// Data source name (`cpu_value`, `interface_rx`)
    Name,
}

impl fmt::Display for MeasurementLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeasurementLabel::Kind => write!(f, "kind"),
            MeasurementLabel::Name => write!(f, "name"),
        }
    }
}

// =============================================================================
// File Config Structs (JSON deserialization)
// =============================================================================

/// collectd listener section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ListenerFileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub max_packet_size: Option<usize>,
}

/// InfluxDB sink section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct InfluxFileConfig {
    /// Base URL or bare `host:port`
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Output naming section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct FormatFileConfig {
    pub hostname_as_column: Option<bool>,
    pub pluginname_as_column: Option<bool>,
    pub naming: Option<NamingMode>,
    pub measurement_label: Option<MeasurementLabel>,
}

/// Batching section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct BatchFileConfig {
    pub interval_ms: Option<u64>,
    pub limit: Option<usize>,
}

/// Rate cache section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CacheFileConfig {
    /// Evict series not seen for this many seconds (unbounded when unset)
    pub max_idle_secs: Option<u64>,
}

/// Shutdown section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ShutdownFileConfig {
    pub drain: Option<bool>,
    pub drain_timeout_ms: Option<u64>,
}

/// Logging section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct LogFileConfig {
    pub file: Option<String>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub listener: Option<ListenerFileConfig>,
    pub typesdb: Option<Vec<String>>,
    pub influxdb: Option<InfluxFileConfig>,
    pub normalize: Option<bool>,
    pub store_rates: Option<bool>,
    pub format: Option<FormatFileConfig>,
    pub batch: Option<BatchFileConfig>,
    pub cache: Option<CacheFileConfig>,
    pub shutdown: Option<ShutdownFileConfig>,
    pub log: Option<LogFileConfig>,
    pub verbose: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if let Some(listener) = other.listener {
            let current = self.listener.get_or_insert_with(ListenerFileConfig::default);
            if listener.host.is_some() {
                current.host = listener.host;
            }
            if listener.port.is_some() {
                current.port = listener.port;
            }
            if listener.max_packet_size.is_some() {
                current.max_packet_size = listener.max_packet_size;
            }
        }

        if other.typesdb.is_some() {
            tracing::trace!(typesdb = ?other.typesdb, "Merging typesdb");
            self.typesdb = other.typesdb;
        }

        if let Some(influx) = other.influxdb {
            let current = self.influxdb.get_or_insert_with(InfluxFileConfig::default);
            if influx.url.is_some() {
                tracing::trace!(url = ?influx.url, "Merging influxdb.url");
                current.url = influx.url;
            }
            if influx.username.is_some() {
                current.username = influx.username;
            }
            if influx.password.is_some() {
                current.password = influx.password;
            }
            if influx.database.is_some() {
                current.database = influx.database;
            }
            if influx.timeout_secs.is_some() {
                current.timeout_secs = influx.timeout_secs;
            }
        }

        if other.normalize.is_some() {
            self.normalize = other.normalize;
        }
        if other.store_rates.is_some() {
            self.store_rates = other.store_rates;
        }

        if let Some(format) = other.format {
            let current = self.format.get_or_insert_with(FormatFileConfig::default);
            if format.hostname_as_column.is_some() {
                current.hostname_as_column = format.hostname_as_column;
            }
            if format.pluginname_as_column.is_some() {
                current.pluginname_as_column = format.pluginname_as_column;
            }
            if format.naming.is_some() {
                current.naming = format.naming;
            }
            if format.measurement_label.is_some() {
                current.measurement_label = format.measurement_label;
            }
        }

        if let Some(batch) = other.batch {
            let current = self.batch.get_or_insert_with(BatchFileConfig::default);
            if batch.interval_ms.is_some() {
                current.interval_ms = batch.interval_ms;
            }
            if batch.limit.is_some() {
                current.limit = batch.limit;
            }
        }

        if let Some(cache) = other.cache
            && cache.max_idle_secs.is_some()
        {
            let current = self.cache.get_or_insert_with(CacheFileConfig::default);
            current.max_idle_secs = cache.max_idle_secs;
        }

        if let Some(shutdown) = other.shutdown {
            let current = self.shutdown.get_or_insert_with(ShutdownFileConfig::default);
            if shutdown.drain.is_some() {
                current.drain = shutdown.drain;
            }
            if shutdown.drain_timeout_ms.is_some() {
                current.drain_timeout_ms = shutdown.drain_timeout_ms;
            }
        }

        if let Some(log) = other.log
            && log.file.is_some()
        {
            let current = self.log.get_or_insert_with(LogFileConfig::default);
            current.file = log.file;
        }

        if other.verbose.is_some() {
            self.verbose = other.verbose;
        }
    }
}

// =============================================================================
// Resolved Config Structs
// =============================================================================

#[derive(Debug, Clone)]
pub struct ListenerConfig {
    pub host: String,
    pub port: u16,
    pub max_packet_size: usize,
}

impl ListenerConfig {
    /// Socket address string to bind to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct InfluxConfig {
    pub url: String,
    pub username: String,
    pub password: String,
    pub database: String,
    pub timeout_secs: u64,
}

/// Rate normalization switches
#[derive(Debug, Clone, Default)]
pub struct RateConfig {
    /// Apply rate math to COUNTER samples
    pub normalize: bool,
    /// Apply rate math to DERIVE samples
    pub store_rates: bool,
    /// Evict cache entries idle for longer than this (unbounded when `None`)
    pub max_idle: Option<Duration>,
}

/// Output naming options
#[derive(Debug, Clone, Default)]
pub struct FormatConfig {
    pub hostname_as_column: bool,
    pub pluginname_as_column: bool,
    pub naming: NamingMode,
    pub measurement_label: MeasurementLabel,
}

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub flush_interval: Duration,
    pub flush_limit: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            flush_interval: Duration::from_millis(DEFAULT_FLUSH_INTERVAL_MS),
            flush_limit: DEFAULT_FLUSH_LIMIT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ShutdownConfig {
    /// Attempt one final flush on shutdown instead of exiting immediately
    pub drain: bool,
    pub drain_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub file: Option<PathBuf>,
    pub verbose: bool,
}

/// Immutable application configuration, built once at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listener: ListenerConfig,
    pub typesdb: Vec<PathBuf>,
    pub influxdb: InfluxConfig,
    pub rates: RateConfig,
    pub format: FormatConfig,
    pub batch: BatchConfig,
    pub shutdown: ShutdownConfig,
    pub log: LogConfig,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.metricbridge/metricbridge.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        if let Some(profile_path) = get_profile_config_path()
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(path);
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        let config = Self::resolve(file_config, cli);
        config.validate()?;
        Ok(config)
    }

    /// Layer configs: defaults -> file config -> CLI/env overrides
    fn resolve(file_config: FileConfig, cli: &CliConfig) -> Self {
        let file_listener = file_config.listener.unwrap_or_default();
        let file_influx = file_config.influxdb.unwrap_or_default();
        let file_format = file_config.format.unwrap_or_default();
        let file_batch = file_config.batch.unwrap_or_default();
        let file_cache = file_config.cache.unwrap_or_default();
        let file_shutdown = file_config.shutdown.unwrap_or_default();
        let file_log = file_config.log.unwrap_or_default();

        let listener = ListenerConfig {
            host: cli
                .host
                .clone()
                .or(file_listener.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: cli.port.or(file_listener.port).unwrap_or(DEFAULT_PORT),
            max_packet_size: file_listener
                .max_packet_size
                .unwrap_or(DEFAULT_MAX_PACKET_SIZE),
        };

        // typesdb: CLI list replaces the file list entirely
        let typesdb = if !cli.typesdb.is_empty() {
            cli.typesdb.iter().map(expand_path).collect()
        } else {
            file_config
                .typesdb
                .unwrap_or_else(|| vec![DEFAULT_TYPESDB.to_string()])
                .iter()
                .map(expand_path)
                .collect()
        };

        let influxdb = InfluxConfig {
            url: cli
                .influxdb
                .clone()
                .or(file_influx.url)
                .unwrap_or_else(|| DEFAULT_INFLUXDB_URL.to_string()),
            username: cli
                .username
                .clone()
                .or(file_influx.username)
                .unwrap_or_else(|| DEFAULT_INFLUXDB_USERNAME.to_string()),
            password: cli
                .password
                .clone()
                .or(file_influx.password)
                .unwrap_or_else(|| DEFAULT_INFLUXDB_PASSWORD.to_string()),
            database: cli
                .database
                .clone()
                .or(file_influx.database)
                .unwrap_or_else(|| DEFAULT_INFLUXDB_DATABASE.to_string()),
            timeout_secs: file_influx
                .timeout_secs
                .unwrap_or(DEFAULT_INFLUXDB_TIMEOUT_SECS),
        };

        // Both rate switches default to on, as the classic proxy did
        let rates = RateConfig {
            normalize: cli.normalize.or(file_config.normalize).unwrap_or(true),
            store_rates: cli.store_rates.or(file_config.store_rates).unwrap_or(true),
            max_idle: file_cache.max_idle_secs.map(Duration::from_secs),
        };

        let format = FormatConfig {
            hostname_as_column: cli
                .hostname_as_column
                .or(file_format.hostname_as_column)
                .unwrap_or(false),
            pluginname_as_column: cli
                .pluginname_as_column
                .or(file_format.pluginname_as_column)
                .unwrap_or(false),
            naming: cli.naming.or(file_format.naming).unwrap_or_default(),
            measurement_label: cli
                .measurement_label
                .or(file_format.measurement_label)
                .unwrap_or_default(),
        };

        let batch = BatchConfig {
            flush_interval: Duration::from_millis(
                file_batch.interval_ms.unwrap_or(DEFAULT_FLUSH_INTERVAL_MS),
            ),
            flush_limit: file_batch.limit.unwrap_or(DEFAULT_FLUSH_LIMIT),
        };

        let shutdown = ShutdownConfig {
            drain: file_shutdown.drain.unwrap_or(false),
            drain_timeout: Duration::from_millis(
                file_shutdown
                    .drain_timeout_ms
                    .unwrap_or(DEFAULT_DRAIN_TIMEOUT_MS),
            ),
        };

        let log = LogConfig {
            file: cli
                .logfile
                .clone()
                .or_else(|| file_log.file.map(expand_path)),
            verbose: cli.verbose || file_config.verbose.unwrap_or(false),
        };

        Self {
            listener,
            typesdb,
            influxdb,
            rates,
            format,
            batch,
            shutdown,
            log,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.listener.host.is_empty() {
            anyhow::bail!("Configuration error: listener.host must not be empty");
        }
        if self.listener.port == 0 {
            anyhow::bail!("Configuration error: listener.port must be greater than 0");
        }
        if self.listener.max_packet_size == 0
            || self.listener.max_packet_size > MAX_PACKET_SIZE_LIMIT
        {
            anyhow::bail!(
                "Configuration error: listener.max_packet_size must be between 1 and {}",
                MAX_PACKET_SIZE_LIMIT
            );
        }
        if self.typesdb.is_empty() {
            anyhow::bail!("Configuration error: at least one typesdb path is required");
        }
        if self.influxdb.url.trim().is_empty() {
            anyhow::bail!("Configuration error: influxdb.url must not be empty");
        }
        if self.influxdb.database.is_empty() {
            anyhow::bail!("Configuration error: influxdb.database must not be empty");
        }
        if self.influxdb.timeout_secs == 0 {
            anyhow::bail!("Configuration error: influxdb.timeout_secs must be greater than 0");
        }
        if self.batch.flush_limit == 0 {
            anyhow::bail!("Configuration error: batch.limit must be greater than 0");
        }
        if self.batch.flush_interval.is_zero() {
            anyhow::bail!("Configuration error: batch.interval_ms must be greater than 0");
        }
        if self.rates.max_idle.is_some_and(|d| d.is_zero()) {
            anyhow::bail!("Configuration error: cache.max_idle_secs must be greater than 0");
        }

        if self.influxdb.username == DEFAULT_INFLUXDB_USERNAME
            && self.influxdb.password == DEFAULT_INFLUXDB_PASSWORD
        {
            tracing::warn!("Using default InfluxDB credentials (root/root)");
        }

        if let Some(max_idle) = self.rates.max_idle
            && max_idle < self.batch.flush_interval * 2
        {
            tracing::warn!(
                max_idle_secs = max_idle.as_secs(),
                "cache.max_idle_secs is shorter than two flush windows, slow series will never produce rates"
            );
        }

        Ok(())
    }
}

/// Get profile config path (~/.metricbridge/metricbridge.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}

/// Whether a bind host means "every interface"
pub(crate) fn is_all_interfaces(host: &str) -> bool {
    matches!(host, "0.0.0.0" | "::" | "[::]")
}
