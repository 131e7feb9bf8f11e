// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display)
pub const APP_NAME: &str = "MetricBridge";

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "metricbridge";

/// Crate name as it appears in log targets
pub const CRATE_LOG_TARGET: &str = "metricbridge_server";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".metricbridge";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "metricbridge.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "METRICBRIDGE_CONFIG";

// =============================================================================
// Environment Variables - Logging
// =============================================================================

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "METRICBRIDGE_LOG";

/// Environment variable for log file path
pub const ENV_LOG_FILE: &str = "METRICBRIDGE_LOG_FILE";

/// Environment variable for verbose packet tracing
pub const ENV_VERBOSE: &str = "METRICBRIDGE_VERBOSE";

// =============================================================================
// Environment Variables - Listener
// =============================================================================

/// Environment variable for the collectd listener host
pub const ENV_HOST: &str = "METRICBRIDGE_HOST";

/// Environment variable for the collectd listener port
pub const ENV_PORT: &str = "METRICBRIDGE_PORT";

/// Environment variable for the types.db path
pub const ENV_TYPESDB: &str = "METRICBRIDGE_TYPESDB";

// =============================================================================
// Environment Variables - InfluxDB
// =============================================================================

pub const ENV_INFLUXDB_URL: &str = "METRICBRIDGE_INFLUXDB";
pub const ENV_INFLUXDB_USERNAME: &str = "INFLUXDB_PROXY_USERNAME";
pub const ENV_INFLUXDB_PASSWORD: &str = "INFLUXDB_PROXY_PASSWORD";
pub const ENV_INFLUXDB_DATABASE: &str = "INFLUXDB_PROXY_DATABASE";

// =============================================================================
// Environment Variables - Processing
// =============================================================================

pub const ENV_NORMALIZE: &str = "METRICBRIDGE_NORMALIZE";
pub const ENV_STORE_RATES: &str = "METRICBRIDGE_STORE_RATES";
pub const ENV_HOSTNAME_AS_COLUMN: &str = "METRICBRIDGE_HOSTNAME_AS_COLUMN";
pub const ENV_PLUGINNAME_AS_COLUMN: &str = "METRICBRIDGE_PLUGINNAME_AS_COLUMN";
pub const ENV_NAMING: &str = "METRICBRIDGE_NAMING";
pub const ENV_MEASUREMENT_LABEL: &str = "METRICBRIDGE_MEASUREMENT_LABEL";

// =============================================================================
// Listener Defaults
// =============================================================================

/// Default listener host
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default listener port (collectd network plugin default)
pub const DEFAULT_PORT: u16 = 25826;

/// Default types.db location
pub const DEFAULT_TYPESDB: &str = "types.db";

/// Default maximum datagram size (collectd network plugin default buffer)
pub const DEFAULT_MAX_PACKET_SIZE: usize = 1452;

/// Largest datagram size accepted in configuration
pub const MAX_PACKET_SIZE_LIMIT: usize = 65_535;

// =============================================================================
// InfluxDB Defaults
// =============================================================================

pub const DEFAULT_INFLUXDB_URL: &str = "localhost:8086";
pub const DEFAULT_INFLUXDB_USERNAME: &str = "root";
pub const DEFAULT_INFLUXDB_PASSWORD: &str = "root";
pub const DEFAULT_INFLUXDB_DATABASE: &str = "collectd_proxy";

/// HTTP request timeout for batch writes in seconds
pub const DEFAULT_INFLUXDB_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// Batching
// =============================================================================

/// Flush the batch after this much time since the last flush attempt
pub const DEFAULT_FLUSH_INTERVAL_MS: u64 = 1000;

/// Flush the batch once this many points are pending
pub const DEFAULT_FLUSH_LIMIT: usize = 50;

// =============================================================================
// Shutdown
// =============================================================================

/// Upper bound for the optional final flush on shutdown
pub const DEFAULT_DRAIN_TIMEOUT_MS: u64 = 2000;

/// Process exit status used for signal-triggered termination
pub const SIGNAL_EXIT_CODE: i32 = 1;

// =============================================================================
// Pipeline
// =============================================================================

/// Capacity of the listener -> pipeline hand-off channel
///
/// One slot: the listener can never run more than one sample ahead.
pub const SAMPLE_CHANNEL_CAPACITY: usize = 1;
