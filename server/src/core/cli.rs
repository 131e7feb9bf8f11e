use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::config::{MeasurementLabel, NamingMode};
use super::constants::{
    APP_NAME_LOWER, ENV_CONFIG, ENV_HOST, ENV_HOSTNAME_AS_COLUMN, ENV_INFLUXDB_DATABASE,
    ENV_INFLUXDB_PASSWORD, ENV_INFLUXDB_URL, ENV_INFLUXDB_USERNAME, ENV_LOG_FILE,
    ENV_MEASUREMENT_LABEL, ENV_NAMING, ENV_NORMALIZE, ENV_PLUGINNAME_AS_COLUMN, ENV_PORT,
    ENV_STORE_RATES, ENV_TYPESDB, ENV_VERBOSE,
};

#[derive(Parser)]
#[command(name = APP_NAME_LOWER)]
#[command(version, about = "collectd to InfluxDB metrics bridge", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// collectd listener host address
    #[arg(long, short = 'H', global = true, env = ENV_HOST)]
    pub host: Option<String>,

    /// collectd listener UDP port
    #[arg(long, short = 'p', global = true, env = ENV_PORT)]
    pub port: Option<u16>,

    /// Path to collectd types.db (repeat or comma-separate for several files)
    #[arg(long, short = 't', global = true, env = ENV_TYPESDB, value_delimiter = ',')]
    pub typesdb: Vec<PathBuf>,

    /// InfluxDB base URL or host:port
    #[arg(long, global = true, env = ENV_INFLUXDB_URL)]
    pub influxdb: Option<String>,

    /// InfluxDB username
    #[arg(long, short = 'u', global = true, env = ENV_INFLUXDB_USERNAME)]
    pub username: Option<String>,

    /// InfluxDB password
    #[arg(long, global = true, env = ENV_INFLUXDB_PASSWORD)]
    pub password: Option<String>,

    /// InfluxDB database name
    #[arg(long, short = 'd', global = true, env = ENV_INFLUXDB_DATABASE)]
    pub database: Option<String>,

    /// Convert COUNTER samples to per-second rates
    #[arg(long, global = true, env = ENV_NORMALIZE)]
    pub normalize: Option<bool>,

    /// Convert DERIVE samples to per-second rates
    #[arg(long, global = true, env = ENV_STORE_RATES)]
    pub store_rates: Option<bool>,

    /// Emit the host as a tag instead of part of the series name
    #[arg(long, global = true, env = ENV_HOSTNAME_AS_COLUMN)]
    pub hostname_as_column: Option<bool>,

    /// Emit the plugin name as a tag
    #[arg(long, global = true, env = ENV_PLUGINNAME_AS_COLUMN)]
    pub pluginname_as_column: Option<bool>,

    /// Point naming mode (measurement or series)
    #[arg(long, global = true, env = ENV_NAMING, value_parser = parse_naming_mode)]
    pub naming: Option<NamingMode>,

    /// Measurement suffix source (kind or name)
    #[arg(long, global = true, env = ENV_MEASUREMENT_LABEL, value_parser = parse_measurement_label)]
    pub measurement_label: Option<MeasurementLabel>,

    /// Append logs to this file instead of stderr
    #[arg(long, short = 'l', global = true, env = ENV_LOG_FILE)]
    pub logfile: Option<PathBuf>,

    /// Trace every packet and every written batch
    #[arg(long, short = 'v', global = true, env = ENV_VERBOSE)]
    pub verbose: bool,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,
}

/// Parse naming mode from CLI/env string
fn parse_naming_mode(s: &str) -> Result<NamingMode, String> {
    match s.to_lowercase().as_str() {
        "measurement" => Ok(NamingMode::Measurement),
        "series" => Ok(NamingMode::Series),
        _ => Err(format!(
            "Invalid naming mode '{}'. Valid options: measurement, series",
            s
        )),
    }
}

/// Parse measurement label source from CLI/env string
fn parse_measurement_label(s: &str) -> Result<MeasurementLabel, String> {
    match s.to_lowercase().as_str() {
        "kind" => Ok(MeasurementLabel::Kind),
        "name" => Ok(MeasurementLabel::Name),
        _ => Err(format!(
            "Invalid measurement label '{}'. Valid options: kind, name",
            s
        )),
    }
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Start the bridge (default command)
    Start,
    /// Load the types.db catalog, report what it contains and exit
    CheckTypes,
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub typesdb: Vec<PathBuf>,
    pub influxdb: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub normalize: Option<bool>,
    pub store_rates: Option<bool>,
    pub hostname_as_column: Option<bool>,
    pub pluginname_as_column: Option<bool>,
    pub naming: Option<NamingMode>,
    pub measurement_label: Option<MeasurementLabel>,
    pub logfile: Option<PathBuf>,
    pub verbose: bool,
    pub config: Option<PathBuf>,
}

impl From<Cli> for CliConfig {
    fn from(cli: Cli) -> Self {
        Self {
            host: cli.host,
            port: cli.port,
            typesdb: cli.typesdb,
            influxdb: cli.influxdb,
            username: cli.username,
            password: cli.password,
            database: cli.database,
            normalize: cli.normalize,
            store_rates: cli.store_rates,
            hostname_as_column: cli.hostname_as_column,
            pluginname_as_column: cli.pluginname_as_column,
            naming: cli.naming,
            measurement_label: cli.measurement_label,
            logfile: cli.logfile,
            verbose: cli.verbose,
            config: cli.config,
        }
    }
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Option<Commands>) {
    let mut cli = Cli::parse();
    let command = cli.command.take();
    (cli.into(), command)
}
