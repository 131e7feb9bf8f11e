//! Core application

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use crate::api::CollectdListener;
use crate::core::banner;
use crate::core::cli::{self, CliConfig, Commands};
use crate::core::config::{AppConfig, LogConfig};
use crate::core::constants::{CRATE_LOG_TARGET, ENV_LOG, SAMPLE_CHANNEL_CAPACITY, SIGNAL_EXIT_CODE};
use crate::core::shutdown::{ShutdownMode, ShutdownService};
use crate::data::{InfluxSink, TypeCatalog};
use crate::domain::MetricsPipeline;
use crate::utils::file::open_append;

pub struct CoreApp {
    pub shutdown: ShutdownService,
    pub config: AppConfig,
    pub catalog: Arc<TypeCatalog>,
    pub sink: Arc<InfluxSink>,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();

        let (cli_config, command) = cli::parse();
        let config = Self::load_config(&cli_config)?;
        Self::init_logging(&config.log)?;

        tracing::debug!(command = ?command, "Application starting");

        match command {
            Some(Commands::CheckTypes) => Self::check_types(&config),
            Some(Commands::Start) | None => {
                let app = Self::init(config)?;
                Self::start_proxy(app).await
            }
        }
    }

    /// Load configuration, reporting to stderr until the real subscriber exists
    fn load_config(cli: &CliConfig) -> Result<AppConfig> {
        let subscriber = tracing_subscriber::fmt()
            .with_target(false)
            .compact()
            .with_env_filter(Self::env_filter(cli.verbose))
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::with_default(subscriber, || AppConfig::load(cli))
    }

    fn init(config: AppConfig) -> Result<Self> {
        let catalog = TypeCatalog::load(&config.typesdb).context("Failed to read types.db")?;
        tracing::debug!(types = catalog.len(), "Type catalog loaded");

        let sink = InfluxSink::new(&config.influxdb).context("Failed to create InfluxDB client")?;
        let shutdown = ShutdownService::new(ShutdownMode::from(&config.shutdown));

        Ok(Self {
            shutdown,
            config,
            catalog: Arc::new(catalog),
            sink: Arc::new(sink),
        })
    }

    fn check_types(config: &AppConfig) -> Result<()> {
        for path in &config.typesdb {
            let catalog = TypeCatalog::load(std::slice::from_ref(path))
                .with_context(|| format!("Failed to read {}", path.display()))?;
            println!("{}: {} types", path.display(), catalog.len());
        }

        let merged = TypeCatalog::load(&config.typesdb).context("Failed to read types.db")?;
        println!("Total: {} types", merged.len());
        Ok(())
    }

    fn env_filter(verbose: bool) -> EnvFilter {
        let default_filter = format!("info,{}=info", CRATE_LOG_TARGET);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        let filter = EnvFilter::new(filter);
        if !verbose {
            return filter;
        }
        match format!("{}=trace", CRATE_LOG_TARGET).parse() {
            Ok(directive) => filter.add_directive(directive),
            Err(_) => filter,
        }
    }

    fn init_logging(log: &LogConfig) -> Result<()> {
        let filter = Self::env_filter(log.verbose);

        match &log.file {
            Some(path) => {
                let file = open_append(path)
                    .with_context(|| format!("Failed to open log file: {}", path.display()))?;
                tracing_subscriber::fmt()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_level(true)
                    .with_ansi(false)
                    .compact()
                    .with_env_filter(filter)
                    .with_writer(Mutex::new(file))
                    .init();
            }
            None => {
                tracing_subscriber::fmt()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_level(true)
                    .with_ansi(true)
                    .compact()
                    .with_env_filter(filter)
                    .init();
            }
        }
        Ok(())
    }

    async fn start_proxy(app: Self) -> Result<()> {
        // Install signal handlers FIRST
        app.shutdown.install_signal_handlers();

        let listener = CollectdListener::bind(&app.config.listener, app.config.log.verbose)
            .await
            .context("Failed to start collectd listener")?;

        let (tx, rx) = mpsc::channel(SAMPLE_CHANNEL_CAPACITY);

        let pipeline = MetricsPipeline::new(app.catalog.clone(), app.sink.clone(), &app.config);
        app.shutdown
            .register(pipeline.start(rx, app.shutdown.subscribe()))
            .await;
        app.shutdown
            .register(listener.start(tx, app.shutdown.subscribe()))
            .await;

        banner::print_banner(&app.config, app.sink.write_url().as_str(), app.catalog.len());
        tracing::info!(
            address = %app.config.listener.bind_address(),
            database = %app.config.influxdb.database,
            "Proxy started"
        );

        app.shutdown.wait().await;

        let drained = app.shutdown.shutdown().await;
        tracing::info!(
            mode = ?app.shutdown.mode(),
            drained,
            "Exiting on signal"
        );
        std::process::exit(SIGNAL_EXIT_CODE);
    }
}
