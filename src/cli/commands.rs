use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::config::AppConfig;
use crate::dispatcher::Dispatcher;
use crate::docs::{write_artifacts, DocsInfo, DocsSite};
use crate::middleware::{RequestLogger, TracingMiddleware};
use crate::registry::Registry;
use crate::request_log::{LogSink, Rotation};
use crate::routes::register_all;
use crate::server::{AppService, HttpServer, ServerHandle};

/// Command-line interface for brrtapi
#[derive(Parser, Debug)]
#[command(name = "brrtapi")]
#[command(version, about = "REST API scaffold with structured request logging", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the registry, bind it and serve HTTP until interrupted
    Serve {
        /// YAML or TOML configuration file
        #[arg(short, long, env = "BRRTAPI_CONFIG")]
        config: Option<PathBuf>,

        /// Listening port
        #[arg(short, long)]
        port: Option<u16>,

        /// Debug logging and console echo of request records
        #[arg(long, default_value_t = false)]
        debug: bool,

        /// Pretty-print request log records
        #[arg(long, default_value_t = false)]
        pretty: bool,

        /// Colorize the console echo (red for errors)
        #[arg(long, default_value_t = false)]
        color: bool,

        /// Request log file; empty or nop:// disables it
        #[arg(long)]
        log_file: Option<String>,

        /// Log file rotation: minutely, hourly, daily or never
        #[arg(long)]
        log_rotation: Option<Rotation>,

        /// Directory holding index.html and the generated docs
        #[arg(long)]
        docs_dir: Option<PathBuf>,
    },
    /// Generate openapi.json and index.html.md, then exit
    Docs {
        /// YAML or TOML configuration file
        #[arg(short, long, env = "BRRTAPI_CONFIG")]
        config: Option<PathBuf>,

        /// Output directory (defaults to the configured docs_dir)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Print every bound `METHOD path` pair
    Routes {
        /// YAML or TOML configuration file
        #[arg(short, long, env = "BRRTAPI_CONFIG")]
        config: Option<PathBuf>,
    },
}

impl Commands {
    /// Load the configuration file and apply this command's flags on top.
    ///
    /// # Errors
    ///
    /// The configuration file cannot be read or parsed.
    pub fn config(&self) -> Result<AppConfig> {
        match self {
            Commands::Serve {
                config,
                port,
                debug,
                pretty,
                color,
                log_file,
                log_rotation,
                docs_dir,
            } => {
                let mut cfg = AppConfig::load(config.as_deref())?;
                if let Some(port) = port {
                    cfg.port = *port;
                }
                cfg.debug |= *debug;
                cfg.pretty_log |= *pretty;
                cfg.color |= *color;
                if let Some(path) = log_file {
                    cfg.log.file_path.clone_from(path);
                }
                if let Some(rotation) = log_rotation {
                    cfg.log.rotation = *rotation;
                }
                if let Some(dir) = docs_dir {
                    cfg.docs_dir.clone_from(dir);
                }
                Ok(cfg)
            }
            Commands::Docs { config, out } => {
                let mut cfg = AppConfig::load(config.as_deref())?;
                cfg.build_docs = true;
                if let Some(dir) = out {
                    cfg.docs_dir.clone_from(dir);
                }
                Ok(cfg)
            }
            Commands::Routes { config } => AppConfig::load(config.as_deref()),
        }
    }
}

/// A registry bound to a dispatcher, ready to serve.
pub struct App {
    pub config: AppConfig,
    pub registry: Registry,
    pub dispatcher: Arc<Dispatcher>,
    pub docs: Arc<DocsSite>,
}

impl App {
    /// Register the example routes and the docs routes, validate, bind and
    /// publish the OpenAPI snapshot.
    ///
    /// # Errors
    ///
    /// Invalid configuration, a registration or validation failure, or a
    /// duplicate binding. The server must not start in any of these cases.
    pub fn build(config: AppConfig) -> Result<Self> {
        let any = config.any_expansion()?;
        let mut registry = Registry::new(any.clone());
        let docs = DocsSite::new(&config.docs_dir, DocsInfo::default());

        register_all(&mut registry, &docs).context("endpoint registration failed")?;
        registry.validate().context("endpoint validation failed")?;

        let mut dispatcher = Dispatcher::new(any);
        dispatcher
            .bind(&mut registry)
            .context("endpoint binding failed")?;
        docs.publish(&registry)?;

        Ok(Self {
            config,
            registry,
            dispatcher: Arc::new(dispatcher),
            docs,
        })
    }

    /// The request pipeline with tracing spans and request logging to `sink`.
    #[must_use]
    pub fn service(&self, sink: Arc<LogSink>) -> AppService {
        AppService::new(Arc::clone(&self.dispatcher))
            .with_middleware(Arc::new(TracingMiddleware))
            .with_middleware(Arc::new(RequestLogger::new(sink)))
    }

    /// Start serving on `0.0.0.0:<port>`.
    ///
    /// # Errors
    ///
    /// The log sink cannot be opened or the port cannot be bound.
    pub fn start(&self) -> Result<ServerHandle> {
        let sink = LogSink::from_options(&self.config.sink_options())?;
        let addr = format!("0.0.0.0:{}", self.config.port);
        info!(
            port = self.config.port,
            endpoints = self.registry.len(),
            request_log = %self.config.log.file_path,
            "Starting API server"
        );
        HttpServer(self.service(Arc::new(sink)))
            .start(addr.as_str())
            .with_context(|| format!("failed to bind {addr}"))
    }

    /// Write the documentation artifacts into `dir`.
    ///
    /// # Errors
    ///
    /// See [`write_artifacts`].
    pub fn write_docs(&self, dir: &Path) -> Result<()> {
        write_artifacts(&self.registry, &DocsInfo::default(), dir)
    }

    /// Bound routes as `METHOD path` lines.
    #[must_use]
    pub fn route_lines(&self) -> Vec<String> {
        self.dispatcher
            .routes()
            .iter()
            .map(|(method, path)| format!("{method} {path}"))
            .collect()
    }
}

/// Execute `command` with its resolved configuration.
///
/// `serve` blocks until SIGINT or SIGTERM. With `build_docs` set (always for
/// the `docs` command) the artifacts are written and nothing is served.
///
/// # Errors
///
/// Any startup failure; see [`App::build`] and [`App::start`].
pub fn run_cli(command: &Commands, config: AppConfig) -> Result<()> {
    let app = App::build(config)?;
    match command {
        Commands::Routes { .. } => {
            let mut out = io::stdout().lock();
            for line in app.route_lines() {
                writeln!(out, "{line}")?;
            }
            Ok(())
        }
        Commands::Docs { .. } | Commands::Serve { .. } if app.config.build_docs => {
            app.write_docs(&app.config.docs_dir)
        }
        Commands::Docs { .. } | Commands::Serve { .. } => {
            let handle = app.start()?;
            wait_for_shutdown(handle)
        }
    }
}

#[cfg(unix)]
fn wait_for_shutdown(handle: ServerHandle) -> Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals =
        Signals::new([SIGINT, SIGTERM]).context("failed to register signal handlers")?;
    if let Some(signal) = signals.forever().next() {
        info!(signal, addr = %handle.addr(), "Shutdown signal received");
    }
    handle.stop();
    Ok(())
}

#[cfg(not(unix))]
fn wait_for_shutdown(handle: ServerHandle) -> Result<()> {
    handle
        .join()
        .map_err(|e| anyhow::anyhow!("server coroutine panicked: {e:?}"))
}
