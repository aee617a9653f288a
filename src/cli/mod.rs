//! # CLI Module
//!
//! Command-line entry points for the `brrtapi` binary.
//!
//! ## Commands
//!
//! ### `serve`
//!
//! Build the registry, validate it, bind it and serve until SIGINT/SIGTERM:
//!
//! ```bash
//! brrtapi serve --config config/config.yaml --port 9876 --debug --color
//! ```
//!
//! Options:
//! - `--config <FILE>` - YAML or TOML configuration (also `BRRTAPI_CONFIG`)
//! - `--port <N>` - listening port (default 9876)
//! - `--debug` - debug diagnostics and a console echo of every request record
//! - `--pretty` - indent request log records
//! - `--color` - red/green console echo
//! - `--log-file <PATH>` / `--log-rotation <R>` - request log file and rotation
//! - `--docs-dir <DIR>` - directory served under `/docs`
//!
//! ### `docs`
//!
//! Write `openapi.json` and `index.html.md` and exit:
//!
//! ```bash
//! brrtapi docs --out docs
//! ```
//!
//! ### `routes`
//!
//! Print every bound `METHOD path` pair:
//!
//! ```bash
//! brrtapi routes
//! ```
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use brrtapi::cli::{run_cli, Cli};
//! use clap::Parser;
//!
//! let cli = Cli::parse();
//! let config = cli.command.config()?;
//! run_cli(&cli.command, config)?;
//! ```

mod commands;


pub use commands::{run_cli, App, Cli, Commands};
