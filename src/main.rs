use brrtapi::cli::{run_cli, Cli};
use brrtapi::otel::{init_logging, LogConfig};
use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.command.config()?;

    let _log_guard = init_logging(&LogConfig::from_env().with_debug(config.debug))?;
    may::config().set_stack_size(config.stack_size);

    run_cli(&cli.command, config)
}
