use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use colored::Colorize;
use kconftool::{ctx::AppContext, tools::Tool};
use log::LevelFilter;

/// Kconfig configuration tools.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Top-level Kconfig file
    #[arg(long, global = true, env = "KCONFTOOL_KCONFIG")]
    kconfig: Option<PathBuf>,
    /// Configuration file [default: $KCONFIG_CONFIG or .config]
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Settings file [default: .kconftool.toml]
    #[arg(long, global = true)]
    settings: Option<PathBuf>,
    /// More output, repeat for debug messages
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    tool: Tool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", format!("error: {e:#}").red());
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .format_target(false)
        .parse_default_env()
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let workspace = std::env::current_dir()?;
    let ctx = AppContext::new(workspace, cli.kconfig, cli.config, cli.settings.as_deref())?;
    cli.tool.run(&ctx)
}
