use clap::Parser;
use std::io;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use visit_tally::cli::Cli;
use visit_tally::config_file::ConfigFile;
use visit_tally::platform::ExitCode;
use visit_tally::TallyConfig;

fn main() {
    let cli = process_args_with_config();

    init_logging(cli.log_level());

    let config = TallyConfig::from_cli(&cli);
    if let Err(e) = config.validate() {
        eprintln!("visit-tally: Error: {:#}", e);
        ExitCode::InvalidUsage.exit();
    }

    match visit_tally::run(&config) {
        Ok(stats) => {
            if cli.stats {
                eprintln!("{}", stats.format_stats());
            }
            ExitCode::Success.exit();
        }
        Err(e) => {
            eprintln!("visit-tally: Error: {:#}", e);
            ExitCode::GeneralError.exit();
        }
    }
}

/// Logs go to stderr; `RUST_LOG` takes precedence over `-v`.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("visit_tally={}", level)));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .with(filter)
        .init();
}

/// Parse the command line after prepending config file defaults.
fn process_args_with_config() -> Cli {
    let raw_args: Vec<String> = std::env::args().collect();

    let config_file_path = extract_config_file_arg(&raw_args);
    let has_show_config = raw_args.iter().any(|arg| arg == "--show-config");
    let has_ignore_config = raw_args.iter().any(|arg| arg == "--ignore-config");

    // Handled before parsing so that no input/output paths are needed
    if has_show_config {
        ConfigFile::show_config(config_file_path.as_deref());
        ExitCode::Success.exit();
    }

    let processed_args = if has_ignore_config {
        raw_args
    } else {
        match ConfigFile::load(config_file_path.as_deref())
            .and_then(|config_file| config_file.process_args(raw_args))
        {
            Ok(processed) => processed,
            Err(e) => {
                eprintln!("visit-tally: Config error: {:#}", e);
                ExitCode::InvalidUsage.exit();
            }
        }
    };

    match Cli::try_parse_from(processed_args) {
        Ok(cli) => cli,
        Err(e) => e.exit(),
    }
}

/// Extract --config-file argument from raw args
fn extract_config_file_arg(args: &[String]) -> Option<String> {
    args.iter().enumerate().find_map(|(i, arg)| {
        if arg == "--config-file" {
            args.get(i + 1).cloned()
        } else {
            arg.strip_prefix("--config-file=").map(str::to_string)
        }
    })
}
