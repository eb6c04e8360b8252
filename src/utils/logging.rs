// file: src/utils/logging.rs
// description: tracing subscriber setup and colored console message helpers

use colored::*;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

// lance and datafusion log every fragment write at info
const QUIET_TARGETS: &str = "lance=warn,lancedb=warn,datafusion=warn,ort=warn,reqwest=warn";

/// `RUST_LOG` wins when set; otherwise `--verbose` picks debug over info.
pub fn init_logger(colored_output: bool, verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},{}", level, QUIET_TARGETS)));

    let fmt_layer = fmt::layer()
        .with_target(verbose)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(verbose)
        .with_line_number(verbose)
        .compact()
        .with_ansi(colored_output);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

pub fn format_success(msg: &str) -> String {
    format!("{} {}", "✓".green().bold(), msg.green())
}

pub fn format_warning(msg: &str) -> String {
    format!("{} {}", "⚠".yellow().bold(), msg.yellow())
}

pub fn format_info(msg: &str) -> String {
    format!("{} {}", "ℹ".blue().bold(), msg)
}
