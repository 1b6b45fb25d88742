use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use livefix_cli::commands::replay_ops::{ReplayOptions, ServiceChoice};
use livefix_cli::commands::{
    check_ops, config_ops, exit_with, parse_operation, replay_ops, settings_or_default,
};
use livefix_core::service::Operation;
use livefix_engine::trace_init::{self, TraceGuard};

#[derive(Parser)]
#[command(name = "fixtool", about = "Live Tamil correction diagnostics")]
struct Cli {
    /// Log engine decisions to stderr (filter with RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Write a JSON trace log into DIR instead (build with --features trace)
    #[arg(long, global = true, value_name = "DIR", conflicts_with = "verbose")]
    trace_dir: Option<PathBuf>,

    /// Settings TOML file (defaults to the built-in settings)
    #[arg(long, global = true)]
    settings: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Send one text to the correction service and print the response
    Check {
        /// Text to correct
        text: String,
        /// Service endpoint (overrides the settings)
        #[arg(long)]
        endpoint: Option<String>,
        /// Operation: live_grammar or spell_check
        #[arg(long, value_parser = parse_operation)]
        operation: Option<Operation>,
    },

    /// Type text into a simulated field and print every suggestion transition
    Replay {
        /// Text to type, one character per keystroke
        text: String,
        /// Use a rich-text region instead of a plain text input
        #[arg(long)]
        rich: bool,
        /// Accept every suggestion as soon as it is shown
        #[arg(long)]
        accept: bool,
        /// Milliseconds between keystrokes
        #[arg(long, default_value = "100")]
        keystroke_ms: u64,
        /// JSON corrections table (`{"wrong": "right"}`) instead of the built-in one
        #[arg(long, conflicts_with = "live")]
        table: Option<String>,
        /// Ask the HTTP service instead of an offline table
        #[arg(long)]
        live: bool,
        /// Service endpoint for --live (overrides the settings)
        #[arg(long, requires = "live")]
        endpoint: Option<String>,
        /// Output as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Print the default settings TOML
    SettingsExport,

    /// Validate a settings TOML file
    SettingsValidate {
        /// Path to the settings file
        file: String,
    },
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .init();
}

fn init_trace(dir: &Path) -> TraceGuard {
    match trace_init::init_tracing(dir) {
        Ok(guard) => guard,
        Err(e) => exit_with(&format!("Error: {e}")),
    }
}

fn main() {
    let cli = Cli::parse();
    if cli.verbose {
        init_logging();
    }
    // Held to the end of main so the trace file is flushed.
    let _trace = cli.trace_dir.as_deref().map(init_trace);

    match cli.command {
        Command::Check {
            text,
            endpoint,
            operation,
        } => {
            let settings = settings_or_default(cli.settings.as_deref());
            check_ops::check(&settings, &text, endpoint.as_deref(), operation);
        }
        Command::Replay {
            text,
            rich,
            accept,
            keystroke_ms,
            table,
            live,
            endpoint,
            json,
        } => {
            let settings = settings_or_default(cli.settings.as_deref());
            let choice = match (table, live) {
                (Some(path), _) => ServiceChoice::Table(path),
                (None, true) => ServiceChoice::Live(endpoint),
                (None, false) => ServiceChoice::Offline,
            };
            let options = ReplayOptions {
                rich,
                accept,
                keystroke_ms,
            };
            replay_ops::replay(&settings, &choice, &text, &options, json);
        }
        Command::SettingsExport => config_ops::settings_export(),
        Command::SettingsValidate { file } => config_ops::settings_validate(&file),
    }
}
