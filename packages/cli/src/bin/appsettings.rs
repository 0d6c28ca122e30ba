// ABOUTME: Entry point for the appsettings command line tool
// ABOUTME: Parses global options, builds the settings context, and dispatches subcommands

use app_settings::{AppSettings, Backend, SettingsContext, StoreConfig};
use appsettings_cli::commands;
use appsettings_cli::MyAppSettings;
use appsettings_config::constants::{DEFAULT_LOG_FILTER, RUST_LOG};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "appsettings")]
#[command(about = "Inspect and edit persisted application settings")]
#[command(version)]
struct Cli {
    /// Scope values to a named instance (e.g. a user account)
    #[arg(long, global = true)]
    identifier: Option<String>,

    /// Use a shared suite instead of the standard domain
    #[arg(long, global = true)]
    suite: Option<String>,

    /// Directory holding the domain files
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    /// Keep everything in memory for this run
    #[arg(long, global = true)]
    memory: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List declared properties
    Schema,
    /// Show every property and its current value
    Show,
    /// Print one property
    Get {
        /// Property name
        key: String,
    },
    /// Set one property, parsed according to its declared type
    Set {
        /// Property name
        key: String,
        /// New value
        value: String,
    },
    /// Remove one property's stored value
    Unset {
        /// Property name
        key: String,
    },
    /// Remove every stored value and re-apply defaults
    Reset,
    /// Write sample values and read them back
    Demo,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = handle_command(cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(RUST_LOG).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn build_context(cli: &Cli) -> Result<SettingsContext, Box<dyn std::error::Error>> {
    let mut config = StoreConfig::from_env()?;
    if let Some(home) = &cli.home {
        config.directory = home.clone();
    }
    if cli.memory {
        config.backend = Backend::Memory;
    }
    Ok(SettingsContext::from_config(config))
}

fn handle_command(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let context = build_context(&cli)?;
    let open = || {
        commands::open_settings(&context, cli.identifier.as_deref(), cli.suite.as_deref())
    };

    match &cli.command {
        Commands::Schema => {
            println!("{}", "Declared properties".blue().bold());
            println!("{}", commands::schema_table::<MyAppSettings>());
        }
        Commands::Show => {
            let settings = open()?;
            let scope = settings.identifier().unwrap_or("default");
            println!("{}", format!("Settings ({})", scope).blue().bold());
            println!("{}", commands::show_table(settings.as_ref()));
        }
        Commands::Get { key } => match commands::get_value(open()?.as_ref(), key)? {
            Some(value) => println!("{}", value),
            None => println!("{}", "(not set)".dimmed()),
        },
        Commands::Set { key, value } => {
            commands::set_value(open()?.as_ref(), key, value)?;
            println!("{} {} = {}", "✓".green(), key.cyan(), value);
        }
        Commands::Unset { key } => {
            commands::unset_value(open()?.as_ref(), key)?;
            println!("{} {} removed", "✓".green(), key.cyan());
        }
        Commands::Reset => {
            commands::reset(open()?.as_ref())?;
            println!("{}", "Settings reset to defaults".green());
        }
        Commands::Demo => {
            for line in commands::run_demo(&context)? {
                println!("{}", line);
            }
        }
    }

    Ok(())
}
