//! envconf CLI tool.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "envconf")]
#[command(about = "Resolve and validate configuration from the environment", long_about = None)]
struct Cli {
    /// Schema file (KDL). The built-in web settings schema is used when omitted
    #[arg(long, global = true, env = "ENVCONF_SCHEMA")]
    schema: Option<PathBuf>,

    /// Project directory used for computed defaults of the built-in schema
    #[arg(long, global = true, env = "ENVCONF_BASE_DIR")]
    base_dir: Option<PathBuf>,

    /// Override an environment variable (KEY=VALUE), may be repeated
    #[arg(long = "set", global = true, value_parser = parse_key_val)]
    overrides: Vec<(String, String)>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the configuration and report whether it is valid
    Check,
    /// Print the resolved configuration
    Show {
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
        /// Print secret values instead of masking them
        #[arg(long)]
        reveal: bool,
    },
    /// List the schema's variables in resolution order
    Schema,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Json,
    Env,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    if key.is_empty() {
        return Err(format!("empty variable name in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let source = commands::SchemaSource {
        schema: cli.schema,
        base_dir: cli.base_dir,
        overrides: cli.overrides,
    };

    match cli.command {
        Commands::Check => commands::check(&source)?,
        Commands::Show { format, reveal } => commands::show(&source, format, reveal)?,
        Commands::Schema => commands::schema(&source)?,
    }

    Ok(())
}
