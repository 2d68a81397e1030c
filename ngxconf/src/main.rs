//! ngxconf - nginx configuration toolkit
//!
//! Generates configurations from a deployment topology, and formats,
//! validates and inspects existing configuration files.

mod generator;
mod topology;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use ngxconf_config::{JsonAdapter, Projection};
use ngxconf_core::{Conf, Parent, Render};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::generator::Generator;
use crate::topology::Topology;

/// Default location of generated output
const DEFAULT_OUTPUT: &str = "./resources/generated_nginx.conf";

/// ngxconf - parse, generate and format nginx configuration
#[derive(Parser)]
#[command(name = "ngxconf")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a configuration from a topology file
    Generate {
        /// Topology file (YAML, JSON or TOML)
        #[arg(long)]
        input: PathBuf,

        /// Where to write the configuration
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Re-serialize a configuration file in canonical layout
    Fmt {
        /// Configuration file
        file: PathBuf,

        /// Only report whether the file is already formatted
        #[arg(long)]
        check: bool,
    },

    /// Check that a configuration file is well formed
    Validate {
        /// Configuration file
        file: PathBuf,
    },

    /// Print the structural projection of a configuration as JSON
    Dump {
        /// Configuration file
        file: PathBuf,

        #[arg(long, value_enum, default_value_t = Format::List)]
        format: Format,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    List,
    Dict,
}

impl From<Format> for Projection {
    fn from(format: Format) -> Self {
        match format {
            Format::List => Projection::List,
            Format::Dict => Projection::Dict,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    if cli.verbose {
        tracing::debug!("Verbose mode enabled");
    }

    match cli.command {
        Commands::Generate { input, output } => generate(&input, output.as_deref()),
        Commands::Fmt { file, check } => fmt(&file, check),
        Commands::Validate { file } => validate(&file),
        Commands::Dump { file, format } => dump(&file, format),
    }
}

fn generate(input: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    tracing::info!("📄 Reading topology from {}", input.display());
    let topology = Topology::load(input)?;

    let output = match output {
        Some(path) => {
            tracing::info!("Output location specified as {}", path.display());
            path.to_path_buf()
        }
        None => {
            tracing::warn!("Output location not specified, writing to {}", DEFAULT_OUTPUT);
            PathBuf::from(DEFAULT_OUTPUT)
        }
    };

    let conf = Generator::new(&topology).generate()?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    ngxconf_config::dumpf(&conf, &output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    tracing::info!("✅ Generated configuration at {}", output.display());
    Ok(())
}

fn fmt(file: &Path, check: bool) -> anyhow::Result<()> {
    let source = read(file)?;

    // `#` lines are not part of the grammar.
    if let Some(line) = comment_line(&source) {
        eprintln!(
            "❌ {}:{}: comments are not supported, leaving the file unchanged",
            file.display(),
            line
        );
        std::process::exit(1);
    }
    let conf = parse_or_report(file, &source);
    let formatted = conf.dumps();

    if check {
        if formatted != source {
            eprintln!("❌ {} is not formatted", file.display());
            std::process::exit(1);
        }
        println!("✅ {} is formatted", file.display());
        return Ok(());
    }

    if formatted == source {
        tracing::info!("{} already formatted", file.display());
        return Ok(());
    }
    std::fs::write(file, formatted)
        .with_context(|| format!("Failed to write {}", file.display()))?;
    tracing::info!("✨ Formatted {}", file.display());
    Ok(())
}

fn validate(file: &Path) -> anyhow::Result<()> {
    tracing::info!("Validating config: {}", file.display());
    let source = read(file)?;

    let conf = parse_or_report(file, &source);
    tracing::debug!(nodes = conf.children().len(), "parsed");
    println!("✅ Configuration '{}' is valid!", file.display());
    Ok(())
}

/// Strict parse; on failure print the report and exit
fn parse_or_report(file: &Path, source: &str) -> Conf {
    match ngxconf_config::parse_strict(source) {
        Ok(conf) => conf,
        Err(e) => {
            let name = file.display().to_string();
            let color = std::io::stderr().is_terminal();
            eprint!("{}", ngxconf_config::render(&name, source, &e, color));
            std::process::exit(1);
        }
    }
}

/// 1-based number of the first line that starts with `#`
fn comment_line(source: &str) -> Option<usize> {
    source
        .lines()
        .position(|line| line.trim_start().starts_with('#'))
        .map(|i| i + 1)
}

fn dump(file: &Path, format: Format) -> anyhow::Result<()> {
    let conf = ngxconf_config::parse(&read(file)?);
    let json = JsonAdapter::serialize(&conf, format.into(), true)?;
    println!("{}", json);
    Ok(())
}

fn read(file: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))
}
