//! xmlhand CLI
//!
//! Reformat, search and cross-check XML files on either tree backend.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use xmlhand::{unified, AnyDocument, Backend, Config};

#[derive(Parser)]
#[command(name = "xmlhand")]
#[command(version, about = "Fluent XML over interchangeable tree backends", long_about = None)]
struct Cli {
    /// Tree backend to load documents into
    #[arg(short, long, value_enum, default_value_t = Backend::Dom, global = true)]
    backend: Backend,

    /// JSON file with reader and writer settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a file and write it back out
    Format {
        /// Input file
        input: PathBuf,

        /// Spaces per nesting level
        #[arg(long)]
        indent: Option<usize>,

        /// No indentation or line breaks
        #[arg(long)]
        compact: bool,

        /// Leave out the XML declaration
        #[arg(long)]
        omit_declaration: bool,

        /// Encoding named in the declaration
        #[arg(long)]
        encoding: Option<String>,
    },

    /// List elements matching a name and namespace
    Find {
        /// Input file
        input: PathBuf,

        /// Local name to match (default: any)
        #[arg(short, long)]
        name: Option<String>,

        /// Namespace URI to match; empty matches no namespace (default: any)
        #[arg(long)]
        ns: Option<String>,

        /// Print matches as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parse a file on every backend and compare the output
    Check {
        /// Input file
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "xmlhand=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Format {
            input,
            indent,
            compact,
            omit_declaration,
            encoding,
        } => {
            let mut writer = config.writer.clone();
            if compact {
                writer.indent = 0;
                writer.newline = String::new();
            }
            if let Some(indent) = indent {
                writer.indent = indent;
            }
            if omit_declaration {
                writer.omit_declaration = true;
            }
            if encoding.is_some() {
                writer.encoding = encoding;
            }
            let doc = load(cli.backend, &input, &config)?;
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            doc.write_with(&mut out, &writer)
                .context("Failed to write document")?;
            out.flush()?;
        }
        Commands::Find {
            input,
            name,
            ns,
            json,
        } => {
            let doc = load(cli.backend, &input, &config)?;
            let found = doc.find(name.as_deref(), ns.as_deref());
            tracing::info!(backend = %cli.backend, matches = found.len(), "search finished");
            if json {
                println!("{}", serde_json::to_string_pretty(&found)?);
            } else {
                for info in &found {
                    let ns = info.namespace_uri.as_deref().unwrap_or("");
                    println!("{}{}\t{{{}}}", "  ".repeat(info.depth), info.name, ns);
                }
            }
        }
        Commands::Check { input } => {
            let xml = read(&input)?;
            let report = unified::check(&xml, &config.parse, &config.writer)
                .with_context(|| format!("Failed to parse {}", input.display()))?;
            if !report.agree {
                for output in &report.outputs {
                    println!("== {} ==\n{}", output.backend, output.xml);
                }
                bail!("backends disagree on {}", input.display());
            }
            println!("{}: backends agree", input.display());
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let text = read(path)?;
    Config::from_json(&text).with_context(|| format!("Invalid config {}", path.display()))
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn load(backend: Backend, path: &Path, config: &Config) -> Result<AnyDocument> {
    let xml = read(path)?;
    AnyDocument::parse_with(backend, &xml, &config.parse)
        .with_context(|| format!("Failed to parse {} with the {} backend", path.display(), backend))
}
