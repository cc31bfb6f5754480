//! Richdoc CLI - render rich documents to plain text.

use clap::{Parser, Subcommand};
use richdoc::Version;
use richdoc::text::{Renderer, RendererConfig};
use serde_json::Value;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "richdoc")]
#[command(author, version, about = "Render rich documents to plain text", long_about = None)]
struct Cli {
    /// Log debug output to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a JSON document to text
    Render {
        /// Input file (use - for stdin)
        input: PathBuf,

        /// Output file (use - for stdout, or omit to use stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Template plugin file (.toml or .json)
        #[arg(short, long)]
        plugins: Option<PathBuf>,
    },

    /// List supported document versions
    Versions,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Render {
            input,
            output,
            plugins,
        } => {
            render(&input, output.as_deref(), plugins.as_deref())?;
        }
        Commands::Versions => {
            for version in Version::ALL {
                println!("{version}");
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn render(
    input: &Path,
    output: Option<&Path>,
    plugins: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = match plugins {
        Some(path) => load_plugins(path)?,
        None => RendererConfig::new(),
    };
    let renderer = Renderer::new(config)?;
    let input_text = read_input(input, io::stdin().lock())?;

    match output {
        Some(path) if path.as_os_str() != "-" => {
            let mut file = fs::File::create(path)?;
            render_to(&renderer, &input_text, &mut file, false)
        }
        _ => render_to(&renderer, &input_text, &mut io::stdout().lock(), true),
    }
}

/// Read the document text from `input`, or from `stdin` when it is `-`.
fn read_input(input: &Path, mut stdin: impl Read) -> io::Result<String> {
    if input.as_os_str() == "-" {
        let mut buf = String::new();
        stdin.read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        fs::read_to_string(input)
    }
}

/// Render `input_text` into `out`. Teardown runs once the text is flushed.
fn render_to(
    renderer: &Renderer,
    input_text: &str,
    out: &mut impl Write,
    trailing_newline: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let document: Value = serde_json::from_str(input_text)?;
    let mut rendered = renderer.render(&document)?;

    out.write_all(rendered.text.as_bytes())?;
    if trailing_newline {
        out.write_all(b"\n")?;
    }
    out.flush()?;

    debug!(callbacks = rendered.teardown.len(), "running teardown");
    rendered.teardown.run();
    Ok(())
}

/// Read a plugin file, choosing the decoder by extension.
fn load_plugins(path: &Path) -> Result<RendererConfig, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)?;
    let value = parse_plugins(&text, path.extension().and_then(|e| e.to_str()))?;
    Ok(RendererConfig::from_value(&value)?)
}

fn parse_plugins(text: &str, extension: Option<&str>) -> Result<Value, Box<dyn std::error::Error>> {
    match extension.map(str::to_lowercase).as_deref() {
        Some("toml") => Ok(toml::from_str(text)?),
        Some("json") => Ok(serde_json::from_str(text)?),
        _ => Err("Cannot determine plugin file format. Use a .toml or .json extension.".into()),
    }
}
