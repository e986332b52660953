//! CLI binary for img2latex.
//!
//! A thin shim over the library crate: `serve` maps flags and environment
//! variables onto `ServiceConfig` and runs the HTTP gateway; `convert` runs a
//! single image through the same pipeline and prints the LaTeX.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use img2latex::{
    serve, ContentType, LatexGenerator, OllamaLatexGenerator, ServiceConfig, ServiceConfigBuilder,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run the HTTP API on the default port (5050)
  img2latex serve

  # Use a different vision model and a remote Ollama
  img2latex serve --model llama3.2-vision --ollama-host http://gpu-box:11434

  # Convert one image without a server
  img2latex convert --type table scan.png

  # Call the running API
  curl -F file=@scan.png -F type=equation http://localhost:5050/api/generate

ENVIRONMENT VARIABLES:
  API_HOST              Interface to bind (default 0.0.0.0)
  API_PORT              Port to listen on (default 5050)
  OLLAMA_MODEL          Vision model (default llava:34b)
  OLLAMA_API_HOST       Ollama base URL (default http://localhost:11434)
  OLLAMA_TIMEOUT_SECS   Per-call inference timeout (default 120)
  UPLOAD_DIR            Root for the upload staging directory
  ALLOWED_EXTENSIONS    Comma-separated list (default png,jpg,jpeg)
  MAX_UPLOAD_MB         Largest accepted request body (default 16)
  RUST_LOG              Overrides the log filter
"#;

/// Convert images of tables, equations and text to LaTeX with a vision model.
#[derive(Parser, Debug)]
#[command(
    name = "img2latex",
    version,
    about = "Convert images of tables, equations and text to LaTeX with a vision model",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "IMG2LATEX_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "IMG2LATEX_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API.
    Serve(ServeArgs),
    /// Convert a single image and print the LaTeX to stdout.
    Convert(ConvertArgs),
}

/// Settings shared by both subcommands.
#[derive(Args, Debug)]
struct ModelArgs {
    /// Vision model identifier.
    #[arg(long, env = "OLLAMA_MODEL", default_value = img2latex::config::DEFAULT_MODEL)]
    model: String,

    /// Base URL of the Ollama-compatible inference endpoint.
    #[arg(long, env = "OLLAMA_API_HOST", default_value = img2latex::config::DEFAULT_OLLAMA_HOST)]
    ollama_host: String,

    /// Per-call inference timeout in seconds.
    #[arg(long, env = "OLLAMA_TIMEOUT_SECS", default_value_t = 120)]
    timeout: u64,
}

#[derive(Args, Debug)]
struct ServeArgs {
    #[command(flatten)]
    model: ModelArgs,

    /// Interface to bind.
    #[arg(long, env = "API_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on.
    #[arg(short, long, env = "API_PORT", default_value_t = 5050)]
    port: u16,

    /// Root directory for staged uploads (a `latex_generator_uploads`
    /// subdirectory is created inside). Defaults to the system temp dir.
    #[arg(long, env = "UPLOAD_DIR")]
    upload_dir: Option<PathBuf>,

    /// Comma-separated list of accepted file extensions.
    #[arg(long, env = "ALLOWED_EXTENSIONS", default_value = "png,jpg,jpeg")]
    allowed_extensions: String,

    /// Largest accepted request body, in megabytes.
    #[arg(long, env = "MAX_UPLOAD_MB", default_value_t = 16)]
    max_upload_mb: usize,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    #[command(flatten)]
    model: ModelArgs,

    /// What the image contains.
    #[arg(short = 't', long = "type", value_enum)]
    content_type: ContentTypeArg,

    /// Image file to convert.
    image: PathBuf,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ContentTypeArg {
    Table,
    Equation,
    Text,
}

impl From<ContentTypeArg> for ContentType {
    fn from(v: ContentTypeArg) -> Self {
        match v {
            ContentTypeArg::Table => ContentType::Table,
            ContentTypeArg::Equation => ContentType::Equation,
            ContentTypeArg::Text => ContentType::Text,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Serve(args) => run_serve(args).await,
        Command::Convert(args) => run_convert(args).await,
    }
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    let mut builder = model_builder(&args.model)
        .bind_host(args.host)
        .port(args.port)
        .allowed_extensions(&args.allowed_extensions)
        .max_upload_bytes(args.max_upload_mb.saturating_mul(1024 * 1024));
    if let Some(root) = args.upload_dir {
        builder = builder.upload_root(root);
    }
    let config = builder.build().context("Invalid configuration")?;

    let generator =
        OllamaLatexGenerator::new(&config).context("Failed to build inference client")?;

    serve(Arc::new(config), Arc::new(generator))
        .await
        .context("Server error")
}

async fn run_convert(args: ConvertArgs) -> Result<()> {
    let config = model_builder(&args.model)
        .build()
        .context("Invalid configuration")?;
    let generator =
        OllamaLatexGenerator::new(&config).context("Failed to build inference client")?;

    let latex = generator
        .generate(&args.image, args.content_type.into())
        .await
        .with_context(|| format!("Conversion of {:?} failed", args.image))?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(latex.as_bytes())
        .context("Failed to write to stdout")?;
    if !latex.ends_with('\n') {
        handle.write_all(b"\n").ok();
    }
    Ok(())
}

fn model_builder(args: &ModelArgs) -> ServiceConfigBuilder {
    ServiceConfig::builder()
        .model(args.model.clone())
        .ollama_host(args.ollama_host.clone())
        .request_timeout_secs(args.timeout)
}
