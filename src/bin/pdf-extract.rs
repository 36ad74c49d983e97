//! CLI binary for edgequake-pdf-extract.
//!
//! `pdf-extract serve` runs the HTTP service; `pdf-extract extract` runs
//! the same extraction (and optional pattern cleaning) on a local file.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use edgequake_pdf_extract::{convert, server, PdfiumExtractor, ServerConfig};
use std::io;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"ENVIRONMENT:
  GEMINI_API_KEY, GROQ_API_KEY, SAMBANOVA_API_KEY
      Server-side credentials for /extract-with-ai. A request's api_key
      field overrides them for that request only.
  PDFIUM_LIB_PATH
      pdfium shared library, or the directory holding it.
  RUST_LOG
      Log filter; overrides --verbose / --quiet.

  Variables may also be placed in a .env file in the working directory.

EXAMPLES:
  pdf-extract serve --port 8000
  pdf-extract extract report.pdf --clean -o report.md
  pdf-extract extract report.pdf --json | jq .page_count
"#;

/// Extract text from PDFs and clean it with pattern rules or an LLM.
#[derive(Parser, Debug)]
#[command(
    name = "pdf-extract",
    version,
    about = "Extract text from PDFs and clean it with pattern rules or an LLM",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// pdfium shared library file, or the directory holding it.
    #[arg(long, global = true, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Debug-level logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Errors only.
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service.
    Serve(ServeArgs),
    /// Extract one local PDF and print the text.
    Extract(ExtractArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to bind.
    #[arg(long, env = "HOST")]
    host: Option<IpAddr>,

    /// Port to bind.
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Seconds to wait for an AI provider before returning the raw text.
    #[arg(long, env = "AI_TIMEOUT_SECS")]
    ai_timeout: Option<u64>,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// PDF file to extract.
    input: PathBuf,

    /// Run the pattern cleaner over the extracted text.
    #[arg(long)]
    clean: bool,

    /// Print `{"markdown": …, "page_count": …}` instead of plain text.
    #[arg(long)]
    json: bool,

    /// Write the result to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is the normal case.
    let _ = dotenvy::dotenv();
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
        Command::Serve(ref args) => run_serve(&cli, args).await,
        Command::Extract(ref args) => run_extract(&cli, args).await,
    }
}

async fn run_serve(cli: &Cli, args: &ServeArgs) -> Result<()> {
    let mut config = ServerConfig::from_env().context("Invalid environment configuration")?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(secs) = args.ai_timeout {
        anyhow::ensure!(secs > 0, "--ai-timeout must be at least 1 second");
        config.ai_timeout_secs = secs;
    }
    if let Some(ref path) = cli.pdfium_lib {
        config.pdfium_library_path = Some(path.clone());
    }
    tracing::debug!("{:?}", config);

    server::serve(config).await.context("Server failed")
}

async fn run_extract(cli: &Cli, args: &ExtractArgs) -> Result<()> {
    let start = Instant::now();
    let extractor = Arc::new(PdfiumExtractor::new(cli.pdfium_lib.clone()));

    let mut result = convert::extract_file(extractor, &args.input)
        .await
        .with_context(|| format!("Extraction failed for {}", args.input.display()))?;
    if args.clean {
        result.markdown = convert::clean(&result.markdown);
    }

    let rendered = if args.json {
        serde_json::to_string_pretty(&result).context("Failed to serialise result")?
    } else {
        result.markdown.clone()
    };

    match args.output {
        Some(ref path) => {
            write_atomic(path, &rendered).await?;
            if !cli.quiet {
                eprintln!(
                    "{}  {} pages  {} chars  {}ms  →  {}",
                    green("✔"),
                    result.page_count,
                    dim(&result.markdown.chars().count().to_string()),
                    start.elapsed().as_millis(),
                    bold(&path.display().to_string()),
                );
            }
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

/// Write to a temp file, then rename, so readers never see partial output.
async fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, contents)
        .await
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
