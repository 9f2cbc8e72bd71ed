//! Timeline digest CLI - mails new timeline posts once per run.

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use timeline_digest::cursor::{CursorStore, FileCursorStore, MemoryCursorStore};
use timeline_digest::digest::{
    build_digest, error_digest, timeline_records, DigestEmail, MailDispatcher, SmtpMailer,
};
use timeline_digest::error::DispatchError;
use timeline_digest::pipeline::{Pipeline, RunReport};
use timeline_digest::server::{run_server, AppState};
use timeline_digest::twitter::TwitterClient;
use timeline_digest::DigestConfig;

/// Timeline digest - fetch new posts, render them, mail them.
#[derive(Parser)]
#[command(name = "timeline-digest")]
#[command(about = "Email digest of new Twitter timeline posts")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a single digest cycle (for CronJob use)
    Run {
        /// Print the digest instead of mailing it; the cursor is not advanced
        #[arg(long)]
        dry_run: bool,
    },

    /// Serve the secret-gated HTTP trigger
    Serve {
        /// Listen port (defaults to PORT or 8080)
        #[arg(long)]
        port: Option<u16>,

        /// Bind address
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
    },

    /// Render a saved timeline response to HTML
    Preview {
        /// JSON file holding an array of timeline records
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("timeline_digest=debug,info")
    } else {
        EnvFilter::new("timeline_digest=info,warn")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Run { dry_run } => run_once(dry_run).await,
        Commands::Serve { port, host } => serve(port, &host).await,
        Commands::Preview { input } => preview(&input),
    }
}

/// Prints the digest instead of sending it.
struct StdoutMailer;

#[async_trait]
impl MailDispatcher for StdoutMailer {
    async fn send(&self, email: &DigestEmail) -> Result<(), DispatchError> {
        println!("Subject: {}\nTo: {}\n\n{}", email.subject, email.to, email.html);
        Ok(())
    }
}

fn build_pipeline(
    config: &DigestConfig,
    mailer: Arc<dyn MailDispatcher>,
    cursor: Arc<dyn CursorStore>,
) -> Result<Pipeline> {
    let source = TwitterClient::new(&config.timeline_url, config.twitter.clone())
        .context("Failed to create timeline client")?;

    Ok(Pipeline::new(
        Arc::new(source),
        mailer,
        cursor,
        &config.to_address,
        &config.from_address,
    ))
}

fn smtp_pipeline(config: &DigestConfig) -> Result<Pipeline> {
    let mailer = SmtpMailer::new(&config.smtp).context("Failed to create SMTP transport")?;
    build_pipeline(
        config,
        Arc::new(mailer),
        Arc::new(FileCursorStore::new(&config.cursor_path)),
    )
}

async fn run_once(dry_run: bool) -> Result<()> {
    let config = DigestConfig::from_env()?;
    tracing::info!(
        cursor_path = %config.cursor_path.display(),
        dry_run,
        "Starting digest run"
    );

    let pipeline = if dry_run {
        // in-memory copy so the cursor file is never written
        let current = FileCursorStore::new(&config.cursor_path)
            .read_cursor()
            .await
            .context("Failed to read cursor")?;
        build_pipeline(
            &config,
            Arc::new(StdoutMailer),
            Arc::new(MemoryCursorStore::new(current)),
        )?
    } else {
        smtp_pipeline(&config)?
    };

    let report = pipeline.run_once().await?;
    print_summary(&report);
    Ok(())
}

fn print_summary(report: &RunReport) {
    println!("\n{}", "Digest Run Summary".bold());
    println!("   Status: {}", report.status.to_string().green());
    println!("   Posts:  {}", report.posts);
    println!(
        "   Cursor: {}",
        report.cursor.as_deref().unwrap_or("(none)")
    );
    println!("   {}", report.detail.dimmed());
}

async fn serve(port: Option<u16>, host: &str) -> Result<()> {
    let config = DigestConfig::from_env()?;
    let secret = config
        .secret
        .clone()
        .context("SECRET environment variable not set")?;

    let pipeline = smtp_pipeline(&config)?;
    tracing::info!(cursor_path = %config.cursor_path.display(), "Trigger server configured");

    let addr = format!("{host}:{}", port.unwrap_or(config.port));
    run_server(AppState::new(pipeline, secret), &addr)
        .await
        .context("Trigger server failed")
}

fn preview(input: &Path) -> Result<()> {
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let body: serde_json::Value =
        serde_json::from_str(&content).context("Input is not valid JSON")?;

    let html = match timeline_records(&body) {
        Ok(records) => build_digest(records),
        Err(e) => error_digest(&e),
    };
    println!("{html}");
    Ok(())
}
