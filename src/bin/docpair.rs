//! CLI binary for edgequake-docpair.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `PipelineConfig` / `MailConfig`, runs one comparison and prints the
//! result view.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_docpair::compare::write_atomic;
use edgequake_docpair::{
    load_document, write_record, DocumentPair, MailConfig, MailSecurity, Notifier, Pipeline,
    PipelineConfig, PipelineProgressCallback, ProgressCallback, RunRecord, RunState,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner showing the current run state plus
/// one log line per collaborator call.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

/// Truncate long collaborator errors to keep output tidy.
fn shorten(error: &str) -> String {
    if error.chars().count() > 80 {
        let head: String = error.chars().take(79).collect();
        format!("{head}\u{2026}")
    } else {
        error.to_string()
    }
}

impl PipelineProgressCallback for CliProgressCallback {
    fn on_run_start(&self, filenames: [&str; 2]) {
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Comparing {} vs {}…", filenames[0], filenames[1]))
        ));
    }

    fn on_state_change(&self, state: RunState) {
        self.bar.set_prefix("Running");
        self.bar.set_message(state.to_string());
    }

    fn on_extraction_complete(&self, index: usize, filename: &str, text_len: usize) {
        self.bar.println(format!(
            "  {} Document {}  {:<24}  {}",
            green("✓"),
            index + 1,
            filename,
            dim(&format!("{text_len:>6} chars")),
        ));
    }

    fn on_extraction_error(&self, index: usize, filename: &str, error: &str) {
        self.bar.println(format!(
            "  {} Document {}  {:<24}  {}",
            red("✗"),
            index + 1,
            filename,
            red(&shorten(error)),
        ));
    }

    fn on_analysis_complete(&self, narrative_len: usize) {
        self.bar.println(format!(
            "  {} Analysis    {}",
            green("✓"),
            dim(&format!("{narrative_len:>6} chars")),
        ));
    }

    fn on_analysis_error(&self, error: &str) {
        self.bar
            .println(format!("  {} Analysis    {}", red("✗"), red(&shorten(error))));
    }

    fn on_run_complete(&self, failed_extractions: usize, analysis_ok: bool) {
        self.bar.finish_and_clear();
        if failed_extractions == 0 && analysis_ok {
            eprintln!("{} comparison complete", green("✔"));
        } else {
            eprintln!(
                "{} comparison complete with {} failed step(s)",
                cyan("⚠"),
                red(&(failed_extractions + usize::from(!analysis_ok)).to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Compare two invoices, print the result view
  docpair client.pdf policy.pdf \
      --ocr-url https://ocr.example.com/upload-pdf/ \
      --analysis-url https://n8n.example.com/webhook/compare

  # Endpoints from the environment, JSON record to a file
  export DOCPAIR_OCR_URL=https://ocr.example.com/upload-pdf/
  export DOCPAIR_ANALYSIS_URL=https://n8n.example.com/webhook/compare
  docpair client.pdf policy.pdf --json -o record.json

  # Inputs can be URLs
  docpair https://example.com/PO.pdf https://example.com/Conf.pdf

  # Mail the summary afterwards
  DOCPAIR_SMTP_USER=bot@example.com DOCPAIR_SMTP_PASSWORD=... \
  docpair client.pdf policy.pdf --email-to ops@example.com

ENVIRONMENT VARIABLES:
  DOCPAIR_OCR_URL         OCR endpoint (multipart field "file")
  DOCPAIR_ANALYSIS_URL    Analysis webhook ({"documents": [...]})
  DOCPAIR_EMAIL_TO        Summary recipient
  DOCPAIR_SMTP_USER       SMTP login (also the sender unless --smtp-sender)
  DOCPAIR_SMTP_PASSWORD   SMTP password / app password
  RUST_LOG                Override log filter (e.g. edgequake_docpair=debug)
"#;

/// Compare two PDF documents via a remote OCR service and an analysis webhook.
#[derive(Parser, Debug)]
#[command(
    name = "docpair",
    version,
    about = "Compare two PDF documents via a remote OCR service and an analysis webhook",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// The two documents: local PDF paths or HTTP/HTTPS URLs, in order.
    #[arg(required = true, value_name = "DOCUMENT")]
    inputs: Vec<String>,

    /// OCR service endpoint.
    #[arg(long, env = "DOCPAIR_OCR_URL")]
    ocr_url: String,

    /// Analysis webhook endpoint.
    #[arg(long, env = "DOCPAIR_ANALYSIS_URL")]
    analysis_url: String,

    /// Per-document OCR timeout in seconds.
    #[arg(long, env = "DOCPAIR_OCR_TIMEOUT", default_value_t = 60)]
    ocr_timeout: u64,

    /// Analysis call timeout in seconds.
    #[arg(long, env = "DOCPAIR_ANALYSIS_TIMEOUT", default_value_t = 60)]
    analysis_timeout: u64,

    /// HTTP download timeout for URL inputs in seconds.
    #[arg(long, env = "DOCPAIR_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Send both documents to the OCR service at the same time.
    #[arg(long, env = "DOCPAIR_CONCURRENT")]
    concurrent: bool,

    /// Write the result to this file instead of stdout.
    #[arg(short, long, env = "DOCPAIR_OUTPUT")]
    output: Option<PathBuf>,

    /// Output the RunRecord as JSON instead of the Markdown view.
    #[arg(long, env = "DOCPAIR_JSON")]
    json: bool,

    /// Mail a summary to this address once the run is complete.
    #[arg(long, env = "DOCPAIR_EMAIL_TO")]
    email_to: Option<String>,

    /// SMTP relay host.
    #[arg(long, env = "DOCPAIR_SMTP_RELAY", default_value = "smtp.gmail.com")]
    smtp_relay: String,

    /// SMTP relay port.
    #[arg(long, env = "DOCPAIR_SMTP_PORT", default_value_t = 587)]
    smtp_port: u16,

    /// Use implicit TLS (port 465 style) instead of STARTTLS.
    #[arg(long, env = "DOCPAIR_SMTP_IMPLICIT_TLS")]
    smtp_implicit_tls: bool,

    /// SMTP login user.
    #[arg(long, env = "DOCPAIR_SMTP_USER")]
    smtp_user: Option<String>,

    /// SMTP login password.
    #[arg(long, env = "DOCPAIR_SMTP_PASSWORD", hide_env_values = true)]
    smtp_password: Option<String>,

    /// `From:` address, if different from the SMTP user.
    #[arg(long, env = "DOCPAIR_SMTP_SENDER")]
    smtp_sender: Option<String>,

    /// Disable the progress spinner.
    #[arg(long, env = "DOCPAIR_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCPAIR_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCPAIR_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner already reports every step; keep library logs quiet
    // while it is shown.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
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

    // Reject a wrong count before any input is downloaded or read.
    DocumentPair::check_count(cli.inputs.len()).context("Cannot start processing")?;

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn PipelineProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;
    let pipeline = Pipeline::new(&config).context("Failed to set up collaborator clients")?;

    // ── Load documents ───────────────────────────────────────────────────
    let mut documents = Vec::with_capacity(cli.inputs.len());
    for input in &cli.inputs {
        let doc = load_document(input, config.download_timeout_secs)
            .await
            .with_context(|| format!("Failed to load '{input}'"))?;
        documents.push(doc);
    }

    // ── Run ──────────────────────────────────────────────────────────────
    let record = pipeline.run(documents).await.context("Cannot start processing")?;

    // ── Output ───────────────────────────────────────────────────────────
    emit(&cli, &record).await?;

    // ── Optional summary mail ────────────────────────────────────────────
    if let Some(ref destination) = cli.email_to {
        if let Err(e) = send_summary(&cli, &record, destination).await {
            eprintln!("{} summary email not sent: {:#}", cyan("⚠"), e);
        } else if !cli.quiet {
            eprintln!("{} summary sent to {}", green("✔"), bold(destination));
        }
    }

    if !cli.quiet && !show_progress {
        eprintln!(
            "Compared {} documents in {}ms ({} extraction failure(s), analysis {})",
            record.ocr_results.len(),
            record.stats.total_duration_ms,
            record.stats.failed_extractions,
            if record.analysis.is_success() { "ok" } else { "failed" },
        );
    }

    Ok(())
}

/// Map CLI args to `PipelineConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<PipelineConfig> {
    let mut builder = PipelineConfig::builder()
        .ocr_url(cli.ocr_url.clone())
        .analysis_url(cli.analysis_url.clone())
        .ocr_timeout_secs(cli.ocr_timeout)
        .analysis_timeout_secs(cli.analysis_timeout)
        .download_timeout_secs(cli.download_timeout)
        .concurrent_extraction(cli.concurrent);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Write the record (Markdown view or JSON) to the output file or stdout.
async fn emit(cli: &Cli, record: &RunRecord) -> Result<()> {
    match (&cli.output, cli.json) {
        (Some(path), true) => {
            write_record(record, path)
                .await
                .context("Failed to write output")?;
        }
        (Some(path), false) => {
            write_atomic(path, record.render_markdown().as_bytes())
                .await
                .context("Failed to write output")?;
        }
        (None, true) => {
            let json = serde_json::to_string_pretty(record).context("Failed to serialise record")?;
            println!("{json}");
        }
        (None, false) => {
            let view = record.render_markdown();
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(view.as_bytes())
                .context("Failed to write to stdout")?;
        }
    }

    if let (Some(path), false) = (&cli.output, cli.quiet) {
        eprintln!("{}  →  {}", green("✔"), bold(&path.display().to_string()));
    }
    Ok(())
}

async fn send_summary(cli: &Cli, record: &RunRecord, destination: &str) -> Result<()> {
    let user = cli
        .smtp_user
        .clone()
        .context("--smtp-user (or DOCPAIR_SMTP_USER) is required to send email")?;
    let password = cli
        .smtp_password
        .clone()
        .context("--smtp-password (or DOCPAIR_SMTP_PASSWORD) is required to send email")?;

    let mut mail = MailConfig::new(user, password)
        .with_relay(cli.smtp_relay.clone(), cli.smtp_port)
        .with_security(if cli.smtp_implicit_tls {
            MailSecurity::Implicit
        } else {
            MailSecurity::StartTls
        });
    if let Some(ref sender) = cli.smtp_sender {
        mail = mail.with_sender(sender.clone());
    }

    let notifier = Notifier::smtp(mail)?;
    notifier.dispatch(record, destination).await?;
    Ok(())
}
