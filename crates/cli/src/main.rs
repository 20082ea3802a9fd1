use std::fs;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, bail};
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use noteify_core::store::DEFAULT_IDENTITY;
use noteify_core::{
    FetchConfig, NoteConfig, NoteDocument, NoteOrigin, NotePipeline, NoteStore, OutputFormat, ProviderConfig,
    QuotaLedger, QuotaService, fetch_file, fetch_stdin,
};
use owo_colors::OwoColorize;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use url::Url;

mod echo;

use echo::{format_size, print_banner, print_detail, print_info, print_step, print_success, print_warning};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable consulted when `--api-key` is not given
const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// File under the data directory holding per-identity usage
const QUOTA_FILE: &str = "quota.json";

/// Output format for the finished note
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Format(OutputFormat);

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "html" => Ok(Self(OutputFormat::Html)),
            "markdown" | "md" => Ok(Self(OutputFormat::Markdown)),
            "text" | "txt" => Ok(Self(OutputFormat::PlainText)),
            "json" => Ok(Self(OutputFormat::Json)),
            "narration" | "speech" => Ok(Self(OutputFormat::Narration)),
            _ => Err(format!(
                "Invalid format: {}. Valid options: html, markdown, text, json, narration",
                s
            )),
        }
    }
}

/// Turn web pages into structured, AI-rewritten notes
#[derive(Parser, Debug)]
#[command(name = "noteify")]
#[command(version)]
#[command(about = "Turn web pages into structured notes", long_about = None)]
struct Args {
    /// URL to fetch, local HTML file, or "-" for stdin
    #[arg(value_name = "INPUT", required_unless_present = "completions")]
    input: Option<String>,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output format (html, markdown, text, json, narration)
    #[arg(short, long, default_value = "html", value_name = "FORMAT")]
    format: Format,

    /// Revise the generated notes with a free-text instruction
    #[arg(long, value_name = "INSTRUCTION")]
    customize: Option<String>,

    /// Rewrite provider API key (default: $GEMINI_API_KEY)
    #[arg(long, value_name = "KEY")]
    api_key: Option<String>,

    /// Rewrite provider model
    #[arg(long, value_name = "MODEL")]
    model: Option<String>,

    /// Rewrite provider base URL
    #[arg(long, value_name = "URL", hide = true)]
    provider_url: Option<String>,

    /// HTTP timeout in seconds, for both retrieval and rewriting
    #[arg(long, default_value = "30", value_name = "SECS")]
    timeout: u64,

    /// Custom User-Agent for HTTP requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Minimum characters a content container must exceed to be selected
    #[arg(long, default_value = "500", value_name = "NUM")]
    min_content_chars: usize,

    /// Identity whose extraction allowance is checked and recorded
    #[arg(long, value_name = "ID")]
    identity: Option<String>,

    /// Mark the identity as premium (unlimited extractions)
    #[arg(long, requires = "identity")]
    premium: bool,

    /// Save the note to the data directory
    #[arg(long)]
    save: bool,

    /// Data directory for saved notes and quota state
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Generate shell completion script
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// Where the page markup comes from
enum Input {
    Stdin,
    Url(Url),
    File(String),
}

impl Input {
    fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            return Input::Stdin;
        }
        match Url::parse(arg) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Input::Url(url),
            _ => Input::File(arg.to_string()),
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn resolve_api_key(flag: Option<String>) -> Option<String> {
    flag.or_else(|| std::env::var(API_KEY_ENV).ok()).map(|k| k.trim().to_string()).filter(|k| !k.is_empty())
}

fn resolve_data_dir(flag: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    flag.or_else(NoteStore::default_data_dir)
        .context("Could not determine a data directory; pass --data-dir")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if let Some(shell) = args.completions {
        clap_complete::generate(shell, &mut Args::command(), "noteify", &mut io::stdout());
        return Ok(());
    }

    init_tracing(args.verbose);

    let Some(input) = args.input.as_deref() else {
        bail!("No input given");
    };

    if args.verbose {
        print_banner();
        print_info("Debug logging enabled");
        eprintln!();
    }

    let api_key = resolve_api_key(args.api_key.clone());
    let needs_data_dir = args.save || args.identity.is_some();
    let data_dir = if needs_data_dir { Some(resolve_data_dir(args.data_dir.clone())?) } else { None };

    let ledger = match (&args.identity, &data_dir) {
        (Some(identity), Some(dir)) => {
            let ledger = QuotaLedger::open(dir.join(QUOTA_FILE))
                .with_context(|| format!("Failed to open quota ledger in {}", dir.display()))?;
            if args.premium {
                ledger.set_premium(identity, true).context("Failed to update quota ledger")?;
            }
            ledger.ensure_can_extract(identity)?;
            debug!(identity = %identity, remaining = ?ledger.account(identity).remaining(), "quota checked");
            Some(ledger)
        }
        _ => None,
    };

    let provider = ProviderConfig {
        base_url: args.provider_url.clone().unwrap_or_else(|| ProviderConfig::default().base_url),
        model: args.model.clone().unwrap_or_else(|| ProviderConfig::default().model),
        timeout: args.timeout,
    };
    let fetch = FetchConfig {
        timeout: args.timeout,
        user_agent: args.user_agent.clone().unwrap_or_else(|| FetchConfig::default().user_agent),
    };
    let config = NoteConfig::builder().min_content_chars(args.min_content_chars).build();
    let pipeline = NotePipeline::new(config, fetch, provider).context("Failed to set up extraction pipeline")?;

    let total = if args.customize.is_some() { 3 } else { 2 };

    let mut note = match Input::from_arg(input) {
        Input::Url(url) => {
            if args.verbose {
                print_step(1, total, &format!("Fetching {}", url.as_str().bright_white().underline()));
            }
            pipeline.extract(url.as_str(), api_key.as_deref()).await.context("Failed to fetch URL")?
        }
        Input::Stdin => {
            if args.verbose {
                print_step(1, total, "Reading from stdin");
            }
            let html = fetch_stdin().context("Failed to read from stdin")?;
            if args.verbose {
                print_detail("Size", &format_size(html.len()));
            }
            pipeline.extract_html(&html, "stdin", api_key.as_deref()).await
        }
        Input::File(path) => {
            if args.verbose {
                print_step(1, total, &format!("Reading from file {}", path.bright_white()));
            }
            let html = fetch_file(&path).with_context(|| format!("Failed to read file: {}", path))?;
            if args.verbose {
                print_detail("Size", &format_size(html.len()));
            }
            pipeline.extract_html(&html, &path, api_key.as_deref()).await
        }
    };

    if args.verbose {
        print_step(2, total, "Building notes");
        print_detail("Title", &note.title);
        print_detail("Origin", note.origin.as_str());
        print_detail("Words", &note.word_count.to_string());
    }
    report_origin(&note);

    if let Some(instruction) = args.customize.as_deref() {
        if args.verbose {
            print_step(3, total, "Customizing notes");
        }
        let Some(key) = api_key.as_deref() else {
            bail!("--customize needs an API key (--api-key or ${})", API_KEY_ENV);
        };
        note = pipeline.customize(&note, instruction, key).await.context("Failed to customize notes")?;
    }

    if let (Some(ledger), Some(identity)) = (&ledger, &args.identity) {
        ledger.record_extraction(identity).context("Failed to record extraction")?;
        if args.verbose
            && let Some(remaining) = ledger.account(identity).remaining()
        {
            print_detail("Extractions left", &remaining.to_string());
        }
    }

    if args.save
        && let Some(dir) = &data_dir
    {
        let identity = args.identity.as_deref().unwrap_or(DEFAULT_IDENTITY);
        let saved = NoteStore::new(dir).save(identity, &note).context("Failed to save note")?;
        print_success(&format!("Saved note to {}", saved.path.display().bright_white()));
    }

    let output = note.to_format(args.format.0).context("Failed to render note")?;

    match args.output {
        Some(path) => {
            fs::write(&path, output).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None => {
            println!("{}", output);
        }
    }

    Ok(())
}

fn report_origin(note: &NoteDocument) {
    match note.origin {
        NoteOrigin::Unconfigured => {
            print_warning(&format!("No API key configured; showing extracted content (set ${})", API_KEY_ENV))
        }
        NoteOrigin::Fallback => print_warning("Rewrite provider failed; showing extracted content instead"),
        NoteOrigin::Generated | NoteOrigin::Revised => {}
    }
}
