//! yagooglesearch CLI - polite paginated Google search from the command line.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use yagooglesearch::{SearchClient, SearchConfig, SessionOutcome, SessionStatus, Tbs, TimeRange};

/// yagooglesearch - Yet another Google search scraper
#[derive(Parser)]
#[command(name = "yagooglesearch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search Google and print the results
    Search(SearchArgs),

    /// Print a tbs token for time-restricted or verbatim searches
    Tbs(TbsArgs),
}

#[derive(Args)]
struct SearchArgs {
    /// Search query
    query: String,

    /// JSON file with SearchConfig fields; flags override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Top level domain (com, co.uk, ...)
    #[arg(long)]
    tld: Option<String>,

    /// Interface language (hl)
    #[arg(long)]
    lang_html_ui: Option<String>,

    /// Result language (lr), e.g. lang_de
    #[arg(long)]
    lang_result: Option<String>,

    /// Raw tbs token, see the `tbs` subcommand
    #[arg(long)]
    tbs: Option<String>,

    /// Safe search (off, active)
    #[arg(long)]
    safe: Option<String>,

    /// Offset of the first result
    #[arg(long)]
    start: Option<u32>,

    /// Results per page (at most 100)
    #[arg(short, long)]
    num: Option<u32>,

    /// Country restriction, e.g. countryCA
    #[arg(long)]
    country: Option<String>,

    /// Maximum number of URLs to return
    #[arg(short = 'm', long)]
    max_results: Option<usize>,

    /// Minimum delay between result pages, in seconds
    #[arg(long)]
    min_delay: Option<u64>,

    /// Maximum delay between result pages, in seconds
    #[arg(long)]
    max_delay: Option<u64>,

    /// Fixed User-Agent header
    #[arg(long)]
    user_agent: Option<String>,

    /// Extra GET parameter as key=value (repeatable)
    #[arg(long = "param", value_parser = parse_key_value)]
    params: Vec<(String, String)>,

    /// Proxy URL (e.g., http://127.0.0.1:8080 or socks5h://127.0.0.1:9050)
    #[arg(short, long)]
    proxy: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long)]
    insecure: bool,

    /// Stop on HTTP 429 instead of sleeping and retrying
    #[arg(long)]
    no_manage_429: bool,

    /// First cool-off after an HTTP 429, in minutes
    #[arg(long)]
    cool_off: Option<f64>,

    /// Growth factor for consecutive cool-offs
    #[arg(long)]
    cool_off_factor: Option<f64>,

    /// Give up after this many consecutive HTTP 429s
    #[arg(long)]
    max_429_retries: Option<u32>,

    /// GOOGLE_ABUSE_EXEMPTION cookie value
    #[arg(long)]
    exemption: Option<String>,

    /// Logging verbosity, 0 (silent) to 5 (debug)
    #[arg(short, long)]
    verbosity: Option<u8>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Args)]
struct TbsArgs {
    /// Relative window
    #[arg(long, conflicts_with_all = ["from", "to", "verbatim"])]
    past: Option<PastArg>,

    /// Start date (YYYY-MM-DD)
    #[arg(long, requires = "to")]
    from: Option<NaiveDate>,

    /// End date (YYYY-MM-DD)
    #[arg(long, requires = "from")]
    to: Option<NaiveDate>,

    /// Verbatim search
    #[arg(long, conflicts_with_all = ["from", "to"])]
    verbatim: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum PastArg {
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl From<PastArg> for TimeRange {
    fn from(arg: PastArg) -> Self {
        match arg {
            PastArg::Hour => TimeRange::Hour,
            PastArg::Day => TimeRange::Day,
            PastArg::Week => TimeRange::Week,
            PastArg::Month => TimeRange::Month,
            PastArg::Year => TimeRange::Year,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output
    Json,
    /// One URL per line
    Compact,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Search(args) => run_search(args).await,
        Commands::Tbs(args) => print_tbs(args),
    }
}

fn print_tbs(args: TbsArgs) -> Result<()> {
    let tbs = match (args.past, args.from, args.to) {
        (Some(past), _, _) => Tbs::Past(past.into()),
        (None, Some(from), Some(to)) => Tbs::Custom { from, to },
        _ if args.verbatim => Tbs::Verbatim,
        _ => Tbs::None,
    };
    println!("{}", tbs);
    Ok(())
}

async fn run_search(args: SearchArgs) -> Result<()> {
    let config = build_config(&args)?;
    init_logging(config.verbosity)?;

    let mut client = SearchClient::new(config)?;
    let outcome = client.search().await?;

    match args.format {
        OutputFormat::Text => print_text(&args.query, &outcome),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
        OutputFormat::Compact => {
            for url in outcome.urls() {
                println!("{}", url);
            }
        }
    }

    match outcome.status {
        SessionStatus::Completed => {}
        SessionStatus::ThrottledUnhandled => eprintln!("Stopped: Google returned HTTP 429"),
        SessionStatus::Aborted => eprintln!("Stopped early, results are partial"),
    }
    Ok(())
}

fn print_text(query: &str, outcome: &SessionOutcome) {
    println!("\nSearch results for \"{}\" ({} results):\n", query, outcome.len());

    for result in &outcome.results {
        println!("{}. {}", result.rank, result.title);
        println!("   URL: {}", result.url);
        if !result.description.is_empty() {
            let description = if result.description.chars().count() > 150 {
                format!("{}...", result.description.chars().take(150).collect::<String>())
            } else {
                result.description.clone()
            };
            println!("   {}", description);
        }
        println!();
    }
}

fn build_config(args: &SearchArgs) -> Result<SearchConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str::<SearchConfig>(&raw)
                .with_context(|| format!("Invalid config file {}", path.display()))?
        }
        None => SearchConfig::new(""),
    };
    config.query = args.query.clone();

    if let Some(tld) = &args.tld {
        config.tld = tld.clone();
    }
    if let Some(lang) = &args.lang_html_ui {
        config.lang_html_ui = lang.clone();
    }
    if let Some(lang) = &args.lang_result {
        config.lang_result = lang.clone();
    }
    if let Some(tbs) = &args.tbs {
        config.tbs = tbs.clone();
    }
    if let Some(safe) = &args.safe {
        config.safe = safe.clone();
    }
    if let Some(start) = args.start {
        config.start = start;
    }
    if let Some(num) = args.num {
        config.num = num;
    }
    if let Some(country) = &args.country {
        config.country = country.clone();
    }
    if let Some(max) = args.max_results {
        config.max_search_result_urls_to_return = max;
    }
    if let Some(min) = args.min_delay {
        config.minimum_delay_between_paged_results_in_seconds = min;
        // Keep the default ten second spread when only the minimum is given.
        if args.max_delay.is_none() {
            config.maximum_delay_between_paged_results_in_seconds = min + 10;
        }
    }
    if let Some(max) = args.max_delay {
        config.maximum_delay_between_paged_results_in_seconds = max;
    }
    if let Some(user_agent) = &args.user_agent {
        config.user_agent = Some(user_agent.clone());
    }
    for (key, value) in &args.params {
        config.extra_params.insert(key.clone(), value.clone());
    }
    if let Some(proxy) = &args.proxy {
        config.proxy = Some(proxy.clone());
    }
    if args.insecure {
        config.verify_ssl = false;
    }
    if args.no_manage_429 {
        config.yagooglesearch_manages_http_429s = false;
    }
    if let Some(minutes) = args.cool_off {
        config.http_429_cool_off_time_in_minutes = minutes;
    }
    if let Some(factor) = args.cool_off_factor {
        config.http_429_cool_off_factor = factor;
    }
    if let Some(retries) = args.max_429_retries {
        config.max_http_429_retries = Some(retries);
    }
    if let Some(exemption) = &args.exemption {
        config.google_exemption = Some(exemption.clone());
    }
    if let Some(verbosity) = args.verbosity {
        config.verbosity = verbosity;
    }
    if matches!(args.format, OutputFormat::Text) {
        config.verbose_output = true;
    }

    Ok(config)
}

fn parse_key_value(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}

fn level_for(verbosity: u8) -> Option<Level> {
    match verbosity {
        0 | 1 => None,
        2 => Some(Level::ERROR),
        3 => Some(Level::WARN),
        4 => Some(Level::INFO),
        _ => Some(Level::DEBUG),
    }
}

fn init_logging(verbosity: u8) -> Result<()> {
    let Some(level) = level_for(verbosity) else {
        return Ok(());
    };

    // RUST_LOG wins over --verbosity when set.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("yagooglesearch={}", level)));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for() {
        assert_eq!(level_for(5), Some(Level::DEBUG));
        assert_eq!(level_for(4), Some(Level::INFO));
        assert_eq!(level_for(3), Some(Level::WARN));
        assert_eq!(level_for(2), Some(Level::ERROR));
        assert_eq!(level_for(1), None);
        assert_eq!(level_for(0), None);
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(parse_key_value("as_qdr=d"), Ok(("as_qdr".into(), "d".into())));
        assert!(parse_key_value("nope").is_err());
    }

    #[test]
    fn test_build_config_from_flags() {
        let cli = Cli::parse_from([
            "yagooglesearch",
            "search",
            "rust lang",
            "--num",
            "20",
            "--min-delay",
            "2",
            "--param",
            "as_sitesearch=docs.rs",
            "--no-manage-429",
            "--format",
            "compact",
        ]);
        let Commands::Search(args) = cli.command else {
            panic!("expected search command");
        };
        let config = build_config(&args).unwrap();
        assert_eq!(config.query, "rust lang");
        assert_eq!(config.num, 20);
        assert_eq!(config.delay_range(), 2..=12);
        assert_eq!(config.extra_params.get("as_sitesearch").map(String::as_str), Some("docs.rs"));
        assert!(!config.yagooglesearch_manages_http_429s);
        assert!(!config.verbose_output);
    }

    #[test]
    fn test_tbs_args() {
        let cli = Cli::parse_from(["yagooglesearch", "tbs", "--from", "2024-01-01", "--to", "2024-02-15"]);
        let Commands::Tbs(args) = cli.command else {
            panic!("expected tbs command");
        };
        assert!(print_tbs(args).is_ok());
    }
}
