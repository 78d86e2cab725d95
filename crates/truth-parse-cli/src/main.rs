use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use truth_parse::{DateTime, ParseOptions, Timezone};

#[derive(Parser, Debug)]
#[command(
    name = "tparse",
    version,
    about = "Parse temporal text into a date, time, datetime, duration or interval"
)]
struct Cli {
    /// Text to parse, e.g. "2021-05-03T10:00:00Z", "P1Y2M", "2021-01-01/P1M" or "now"
    text: String,

    /// Timezone for input without an offset (IANA name or ±HH:MM)
    #[arg(long, default_value = "UTC")]
    tz: String,

    /// RFC 3339 instant to use for "now" instead of the system clock
    #[arg(long)]
    now: Option<String>,

    /// Keep bare dates and times as dates and times
    #[arg(long)]
    exact: bool,

    /// Fall back to common non-ISO formats
    #[arg(long)]
    lenient: bool,

    /// Read NN/NN/YYYY as day/month/year (with --lenient)
    #[arg(long)]
    day_first: bool,

    /// Print JSON instead of the ISO rendering
    #[arg(long)]
    json: bool,

    /// Log to stderr (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let options = build_options(&cli)?;
    tracing::debug!(
        tz = %options.tz,
        now_override = options.now.is_some(),
        exact = options.exact,
        strict = options.strict,
        day_first = options.day_first,
        "options built from flags"
    );
    let value = truth_parse::parse(&cli.text, &options)
        .with_context(|| format!("failed to parse '{}'", cli.text))?;

    if cli.json {
        let json = serde_json::to_string_pretty(&value).context("failed to serialize result")?;
        println!("{json}");
    } else {
        println!("{value}");
    }
    Ok(())
}

fn build_options(cli: &Cli) -> Result<ParseOptions> {
    let tz: Timezone = cli
        .tz
        .parse()
        .with_context(|| format!("invalid --tz '{}'", cli.tz))?;

    let mut options = ParseOptions::default()
        .with_tz(tz)
        .with_exact(cli.exact)
        .with_strict(!cli.lenient)
        .with_day_first(cli.day_first);

    if let Some(now) = &cli.now {
        let instant = chrono::DateTime::parse_from_rfc3339(now)
            .with_context(|| format!("invalid --now '{now}', expected RFC 3339"))?;
        options = options.with_now(DateTime::from_instant(instant.to_utc(), tz));
    }
    Ok(options)
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
