use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use mysqldiff::api::{compare, CompareOptions};
use mysqldiff::diff::Equivalences;
use mysqldiff::filter::ObjectType;
use mysqldiff::mysql::introspect::DEFAULT_RESERVED_PREFIX;
use mysqldiff::mysql::ConnectionConfig;
use mysqldiff::report::{render_json, render_text, RenderOptions};

const EXIT_IDENTICAL: u8 = 0;
const EXIT_DIFFERENT: u8 = 1;
const EXIT_ERROR: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Compare the structure of a target MySQL database against a base database.
///
/// Exits with 0 when the schemas match, 1 when differences were found and 2
/// on errors.
#[derive(Parser)]
#[command(name = "mysqldiff")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Base (reference) database: mysql://[user[:password]@]host[:port]/database
    #[arg(env = "MYSQLDIFF_BASE")]
    base: String,

    /// Target database, same format as BASE
    #[arg(env = "MYSQLDIFF_TARGET")]
    target: String,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Only compare tables matching this glob (repeatable)
    #[arg(long)]
    include: Vec<String>,

    /// Skip tables matching this glob (repeatable)
    #[arg(long)]
    exclude: Vec<String>,

    /// Restrict the comparison to `tables` or `views` (repeatable)
    #[arg(long)]
    only: Vec<ObjectType>,

    /// Tables and columns starting with this prefix are ignored; empty disables
    #[arg(long, default_value = DEFAULT_RESERVED_PREFIX)]
    reserved_prefix: String,

    /// Comma separated column defaults to treat as equal (repeatable),
    /// e.g. "CURRENT_TIMESTAMP,current_timestamp()"
    #[arg(long = "equivalent", value_name = "VALUES")]
    equivalents: Vec<String>,

    /// Log queries and progress to stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn compare_options(&self) -> CompareOptions {
        let equivalences = self
            .equivalents
            .iter()
            .fold(Equivalences::default(), |registry, set| {
                let values: Vec<&str> = set.split(',').map(str::trim).collect();
                registry.with_reported_defaults(&values)
            });

        CompareOptions::new(&self.base, &self.target)
            .with_reserved_prefix(&self.reserved_prefix)
            .with_include(self.include.clone())
            .with_exclude(self.exclude.clone())
            .with_only(self.only.clone())
            .with_equivalences(equivalences)
    }

    fn render_options(&self) -> RenderOptions {
        if self.no_color {
            RenderOptions::plain()
        } else {
            RenderOptions::colored()
        }
    }
}

fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

async fn execute(cli: Cli) -> Result<u8> {
    init_tracing(cli.verbose)?;

    // Validate both descriptors up front so the banner can be printed before
    // any connection is made.
    let base = ConnectionConfig::parse(&cli.base).context("Invalid base database")?;
    let target = ConnectionConfig::parse(&cli.target).context("Invalid target database")?;

    if cli.format == OutputFormat::Text {
        println!("Base database: {base}");
        println!("Target database: {target}");
        println!();
    }

    let result = compare(cli.compare_options()).await?;

    match cli.format {
        OutputFormat::Text => print!("{}", render_text(&result.diff, &cli.render_options())),
        OutputFormat::Json => println!("{}", render_json(&result.json_report())?),
    }

    Ok(if result.is_identical() {
        EXIT_IDENTICAL
    } else {
        EXIT_DIFFERENT
    })
}

pub async fn run() -> ExitCode {
    let cli = Cli::parse();

    match execute(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}
