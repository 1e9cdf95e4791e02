use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use flightlog::{
    config::{Config, OutputFormat},
    group_by_pilot,
    report::{HeadersReport, LogbookReport, PilotsReport, Selection},
    sheet::{load_sheet, LoadOptions, Sheet},
    HeaderCatalog,
};
use futures::future::try_join_all;
use serde::Serialize;
use std::{env, path::PathBuf, sync::Arc};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Per-pilot flight-time summaries from spreadsheet logbooks"
)]
struct Args {
    /// YAML config file (defaults to $FLIGHTLOG_CONFIG, then ./flightlog.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Output format
    #[arg(long, value_enum, global = true)]
    format: Option<OutputFormat>,
    /// Worksheet to read instead of the first one
    #[arg(long, global = true)]
    sheet: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Totals, profile and last flight for one pilot (or every row)
    Summary {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Pilot to report on; defaults to the configured preferred pilot,
        /// then the first pilot by name
        #[arg(long, conflicts_with = "all")]
        pilot: Option<String>,
        /// Summarize every row regardless of pilot
        #[arg(long)]
        all: bool,
    },
    /// Per-pilot totals
    Pilots {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Show which column each field resolved to
    Headers {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

impl Command {
    fn files(&self) -> &[PathBuf] {
        match self {
            Command::Summary { files, .. }
            | Command::Pilots { files }
            | Command::Headers { files } => files,
        }
    }
}

fn init_logging() {
    // LOGBOOK_DEBUG=true turns on debug output unless RUST_LOG says otherwise
    let debug = env::var("LOGBOOK_DEBUG")
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    let default = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn emit<T: Serialize>(format: OutputFormat, value: &T, text: impl FnOnce() -> String) -> Result<()> {
    match format {
        OutputFormat::Text => print!("{}", text()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(value)?),
    }
    Ok(())
}

/// Decode every input on the blocking pool; results come back in input order.
async fn load_all(files: &[PathBuf], opts: LoadOptions) -> Result<Vec<(PathBuf, Sheet)>> {
    let opts = Arc::new(opts);
    let handles = files.iter().cloned().map(|path| {
        let opts = Arc::clone(&opts);
        tokio::task::spawn_blocking(move || {
            let sheet = load_sheet(&path, &opts)?;
            Ok::<_, anyhow::Error>((path, sheet))
        })
    });
    let joined = try_join_all(handles)
        .await
        .context("loader task panicked")?;
    joined.into_iter().collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let mut cfg = Config::discover(args.config.as_deref())?;
    if args.sheet.is_some() {
        cfg.sheet = args.sheet.clone();
    }
    let format = args.format.or(cfg.format).unwrap_or_default();
    let catalog: HeaderCatalog = cfg.catalog();

    let sheets = load_all(args.command.files(), cfg.load_options()).await?;
    info!(files = sheets.len(), "logbooks loaded");

    for (path, sheet) in &sheets {
        let source = path.display().to_string();
        let index = sheet.field_index(&catalog);
        let unresolved = index.unresolved();
        if !unresolved.is_empty() {
            warn!(source = %source, fields = ?unresolved, "fields without a matching header");
        }

        match &args.command {
            Command::Summary { pilot, all, .. } => {
                let selection = if *all {
                    Selection::All
                } else if let Some(name) = pilot {
                    Selection::Pilot(name.trim().to_string())
                } else {
                    let groups = group_by_pilot(sheet.rows(), &index);
                    Selection::default_for(&groups, cfg.preferred_pilot.as_deref())
                };
                let report = LogbookReport::build(&source, sheet, &index, &selection);
                emit(format, &report, || report.render_text())?;
            }
            Command::Pilots { .. } => {
                let report = PilotsReport::build(&source, sheet, &index);
                emit(format, &report, || report.render_text())?;
            }
            Command::Headers { .. } => {
                let report = HeadersReport::build(&source, sheet, &index);
                emit(format, &report, || report.render_text())?;
            }
        }
    }

    info!("all done");
    Ok(())
}
