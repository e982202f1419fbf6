use clap::{Parser, ValueEnum};
use itertools::Itertools;
use quire::{
    DataRow, ProcessingConfig, ProcessingError, ReportDefinition, ReportEvent, ReportProcessingError,
    ReportProcessor, TableDataFactory,
};
use serde_json::{Map, Value, json};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Traverses a report definition against JSON data and prints its event stream.
#[derive(Parser, Debug)]
#[command(name = "quire", version)]
struct Cli {
    /// Report definition (JSON).
    report: PathBuf,

    /// Data file: an object mapping query names to arrays of row objects.
    data: PathBuf,

    /// Processing configuration (JSON).
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Print the row values of every event.
    #[arg(long)]
    rows: bool,

    /// Place bands on pages and emit page events.
    #[arg(long)]
    paginate: bool,

    /// Validate the report definition and exit.
    #[arg(long)]
    check: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn row_values(row: &dyn DataRow) -> Result<Map<String, Value>, ReportProcessingError> {
    let mut values = Map::new();
    for name in row.field_names() {
        let value = row.get(&name).map_err(|e| ReportProcessingError::Listener(e.to_string()))?;
        values.insert(name, value);
    }
    Ok(values)
}

fn event_json(event: &ReportEvent) -> Value {
    json!({
        "code": event.code.to_string(),
        "report": event.report_name,
        "group_index": event.group_index,
        "group": event.group_name,
        "cursor": event.cursor,
        "depth": event.depth,
    })
}

fn main() -> Result<(), ProcessingError> {
    env_logger::init();
    let cli = Cli::parse();

    let report = ReportDefinition::from_json(&fs::read_to_string(&cli.report)?)?;
    report.validate()?;
    if cli.check {
        println!("{}: ok ({} groups)", report.name, report.group_count());
        return Ok(());
    }

    let data: Value = serde_json::from_str(&fs::read_to_string(&cli.data)?)?;
    let factory = TableDataFactory::from_json(data)?;
    let mut config = match &cli.config {
        Some(path) => ProcessingConfig::from_file(path)?,
        None => ProcessingConfig::default(),
    };
    config.paginate |= cli.paginate;

    let processor = ReportProcessor::builder(report)
        .with_data_factory(factory)
        .with_config(config)
        .build()?;

    let mut out = BufWriter::new(io::stdout().lock());
    let mut listener = |event: &ReportEvent, row: &dyn DataRow| -> Result<(), ReportProcessingError> {
        let line = match cli.format {
            OutputFormat::Text if cli.rows => {
                let values = row_values(row)?;
                format!("{event}  {}", values.iter().map(|(k, v)| format!("{k}={v}")).join(", "))
            }
            OutputFormat::Text => event.to_string(),
            OutputFormat::Json => {
                let mut value = event_json(event);
                if cli.rows {
                    value["row"] = Value::Object(row_values(row)?);
                }
                value.to_string()
            }
        };
        writeln!(out, "{line}").map_err(|e| ReportProcessingError::Listener(e.to_string()))
    };

    let summary = processor.process(&mut listener)?;
    out.flush()?;
    log::info!(
        "Done: {} print passes, {} paginated passes",
        summary.print.len(),
        summary.pagination.len()
    );
    Ok(())
}
