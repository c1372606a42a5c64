pub mod candidate;
pub mod cli;
pub mod evaluator;
pub mod mask;
pub mod report;
pub mod value;

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::{env, sync::OnceLock};

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use log::{LevelFilter, info};

use crate::candidate::{DEFAULT_DATE_FORMATS, DEFAULT_INTEGER_FORMATS, DEFAULT_NUMBER_FORMATS};
use crate::cli::{Cli, Commands, ProbeArgs};
use crate::evaluator::{EvaluatorOptions, StringEvaluator};
use crate::report::ProbeReport;

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("type_probe", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Probe(args) => handle_probe(&args),
        Commands::Formats => handle_formats(),
    }
}

fn handle_probe(args: &ProbeArgs) -> Result<()> {
    let options = EvaluatorOptions {
        locale: args.locale.into(),
        try_trimming: !args.no_trim,
        auto_scaling: !args.no_auto_scale,
        number_formats: if args.number_formats.is_empty() {
            DEFAULT_NUMBER_FORMATS.iter().map(|s| s.to_string()).collect()
        } else {
            args.number_formats.clone()
        },
        date_formats: if args.date_formats.is_empty() {
            DEFAULT_DATE_FORMATS.iter().map(|s| s.to_string()).collect()
        } else {
            args.date_formats.clone()
        },
    };
    let mut evaluator = StringEvaluator::with_options(options)?;
    let fed = match &args.column {
        Some(column) => feed_csv(&mut evaluator, args, column)
            .with_context(|| format!("Reading column '{}' from {:?}", column, args.input))?,
        None => feed_lines(&mut evaluator, args)
            .with_context(|| format!("Reading samples from {:?}", args.input))?,
    };
    info!(
        "Evaluated {} sample(s) from '{}'",
        fed,
        args.input.display()
    );
    let report = ProbeReport::from_session(&evaluator);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report::print_report(&report, args.all);
    }
    Ok(())
}

fn handle_formats() -> Result<()> {
    println!("Number masks:");
    for mask in DEFAULT_NUMBER_FORMATS {
        println!("  {mask}");
    }
    println!("Integer masks:");
    for mask in DEFAULT_INTEGER_FORMATS {
        println!("  {mask}");
    }
    println!("Date masks (strftime):");
    for mask in DEFAULT_DATE_FORMATS {
        println!("  {mask}");
    }
    Ok(())
}

fn feed_csv(evaluator: &mut StringEvaluator, args: &ProbeArgs, column: &str) -> Result<usize> {
    let delimiter = args.delimiter.unwrap_or(b',');
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(!args.no_header)
        .flexible(true)
        .from_reader(open_input(&args.input)?);
    let index = if args.no_header {
        column.parse::<usize>().map_err(|_| {
            anyhow!("Column '{column}' must be a 0-based index when the input has no header row")
        })?
    } else {
        let headers = reader.headers()?.clone();
        headers
            .iter()
            .position(|header| header == column)
            .or_else(|| column.parse::<usize>().ok())
            .ok_or_else(|| anyhow!("Column '{column}' not found in header row {headers:?}"))?
    };
    let mut fed = 0usize;
    for record in reader.records() {
        if args.sample_rows > 0 && fed >= args.sample_rows {
            break;
        }
        let record = record?;
        match record.get(index) {
            Some("") | None => evaluator.evaluate(None),
            Some(field) => evaluator.evaluate(Some(field)),
        }
        fed += 1;
    }
    if fed == 0 {
        bail!("No records found in {:?}", args.input);
    }
    Ok(fed)
}

fn feed_lines(evaluator: &mut StringEvaluator, args: &ProbeArgs) -> Result<usize> {
    let mut text = String::new();
    open_input(&args.input)?.read_to_string(&mut text)?;
    let mut fed = 0usize;
    for line in text.lines() {
        if args.sample_rows > 0 && fed >= args.sample_rows {
            break;
        }
        if line.is_empty() {
            evaluator.evaluate(None);
        } else {
            evaluator.evaluate(Some(line));
        }
        fed += 1;
    }
    Ok(fed)
}

fn open_input(path: &Path) -> Result<Box<dyn Read>> {
    if path.as_os_str() == "-" {
        Ok(Box::new(io::stdin()))
    } else {
        let file = File::open(path).with_context(|| format!("Opening {path:?}"))?;
        Ok(Box::new(file))
    }
}
