use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::mask::LocaleFamily;

#[derive(Debug, Parser)]
#[command(author, version, about = "Infer data types from string samples", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Probe a column of samples and report the best type candidate
    Probe(ProbeArgs),
    /// List the built-in number, integer, and date masks
    Formats,
}

#[derive(Debug, Args)]
pub struct ProbeArgs {
    /// Input file to inspect, or '-' to read from stdin
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// CSV column to probe, by header name or 0-based index; omit to read
    /// one sample per line
    #[arg(short = 'c', long = "column")]
    pub column: Option<String>,
    /// Number of samples to evaluate (0 means all)
    #[arg(long, default_value_t = 0)]
    pub sample_rows: usize,
    /// Field delimiter for CSV input (e.g. ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Treat the first CSV row as data instead of a header
    #[arg(long = "no-header")]
    pub no_header: bool,
    /// Preferred decimal/grouping convention
    #[arg(long, value_enum, default_value = "us")]
    pub locale: LocaleArg,
    /// Do not seed trimmed variants of the candidates
    #[arg(long = "no-trim")]
    pub no_trim: bool,
    /// Count precision overflows as truncations instead of widening masks
    #[arg(long = "no-auto-scale")]
    pub no_auto_scale: bool,
    /// Numeric mask to probe with, replacing the defaults (repeatable)
    #[arg(long = "number-format", action = clap::ArgAction::Append)]
    pub number_formats: Vec<String>,
    /// Date mask to probe with in strftime syntax, replacing the defaults
    /// (repeatable)
    #[arg(long = "date-format", action = clap::ArgAction::Append)]
    pub date_formats: Vec<String>,
    /// Emit the full report as JSON
    #[arg(long)]
    pub json: bool,
    /// Include every surviving candidate in the report
    #[arg(long)]
    pub all: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LocaleArg {
    /// Decimal '.', grouping ',', currency '$'
    Us,
    /// Decimal ',', grouping '.', currency '€'
    Eu,
}

impl From<LocaleArg> for LocaleFamily {
    fn from(arg: LocaleArg) -> Self {
        match arg {
            LocaleArg::Us => LocaleFamily::Us,
            LocaleArg::Eu => LocaleFamily::Eu,
        }
    }
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_delimiter_accepts_names_and_single_chars() {
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert_eq!(parse_delimiter(";"), Ok(b';'));
        assert_eq!(parse_delimiter("|"), Ok(b'|'));
        assert!(parse_delimiter("ab").is_err());
        assert!(parse_delimiter("").is_err());
    }
}
