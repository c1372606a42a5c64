use serde::Serialize;

use crate::candidate::{Candidate, CandidateKind, TrimPolicy};
use crate::evaluator::{StringEvaluator, TypeGuess};

/// Everything a probe run learned about a sample stream.
#[derive(Debug, Serialize)]
pub struct ProbeReport {
    pub best: TypeGuess,
    pub sample_count: usize,
    pub distinct_count: usize,
    pub max_length: u32,
    pub max_precision: u32,
    pub survivors: Vec<CandidateSummary>,
}

#[derive(Debug, Serialize)]
pub struct CandidateSummary {
    pub kind: CandidateKind,
    pub mask: Option<String>,
    pub trim: TrimPolicy,
    pub precision: u32,
    pub successes: usize,
    pub nulls: usize,
    pub truncations: usize,
}

impl CandidateSummary {
    fn from_candidate(candidate: &Candidate) -> Self {
        Self {
            kind: candidate.kind(),
            mask: candidate.mask().map(str::to_string),
            trim: candidate.trim(),
            precision: candidate.precision(),
            successes: candidate.successes(),
            nulls: candidate.nulls(),
            truncations: candidate.truncations(),
        }
    }
}

impl ProbeReport {
    pub fn from_session(evaluator: &StringEvaluator) -> Self {
        Self {
            best: evaluator.best_candidate(),
            sample_count: evaluator.sample_count(),
            distinct_count: evaluator.distinct_values().len(),
            max_length: evaluator.max_length(),
            max_precision: evaluator.max_precision(),
            survivors: evaluator
                .surviving_candidates()
                .into_iter()
                .map(CandidateSummary::from_candidate)
                .collect(),
        }
    }
}

pub fn print_report(report: &ProbeReport, all: bool) {
    let best = &report.best;
    println!("type      : {}", best.kind);
    if let Some(mask) = &best.mask {
        println!("mask      : {mask}");
    }
    if let Some(symbols) = &best.symbols {
        println!("decimal   : {}", symbols.decimal);
        println!("grouping  : {}", symbols.grouping);
        if let Some(currency) = &symbols.currency {
            println!("currency  : {currency}");
        }
    }
    if best.trim == TrimPolicy::Both {
        println!("trim      : both");
    }
    println!("length    : {}", best.length);
    println!("precision : {}", best.precision);
    println!(
        "samples   : {} ({} distinct, {} null)",
        report.sample_count, report.distinct_count, best.nulls
    );
    if best.truncations > 0 {
        println!("truncated : {}", best.truncations);
    }
    if let (Some(min), Some(max)) = (&best.min, &best.max) {
        println!("range     : {} .. {}", min.as_display(), max.as_display());
    }
    if all && !report.survivors.is_empty() {
        println!();
        println!(
            "{:<10} {:<24} {:>9} {:>6} {:>6} {:>10}",
            "kind", "mask", "precision", "ok", "null", "truncated"
        );
        for survivor in &report.survivors {
            println!(
                "{:<10} {:<24} {:>9} {:>6} {:>6} {:>10}",
                survivor.kind.as_str(),
                survivor.mask.as_deref().unwrap_or("-"),
                survivor.precision,
                survivor.successes,
                survivor.nulls,
                survivor.truncations
            );
        }
    }
}
