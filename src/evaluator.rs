//! Streaming type inference over string samples.
//!
//! A [`StringEvaluator`] session seeds a set of typed candidates (boolean,
//! date, integer, number, currency, each crossed with trim policies), then
//! challenges every live candidate with each distinct sample. Candidates
//! that cannot represent a sample are eliminated; survivors accumulate
//! statistics. [`StringEvaluator::best_candidate`] adjudicates the
//! survivors into a single best guess, falling back to a plain string
//! summary when nothing survives.
//!
//! Sessions are single-threaded and deterministic: the same multiset of
//! samples produces the same guess regardless of duplicate ordering,
//! because each distinct sample is processed exactly once.

use std::cmp::Ordering;
use std::collections::HashSet;

use anyhow::Result;
use itertools::{Itertools, MinMaxResult};
use serde::Serialize;

use crate::candidate::{
    Candidate, CandidateKind, DEFAULT_DATE_FORMATS, DEFAULT_NUMBER_FORMATS, TrimPolicy,
    seed_candidates,
};
use crate::mask::{LocaleFamily, NumericSymbols, scan_precision};
use crate::value::TypedValue;

/// Session configuration. `try_trimming` doubles the candidate set with
/// trimmed variants; `auto_scaling` widens decimal masks in place instead
/// of counting truncations.
#[derive(Debug, Clone)]
pub struct EvaluatorOptions {
    pub locale: LocaleFamily,
    pub try_trimming: bool,
    pub auto_scaling: bool,
    pub number_formats: Vec<String>,
    pub date_formats: Vec<String>,
}

impl Default for EvaluatorOptions {
    fn default() -> Self {
        Self {
            locale: LocaleFamily::Us,
            try_trimming: true,
            auto_scaling: true,
            number_formats: DEFAULT_NUMBER_FORMATS.iter().map(|s| s.to_string()).collect(),
            date_formats: DEFAULT_DATE_FORMATS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// The adjudicated result kind. `String` only appears via the fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InferredKind {
    String,
    Boolean,
    Date,
    Integer,
    Number,
    Currency,
}

impl InferredKind {
    pub fn as_str(self) -> &'static str {
        match self {
            InferredKind::String => "string",
            InferredKind::Boolean => "boolean",
            InferredKind::Date => "date",
            InferredKind::Integer => "integer",
            InferredKind::Number => "number",
            InferredKind::Currency => "currency",
        }
    }
}

impl From<CandidateKind> for InferredKind {
    fn from(kind: CandidateKind) -> Self {
        match kind {
            CandidateKind::Boolean => InferredKind::Boolean,
            CandidateKind::Date => InferredKind::Date,
            CandidateKind::Integer => InferredKind::Integer,
            CandidateKind::Number => InferredKind::Number,
            CandidateKind::Currency => InferredKind::Currency,
        }
    }
}

impl std::fmt::Display for InferredKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The adjudicated best interpretation of a sample stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeGuess {
    pub kind: InferredKind,
    pub mask: Option<String>,
    pub trim: TrimPolicy,
    pub symbols: Option<NumericSymbols>,
    pub length: u32,
    pub precision: u32,
    pub successes: usize,
    pub nulls: usize,
    pub truncations: usize,
    pub min: Option<TypedValue>,
    pub max: Option<TypedValue>,
}

impl TypeGuess {
    fn from_candidate(candidate: &Candidate) -> Self {
        Self {
            kind: candidate.kind().into(),
            mask: candidate.mask().map(str::to_string),
            trim: candidate.trim(),
            symbols: candidate.symbols().cloned(),
            length: candidate.length(),
            precision: candidate.precision(),
            successes: candidate.successes(),
            nulls: candidate.nulls(),
            truncations: candidate.truncations(),
            min: candidate.min().cloned(),
            max: candidate.max().cloned(),
        }
    }
}

/// A single-column inference session. Feed samples with
/// [`StringEvaluator::evaluate`], then call
/// [`StringEvaluator::best_candidate`] (repeatable, side-effect free).
pub struct StringEvaluator {
    options: EvaluatorOptions,
    values: HashSet<Option<String>>,
    candidates: Vec<Candidate>,
    live: Vec<bool>,
    count: usize,
    max_length: u32,
    max_precision: u32,
}

impl StringEvaluator {
    /// A session with default masks and trimming for the given locale
    /// family. Fails only on malformed mask configuration.
    pub fn new(locale: LocaleFamily) -> Result<Self> {
        Self::with_options(EvaluatorOptions {
            locale,
            ..EvaluatorOptions::default()
        })
    }

    pub fn with_options(options: EvaluatorOptions) -> Result<Self> {
        let candidates = seed_candidates(
            options.try_trimming,
            &options.number_formats,
            &options.date_formats,
            options.locale,
        )?;
        let live = vec![true; candidates.len()];
        Ok(Self {
            options,
            values: HashSet::new(),
            candidates,
            live,
            count: 0,
            max_length: 0,
            max_precision: 0,
        })
    }

    /// Feeds one sample into the session. `None` is a null sample: it
    /// counts toward the total and the null statistics but can never
    /// eliminate a candidate. Duplicate samples (including repeated
    /// nulls) are counted but not re-evaluated.
    pub fn evaluate(&mut self, value: Option<&str>) {
        self.count += 1;
        if !self.values.insert(value.map(str::to_string)) {
            return;
        }
        match value {
            None => {
                for (index, candidate) in self.candidates.iter_mut().enumerate() {
                    if self.live[index] {
                        candidate.record_null();
                    }
                }
            }
            Some(text) => {
                self.max_length = self.max_length.max(text.chars().count() as u32);
                self.max_precision = self
                    .max_precision
                    .max(scan_precision(text, self.options.locale.decimal_symbol()));
                for index in 0..self.candidates.len() {
                    if !self.live[index] {
                        continue;
                    }
                    if !self.candidates[index].challenge(text, self.options.auto_scaling) {
                        self.live[index] = false;
                    }
                }
            }
        }
    }

    /// Total samples fed, duplicates included.
    pub fn sample_count(&self) -> usize {
        self.count
    }

    /// Longest sample seen, in characters.
    pub fn max_length(&self) -> u32 {
        self.max_length
    }

    /// Widest fractional part seen, scanned with the preferred locale's
    /// decimal symbol.
    pub fn max_precision(&self) -> u32 {
        self.max_precision
    }

    pub fn distinct_values(&self) -> &HashSet<Option<String>> {
        &self.values
    }

    pub fn live_candidate_count(&self) -> usize {
        self.live.iter().filter(|&&alive| alive).count()
    }

    /// Candidates still in contention that converted at least one sample.
    pub fn surviving_candidates(&self) -> Vec<&Candidate> {
        self.candidates
            .iter()
            .zip(&self.live)
            .filter(|&(candidate, &alive)| alive && candidate.successes() > 0)
            .map(|(candidate, _)| candidate)
            .collect()
    }

    /// Adjudicates the surviving candidates into a single guess. Operates
    /// on cloned candidates, so calling it repeatedly (or interleaved with
    /// further [`StringEvaluator::evaluate`] calls) is safe.
    pub fn best_candidate(&self) -> TypeGuess {
        let mut remaining: Vec<Candidate> = self
            .candidates
            .iter()
            .zip(&self.live)
            .filter(|&(_, &alive)| alive)
            .map(|(candidate, _)| candidate.clone())
            .collect();
        if remaining.is_empty() || remaining.iter().all(|c| c.successes() == 0) {
            return self.string_fallback();
        }

        // integers and decimals both fit: the session-wide precision scan
        // decides which family stays
        let has_integer = remaining
            .iter()
            .any(|c| c.kind() == CandidateKind::Integer && c.successes() > 0);
        let has_number = remaining
            .iter()
            .any(|c| c.kind().is_decimal_like() && c.successes() > 0);
        if has_integer && has_number {
            let max_precision = self.max_precision;
            remaining.retain(|c| {
                if max_precision == 0 && c.kind().is_decimal_like() {
                    return false;
                }
                if max_precision > 0 && c.kind() == CandidateKind::Integer {
                    return false;
                }
                true
            });
        }

        // all-digit strings that also parse as dates are dates
        let has_integer = remaining
            .iter()
            .any(|c| c.kind() == CandidateKind::Integer && c.successes() > 0);
        let has_date = remaining
            .iter()
            .any(|c| c.kind() == CandidateKind::Date && c.successes() > 0);
        if has_integer && has_date {
            remaining.retain(|c| c.kind() != CandidateKind::Integer);
        }

        let has_date = remaining
            .iter()
            .any(|c| c.kind() == CandidateKind::Date && c.successes() > 0);
        if has_date {
            remaining.sort_by(|a, b| mask_len(b).cmp(&mask_len(a)));
        } else {
            let preferred = self.options.locale.decimal_symbol();
            remaining.sort_by(|a, b| {
                let by_truncations = a.truncations().cmp(&b.truncations());
                if by_truncations != Ordering::Equal {
                    return by_truncations;
                }
                if a.exponent_values() > 0 {
                    let a_exponent = a.has_exponent_mask();
                    let b_exponent = b.has_exponent_mask();
                    if a_exponent != b_exponent {
                        return if a_exponent { Ordering::Less } else { Ordering::Greater };
                    }
                }
                if a.grouping_symbol() != b.grouping_symbol() {
                    return if a.decimal_symbol() == Some(preferred) {
                        Ordering::Less
                    } else {
                        Ordering::Greater
                    };
                }
                mask_len(a).cmp(&mask_len(b))
            });
        }

        let mut winner = remaining.swap_remove(0);
        // session-level aggregates are stamped onto non-currency decimal
        // winners, even when the locale-naive precision scan disagrees
        // with the mask
        if winner.kind().is_decimal_like() && winner.currency_symbol().is_none() {
            winner.set_precision(self.max_precision);
            if self.max_precision > 0 && self.max_length > 0 {
                winner.set_length(self.max_length);
            }
        }
        TypeGuess::from_candidate(&winner)
    }

    fn string_fallback(&self) -> TypeGuess {
        let nulls = self.values.iter().filter(|v| v.is_none()).count();
        let (min, max) = match self.values.iter().flatten().minmax() {
            MinMaxResult::NoElements => (None, None),
            MinMaxResult::OneElement(only) => (Some(only.clone()), Some(only.clone())),
            MinMaxResult::MinMax(lo, hi) => (Some(lo.clone()), Some(hi.clone())),
        };
        TypeGuess {
            kind: InferredKind::String,
            mask: None,
            trim: TrimPolicy::None,
            symbols: None,
            length: self.max_length,
            precision: 0,
            successes: 0,
            nulls,
            truncations: 0,
            min: min.map(TypedValue::String),
            max: max.map(TypedValue::String),
        }
    }
}

fn mask_len(candidate: &Candidate) -> usize {
    candidate.mask().map_or(0, str::len)
}
