use std::fmt;

use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

use crate::mask::{
    EXPONENT_MARKER, LocaleFamily, MaskError, NumericMask, NumericSymbols, decimal_digit_count,
    mask_precision, parse_date_strict, validate_date_mask,
};
use crate::value::TypedValue;

/// Default numeric masks tried against every sample stream.
pub const DEFAULT_NUMBER_FORMATS: &[&str] = &[
    "#.#",
    "#,###.#",
    "#,###.0;(#,###.0)",
    "$#,###.0;($#,###.0)",
    "###.#E0",
    "#.#%",
];

/// Fixed integer masks; these are seeded regardless of the number formats
/// in effect.
pub const DEFAULT_INTEGER_FORMATS: &[&str] = &["#", "#,###", "#,###;(#,###)", "$#,###;($#,###)"];

/// Default date masks, longest first so ties in adjudication favor the most
/// specific pattern.
pub const DEFAULT_DATE_FORMATS: &[&str] = &[
    "%Y/%m/%d %H:%M:%S%.3f",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y%m%d%H%M%S",
    "%Y/%m/%d",
    "%Y-%m-%d",
    "%Y%m%d",
    "%m/%d/%Y",
    "%m/%d/%y",
    "%d/%m/%Y",
    "%d-%m-%Y",
];

const CURRENCY_FRACTION_DIGITS: u32 = 2;
const NUMERIC_DEFAULT_LENGTH: u32 = 15;
const BOOLEAN_TOKENS: &[&str] = &["Y", "N", "TRUE", "FALSE"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateKind {
    Boolean,
    Date,
    Integer,
    Number,
    Currency,
}

impl CandidateKind {
    /// Number and Currency carry fractional digits; Integer does not.
    pub fn is_decimal_like(self) -> bool {
        matches!(self, CandidateKind::Number | CandidateKind::Currency)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CandidateKind::Boolean => "boolean",
            CandidateKind::Date => "date",
            CandidateKind::Integer => "integer",
            CandidateKind::Number => "number",
            CandidateKind::Currency => "currency",
        }
    }
}

impl fmt::Display for CandidateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrimPolicy {
    #[default]
    None,
    Both,
}

impl TrimPolicy {
    pub fn apply(self, value: &str) -> &str {
        match self {
            TrimPolicy::None => value,
            TrimPolicy::Both => value.trim(),
        }
    }
}

#[derive(Debug, Clone)]
enum CandidateDetail {
    Boolean,
    Date { mask: String },
    Numeric { mask: NumericMask, symbols: NumericSymbols },
}

/// One competing interpretation of the sample stream. A candidate is
/// eliminated by its session the first time [`Candidate::challenge`]
/// returns `false`; until then it accumulates statistics.
#[derive(Debug, Clone)]
pub struct Candidate {
    kind: CandidateKind,
    detail: CandidateDetail,
    trim: TrimPolicy,
    precision: u32,
    length: u32,
    successes: usize,
    nulls: usize,
    truncations: usize,
    exponent_values: usize,
    min: Option<TypedValue>,
    max: Option<TypedValue>,
}

impl Candidate {
    fn base(kind: CandidateKind, detail: CandidateDetail, trim: TrimPolicy, precision: u32, length: u32) -> Self {
        Self {
            kind,
            detail,
            trim,
            precision,
            length,
            successes: 0,
            nulls: 0,
            truncations: 0,
            exponent_values: 0,
            min: None,
            max: None,
        }
    }

    fn boolean(trim: TrimPolicy) -> Self {
        Self::base(CandidateKind::Boolean, CandidateDetail::Boolean, trim, 0, 1)
    }

    fn date(mask: String, trim: TrimPolicy) -> Self {
        let length = mask.len() as u32;
        Self::base(CandidateKind::Date, CandidateDetail::Date { mask }, trim, 0, length)
    }

    fn numeric(
        kind: CandidateKind,
        mask: &str,
        symbols: NumericSymbols,
        trim: TrimPolicy,
        precision: u32,
    ) -> Result<Self, MaskError> {
        let compiled = NumericMask::compile(mask)?;
        Ok(Self::base(
            kind,
            CandidateDetail::Numeric { mask: compiled, symbols },
            trim,
            precision,
            NUMERIC_DEFAULT_LENGTH,
        ))
    }

    pub fn kind(&self) -> CandidateKind {
        self.kind
    }

    pub fn mask(&self) -> Option<&str> {
        match &self.detail {
            CandidateDetail::Boolean => None,
            CandidateDetail::Date { mask } => Some(mask),
            CandidateDetail::Numeric { mask, .. } => Some(mask.raw()),
        }
    }

    pub fn symbols(&self) -> Option<&NumericSymbols> {
        match &self.detail {
            CandidateDetail::Numeric { symbols, .. } => Some(symbols),
            _ => None,
        }
    }

    pub fn trim(&self) -> TrimPolicy {
        self.trim
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    pub fn successes(&self) -> usize {
        self.successes
    }

    pub fn nulls(&self) -> usize {
        self.nulls
    }

    pub fn truncations(&self) -> usize {
        self.truncations
    }

    pub fn exponent_values(&self) -> usize {
        self.exponent_values
    }

    pub fn min(&self) -> Option<&TypedValue> {
        self.min.as_ref()
    }

    pub fn max(&self) -> Option<&TypedValue> {
        self.max.as_ref()
    }

    pub fn decimal_symbol(&self) -> Option<char> {
        self.symbols().map(|s| s.decimal)
    }

    pub fn grouping_symbol(&self) -> Option<char> {
        self.symbols().map(|s| s.grouping)
    }

    pub fn currency_symbol(&self) -> Option<&str> {
        self.symbols().and_then(|s| s.currency.as_deref())
    }

    /// True when the candidate's compiled mask carries an exponent section.
    pub fn has_exponent_mask(&self) -> bool {
        match &self.detail {
            CandidateDetail::Numeric { mask, .. } => mask.has_exponent(),
            _ => false,
        }
    }

    pub(crate) fn record_null(&mut self) {
        self.nulls += 1;
    }

    pub(crate) fn set_precision(&mut self, precision: u32) {
        self.precision = precision;
    }

    pub(crate) fn set_length(&mut self, length: u32) {
        self.length = length;
    }

    /// Presents one sample to this candidate. Returns `false` when the
    /// sample is structurally or semantically incompatible, which
    /// permanently eliminates the candidate from its session.
    pub(crate) fn challenge(&mut self, value: &str, auto_scaling: bool) -> bool {
        match self.detail {
            CandidateDetail::Boolean => self.challenge_boolean(value),
            CandidateDetail::Date { .. } => self.challenge_date(value),
            CandidateDetail::Numeric { .. } => self.challenge_numeric(value, auto_scaling),
        }
    }

    fn challenge_boolean(&mut self, value: &str) -> bool {
        let text = self.trim.apply(value);
        if text.is_empty() {
            self.nulls += 1;
            return true;
        }
        if BOOLEAN_TOKENS.iter().any(|token| text.eq_ignore_ascii_case(token)) {
            self.successes += 1;
            true
        } else {
            false
        }
    }

    fn challenge_date(&mut self, value: &str) -> bool {
        let parsed = {
            let CandidateDetail::Date { mask } = &self.detail else {
                return false;
            };
            let text = self.trim.apply(value);
            match parse_date_strict(text, mask) {
                Some(parsed) => parsed,
                None => return false,
            }
        };
        self.successes += 1;
        self.observe(TypedValue::Date(parsed));
        true
    }

    fn challenge_numeric(&mut self, value: &str, auto_scaling: bool) -> bool {
        let (parsed, exponent_seen) = {
            let CandidateDetail::Numeric { mask, symbols } = &self.detail else {
                return false;
            };
            let text = self.trim.apply(value);
            let chars: Vec<char> = text.chars().collect();
            let mut exponent_pos: Option<usize> = None;
            let mut dots = 0usize;
            let mut commas = 0usize;
            for (pos, &c) in chars.iter().enumerate() {
                if c == EXPONENT_MARKER {
                    // an integer mask cannot express a negative exponent
                    if self.kind == CandidateKind::Integer
                        && !text.contains(symbols.decimal)
                        && chars.get(pos + 1) == Some(&'-')
                    {
                        return false;
                    }
                    exponent_pos = Some(pos);
                    continue;
                }
                let sign_ok = (c == '+' || c == '-')
                    && (pos == 0 || exponent_pos.is_some_and(|e| pos == e + 1));
                let currency_ok = symbols
                    .currency
                    .as_deref()
                    .is_some_and(|symbol| symbol.contains(c));
                let percent_ok = c == '%' && mask.percent();
                if !(c.is_ascii_digit()
                    || c == '.'
                    || c == ','
                    || c.is_whitespace()
                    || c == '('
                    || c == ')'
                    || sign_ok
                    || currency_ok
                    || percent_ok)
                {
                    return false;
                }
                if c == '.' {
                    if self.kind == CandidateKind::Integer {
                        return false;
                    }
                    dots += 1;
                }
                if c == ',' {
                    commas += 1;
                }
            }
            if dots > 1 && commas > 1 {
                return false;
            }
            match mask.parse(text, symbols) {
                Ok(parsed) => (parsed, exponent_pos.is_some_and(|pos| pos > 0)),
                Err(_) => return false,
            }
        };
        let Some(number) = parsed else {
            self.nulls += 1;
            return true;
        };
        let typed = if self.kind == CandidateKind::Integer {
            if !number.is_integer() {
                return false;
            }
            match number.to_i64() {
                Some(v) => TypedValue::Integer(v),
                None => return false,
            }
        } else {
            TypedValue::Number(number)
        };
        self.successes += 1;
        if exponent_seen {
            self.exponent_values += 1;
        }
        if self.kind.is_decimal_like() {
            let scale = number.scale();
            let digits = decimal_digit_count(&number);
            if self.precision < scale.min(digits) {
                if auto_scaling {
                    self.widen_scale(scale, digits, exponent_seen);
                } else {
                    self.truncations += 1;
                }
            }
        }
        self.observe(typed);
        true
    }

    /// Grows the candidate's precision (and mask) to carry the widest
    /// fractional part seen. Very small exponent-notation values widen to
    /// their significant-digit count instead of their scale.
    fn widen_scale(&mut self, scale: u32, digits: u32, exponent_seen: bool) {
        let current = i64::from(self.precision);
        let (additional, updated) = if exponent_seen && i64::from(digits) - i64::from(scale) - 1 < -6
        {
            (i64::from(digits) - 1 - current, i64::from(digits) - 1)
        } else {
            (i64::from(scale) - current, i64::from(scale))
        };
        if additional > 0
            && let CandidateDetail::Numeric { mask, .. } = &mut self.detail
        {
            mask.widen(additional as usize);
        }
        self.precision = updated.max(0) as u32;
    }

    fn observe(&mut self, value: TypedValue) {
        match &self.min {
            Some(min) if *min <= value => {}
            _ => self.min = Some(value.clone()),
        }
        match &self.max {
            Some(max) if *max >= value => {}
            _ => self.max = Some(value),
        }
    }
}

/// Builds the initial candidate set: dates per date mask, US and EU number
/// candidates per numeric mask, the locale-family currency candidate plus
/// its symbol-stripped siblings, the fixed integer masks, and a boolean,
/// all crossed with the trim policies in effect.
pub(crate) fn seed_candidates(
    try_trimming: bool,
    number_formats: &[String],
    date_formats: &[String],
    locale: LocaleFamily,
) -> Result<Vec<Candidate>, MaskError> {
    let trims: &[TrimPolicy] = if try_trimming {
        &[TrimPolicy::None, TrimPolicy::Both]
    } else {
        &[TrimPolicy::None]
    };
    let mut candidates = Vec::new();
    for &trim in trims {
        for format in date_formats {
            validate_date_mask(format)?;
            candidates.push(Candidate::date(format.clone(), trim));
        }
        for format in number_formats {
            // bare integer masks are covered by the fixed integer set
            if format == "#" || format == "0" {
                continue;
            }
            let precision = mask_precision(format);
            candidates.push(Candidate::numeric(
                CandidateKind::Number,
                format,
                NumericSymbols::us(None),
                trim,
                precision,
            )?);
            candidates.push(Candidate::numeric(
                CandidateKind::Number,
                format,
                NumericSymbols::eu(None),
                trim,
                precision,
            )?);
        }
        candidates.push(Candidate::numeric(
            CandidateKind::Currency,
            locale.currency_mask(),
            locale.symbols(Some(locale.currency_symbol().to_string())),
            trim,
            CURRENCY_FRACTION_DIGITS,
        )?);
        let stripped = locale.currency_mask_as_numeric();
        candidates.push(Candidate::numeric(
            CandidateKind::Number,
            &stripped,
            NumericSymbols::us(None),
            trim,
            CURRENCY_FRACTION_DIGITS,
        )?);
        candidates.push(Candidate::numeric(
            CandidateKind::Number,
            &stripped,
            NumericSymbols::eu(None),
            trim,
            CURRENCY_FRACTION_DIGITS,
        )?);
        for format in DEFAULT_INTEGER_FORMATS {
            let currency = format.contains('$').then(|| "$".to_string());
            candidates.push(Candidate::numeric(
                CandidateKind::Integer,
                format,
                NumericSymbols {
                    decimal: locale.decimal_symbol(),
                    grouping: locale.grouping_symbol(),
                    currency,
                },
                trim,
                0,
            )?);
        }
        candidates.push(Candidate::boolean(trim));
    }
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> (Vec<String>, Vec<String>) {
        (
            DEFAULT_NUMBER_FORMATS.iter().map(|s| s.to_string()).collect(),
            DEFAULT_DATE_FORMATS.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn seeding_crosses_trim_policies() {
        let (numbers, dates) = defaults();
        let trimmed = seed_candidates(true, &numbers, &dates, LocaleFamily::Us).expect("seed");
        let untrimmed = seed_candidates(false, &numbers, &dates, LocaleFamily::Us).expect("seed");
        assert_eq!(trimmed.len(), untrimmed.len() * 2);
        assert!(untrimmed.iter().all(|c| c.trim() == TrimPolicy::None));
    }

    #[test]
    fn seeding_skips_bare_integer_number_masks() {
        let numbers = vec!["#".to_string(), "0".to_string()];
        let candidates = seed_candidates(false, &numbers, &[], LocaleFamily::Us).expect("seed");
        assert!(
            candidates
                .iter()
                .filter(|c| c.kind() == CandidateKind::Number)
                .all(|c| c.mask() != Some("#") && c.mask() != Some("0"))
        );
    }

    #[test]
    fn seeding_rejects_malformed_masks() {
        let numbers = vec!["#.#.#".to_string()];
        assert!(seed_candidates(false, &numbers, &[], LocaleFamily::Us).is_err());
        let dates = vec!["%Q".to_string()];
        assert!(seed_candidates(false, &[], &dates, LocaleFamily::Us).is_err());
    }

    #[test]
    fn currency_candidate_follows_the_locale_family() {
        let candidates = seed_candidates(false, &[], &[], LocaleFamily::Eu).expect("seed");
        let currency = candidates
            .iter()
            .find(|c| c.kind() == CandidateKind::Currency)
            .expect("currency candidate");
        assert_eq!(currency.mask(), Some("#,##0.00 \u{20AC}"));
        assert_eq!(currency.currency_symbol(), Some("\u{20AC}"));
        assert_eq!(currency.decimal_symbol(), Some(','));
        assert_eq!(currency.precision(), 2);
    }

    #[test]
    fn boolean_challenge_accepts_tokens_case_insensitively() {
        let mut candidate = Candidate::boolean(TrimPolicy::Both);
        for token in ["Y", "n", "true", "FALSE", " TRUE "] {
            assert!(candidate.challenge(token, true), "{token}");
        }
        assert_eq!(candidate.successes(), 5);
        assert!(!candidate.challenge("yes", true));
    }

    #[test]
    fn boolean_challenge_counts_empty_as_null() {
        let mut candidate = Candidate::boolean(TrimPolicy::None);
        assert!(candidate.challenge("", true));
        assert_eq!(candidate.nulls(), 1);
        assert_eq!(candidate.successes(), 0);
    }

    #[test]
    fn date_challenge_eliminates_on_empty() {
        let mut candidate = Candidate::date("%Y-%m-%d".to_string(), TrimPolicy::None);
        assert!(candidate.challenge("2023-01-15", true));
        assert!(!candidate.challenge("", true));
    }

    #[test]
    fn date_challenge_tracks_min_and_max() {
        let mut candidate = Candidate::date("%Y-%m-%d".to_string(), TrimPolicy::None);
        assert!(candidate.challenge("2023-06-01", true));
        assert!(candidate.challenge("2021-01-01", true));
        assert!(candidate.challenge("2022-03-15", true));
        assert_eq!(candidate.min().map(TypedValue::as_display).as_deref(), Some("2021-01-01 00:00:00"));
        assert_eq!(candidate.max().map(TypedValue::as_display).as_deref(), Some("2023-06-01 00:00:00"));
    }

    #[test]
    fn integer_challenge_rejects_decimal_points() {
        let mut candidate =
            Candidate::numeric(CandidateKind::Integer, "#", NumericSymbols::us(None), TrimPolicy::None, 0)
                .expect("candidate");
        assert!(candidate.challenge("42", true));
        assert!(!candidate.challenge("4.2", true));
    }

    #[test]
    fn integer_challenge_rejects_out_of_range_values() {
        let mut candidate =
            Candidate::numeric(CandidateKind::Integer, "#", NumericSymbols::us(None), TrimPolicy::None, 0)
                .expect("candidate");
        assert!(candidate.challenge("9223372036854775807", true));
        assert!(!candidate.challenge("9223372036854775808", true));
    }

    #[test]
    fn numeric_challenge_rejects_letters_at_the_scan() {
        let mut candidate = Candidate::numeric(
            CandidateKind::Number,
            "#.#",
            NumericSymbols::us(None),
            TrimPolicy::None,
            1,
        )
        .expect("candidate");
        assert!(!candidate.challenge("12ab", true));
    }

    #[test]
    fn numeric_challenge_widens_precision_when_auto_scaling() {
        let mut candidate = Candidate::numeric(
            CandidateKind::Number,
            "#.#",
            NumericSymbols::us(None),
            TrimPolicy::None,
            1,
        )
        .expect("candidate");
        assert!(candidate.challenge("1.23456", true));
        assert_eq!(candidate.precision(), 5);
        assert_eq!(candidate.mask(), Some("#.#####"));
        assert_eq!(candidate.truncations(), 0);
    }

    #[test]
    fn numeric_challenge_counts_truncations_without_auto_scaling() {
        let mut candidate = Candidate::numeric(
            CandidateKind::Number,
            "#.#",
            NumericSymbols::us(None),
            TrimPolicy::None,
            1,
        )
        .expect("candidate");
        assert!(candidate.challenge("1.23456", false));
        assert_eq!(candidate.precision(), 1);
        assert_eq!(candidate.mask(), Some("#.#"));
        assert_eq!(candidate.truncations(), 1);
    }

    #[test]
    fn numeric_challenge_counts_exponent_values() {
        let mut candidate = Candidate::numeric(
            CandidateKind::Number,
            "###.#E0",
            NumericSymbols::us(None),
            TrimPolicy::None,
            1,
        )
        .expect("candidate");
        assert!(candidate.challenge("2.5E3", true));
        assert_eq!(candidate.exponent_values(), 1);
    }

    #[test]
    fn exponent_masks_are_detected_from_the_compiled_mask() {
        let exponent = Candidate::numeric(
            CandidateKind::Number,
            "###.#E0",
            NumericSymbols::us(None),
            TrimPolicy::None,
            1,
        )
        .expect("candidate");
        assert!(exponent.has_exponent_mask());

        // a literal 'E' in an affix is not an exponent section
        let affixed = Candidate::numeric(
            CandidateKind::Number,
            "E#.#",
            NumericSymbols::us(None),
            TrimPolicy::None,
            1,
        )
        .expect("candidate");
        assert!(!affixed.has_exponent_mask());
        assert!(!Candidate::boolean(TrimPolicy::None).has_exponent_mask());
    }

    #[test]
    fn percent_only_allowed_for_percent_masks() {
        let mut percent = Candidate::numeric(
            CandidateKind::Number,
            "#.#%",
            NumericSymbols::us(None),
            TrimPolicy::None,
            1,
        )
        .expect("candidate");
        assert!(percent.challenge("12.5%", true));

        let mut plain = Candidate::numeric(
            CandidateKind::Number,
            "#.#",
            NumericSymbols::us(None),
            TrimPolicy::None,
            1,
        )
        .expect("candidate");
        assert!(!plain.challenge("12.5%", true));
    }

    #[test]
    fn mixed_grouping_and_decimal_repeats_eliminate() {
        let mut candidate = Candidate::numeric(
            CandidateKind::Number,
            "#,###.#",
            NumericSymbols::us(None),
            TrimPolicy::None,
            1,
        )
        .expect("candidate");
        assert!(!candidate.challenge("1.2.3,4,5", true));
    }
}
