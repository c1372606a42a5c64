//! Parse masks: locale symbol sets, a `DecimalFormat`-style numeric mask
//! engine (compile, parse, format, widen), strftime date mask validation,
//! and the fractional-precision scans shared by masks and raw samples.

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::format::{Item, StrftimeItems};
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// Exponent marker recognized in numeric masks and sample values.
pub const EXPONENT_MARKER: char = 'E';

static PRECISION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[^0-9#]").expect("precision pattern is valid"));

#[derive(Debug, Error)]
pub enum MaskError {
    #[error("numeric mask '{0}' has no digit placeholders")]
    NoDigits(String),
    #[error("numeric mask '{0}' has more than one decimal point in a section")]
    MultipleDecimals(String),
    #[error("numeric mask '{0}' has more than one section separator")]
    MultipleSections(String),
    #[error("numeric mask '{0}' has an exponent with no digits")]
    EmptyExponent(String),
    #[error("numeric mask '{0}' mixes literal text into a digit run")]
    StrayLiteral(String),
    #[error("date mask '{0}' is not a valid strftime pattern")]
    BadDateMask(String),
}

/// Why a sample failed to parse under a mask. Never surfaced to callers of
/// the evaluator; a rejection simply eliminates the candidate.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseRejection {
    #[error("value does not match the mask's literal affixes")]
    AffixMismatch,
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
    #[error("no digits in value")]
    NoDigits,
    #[error("more than one decimal separator")]
    MultipleDecimals,
    #[error("malformed exponent")]
    BadExponent,
    #[error("value does not fit the target type")]
    OutOfRange,
}

/// Preferred grouping/decimal convention, supplied explicitly at
/// construction instead of being read from ambient process state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LocaleFamily {
    Us,
    Eu,
}

impl LocaleFamily {
    pub fn decimal_symbol(self) -> char {
        match self {
            LocaleFamily::Us => '.',
            LocaleFamily::Eu => ',',
        }
    }

    pub fn grouping_symbol(self) -> char {
        match self {
            LocaleFamily::Us => ',',
            LocaleFamily::Eu => '.',
        }
    }

    pub fn currency_symbol(self) -> &'static str {
        match self {
            LocaleFamily::Us => "$",
            LocaleFamily::Eu => "\u{20AC}",
        }
    }

    /// Currency mask in canonical pattern syntax; the symbol set governs how
    /// the value text itself is read.
    pub fn currency_mask(self) -> &'static str {
        match self {
            LocaleFamily::Us => "$#,##0.00;($#,##0.00)",
            LocaleFamily::Eu => "#,##0.00 \u{20AC}",
        }
    }

    /// The currency mask with its currency symbol (and any adjacent space)
    /// removed, for the symbol-less sibling candidates.
    pub fn currency_mask_as_numeric(self) -> String {
        let symbol = self.currency_symbol();
        self.currency_mask()
            .replace(&format!(" {symbol}"), "")
            .replace(&format!("{symbol} "), "")
            .replace(symbol, "")
    }

    pub fn symbols(self, currency: Option<String>) -> NumericSymbols {
        NumericSymbols {
            decimal: self.decimal_symbol(),
            grouping: self.grouping_symbol(),
            currency,
        }
    }
}

/// The symbols a numeric candidate reads its value text with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NumericSymbols {
    pub decimal: char,
    pub grouping: char,
    pub currency: Option<String>,
}

impl NumericSymbols {
    pub fn us(currency: Option<String>) -> Self {
        LocaleFamily::Us.symbols(currency)
    }

    pub fn eu(currency: Option<String>) -> Self {
        LocaleFamily::Eu.symbols(currency)
    }
}

/// A compiled numeric mask with an optional negative section, e.g.
/// `#,###.0;(#,###.0)` or `$#,##0.00`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumericMask {
    raw: String,
    positive: MaskSection,
    negative: Option<MaskSection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct MaskSection {
    prefix: String,
    suffix: String,
    grouping: bool,
    integer_digits: usize,
    fraction_min: usize,
    fraction_max: usize,
    exponent_digits: usize,
    percent: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Prefix,
    Digits,
    Fraction,
    Exponent,
    Suffix,
}

impl MaskSection {
    fn compile(section: &str, whole: &str) -> Result<Self, MaskError> {
        let mut out = MaskSection::default();
        let mut state = ScanState::Prefix;
        for ch in section.chars() {
            match ch {
                '#' | '0' => match state {
                    ScanState::Prefix => {
                        state = ScanState::Digits;
                        out.integer_digits = 1;
                    }
                    ScanState::Digits => out.integer_digits += 1,
                    ScanState::Fraction => {
                        out.fraction_max += 1;
                        if ch == '0' {
                            out.fraction_min += 1;
                        }
                    }
                    ScanState::Exponent => out.exponent_digits += 1,
                    ScanState::Suffix => {
                        return Err(MaskError::StrayLiteral(whole.to_string()));
                    }
                },
                ',' => match state {
                    ScanState::Digits => out.grouping = true,
                    ScanState::Prefix => out.prefix.push(ch),
                    ScanState::Suffix => out.suffix.push(ch),
                    ScanState::Fraction | ScanState::Exponent => {
                        return Err(MaskError::StrayLiteral(whole.to_string()));
                    }
                },
                '.' => match state {
                    ScanState::Prefix => state = ScanState::Fraction,
                    ScanState::Digits => state = ScanState::Fraction,
                    ScanState::Fraction | ScanState::Exponent => {
                        return Err(MaskError::MultipleDecimals(whole.to_string()));
                    }
                    ScanState::Suffix => out.suffix.push(ch),
                },
                EXPONENT_MARKER if matches!(state, ScanState::Digits | ScanState::Fraction) => {
                    state = ScanState::Exponent;
                }
                '%' => {
                    out.percent = true;
                    match state {
                        ScanState::Prefix => out.prefix.push(ch),
                        _ => {
                            state = ScanState::Suffix;
                            out.suffix.push(ch);
                        }
                    }
                }
                other => match state {
                    ScanState::Prefix => out.prefix.push(other),
                    ScanState::Suffix => out.suffix.push(other),
                    ScanState::Exponent if out.exponent_digits == 0 => {
                        return Err(MaskError::EmptyExponent(whole.to_string()));
                    }
                    _ => {
                        state = ScanState::Suffix;
                        out.suffix.push(other);
                    }
                },
            }
        }
        if state == ScanState::Exponent && out.exponent_digits == 0 {
            return Err(MaskError::EmptyExponent(whole.to_string()));
        }
        if out.integer_digits == 0 && out.fraction_max == 0 {
            return Err(MaskError::NoDigits(whole.to_string()));
        }
        Ok(out)
    }
}

impl NumericMask {
    pub fn compile(mask: &str) -> Result<Self, MaskError> {
        if mask.matches(';').count() > 1 {
            return Err(MaskError::MultipleSections(mask.to_string()));
        }
        let (positive_text, negative_text) = match mask.split_once(';') {
            Some((positive, negative)) => (positive, Some(negative)),
            None => (mask, None),
        };
        let positive = MaskSection::compile(positive_text, mask)?;
        let negative = negative_text
            .map(|section| MaskSection::compile(section, mask))
            .transpose()?;
        Ok(Self {
            raw: mask.to_string(),
            positive,
            negative,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn percent(&self) -> bool {
        self.positive.percent
    }

    pub fn has_exponent(&self) -> bool {
        self.positive.exponent_digits > 0
    }

    /// Appends `additional` fraction placeholders to every section, growing
    /// the mask in place to accommodate wider values seen later in the
    /// stream. A mask with no fractional section is left unchanged.
    pub fn widen(&mut self, additional: usize) {
        if additional == 0 {
            return;
        }
        let widened = widen_mask(&self.raw, additional);
        if let Ok(mask) = Self::compile(&widened) {
            *self = mask;
        }
    }

    /// Parses a sample under this mask with the given symbol set. `Ok(None)`
    /// is the null representation (an empty sample).
    pub fn parse(
        &self,
        text: &str,
        symbols: &NumericSymbols,
    ) -> Result<Option<Decimal>, ParseRejection> {
        if text.is_empty() {
            return Ok(None);
        }
        let (body, negative) = self.strip_affixes(text)?;
        let mut mantissa = String::with_capacity(body.len());
        let mut fraction_seen = false;
        let mut exponent: Option<String> = None;
        let mut digit_count = 0usize;
        for ch in body.chars() {
            if let Some(exp) = exponent.as_mut() {
                match ch {
                    '0'..='9' => exp.push(ch),
                    '+' | '-' if exp.is_empty() => exp.push(ch),
                    _ => return Err(ParseRejection::BadExponent),
                }
                continue;
            }
            if ch == symbols.decimal {
                if fraction_seen {
                    return Err(ParseRejection::MultipleDecimals);
                }
                fraction_seen = true;
                if mantissa.is_empty() {
                    mantissa.push('0');
                }
                mantissa.push('.');
            } else if ch == symbols.grouping {
                // grouping symbols are skipped; positions are not enforced
            } else if ch == EXPONENT_MARKER {
                exponent = Some(String::new());
            } else if ch.is_ascii_digit() {
                mantissa.push(ch);
                digit_count += 1;
            } else if ch == '+' && mantissa.is_empty() {
                // leading plus sign
            } else {
                return Err(ParseRejection::UnexpectedChar(ch));
            }
        }
        if digit_count == 0 {
            return Err(ParseRejection::NoDigits);
        }
        if mantissa.ends_with('.') {
            mantissa.pop();
        }
        let mut value = match exponent {
            Some(exp) => {
                if exp.is_empty() || exp == "+" || exp == "-" {
                    return Err(ParseRejection::BadExponent);
                }
                Decimal::from_scientific(&format!("{mantissa}e{exp}"))
                    .map_err(|_| ParseRejection::OutOfRange)?
            }
            None => Decimal::from_str(&mantissa).map_err(|_| ParseRejection::OutOfRange)?,
        };
        if negative {
            value.set_sign_negative(true);
        }
        if self.positive.percent {
            value /= Decimal::ONE_HUNDRED;
        }
        Ok(Some(value))
    }

    /// Renders a value under this mask with the given symbol set; the
    /// inverse of [`NumericMask::parse`] up to the mask's precision.
    pub fn format(&self, value: &Decimal, symbols: &NumericSymbols) -> String {
        let negative = value.is_sign_negative() && !value.is_zero();
        let (section, needs_minus) = if negative {
            match &self.negative {
                Some(neg) if !(neg.prefix.is_empty() && neg.suffix.is_empty()) => (neg, false),
                _ => (&self.positive, true),
            }
        } else {
            (&self.positive, false)
        };
        let mut magnitude = value.abs();
        if section.percent {
            magnitude *= Decimal::ONE_HUNDRED;
        }
        let body = if section.exponent_digits > 0 {
            format_scientific(&magnitude, section, symbols)
        } else {
            decimal_body(&magnitude, section, symbols, true)
        };
        let mut out = String::new();
        if needs_minus {
            out.push('-');
        }
        out.push_str(&section.prefix);
        out.push_str(&body);
        out.push_str(&section.suffix);
        out
    }

    fn strip_affixes<'a>(&self, text: &'a str) -> Result<(&'a str, bool), ParseRejection> {
        if let Some(neg) = &self.negative
            && !(neg.prefix.is_empty() && neg.suffix.is_empty())
            && let Some(body) = strip_wrap(text, &neg.prefix, &neg.suffix)
        {
            return Ok((body, true));
        }
        if let Some(rest) = text.strip_prefix('-') {
            let body = strip_wrap(rest, &self.positive.prefix, &self.positive.suffix)
                .ok_or(ParseRejection::AffixMismatch)?;
            return Ok((body, true));
        }
        let body = strip_wrap(text, &self.positive.prefix, &self.positive.suffix)
            .ok_or(ParseRejection::AffixMismatch)?;
        Ok((body, false))
    }
}

fn strip_wrap<'a>(text: &'a str, prefix: &str, suffix: &str) -> Option<&'a str> {
    text.strip_prefix(prefix)?.strip_suffix(suffix)
}

fn widen_mask(mask: &str, additional: usize) -> String {
    match mask.rfind(';') {
        Some(pos) => format!(
            "{};{}",
            widen_piece(&mask[..pos], additional),
            widen_piece(&mask[pos + 1..], additional)
        ),
        None => widen_piece(mask, additional),
    }
}

fn widen_piece(piece: &str, additional: usize) -> String {
    let Some(dot) = piece.rfind('.') else {
        return piece.to_string();
    };
    let fill = piece[dot + 1..].chars().next().unwrap_or('#');
    let mut out = String::with_capacity(piece.len() + additional);
    out.push_str(&piece[..=dot]);
    for _ in 0..additional {
        out.push(fill);
    }
    out.push_str(&piece[dot + 1..]);
    out
}

fn decimal_body(
    value: &Decimal,
    section: &MaskSection,
    symbols: &NumericSymbols,
    grouping: bool,
) -> String {
    let mut scaled = value.round_dp(section.fraction_max as u32).normalize();
    if (scaled.scale() as usize) < section.fraction_min {
        scaled.rescale(section.fraction_min as u32);
    }
    let text = scaled.abs().to_string();
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), ""));
    let int_rendered = if grouping && section.grouping {
        group_digits(int_part, symbols.grouping)
    } else {
        int_part.to_string()
    };
    if frac_part.is_empty() {
        int_rendered
    } else {
        format!("{}{}{}", int_rendered, symbols.decimal, frac_part)
    }
}

fn format_scientific(value: &Decimal, section: &MaskSection, symbols: &NumericSymbols) -> String {
    if value.is_zero() {
        return format!(
            "0{}{}",
            EXPONENT_MARKER,
            render_exponent(0, section.exponent_digits)
        );
    }
    let digits = decimal_digit_count(value) as i64;
    let exponent10 = digits - 1 - value.scale() as i64;
    let mantissa = value / pow10(exponent10);
    let body = decimal_body(&mantissa, section, symbols, false);
    format!(
        "{}{}{}",
        body,
        EXPONENT_MARKER,
        render_exponent(exponent10, section.exponent_digits)
    )
}

fn render_exponent(exponent: i64, min_digits: usize) -> String {
    let magnitude = exponent.unsigned_abs().to_string();
    let padded = if magnitude.len() < min_digits {
        format!("{}{}", "0".repeat(min_digits - magnitude.len()), magnitude)
    } else {
        magnitude
    };
    if exponent < 0 {
        format!("-{padded}")
    } else {
        padded
    }
}

fn pow10(power: i64) -> Decimal {
    if power >= 0 {
        Decimal::from_i128_with_scale(10i128.pow(power as u32), 0)
    } else {
        Decimal::from_i128_with_scale(1, power.unsigned_abs() as u32)
    }
}

fn group_digits(digits: &str, separator: char) -> String {
    let chars: Vec<char> = digits.chars().collect();
    if chars.len() <= 3 {
        return digits.to_string();
    }
    let mut grouped = String::new();
    let mut index = chars.len() % 3;
    if index == 0 {
        index = 3;
    }
    grouped.extend(&chars[..index]);
    while index < chars.len() {
        grouped.push(separator);
        grouped.extend(&chars[index..index + 3]);
        index += 3;
    }
    grouped
}

/// Count of digit/placeholder characters after the last occurrence of
/// `decimal`, stopping at the first character outside `[0-9#]`. Used both
/// to derive a mask's precision and for the locale-naive sample scan.
pub fn scan_precision(text: &str, decimal: char) -> u32 {
    let Some(pos) = text.rfind(decimal) else {
        return 0;
    };
    let tail = &text[pos + decimal.len_utf8()..];
    match PRECISION_PATTERN.find(tail) {
        Some(found) => tail[..found.start()].chars().count() as u32,
        None => tail.chars().count() as u32,
    }
}

/// Fractional precision implied by a numeric mask.
pub fn mask_precision(mask: &str) -> u32 {
    scan_precision(mask, '.')
}

/// Number of significant digits in a decimal's unscaled representation.
pub fn decimal_digit_count(value: &Decimal) -> u32 {
    let mut mantissa = value.mantissa().unsigned_abs();
    if mantissa == 0 {
        return 1;
    }
    let mut digits = 0u32;
    while mantissa > 0 {
        digits += 1;
        mantissa /= 10;
    }
    digits
}

pub fn validate_date_mask(mask: &str) -> Result<(), MaskError> {
    let mut items = StrftimeItems::new(mask);
    if items.any(|item| matches!(item, Item::Error)) {
        return Err(MaskError::BadDateMask(mask.to_string()));
    }
    Ok(())
}

/// Parses `value` under a strftime mask, accepting it only when the mask
/// reproduces the input exactly on re-format. Rejects partially-consumed
/// and non-canonical inputs the way a non-lenient parser would.
pub fn parse_date_strict(value: &str, mask: &str) -> Option<NaiveDateTime> {
    let parsed = NaiveDateTime::parse_from_str(value, mask).ok().or_else(|| {
        NaiveDate::parse_from_str(value, mask)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
    })?;
    (parsed.format(mask).to_string() == value).then_some(parsed)
}
