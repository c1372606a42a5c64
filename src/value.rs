use std::fmt;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;

/// A successfully converted sample. Candidates only ever compare values of
/// their own kind, so ordering across variants is a logic error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TypedValue {
    String(String),
    Boolean(bool),
    Integer(i64),
    Number(Decimal),
    Date(NaiveDateTime),
}

impl Eq for TypedValue {}

impl TypedValue {
    pub fn as_display(&self) -> String {
        match self {
            TypedValue::String(s) => s.clone(),
            TypedValue::Boolean(b) => b.to_string(),
            TypedValue::Integer(i) => i.to_string(),
            TypedValue::Number(n) => n.to_string(),
            TypedValue::Date(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

impl Ord for TypedValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match (self, other) {
            (TypedValue::String(a), TypedValue::String(b)) => a.cmp(b),
            (TypedValue::Boolean(a), TypedValue::Boolean(b)) => a.cmp(b),
            (TypedValue::Integer(a), TypedValue::Integer(b)) => a.cmp(b),
            (TypedValue::Number(a), TypedValue::Number(b)) => a.cmp(b),
            (TypedValue::Date(a), TypedValue::Date(b)) => a.cmp(b),
            _ => panic!("Cannot compare heterogeneous TypedValue variants"),
        }
    }
}

impl PartialOrd for TypedValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_variants_order_naturally() {
        assert!(TypedValue::Integer(2) < TypedValue::Integer(10));
        assert!(TypedValue::String("10".into()) < TypedValue::String("2".into()));
        assert!(TypedValue::Number(Decimal::new(15, 1)) < TypedValue::Number(Decimal::new(2, 0)));
    }

    #[test]
    #[should_panic(expected = "heterogeneous")]
    fn heterogeneous_comparison_panics() {
        let _ = TypedValue::Integer(1).cmp(&TypedValue::String("1".into()));
    }

    #[test]
    fn display_formats_dates_canonically() {
        let dt = chrono::NaiveDate::from_ymd_opt(2023, 1, 15)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        assert_eq!(TypedValue::Date(dt).as_display(), "2023-01-15 08:30:00");
    }
}
