//! Small shared helpers: ids, timestamps, and tolerant field parsing.

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use regex::Regex;
use serde_json::Value;
use uuid::Uuid;

/// Generate a fresh document id (32 lowercase hex characters).
pub fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Whether `id` has the shape of a document id.
pub fn is_valid_id(id: &str) -> bool {
    Uuid::parse_str(id).is_ok()
}

/// Fixed-width RFC 3339 rendering used for stored timestamps, so that
/// lexicographic order in SQLite matches chronological order.
pub fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Parse the leading `YYYY-MM-DD` of a date or datetime string.
///
/// Example: "2025-01-05T10:00:00.000Z" → 2025-01-05
pub fn parse_date_prefix(raw: &str) -> Option<NaiveDate> {
    let head = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// "January 5, 2025"
pub fn format_long_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

fn non_numeric_regex() -> &'static Regex {
    static NON_NUMERIC_RE: OnceLock<Regex> = OnceLock::new();
    NON_NUMERIC_RE
        .get_or_init(|| Regex::new(r"[^0-9.\-]").expect("non-numeric regex should compile"))
}

/// Parse a human-entered amount such as "₹ 1,20,000" or "45 kg".
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned = non_numeric_regex().replace_all(raw, "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Numeric value of a JSON number or numeric string.
pub fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_amount(s),
        _ => None,
    }
}

/// Date value of a JSON string; anything else is treated as absent.
pub fn date_from_value(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(s) => {
            let parsed = parse_date_prefix(s);
            if parsed.is_none() && !s.trim().is_empty() {
                log::warn!("Ignoring malformed date value {:?}", s);
            }
            parsed
        }
        _ => None,
    }
}

/// Tolerant `deserialize_with` helpers for fields that arrive from forms.
///
/// Numbers may be sent as strings (`"1,20,000"`), dates as full timestamps,
/// and malformed dates are dropped instead of rejecting the whole document.
pub mod lenient {
    use chrono::NaiveDate;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::{date_from_value, number_from_value};

    fn number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        let value = Option::<Value>::deserialize(d)?;
        match value {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(v) => number_from_value(&v)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("expected a number, got {v}"))),
        }
    }

    pub fn opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        number(d)
    }

    pub fn f64_or_zero<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        Ok(number(d)?.unwrap_or(0.0))
    }

    /// Largest whole number an f64 holds exactly.
    const MAX_WHOLE: f64 = 9_007_199_254_740_991.0;

    /// Ceiling for a single rupee amount on a rate card.
    pub const MAX_AMOUNT: i64 = 1_000_000_000_000;

    fn whole<E: serde::de::Error>(n: f64) -> Result<i64, E> {
        let rounded = n.round();
        if rounded.abs() > MAX_WHOLE {
            return Err(E::custom(format!("number {n} is out of range")));
        }
        Ok(rounded as i64)
    }

    pub fn opt_i64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        number(d)?.map(whole::<D::Error>).transpose()
    }

    pub fn i64_or_zero<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        Ok(opt_i64(d)?.unwrap_or(0))
    }

    /// Whole rupee amount between zero and [`MAX_AMOUNT`].
    pub fn amount_or_zero<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        let amount = i64_or_zero(d)?;
        if !(0..=MAX_AMOUNT).contains(&amount) {
            return Err(D::Error::custom(format!(
                "amount {amount} must be between 0 and {MAX_AMOUNT}"
            )));
        }
        Ok(amount)
    }

    pub fn opt_date<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let value = Option::<Value>::deserialize(d)?;
        Ok(value.as_ref().and_then(date_from_value))
    }

    pub fn date_or_today<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        Ok(opt_date(d)?.unwrap_or_else(super::today))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Form {
        #[serde(default, deserialize_with = "lenient::opt_f64")]
        amount: Option<f64>,
        #[serde(default, deserialize_with = "lenient::i64_or_zero")]
        count: i64,
        #[serde(default, deserialize_with = "lenient::opt_date")]
        due: Option<NaiveDate>,
    }

    #[test]
    fn test_parse_amount_strips_formatting() {
        assert_eq!(parse_amount("₹ 1,20,000"), Some(120000.0));
        assert_eq!(parse_amount("450 kg"), Some(450.0));
        assert_eq!(parse_amount("-12.5"), Some(-12.5));
        assert_eq!(parse_amount("n/a"), None);
    }

    #[test]
    fn test_parse_date_prefix() {
        let expected = NaiveDate::from_ymd_opt(2025, 1, 5);
        assert_eq!(parse_date_prefix("2025-01-05"), expected);
        assert_eq!(parse_date_prefix("2025-01-05T10:30:00.000Z"), expected);
        assert_eq!(parse_date_prefix("05/01/2025"), None);
        assert_eq!(parse_date_prefix("2025"), None);
    }

    #[test]
    fn test_format_long_date() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        assert_eq!(format_long_date(date), "January 5, 2025");
    }

    #[test]
    fn test_lenient_fields_accept_strings() {
        let form: Form = serde_json::from_value(json!({
            "amount": "1,500.50",
            "count": "3",
            "due": "2025-02-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(form.amount, Some(1500.5));
        assert_eq!(form.count, 3);
        assert_eq!(form.due, NaiveDate::from_ymd_opt(2025, 2, 1));
    }

    #[test]
    fn test_lenient_fields_drop_bad_dates_and_empty_numbers() {
        let form: Form = serde_json::from_value(json!({
            "amount": "",
            "due": "not a date"
        }))
        .unwrap();
        assert_eq!(form.amount, None);
        assert_eq!(form.count, 0);
        assert_eq!(form.due, None);
    }

    #[test]
    fn test_lenient_number_rejects_garbage() {
        let result: Result<Form, _> = serde_json::from_value(json!({ "amount": "abc" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_lenient_integers_reject_out_of_range() {
        let result: Result<Form, _> =
            serde_json::from_value(json!({ "count": "1000000000000000000000" }));
        assert!(result.is_err());

        #[derive(Debug, Deserialize)]
        struct Rate {
            #[serde(default, deserialize_with = "lenient::amount_or_zero")]
            cost: i64,
        }
        let ok: Rate = serde_json::from_value(json!({ "cost": "₹ 1,000,000,000,000" })).unwrap();
        assert_eq!(ok.cost, lenient::MAX_AMOUNT);
        assert!(serde_json::from_value::<Rate>(json!({ "cost": 1_000_000_000_001i64 })).is_err());
        assert!(serde_json::from_value::<Rate>(json!({ "cost": -1 })).is_err());
    }

    #[test]
    fn test_ids() {
        let id = new_id();
        assert_eq!(id.len(), 32);
        assert!(is_valid_id(&id));
        assert!(!is_valid_id("not-an-id"));
    }
}
