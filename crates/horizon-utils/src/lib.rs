//! Utility functions and helpers
//!
//! Pure functions only: formatting of dates and amounts, category
//! counting, transaction status, shareable id encoding and query string
//! rebuilding for page links.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, URL_SAFE};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use thiserror::Error;

/// Errors produced by the fallible helpers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UtilsError {
    #[error("Invalid encoded identifier: {message}")]
    InvalidEncoding { message: String },

    #[error("Decoded identifier is not valid UTF-8")]
    InvalidUtf8,
}

// ==================== Dates ====================

/// The four renderings of a timestamp shown by the dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedDateTime {
    /// e.g. "Wed, Oct 14, 3:05 PM"
    pub date_time: String,
    /// e.g. "Wed, 10/14/2026"
    pub date_day: String,
    /// e.g. "Oct 14, 2026"
    pub date_only: String,
    /// e.g. "3:05 PM"
    pub time_only: String,
}

/// Format a timestamp in en-US style, in whatever zone `timestamp` carries.
///
/// The caller picks the zone, so output is deterministic for a given
/// timestamp and offset.
pub fn format_date_time<Tz>(timestamp: &DateTime<Tz>) -> FormattedDateTime
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    FormattedDateTime {
        date_time: timestamp.format("%a, %b %-d, %-I:%M %p").to_string(),
        date_day: timestamp.format("%a, %m/%d/%Y").to_string(),
        date_only: timestamp.format("%b %-d, %Y").to_string(),
        time_only: timestamp.format("%-I:%M %p").to_string(),
    }
}

// ==================== Amounts ====================

/// Group the digits of a whole number with thousands separators
fn group_thousands(digits: &str) -> String {
    let mut result = String::with_capacity(digits.len() + digits.len() / 3);
    let mut count = 0;
    for c in digits.chars().rev() {
        if count == 3 {
            result.push(',');
            count = 0;
        }
        result.push(c);
        count += 1;
    }
    result.chars().rev().collect()
}

/// Format an amount as US dollars with exactly two fraction digits.
///
/// `1250.36` becomes `"$1,250.36"` and `-4.5` becomes `"-$4.50"`. Half
/// cents round away from zero, so `0.125` becomes `"$0.13"`.
pub fn format_amount(amount: f64) -> String {
    if amount.is_nan() {
        return "$NaN".to_string();
    }
    if amount.is_infinite() {
        let symbol = if amount < 0.0 { "-$∞" } else { "$∞" };
        return symbol.to_string();
    }

    let rounded = match Decimal::from_f64_retain(amount) {
        Some(value) => value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        // Beyond Decimal's range there are no cents left to round
        None => return format_large_amount(amount),
    };

    let fixed = format!("{:.2}", rounded.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };

    format!("{}${}.{}", sign, group_thousands(whole), fraction)
}

fn format_large_amount(amount: f64) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{}${}.00", sign, group_thousands(&format!("{:.0}", amount.abs())))
}

// ==================== Categories ====================

/// Number of transactions in one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    pub name: String,
    pub count: usize,
    /// Number of transactions across all categories
    pub total_count: usize,
}

/// Count occurrences of each category name.
///
/// Results are ordered by count descending; equal counts keep the order
/// in which the category was first seen.
pub fn count_categories<'a, I>(categories: I) -> Vec<CategoryCount>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: Vec<CategoryCount> = Vec::new();
    let mut positions: HashMap<&'a str, usize> = HashMap::new();
    let mut total = 0;

    for category in categories {
        total += 1;
        match positions.get(category) {
            Some(&position) => counts[position].count += 1,
            None => {
                positions.insert(category, counts.len());
                counts.push(CategoryCount {
                    name: category.to_string(),
                    count: 1,
                    total_count: 0,
                });
            }
        }
    }

    for entry in &mut counts {
        entry.total_count = total;
    }
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

// ==================== Status ====================

/// Settlement status derived from a transaction's age
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    /// Dated within the last two days
    Processing,
    /// Older than two days
    Success,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionStatus::Processing => write!(f, "Processing"),
            TransactionStatus::Success => write!(f, "Success"),
        }
    }
}

/// Classify a transaction dated `date` as seen at `now`.
///
/// A date strictly later than two days before `now` is still processing;
/// exactly two days old counts as settled.
pub fn transaction_status(date: DateTime<Utc>, now: DateTime<Utc>) -> TransactionStatus {
    if date > now - Duration::days(2) {
        TransactionStatus::Processing
    } else {
        TransactionStatus::Success
    }
}

// ==================== Identifiers ====================

/// Accepts padded or unpadded input in the standard alphabet
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encode an identifier for use in a shareable URL.
///
/// This is URL-safe base64 over the UTF-8 bytes, so the result never
/// contains `/` or `+`. It obfuscates the id, it does not hide it: anyone
/// can decode it, so it must never gate access to data.
pub fn encode_id(id: &str) -> String {
    URL_SAFE.encode(id.as_bytes())
}

/// Reverse [`encode_id`].
///
/// Both alphabets are accepted, with or without padding, so ids encoded
/// with the standard alphabet still resolve.
pub fn decode_id(encoded: &str) -> Result<String, UtilsError> {
    let normalized: String = encoded
        .trim()
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    let bytes = LENIENT
        .decode(normalized)
        .map_err(|e| UtilsError::InvalidEncoding {
            message: e.to_string(),
        })?;
    String::from_utf8(bytes).map_err(|_| UtilsError::InvalidUtf8)
}

// ==================== Strings ====================

/// Set `key` to `value` in `query` and rebuild `pathname?query`.
///
/// Keys are emitted in sorted order and valueless keys are dropped.
pub fn form_url_query(pathname: &str, query: &str, key: &str, value: &str) -> String {
    let mut params: BTreeMap<String, Option<String>> = BTreeMap::new();

    for pair in query.trim_start_matches('?').split('&') {
        if pair.is_empty() {
            continue;
        }
        let (raw_key, raw_value) = match pair.split_once('=') {
            Some((k, v)) => (k, Some(v)),
            None => (pair, None),
        };
        params.insert(decode_component(raw_key), raw_value.map(decode_component));
    }
    params.insert(key.to_string(), Some(value.to_string()));

    let encoded: Vec<String> = params
        .iter()
        .filter_map(|(k, v)| {
            v.as_ref()
                .map(|v| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        })
        .collect();

    if encoded.is_empty() {
        pathname.to_string()
    } else {
        format!("{}?{}", pathname, encoded.join("&"))
    }
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}
