//! Conversion between scalar wire text and typed values.
//!
//! Every function here is pure. Parsers call the `text_to_*` family on form
//! values, header values, and XML text; serializers call the formatting
//! family when writing text protocols.

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use bytes::Bytes;
use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::ScalarError;

const ISO8601: &str = "%Y-%m-%dT%H:%M:%SZ";
const ISO8601_MICRO: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";
const RFC822: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Wire format of a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimestampFormat {
    /// `2024-01-02T03:04:05Z`, with microseconds when present.
    Iso8601,
    /// Integer seconds since the epoch.
    UnixTimestamp,
    /// `Tue, 02 Jan 2024 03:04:05 GMT`.
    Rfc822,
}

impl TimestampFormat {
    /// The format named by a `timestampFormat` trait, else `default`.
    pub fn resolve(explicit: Option<&str>, default: Self) -> Result<Self, ScalarError> {
        explicit.map_or(Ok(default), str::parse)
    }
}

impl FromStr for TimestampFormat {
    type Err = ScalarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "iso8601" => Ok(Self::Iso8601),
            "unixtimestamp" => Ok(Self::UnixTimestamp),
            "rfc822" => Ok(Self::Rfc822),
            _ => Err(ScalarError::UnknownTimestampFormat(s.to_owned())),
        }
    }
}

impl fmt::Display for TimestampFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Iso8601 => "iso8601",
            Self::UnixTimestamp => "unixTimestamp",
            Self::Rfc822 => "rfc822",
        })
    }
}

/// Parse an integer or long.
pub fn text_to_int(text: &str) -> Result<i64, ScalarError> {
    text.trim()
        .parse()
        .map_err(|_| ScalarError::invalid("integer", text))
}

/// Parse a float or double; `NaN` and `Infinity` are accepted.
pub fn text_to_float(text: &str) -> Result<f64, ScalarError> {
    text.trim()
        .parse()
        .map_err(|_| ScalarError::invalid("float", text))
}

/// Parse `true` or `false`, ignoring case.
pub fn text_to_bool(text: &str) -> Result<bool, ScalarError> {
    if text.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if text.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(ScalarError::invalid("boolean", text))
    }
}

/// Decode standard base64.
pub fn text_to_blob(text: &str) -> Result<Bytes, ScalarError> {
    BASE64_STANDARD
        .decode(text.trim())
        .map(Bytes::from)
        .map_err(|_| ScalarError::invalid("base64 blob", text))
}

/// Parse a timestamp in the given format.
pub fn text_to_timestamp(text: &str, format: TimestampFormat) -> Result<DateTime<Utc>, ScalarError> {
    let text = text.trim();
    let parsed = match format {
        TimestampFormat::Iso8601 => parse_iso8601(text),
        TimestampFormat::UnixTimestamp => text.parse::<f64>().ok().and_then(epoch_to_timestamp),
        TimestampFormat::Rfc822 => DateTime::parse_from_rfc2822(text)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
    };
    parsed.ok_or_else(|| ScalarError::invalid("timestamp", text))
}

fn parse_iso8601(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(text.trim_end_matches('Z'), "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|ndt| ndt.and_utc())
        })
}

/// Convert fractional epoch seconds to a timestamp.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn epoch_to_timestamp(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    let whole = seconds.floor();
    let nanos = ((seconds - whole) * 1e9).round() as u32;
    DateTime::from_timestamp(whole as i64, nanos.min(999_999_999))
}

/// Render a boolean.
#[must_use]
pub fn bool_to_text(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

/// Render a float the way AWS text protocols do.
#[must_use]
pub fn float_to_text(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_owned()
    } else if value.is_infinite() && value.is_sign_positive() {
        "Infinity".to_owned()
    } else if value.is_infinite() {
        "-Infinity".to_owned()
    } else {
        value.to_string()
    }
}

/// Base64-encode a blob.
#[must_use]
pub fn blob_to_text(value: &[u8]) -> String {
    BASE64_STANDARD.encode(value)
}

/// Render a timestamp in the given format.
#[must_use]
pub fn timestamp_to_text(value: &DateTime<Utc>, format: TimestampFormat) -> String {
    match format {
        TimestampFormat::Iso8601 if value.timestamp_subsec_micros() > 0 => {
            value.format(ISO8601_MICRO).to_string()
        }
        TimestampFormat::Iso8601 => value.format(ISO8601).to_string(),
        TimestampFormat::UnixTimestamp => value.timestamp().to_string(),
        TimestampFormat::Rfc822 => value.format(RFC822).to_string(),
    }
}
