//! Request parameter sanitization.
//!
//! Every accessor is permissive: malformed input degrades to a default or to
//! `None`, never to an error. Callers that need strict validation must do it
//! themselves.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::dates::DateService;

/// Untyped request parameters (query string and form body merged).
pub type RawParams = BTreeMap<String, String>;

/// Parse `raw`, falling back to `T::default()` when it does not parse.
///
/// This is deliberate lenient coercion: `"abc"` as a number is `0`.
pub fn parse_lenient<T: FromStr + Default>(raw: &str) -> T {
    raw.trim().parse::<T>().unwrap_or_default()
}

/// Trim, drop control characters and strip anything that looks like an HTML tag.
pub fn sanitize_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '<' {
            let opens_tag = chars
                .peek()
                .is_some_and(|n| n.is_ascii_alphabetic() || *n == '/' || *n == '!');
            if opens_tag {
                // Skip to the closing '>' (or the end of input).
                for t in chars.by_ref() {
                    if t == '>' {
                        break;
                    }
                }
                continue;
            }
        }
        if c.is_control() {
            continue;
        }
        out.push(c);
    }
    out.trim().to_string()
}

/// Typed, lenient view over a set of raw parameters.
pub struct Sanitizer<'a> {
    params: &'a RawParams,
}

impl<'a> Sanitizer<'a> {
    pub fn new(params: &'a RawParams) -> Self {
        Self { params }
    }

    pub fn get_raw(&self, key: &str) -> Option<&'a str> {
        self.params.get(key).map(String::as_str)
    }

    /// Present and non-blank.
    fn get_present(&self, key: &str) -> Option<&'a str> {
        self.get_raw(key).filter(|s| !s.trim().is_empty())
    }

    /// Sanitized string; `None` when absent. An empty value stays `Some("")`.
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get_raw(key).map(sanitize_string)
    }

    /// Decimal number; blank is `None`, anything unparseable is `0`.
    pub fn get_double(&self, key: &str) -> Option<f64> {
        self.get_present(key).map(|raw| {
            let v: f64 = parse_lenient(raw);
            if v.is_finite() {
                v
            } else {
                0.0
            }
        })
    }

    /// Integer; blank or unparseable is `None`.
    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get_present(key)
            .and_then(|raw| raw.trim().parse::<i64>().ok())
    }

    /// Date/time via `dates`; blank or unparseable is `None`.
    pub fn get_date(&self, key: &str, dates: &DateService) -> Option<DateTime<Utc>> {
        self.get_present(key).and_then(|raw| dates.parse(raw))
    }
}
