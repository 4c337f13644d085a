//! Textual forms of floats, instants, booleans and durations.

use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};

/// Layout accepted for instants without an offset; interpreted as UTC
const DATETIME_LAYOUT: &str = "%Y-%m-%d %H:%M:%S";

/// Render a float in exponent form with eight fractional digits and a signed
/// exponent of at least two digits: `777.0` becomes `7.77000000e+02`
pub fn format_exponent(v: f64) -> String {
    if v.is_nan() {
        return "NaN".to_owned();
    }
    if v.is_infinite() {
        return if v > 0.0 { "+Inf" } else { "-Inf" }.to_owned();
    }

    let rendered = format!("{v:.8e}");
    let Some((mantissa, exponent)) = rendered.split_once('e') else {
        return rendered;
    };
    let exponent: i32 = exponent.parse().unwrap_or_default();
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{mantissa}e{sign}{:02}", exponent.unsigned_abs())
}

/// Parse a float literal at the width of `T`
///
/// A finite literal beyond the width's range fails instead of becoming an
/// infinity. Spelled-out `inf` and `NaN` are accepted.
pub(crate) fn parse_float<T>(literal: &str) -> Result<T, String>
where
    T: FromStr + Into<f64> + Copy,
    T::Err: Display,
{
    let v: T = literal.parse().map_err(|e: T::Err| e.to_string())?;
    let wide: f64 = v.into();
    if wide.is_infinite() && !literal.to_ascii_lowercase().contains("inf") {
        return Err("value out of range".to_owned());
    }
    Ok(v)
}

/// Round a double to the nearest single; `None` when a finite double lies
/// beyond the single range
pub(crate) fn narrow_float(v: f64) -> Option<f32> {
    let n = v as f32;
    (n.is_finite() || !v.is_finite()).then_some(n)
}

/// RFC3339 in UTC with the fractional second trimmed of trailing zeros
pub fn format_time(t: &DateTime<Utc>) -> String {
    let mut out = t.format("%Y-%m-%dT%H:%M:%S").to_string();
    let nanos = t.timestamp_subsec_nanos();
    if nanos > 0 {
        let fraction = format!("{nanos:09}");
        out.push('.');
        out.push_str(fraction.trim_end_matches('0'));
    }
    out.push('Z');
    out
}

/// Parse `YYYY-MM-DD HH:MM:SS` (as UTC) or RFC3339
pub fn parse_time(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, DATETIME_LAYOUT) {
        return Some(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Boolean literals: `1 t T TRUE true True` and `0 f F FALSE false False`
pub fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Parse a duration such as `1h30m`, `1.5s`, `-300ms` or `2µs`
///
/// Units are `ns`, `us` (or `µs`), `ms`, `s`, `m` and `h`. A lone `0` needs no
/// unit. Fractions finer than a nanosecond are truncated.
pub fn parse_duration(input: &str) -> Option<TimeDelta> {
    let (negative, mut rest) = match input.as_bytes().first() {
        Some(b'-') => (true, &input[1..]),
        Some(b'+') => (false, &input[1..]),
        _ => (false, input),
    };
    if rest == "0" {
        return Some(TimeDelta::zero());
    }
    if rest.is_empty() {
        return None;
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let int_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        let (whole, tail) = rest.split_at(int_len);
        let (fraction, tail) = match tail.strip_prefix('.') {
            Some(after_dot) => {
                let frac_len = after_dot.bytes().take_while(u8::is_ascii_digit).count();
                after_dot.split_at(frac_len)
            }
            None => ("", tail),
        };
        if whole.is_empty() && fraction.is_empty() {
            return None;
        }

        let unit_len = tail
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);
        rest = tail;

        let scale: u128 = match unit {
            "ns" => 1,
            "us" | "µs" | "μs" => 1_000,
            "ms" => 1_000_000,
            "s" => 1_000_000_000,
            "m" => 60 * 1_000_000_000,
            "h" => 3_600 * 1_000_000_000,
            _ => return None,
        };

        let whole: u128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
        total = total.checked_add(whole.checked_mul(scale)?)?;

        if !fraction.is_empty() {
            // 18 digits is already far below nanosecond resolution for hours
            let digits = &fraction[..fraction.len().min(18)];
            let numerator: u128 = digits.parse().ok()?;
            let denominator = 10u128.pow(digits.len() as u32);
            total = total.checked_add(numerator * scale / denominator)?;
        }
    }

    let nanos = if negative {
        if total > i64::MAX as u128 + 1 {
            return None;
        }
        (total as i128).checked_neg().and_then(|n| i64::try_from(n).ok())?
    } else {
        i64::try_from(total).ok()?
    };
    Some(TimeDelta::nanoseconds(nanos))
}
