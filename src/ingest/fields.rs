//! Lenient field helpers for hand-exported fitness data.
//!
//! Exports differ per language and device: column names change, decimals use `,` or `.`, and
//! missing measurements show up as `--`. None of the helpers here fail. Each one returns a
//! [Lenient] value which remembers whether it had to fall back, so a genuine `0` can be told
//! apart from "not measured".

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Tokens exporters write instead of leaving a cell empty.
const PLACEHOLDERS: [&str; 3] = ["--", "-", "n/a"];

/// Why a lenient parser produced its default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// The field was not there at all.
    Missing,
    /// The field was empty or one of the placeholder tokens.
    Placeholder,
    /// The field had content that couldn't be understood.
    Malformed,
}

/// A parsed value together with the reason it was defaulted, if it was.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lenient<T> {
    pub value: T,
    pub fallback: Option<Fallback>,
}

impl<T> Lenient<T> {
    pub fn parsed(value: T) -> Self {
        Self {
            value,
            fallback: None,
        }
    }

    pub fn defaulted(value: T, reason: Fallback) -> Self {
        Self {
            value,
            fallback: Some(reason),
        }
    }

    pub fn is_defaulted(&self) -> bool {
        self.fallback.is_some()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lenient<U> {
        Lenient {
            value: f(self.value),
            fallback: self.fallback,
        }
    }
}

impl<T: Default> Lenient<T> {
    fn default_for(reason: Fallback) -> Self {
        Self::defaulted(T::default(), reason)
    }
}

/// Returns the first non-empty value among `candidate_keys`. Callers list locale specific
/// names before generic ones, so the order decides which column wins when both exist.
pub fn first_present_value<'a>(
    row: &'a HashMap<String, String>,
    candidate_keys: &[&str],
) -> Option<&'a str> {
    candidate_keys
        .iter()
        .filter_map(|key| row.get(*key))
        .map(|value| value.trim())
        .find(|value| !value.is_empty())
}

/// Classifies raw text before any number parsing happens.
fn classify(value: Option<&str>) -> Result<&str, Fallback> {
    let Some(value) = value else {
        return Err(Fallback::Missing);
    };
    let value = value.trim();
    if value.is_empty()
        || PLACEHOLDERS
            .iter()
            .any(|placeholder| value.eq_ignore_ascii_case(placeholder))
    {
        return Err(Fallback::Placeholder);
    }
    Ok(value)
}

/// Rewrites a number so Rust can parse it. When both `.` and `,` appear the last one is the
/// decimal separator and the other one groups digits.
fn canonical_decimal(value: &str) -> String {
    let last_dot = value.rfind('.');
    let last_comma = value.rfind(',');
    match (last_dot, last_comma) {
        (Some(dot), Some(comma)) if comma > dot => value.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => value.replace(',', ""),
        (None, Some(_)) => value.replace(',', "."),
        _ => value.to_string(),
    }
}

/// Parses a number written with either decimal separator. Placeholders and garbage become `0.0`.
pub fn parse_lenient_float(value: Option<&str>) -> Lenient<f64> {
    let value = match classify(value) {
        Ok(value) => value,
        Err(reason) => return Lenient::default_for(reason),
    };
    match canonical_decimal(value).parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => Lenient::parsed(parsed),
        _ => Lenient::default_for(Fallback::Malformed),
    }
}

/// Integer flavour of [parse_lenient_float]. Anything that had to be defaulted is `None`, a
/// measured zero stays `Some(0)`.
pub fn parse_lenient_int(value: Option<&str>) -> Lenient<Option<u32>> {
    let parsed = parse_lenient_float(value);
    match parsed.fallback {
        Some(reason) => Lenient::defaulted(None, reason),
        None if parsed.value < 0. || parsed.value > u32::MAX as f64 => {
            Lenient::defaulted(None, Fallback::Malformed)
        }
        None => Lenient::parsed(Some(parsed.value.round() as u32)),
    }
}

/// Whole-number counts such as calories or metres climbed. English exports group thousands with
/// a comma (`1,234`), which would otherwise read as a decimal.
pub fn parse_lenient_count(value: Option<&str>) -> Lenient<Option<u32>> {
    let grouped = value.map(str::trim).filter(|v| {
        !v.contains('.')
            && v.contains(',')
            && v.split(',').skip(1).all(|group| {
                group.len() == 3 && group.chars().all(|c| c.is_ascii_digit())
            })
    });
    match grouped {
        Some(v) => parse_lenient_int(Some(&v.replace(',', ""))),
        None => parse_lenient_int(value),
    }
}

/// Accepts `HH:MM:SS`, `MM:SS` or bare seconds. The last component may carry a fraction and is
/// rounded to the nearest second.
pub fn parse_duration_to_seconds(text: Option<&str>) -> Lenient<u32> {
    let value = match classify(text) {
        Ok(value) => value,
        Err(reason) => return Lenient::default_for(reason),
    };

    let seconds = if value.contains(':') {
        let parts = value.split(':').collect::<Vec<_>>();
        match parts.as_slice() {
            [hours, minutes, seconds] => clock_seconds(Some(*hours), minutes, seconds),
            [minutes, seconds] => clock_seconds(None, minutes, seconds),
            _ => None,
        }
    } else {
        canonical_decimal(value)
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.)
    };

    match seconds {
        Some(seconds) if seconds <= u32::MAX as f64 => Lenient::parsed(seconds.round() as u32),
        _ => Lenient::default_for(Fallback::Malformed),
    }
}

/// Joins clock components. Empty components count as zero, whole components must be integers.
fn clock_seconds(hours: Option<&str>, minutes: &str, seconds: &str) -> Option<f64> {
    fn whole(part: &str) -> Option<f64> {
        let part = part.trim();
        if part.is_empty() {
            return Some(0.);
        }
        part.parse::<u32>().ok().map(f64::from)
    }

    let hours = match hours {
        Some(hours) => whole(hours)?,
        None => 0.,
    };
    let minutes = whole(minutes)?;
    let seconds = match seconds.trim() {
        "" => 0.,
        s => canonical_decimal(s).parse::<f64>().ok()?,
    };
    if !seconds.is_finite() || seconds < 0. {
        return None;
    }
    Some(hours * 3600. + minutes * 60. + seconds)
}

/// Accepts `MM:SS` or `MM:SS/km` and returns seconds per kilometre.
pub fn parse_pace_to_seconds_per_km(text: Option<&str>) -> Lenient<u32> {
    let value = match classify(text) {
        Ok(value) => value,
        Err(reason) => return Lenient::default_for(reason),
    };
    let value = value.trim_end_matches("/km").trim_end_matches(" min").trim();

    let Some((minutes, seconds)) = value.split_once(':') else {
        return Lenient::default_for(Fallback::Malformed);
    };
    match clock_seconds(None, minutes, seconds) {
        Some(pace) if !seconds.contains(':') => Lenient::parsed(pace.round() as u32),
        _ => Lenient::default_for(Fallback::Malformed),
    }
}

/// Canonical `HH:MM:SS` rendering. Hours are not wrapped, a 30 hour total stays `30:00:00`.
pub fn format_seconds_as_hms(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Canonical pace label, `M:SS/km`, or `--/km` when there is no pace to show.
pub fn format_pace_label(seconds_per_km: u32) -> String {
    if seconds_per_km == 0 {
        return "--/km".into();
    }
    format!("{}:{:02}/km", seconds_per_km / 60, seconds_per_km % 60)
}

const DATE_TIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

const DATE_FORMATS: [&str; 2] = ["%d/%m/%Y", "%Y-%m-%d"];

/// Tries every date shape the exports have been seen to use, first match wins. The calendar
/// date is taken as written, timezone suffixes do not shift it.
pub fn parse_flexible_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(moment) = DateTime::parse_from_rfc3339(text) {
        return Some(moment.date_naive());
    }

    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|moment| moment.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        })
}
