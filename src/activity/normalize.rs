//! Turns raw source records into [Activity] values.
//!
//! Every source is first mapped onto [SourceFields], a flat view with lenient values. The
//! admission rules and the derived fields are then applied in one place, so a CSV row and a
//! Strava entry describing the same run produce the same activity.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    ingest::{
        fields::{
            first_present_value, format_pace_label, format_seconds_as_hms, parse_duration_to_seconds,
            parse_flexible_date, parse_lenient_count, parse_lenient_float, parse_lenient_int,
            parse_pace_to_seconds_per_km, Fallback, Lenient,
        },
        CsvRecord, FitSession, RawActivity, StravaActivity,
    },
    utils::{clock::Clock, round::round_to, time::display_date},
};

use super::entities::Activity;

pub const DEFAULT_TITLE: &str = "Run";

/// Fields of an activity as the rest of the crate knows them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanonicalField {
    Date,
    Title,
    Distance,
    Time,
    AvgPace,
    AvgHr,
    MaxHr,
    Calories,
    Ascent,
    ActivityType,
}

/// Header names accepted for each field of a CSV export, most specific first.
#[derive(Debug, Clone)]
pub struct CsvAliases {
    pub date: &'static [&'static str],
    pub title: &'static [&'static str],
    pub distance: &'static [&'static str],
    pub time: &'static [&'static str],
    pub avg_pace: &'static [&'static str],
    pub avg_hr: &'static [&'static str],
    pub max_hr: &'static [&'static str],
    pub calories: &'static [&'static str],
    pub ascent: &'static [&'static str],
    pub activity_type: &'static [&'static str],
}

impl CsvAliases {
    /// Garmin Connect exports, in Portuguese and English.
    pub const GARMIN: CsvAliases = CsvAliases {
        date: &["Data", "Date"],
        title: &["Título", "Title"],
        distance: &["Distância", "Distância (km)", "Distance"],
        time: &["Tempo", "Time"],
        avg_pace: &["Ritmo médio", "Avg Pace"],
        avg_hr: &["FC Média", "Avg HR"],
        max_hr: &["FC máxima", "Max HR"],
        calories: &["Calorias", "Calories"],
        ascent: &["Subida total", "Total Ascent"],
        activity_type: &["Tipo de atividade", "Activity Type"],
    };

    pub fn candidates(&self, field: CanonicalField) -> &'static [&'static str] {
        match field {
            CanonicalField::Date => self.date,
            CanonicalField::Title => self.title,
            CanonicalField::Distance => self.distance,
            CanonicalField::Time => self.time,
            CanonicalField::AvgPace => self.avg_pace,
            CanonicalField::AvgHr => self.avg_hr,
            CanonicalField::MaxHr => self.max_hr,
            CanonicalField::Calories => self.calories,
            CanonicalField::Ascent => self.ascent,
            CanonicalField::ActivityType => self.activity_type,
        }
    }
}

/// Why a record didn't become an activity.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    #[error("distance is missing or not positive")]
    NoDistance,
    #[error("duration is missing or not positive")]
    NoDuration,
    #[error("activity type {0:?} is not a run")]
    NotRunning(String),
}

/// An admitted activity and the fields that had to be defaulted on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub activity: Activity,
    pub defaulted: Vec<(CanonicalField, Fallback)>,
}

/// Result of normalizing a whole batch.
#[derive(Debug, Default)]
pub struct NormalizeReport {
    pub activities: Vec<Activity>,
    pub skipped: usize,
}

/// Flat, source independent view of one record.
struct SourceFields {
    date: Lenient<Option<NaiveDate>>,
    title: Option<String>,
    distance_km: Lenient<f64>,
    time_seconds: Lenient<u32>,
    pace_seconds: Lenient<u32>,
    avg_hr: Lenient<Option<u32>>,
    max_hr: Lenient<Option<u32>>,
    calories: Lenient<Option<u32>>,
    ascent: Lenient<Option<u32>>,
    activity_type: Option<String>,
}

pub struct Normalizer {
    aliases: CsvAliases,
    clock: Arc<dyn Clock>,
    default_title: String,
}

impl Normalizer {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            aliases: CsvAliases::GARMIN,
            clock,
            default_title: DEFAULT_TITLE.into(),
        }
    }

    pub fn with_aliases(self, aliases: CsvAliases) -> Self {
        Self { aliases, ..self }
    }

    pub fn with_default_title(self, default_title: impl Into<String>) -> Self {
        Self {
            default_title: default_title.into(),
            ..self
        }
    }

    pub fn normalize(&self, raw: &RawActivity) -> Result<Normalized, Rejection> {
        let fields = match raw {
            RawActivity::GarminCsv(row) => self.csv_fields(row),
            RawActivity::FitSession(session) => fit_fields(session),
            RawActivity::Strava(activity) => strava_fields(activity),
        };
        self.admit(fields, raw)
    }

    /// Normalizes every record in order. Rejections are logged and counted, never fatal.
    pub fn normalize_all(&self, records: &[RawActivity]) -> NormalizeReport {
        let mut report = NormalizeReport::default();
        for raw in records {
            match self.normalize(raw) {
                Ok(normalized) => report.activities.push(normalized.activity),
                Err(rejection) => {
                    warn!("Skipping {}: {rejection}", origin(raw));
                    report.skipped += 1;
                }
            }
        }
        report
    }

    fn csv_fields(&self, row: &CsvRecord) -> SourceFields {
        let value = |field| first_present_value(&row.fields, self.aliases.candidates(field));

        let date = match value(CanonicalField::Date) {
            None => Lenient::defaulted(None, Fallback::Missing),
            Some(text) => match parse_flexible_date(text) {
                Some(date) => Lenient::parsed(Some(date)),
                None => Lenient::defaulted(None, Fallback::Malformed),
            },
        };

        SourceFields {
            date,
            title: value(CanonicalField::Title).map(str::to_string),
            distance_km: parse_lenient_float(value(CanonicalField::Distance)),
            time_seconds: parse_duration_to_seconds(value(CanonicalField::Time)),
            pace_seconds: parse_pace_to_seconds_per_km(value(CanonicalField::AvgPace)),
            avg_hr: parse_lenient_int(value(CanonicalField::AvgHr)),
            max_hr: parse_lenient_int(value(CanonicalField::MaxHr)),
            calories: parse_lenient_count(value(CanonicalField::Calories)),
            ascent: parse_lenient_count(value(CanonicalField::Ascent)),
            activity_type: value(CanonicalField::ActivityType).map(str::to_string),
        }
    }

    fn admit(&self, fields: SourceFields, raw: &RawActivity) -> Result<Normalized, Rejection> {
        if let Some(kind) = fields.activity_type.as_deref() {
            if !kind.trim().is_empty() && !is_running_type(kind) {
                return Err(Rejection::NotRunning(kind.to_string()));
            }
        }

        let distance = round_to(fields.distance_km.value, 2);
        if distance <= 0. {
            return Err(Rejection::NoDistance);
        }
        let time_seconds = fields.time_seconds.value;
        if time_seconds == 0 {
            return Err(Rejection::NoDuration);
        }

        let mut defaulted = vec![];
        let mut note = |field: CanonicalField, fallback: Option<Fallback>| {
            if let Some(reason) = fallback {
                defaulted.push((field, reason));
            }
        };

        let iso_date = match fields.date.value {
            Some(date) => date,
            None => {
                let today = self.clock.time().date_naive();
                warn!("No usable date in {}, using {today}", origin(raw));
                today
            }
        };
        note(CanonicalField::Date, fields.date.fallback);

        let title = match fields.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => {
                note(CanonicalField::Title, Some(Fallback::Missing));
                self.default_title.clone()
            }
        };

        let pace_seconds = if fields.pace_seconds.value > 0 {
            fields.pace_seconds.value
        } else {
            note(
                CanonicalField::AvgPace,
                Some(fields.pace_seconds.fallback.unwrap_or(Fallback::Malformed)),
            );
            (time_seconds as f64 / distance).round() as u32
        };

        note(CanonicalField::AvgHr, fields.avg_hr.fallback);
        note(CanonicalField::MaxHr, fields.max_hr.fallback);
        note(CanonicalField::Calories, fields.calories.fallback);
        note(CanonicalField::Ascent, fields.ascent.fallback);

        let activity = Activity {
            date: display_date(iso_date),
            iso_date,
            title,
            distance,
            time: format_seconds_as_hms(time_seconds as u64),
            time_seconds,
            pace: format_pace_label(pace_seconds),
            pace_seconds,
            avg_hr: fields.avg_hr.value,
            max_hr: fields.max_hr.value,
            calories: fields.calories.value.unwrap_or(0),
            elevation_gain: fields.ascent.value.unwrap_or(0),
        };
        if !defaulted.is_empty() {
            debug!("Defaulted {defaulted:?} for {}", origin(raw));
        }
        Ok(Normalized {
            activity,
            defaulted,
        })
    }
}

/// Running, trail running, treadmill, virtual runs and the Portuguese "Corrida".
pub fn is_running_type(kind: &str) -> bool {
    let kind = kind.to_lowercase();
    kind.contains("run") || kind.contains("corrida")
}

fn fit_fields(session: &FitSession) -> SourceFields {
    SourceFields {
        date: match session.start_time {
            Some(start) => Lenient::parsed(Some(start.with_timezone(&Local).date_naive())),
            None => Lenient::defaulted(None, Fallback::Missing),
        },
        title: None,
        distance_km: measured(session.total_distance_m).map(|m| m / 1000.),
        time_seconds: measured(session.total_timer_time_s).map(|s| s.round() as u32),
        pace_seconds: Lenient::defaulted(0, Fallback::Missing),
        avg_hr: measured_count(session.avg_heart_rate),
        max_hr: measured_count(session.max_heart_rate),
        calories: measured_count(session.total_calories),
        ascent: measured_count(session.total_ascent_m),
        activity_type: session.sport.clone(),
    }
}

fn strava_fields(activity: &StravaActivity) -> SourceFields {
    let date_text = activity
        .start_date_local
        .as_deref()
        .or(activity.start_date.as_deref());
    SourceFields {
        date: match date_text {
            None => Lenient::defaulted(None, Fallback::Missing),
            Some(text) => match parse_flexible_date(text) {
                Some(date) => Lenient::parsed(Some(date)),
                None => Lenient::defaulted(None, Fallback::Malformed),
            },
        },
        title: activity.name.clone(),
        distance_km: measured(Some(activity.distance)).map(|m| m / 1000.),
        time_seconds: Lenient::parsed(activity.moving_time),
        pace_seconds: Lenient::defaulted(0, Fallback::Missing),
        avg_hr: measured_count(activity.average_heartrate),
        max_hr: measured_count(activity.max_heartrate),
        calories: measured_count(activity.calories),
        ascent: measured_count(activity.total_elevation_gain),
        activity_type: activity.sport_type.clone().or_else(|| activity.kind.clone()),
    }
}

fn measured(value: Option<f64>) -> Lenient<f64> {
    match value {
        None => Lenient::defaulted(0., Fallback::Missing),
        Some(v) if v.is_finite() && v >= 0. => Lenient::parsed(v),
        Some(_) => Lenient::defaulted(0., Fallback::Malformed),
    }
}

fn measured_count(value: Option<f64>) -> Lenient<Option<u32>> {
    match value {
        None => Lenient::defaulted(None, Fallback::Missing),
        Some(v) if v.is_finite() && v >= 0. && v <= u32::MAX as f64 => {
            Lenient::parsed(Some(v.round() as u32))
        }
        Some(_) => Lenient::defaulted(None, Fallback::Malformed),
    }
}

/// Where a record came from, for log lines.
fn origin(raw: &RawActivity) -> String {
    match raw {
        RawActivity::GarminCsv(row) => format!("{}:{}", row.file, row.line),
        RawActivity::FitSession(session) => session.file.to_string(),
        RawActivity::Strava(activity) => format!(
            "Strava activity {:?}",
            activity.name.as_deref().unwrap_or_default()
        ),
    }
}
