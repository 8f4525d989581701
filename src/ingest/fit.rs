use std::{path::Path, sync::Arc};

use anyhow::{Context, Result};

use super::{FitSession, RawActivity};

/// Reads the session summary out of a FIT activity file. A file normally has exactly one
/// session, multisport files can have several.
pub async fn read_fit_file(path: &Path) -> Result<Vec<RawActivity>> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {path:?}"))?;
    let file: Arc<str> = path.to_string_lossy().into();
    let sessions = parse_fit_sessions(file, &bytes)?;
    Ok(sessions.into_iter().map(RawActivity::FitSession).collect())
}

#[cfg(feature = "fit")]
pub fn parse_fit_sessions(file: Arc<str>, bytes: &[u8]) -> Result<Vec<FitSession>> {
    use chrono::Utc;
    use fitparser::{de::from_bytes, profile::MesgNum, Value as FitValue};

    let messages = from_bytes(bytes).with_context(|| format!("Failed to parse {file}"))?;

    let mut sessions = vec![];
    for message in messages {
        if message.kind() != MesgNum::Session {
            continue;
        }
        let mut session = FitSession {
            file: file.clone(),
            ..Default::default()
        };
        for field in message.fields() {
            let value = field.value();
            match field.name() {
                "start_time" => {
                    if let FitValue::Timestamp(ts) = value {
                        session.start_time = Some(ts.with_timezone(&Utc));
                    }
                }
                "sport" => session.sport = Some(value.to_string()),
                "total_distance" => session.total_distance_m = fit_value_to_f64(value),
                "total_timer_time" => session.total_timer_time_s = fit_value_to_f64(value),
                "avg_heart_rate" => session.avg_heart_rate = fit_value_to_f64(value),
                "max_heart_rate" => session.max_heart_rate = fit_value_to_f64(value),
                "total_calories" => session.total_calories = fit_value_to_f64(value),
                "total_ascent" => session.total_ascent_m = fit_value_to_f64(value),
                _ => {}
            }
        }
        sessions.push(session);
    }
    Ok(sessions)
}

/// Without the `fit` feature there is no decoder, callers treat this like an unreadable file.
#[cfg(not(feature = "fit"))]
pub fn parse_fit_sessions(file: Arc<str>, _bytes: &[u8]) -> Result<Vec<FitSession>> {
    anyhow::bail!("Can't read {file}: FIT support was not compiled in (enable the `fit` feature)")
}

#[cfg(feature = "fit")]
fn fit_value_to_f64(value: &fitparser::Value) -> Option<f64> {
    use fitparser::Value as FitValue;

    match value {
        FitValue::Float32(v) => Some(*v as f64),
        FitValue::Float64(v) => Some(*v),
        FitValue::SInt8(v) => Some(*v as f64),
        FitValue::SInt16(v) => Some(*v as f64),
        FitValue::SInt32(v) => Some(*v as f64),
        FitValue::SInt64(v) => Some(*v as f64),
        FitValue::UInt8(v) => Some(*v as f64),
        FitValue::UInt16(v) => Some(*v as f64),
        FitValue::UInt32(v) => Some(*v as f64),
        FitValue::UInt64(v) => Some(*v as f64),
        FitValue::String(s) => s.parse().ok(),
        FitValue::Array(values) => values.iter().find_map(fit_value_to_f64),
        _ => None,
    }
}
