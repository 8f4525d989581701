//! Activities as the earlier export scripts stored them.
//!
//! Those entries carry the raw export date, `total_time` in seconds and `average_pace` in
//! decimal minutes per kilometre, without any of the derived display fields.

use serde::Deserialize;
use tracing::warn;

use crate::{
    activity::{entities::lenient_ser, Activity},
    ingest::fields::{format_pace_label, format_seconds_as_hms, parse_flexible_date},
    utils::{round::round_to, time::display_date},
};

/// One entry of a stored activity list, in either generation.
#[derive(Deserialize)]
#[serde(untagged)]
pub enum StoredActivity {
    Current(Activity),
    Legacy(LegacyActivity),
}

#[derive(Debug, Deserialize)]
pub struct LegacyActivity {
    pub date: String,
    pub distance: f64,
    #[serde(default, deserialize_with = "lenient_ser::deserialize_u32")]
    pub total_time: u32,
    #[serde(default, deserialize_with = "lenient_ser::deserialize_u32")]
    pub calories: u32,
    #[serde(default, deserialize_with = "lenient_ser::deserialize_opt_u32")]
    pub average_heartrate: Option<u32>,
    /// Decimal minutes per kilometre.
    #[serde(default)]
    pub average_pace: Option<f64>,
}

impl LegacyActivity {
    /// `None` when the entry has no readable date, no distance or no duration.
    pub fn into_activity(self, title: &str) -> Option<Activity> {
        let Some(iso_date) = parse_flexible_date(&self.date) else {
            warn!("Dropping stored activity with unreadable date {:?}", self.date);
            return None;
        };
        let distance = round_to(self.distance, 2);
        if distance <= 0. || self.total_time == 0 {
            warn!("Dropping stored activity of {iso_date} without distance or duration");
            return None;
        }

        let pace_seconds = match self.average_pace {
            Some(minutes) if minutes.is_finite() && minutes > 0. => (minutes * 60.).round() as u32,
            _ => (self.total_time as f64 / distance).round() as u32,
        };
        Some(Activity {
            date: display_date(iso_date),
            iso_date,
            title: title.to_string(),
            distance,
            time: format_seconds_as_hms(self.total_time as u64),
            time_seconds: self.total_time,
            pace: format_pace_label(pace_seconds),
            pace_seconds,
            avg_hr: self.average_heartrate,
            max_hr: None,
            calories: self.calories,
            elevation_gain: 0,
        })
    }
}

impl StoredActivity {
    pub fn into_activity(self, title: &str) -> Option<Activity> {
        match self {
            StoredActivity::Current(activity) => Some(activity),
            StoredActivity::Legacy(legacy) => legacy.into_activity(title),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::StoredActivity;

    fn parse(json: &str) -> StoredActivity {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn script_entry_becomes_activity() {
        let entry = parse(
            r#"{
                "date": "2024-06-10 07:02:11", "distance": 10.004, "total_time": 3075,
                "calories": 702, "average_heartrate": 149,
                "average_pace": 5.123, "average_speed": 11.71
            }"#,
        );
        let activity = entry.into_activity("Run").unwrap();

        assert_eq!(activity.iso_date, NaiveDate::from_ymd_opt(2024, 6, 10).unwrap());
        assert_eq!(activity.date, "10/06/2024");
        assert_eq!(activity.title, "Run");
        assert_eq!(activity.distance, 10.0);
        assert_eq!(activity.time, "00:51:15");
        assert_eq!(activity.time_seconds, 3075);
        // 5.123 min/km
        assert_eq!(activity.pace_seconds, 307);
        assert_eq!(activity.pace, "5:07/km");
        assert_eq!(activity.avg_hr, Some(149));
        assert_eq!(activity.calories, 702);
    }

    #[test]
    fn missing_pace_is_derived() {
        let entry = parse(
            r#"{"date": "2024-06-10", "distance": 4.0, "total_time": 1300,
                "calories": 0, "average_heartrate": null, "average_pace": 0}"#,
        );
        let activity = entry.into_activity("Corrida").unwrap();
        assert_eq!(activity.pace_seconds, 325);
        assert_eq!(activity.avg_hr, None);
        assert_eq!(activity.title, "Corrida");
    }

    #[test]
    fn unusable_entries_are_dropped() {
        for json in [
            r#"{"date": "someday", "distance": 5.0, "total_time": 1500}"#,
            r#"{"date": "2024-06-10", "distance": 0.0, "total_time": 1500}"#,
            r#"{"date": "2024-06-10", "distance": 5.0, "total_time": 0}"#,
        ] {
            assert!(parse(json).into_activity("Run").is_none(), "{json}");
        }
    }

    #[test]
    fn current_entries_pass_through() {
        let entry = parse(
            r#"{
                "date": "01/06/2024", "iso_date": "2024-06-01", "title": "Parkrun",
                "distance": 5.0, "time": "00:24:00", "time_seconds": 1440, "pace": "4:48/km"
            }"#,
        );
        assert!(matches!(entry, StoredActivity::Current(_)));
        assert_eq!(entry.into_activity("Run").unwrap().title, "Parkrun");
    }
}
