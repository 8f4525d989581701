use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::utils::round::to_centi_km;

/// One running session after normalization. This is also the exact shape written into the
/// `activities`, `recent_runs` and `latest_run` parts of the summary file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Display date, day first.
    pub date: String,
    pub iso_date: NaiveDate,
    pub title: String,
    /// Kilometres, 2 decimals.
    pub distance: f64,
    /// `HH:MM:SS` rendering of `time_seconds`.
    pub time: String,
    #[serde(deserialize_with = "lenient_ser::deserialize_u32")]
    pub time_seconds: u32,
    /// `M:SS/km` rendering of `pace_seconds`.
    pub pace: String,
    #[serde(default, deserialize_with = "lenient_ser::deserialize_u32")]
    pub pace_seconds: u32,
    #[serde(default, deserialize_with = "lenient_ser::deserialize_opt_u32")]
    pub avg_hr: Option<u32>,
    #[serde(default, deserialize_with = "lenient_ser::deserialize_opt_u32")]
    pub max_hr: Option<u32>,
    #[serde(default, deserialize_with = "lenient_ser::deserialize_u32")]
    pub calories: u32,
    #[serde(default, deserialize_with = "lenient_ser::deserialize_u32")]
    pub elevation_gain: u32,
}

impl Activity {
    pub fn signature(&self) -> Signature {
        Signature {
            iso_date: self.iso_date,
            distance_m: (self.distance * 1000.).round() as i64,
            time_seconds: self.time_seconds,
        }
    }

    pub fn centi_km(&self) -> i64 {
        to_centi_km(self.distance)
    }
}

/// Two records with the same signature describe the same run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature {
    pub iso_date: NaiveDate,
    /// Distance rounded to 3 decimals of a kilometre.
    pub distance_m: i64,
    pub time_seconds: u32,
}

/// Most recent first. Longer runs come first within a day, remaining keys only make the order
/// total.
pub fn recent_first(a: &Activity, b: &Activity) -> Ordering {
    b.iso_date
        .cmp(&a.iso_date)
        .then_with(|| b.time_seconds.cmp(&a.time_seconds))
        .then_with(|| b.distance.total_cmp(&a.distance))
        .then_with(|| a.title.cmp(&b.title))
}

/// The persisted collection of activities. It owns every activity it holds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivitySet {
    activities: Vec<Activity>,
}

impl ActivitySet {
    pub fn new(activities: Vec<Activity>) -> Self {
        Self { activities }
    }

    pub fn push(&mut self, activity: Activity) {
        self.activities.push(activity);
    }

    pub fn sort_recent_first(&mut self) {
        self.activities.sort_by(recent_first);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Activity> {
        self.activities.iter()
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    pub fn as_slice(&self) -> &[Activity] {
        &self.activities
    }

    pub fn into_vec(self) -> Vec<Activity> {
        self.activities
    }
}

impl FromIterator<Activity> for ActivitySet {
    fn from_iter<T: IntoIterator<Item = Activity>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Older summary files were written by several generations of tooling. Some of them stored
/// numbers as strings (`"avg_hr": "152"`) or durations as floats, so reading is forgiving.
pub(crate) mod lenient_ser {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberLike {
        Int(u64),
        Float(f64),
        Text(String),
    }

    impl NumberLike {
        fn into_u32(self) -> Option<u32> {
            match self {
                NumberLike::Int(v) => u32::try_from(v).ok(),
                NumberLike::Float(v) if v.is_finite() && v >= 0. && v <= u32::MAX as f64 => {
                    Some(v.round() as u32)
                }
                NumberLike::Float(_) => None,
                NumberLike::Text(s) => s.trim().parse::<f64>().ok().and_then(|v| {
                    (v.is_finite() && v >= 0. && v <= u32::MAX as f64).then(|| v.round() as u32)
                }),
            }
        }
    }

    pub fn deserialize_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<NumberLike>::deserialize(deserializer)?;
        Ok(value.and_then(NumberLike::into_u32).unwrap_or(0))
    }

    pub fn deserialize_opt_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<NumberLike>::deserialize(deserializer)?;
        Ok(value.and_then(NumberLike::into_u32))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::NaiveDate;

    use super::{recent_first, Activity, ActivitySet};

    pub(crate) fn activity(iso: &str, distance: f64, time_seconds: u32) -> Activity {
        let iso_date = NaiveDate::parse_from_str(iso, "%Y-%m-%d").unwrap();
        Activity {
            date: iso_date.format("%d/%m/%Y").to_string(),
            iso_date,
            title: "Run".into(),
            distance,
            time: String::new(),
            time_seconds,
            pace: String::new(),
            pace_seconds: 0,
            avg_hr: None,
            max_hr: None,
            calories: 0,
            elevation_gain: 0,
        }
    }

    #[test]
    fn signature_rounds_distance_to_metres() {
        let a = activity("2024-06-01", 10.0004, 3000);
        let b = activity("2024-06-01", 10.0, 3000);
        let c = activity("2024-06-01", 10.001, 3000);
        assert_eq!(a.signature(), b.signature());
        assert_ne!(b.signature(), c.signature());
    }

    #[test]
    fn sort_is_most_recent_first_then_longest() {
        let mut set = ActivitySet::new(vec![
            activity("2024-05-01", 5.0, 1500),
            activity("2024-06-01", 5.0, 1500),
            activity("2024-06-01", 10.0, 3000),
        ]);
        set.sort_recent_first();
        let order = set
            .iter()
            .map(|a| (a.iso_date.to_string(), a.time_seconds))
            .collect::<Vec<_>>();
        assert_eq!(
            order,
            vec![
                ("2024-06-01".to_string(), 3000),
                ("2024-06-01".to_string(), 1500),
                ("2024-05-01".to_string(), 1500),
            ]
        );
        assert!(recent_first(&set.as_slice()[0], &set.as_slice()[1]).is_lt());
    }

    #[test]
    fn legacy_numbers_are_accepted() {
        let json = r#"{
            "date": "01/06/2024", "iso_date": "2024-06-01", "title": "Morning Run",
            "distance": 10.0, "time": "00:50:00", "time_seconds": 3000.0,
            "pace": "5:00", "avg_hr": "152", "max_hr": null, "calories": 600,
            "elevation_gain": 0
        }"#;
        let parsed: Activity = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.time_seconds, 3000);
        assert_eq!(parsed.avg_hr, Some(152));
        assert_eq!(parsed.max_hr, None);
        assert_eq!(parsed.pace_seconds, 0);
    }
}
