use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    ingest::fields::{format_pace_label, format_seconds_as_hms},
    utils::{
        clock::Clock,
        percentage::{distance_percentage, Percentage},
        round::{from_centi_km, round_to},
        time::week_start,
    },
};

use super::entities::{Activity, ActivitySet};

pub const MARATHON_KM: f64 = 42.195;
pub const RECENT_RUNS: usize = 10;
pub const DEFAULT_WEEKLY_GOAL_KM: f64 = 25.;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub total_runs: usize,
    pub total_distance: f64,
    pub total_time: String,
    pub total_time_seconds: u64,
    pub avg_pace: String,
    pub avg_distance: f64,
    pub marathon_progress: Percentage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekStats {
    pub runs: usize,
    pub distance: f64,
    pub time: String,
    /// Weekly target in kilometres.
    pub goal: f64,
    /// Whole percent of `goal`, capped at 100.
    pub goal_progress: u32,
}

/// The document the website reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub generated_at: DateTime<Utc>,
    pub stats: Stats,
    pub latest_run: Option<Activity>,
    pub this_week: WeekStats,
    pub recent_runs: Vec<Activity>,
    pub activities: Vec<Activity>,
}

/// Running totals. Distances are summed as hundredths of a kilometre so the result does not
/// depend on the order activities are added in.
#[derive(Debug, Default, Clone, Copy)]
struct Totals {
    runs: usize,
    centi_km: i64,
    seconds: u64,
}

impl Totals {
    fn add(&mut self, activity: &Activity) {
        self.runs += 1;
        self.centi_km += activity.centi_km();
        self.seconds += activity.time_seconds as u64;
    }

    fn distance_km(&self) -> f64 {
        from_centi_km(self.centi_km)
    }
}

#[derive(Debug, Clone)]
pub struct Aggregator {
    weekly_goal_km: f64,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(DEFAULT_WEEKLY_GOAL_KM)
    }
}

impl Aggregator {
    pub fn new(weekly_goal_km: f64) -> Self {
        Self { weekly_goal_km }
    }

    /// Computes the whole summary from scratch. The current week starts on the Monday of the
    /// clock's local date.
    pub fn summarize(&self, mut set: ActivitySet, clock: &dyn Clock) -> Summary {
        set.sort_recent_first();

        let mut totals = Totals::default();
        set.iter().for_each(|v| totals.add(v));

        let today = clock.local_date();
        let monday = week_start(today);
        let sunday = monday + Duration::days(6);
        let mut week = Totals::default();
        set.iter()
            .filter(|v| v.iso_date >= monday && v.iso_date <= sunday)
            .for_each(|v| week.add(v));

        let total_distance = totals.distance_km();
        let (avg_pace, avg_distance) = if totals.runs == 0 || totals.centi_km == 0 {
            (format_pace_label(0), 0.)
        } else {
            let pace = (totals.seconds as f64 / total_distance).round() as u32;
            (
                format_pace_label(pace),
                round_to(total_distance / totals.runs as f64, 2),
            )
        };

        let stats = Stats {
            total_runs: totals.runs,
            total_distance: round_to(total_distance, 2),
            total_time: format_seconds_as_hms(totals.seconds),
            total_time_seconds: totals.seconds,
            avg_pace,
            avg_distance,
            marathon_progress: distance_percentage(total_distance, MARATHON_KM).rounded(1),
        };

        let this_week = WeekStats {
            runs: week.runs,
            distance: round_to(week.distance_km(), 2),
            time: format_seconds_as_hms(week.seconds),
            goal: self.weekly_goal_km,
            goal_progress: *distance_percentage(week.distance_km(), self.weekly_goal_km)
                .capped(100.)
                .rounded(0) as u32,
        };

        let activities = set.into_vec();
        Summary {
            generated_at: clock.time(),
            stats,
            latest_run: activities.first().cloned(),
            this_week,
            recent_runs: activities.iter().take(RECENT_RUNS).cloned().collect(),
            activities,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::{Aggregator, MARATHON_KM};
    use crate::{
        activity::entities::{tests::activity, ActivitySet},
        utils::{clock::FixedClock, percentage::Percentage},
    };

    /// Wednesday 2024-06-12.
    fn clock() -> FixedClock {
        FixedClock::new(Utc.with_ymd_and_hms(2024, 6, 12, 18, 0, 0).unwrap())
            .with_local_date(NaiveDate::from_ymd_opt(2024, 6, 12).unwrap())
    }

    #[test]
    fn empty_set() {
        let summary = Aggregator::default().summarize(ActivitySet::default(), &clock());

        assert_eq!(summary.stats.total_runs, 0);
        assert_eq!(summary.stats.total_distance, 0.);
        assert_eq!(summary.stats.total_time, "00:00:00");
        assert_eq!(summary.stats.avg_pace, "--/km");
        assert_eq!(summary.stats.avg_distance, 0.);
        assert_eq!(summary.stats.marathon_progress, Percentage::ZERO);
        assert_eq!(summary.latest_run, None);
        assert_eq!(summary.this_week.runs, 0);
        assert_eq!(summary.this_week.distance, 0.);
        assert_eq!(summary.this_week.time, "00:00:00");
        assert_eq!(summary.this_week.goal_progress, 0);
        assert!(summary.recent_runs.is_empty());
    }

    #[test]
    fn empty_set_serializes_null_latest_run() {
        let summary = Aggregator::default().summarize(ActivitySet::default(), &clock());
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json["latest_run"].is_null());
        assert_eq!(json["stats"]["avg_pace"], "--/km");
        assert_eq!(json["this_week"]["goal"], 25.0);
    }

    #[test]
    fn totals_and_averages() {
        let set = ActivitySet::new(vec![
            activity("2024-06-01", 10.0, 3000),
            activity("2024-06-03", 5.5, 1650),
        ]);
        let summary = Aggregator::default().summarize(set, &clock());

        assert_eq!(summary.stats.total_runs, 2);
        assert_eq!(summary.stats.total_distance, 15.5);
        assert_eq!(summary.stats.total_time_seconds, 4650);
        assert_eq!(summary.stats.total_time, "01:17:30");
        assert_eq!(summary.stats.avg_pace, "5:00/km");
        assert_eq!(summary.stats.avg_distance, 7.75);
        assert_eq!(*summary.stats.marathon_progress, 36.7);
        assert_eq!(
            summary.latest_run.map(|v| v.iso_date),
            NaiveDate::from_ymd_opt(2024, 6, 3)
        );
    }

    #[test]
    fn marathon_distance_is_full_progress() {
        let set = ActivitySet::new(vec![activity("2024-04-21", MARATHON_KM, 14400)]);
        let summary = Aggregator::default().summarize(set, &clock());
        assert_eq!(*summary.stats.marathon_progress, 100.0);
    }

    #[test]
    fn current_week_starts_on_monday() {
        let set = ActivitySet::new(vec![
            // Sunday before, previous week
            activity("2024-06-09", 8.0, 2400),
            // Monday
            activity("2024-06-10", 6.0, 1800),
            // Wednesday, today
            activity("2024-06-12", 7.0, 2100),
        ]);
        let summary = Aggregator::new(20.).summarize(set, &clock());

        assert_eq!(summary.this_week.runs, 2);
        assert_eq!(summary.this_week.distance, 13.0);
        assert_eq!(summary.this_week.time, "01:05:00");
        assert_eq!(summary.this_week.goal, 20.);
        assert_eq!(summary.this_week.goal_progress, 65);
    }

    #[test]
    fn goal_progress_is_capped() {
        let set = ActivitySet::new(vec![activity("2024-06-11", 30.0, 10800)]);
        let summary = Aggregator::new(25.).summarize(set, &clock());
        assert_eq!(summary.this_week.goal_progress, 100);
    }

    #[test]
    fn recent_runs_keeps_ten_most_recent() {
        let set = (1..=15)
            .map(|day| activity(&format!("2024-05-{day:02}"), 5.0, 1500))
            .collect::<ActivitySet>();
        let summary = Aggregator::default().summarize(set, &clock());

        assert_eq!(summary.recent_runs.len(), 10);
        assert_eq!(summary.activities.len(), 15);
        assert_eq!(summary.recent_runs[0].iso_date.to_string(), "2024-05-15");
        assert_eq!(summary.recent_runs[9].iso_date.to_string(), "2024-05-06");
    }

    #[test]
    fn result_does_not_depend_on_input_order() {
        let runs = vec![
            activity("2024-06-01", 10.01, 3000),
            activity("2024-06-01", 0.1, 40),
            activity("2024-06-10", 0.2, 70),
            activity("2024-06-11", 0.3, 100),
            activity("2024-05-20", 21.1, 6600),
        ];
        let forward = Aggregator::default().summarize(runs.iter().cloned().collect(), &clock());
        let backward =
            Aggregator::default().summarize(runs.iter().rev().cloned().collect(), &clock());
        let mut rotated = runs.clone();
        rotated.rotate_left(2);
        let rotated = Aggregator::default().summarize(rotated.into_iter().collect(), &clock());

        assert_eq!(forward, backward);
        assert_eq!(forward, rotated);
        assert_eq!(forward.stats.total_distance, 31.71);
    }
}
