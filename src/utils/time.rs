use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone};

/// This is the standard way of converting a date to a sortable key in runtally.
pub fn iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Day-first date shown on the website.
pub fn display_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Suffix used for timestamped backup copies.
pub fn file_stamp<Tz: TimeZone>(moment: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    moment.format("%Y-%m-%d_%H-%M-%S").to_string()
}

/// Returns the Monday starting the week `date` belongs to.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::{display_date, file_stamp, iso_date, week_start};

    fn test_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 5).unwrap()
    }

    #[test]
    fn date_renderings() {
        assert_eq!(iso_date(test_date()), "2024-06-05");
        assert_eq!(display_date(test_date()), "05/06/2024");
    }

    #[test]
    fn week_starts_on_monday() {
        // 2024-06-05 is a Wednesday.
        assert_eq!(week_start(test_date()), NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
        let monday = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        assert_eq!(week_start(monday), monday);
        let sunday = NaiveDate::from_ymd_opt(2024, 6, 9).unwrap();
        assert_eq!(week_start(sunday), monday);
    }

    #[test]
    fn backup_stamp() {
        let moment = Utc.with_ymd_and_hms(2024, 6, 5, 7, 8, 9).unwrap();
        assert_eq!(file_stamp(&moment), "2024-06-05_07-08-09");
    }
}
