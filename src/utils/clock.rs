use chrono::{DateTime, Local, NaiveDate, Utc};

/// Represents an entity responsible for providing dates across application. Swapping it out lets
/// tests pin "now" for date fallbacks and the weekly window.
#[cfg_attr(test, mockall::automock)]
pub trait Clock: Sync + Send + 'static {
    fn time(&self) -> DateTime<Utc>;

    /// Calendar date the user is currently living in.
    fn local_date(&self) -> NaiveDate {
        self.time().with_timezone(&Local).date_naive()
    }
}

pub struct DefaultClock;

impl Clock for DefaultClock {
    fn time(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a single moment.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    moment: DateTime<Utc>,
    date: NaiveDate,
}

impl FixedClock {
    pub fn new(moment: DateTime<Utc>) -> Self {
        Self {
            moment,
            date: moment.date_naive(),
        }
    }

    /// Overrides the local calendar date independently of the machine timezone.
    pub fn with_local_date(self, date: NaiveDate) -> Self {
        Self { date, ..self }
    }
}

impl Clock for FixedClock {
    fn time(&self) -> DateTime<Utc> {
        self.moment
    }

    fn local_date(&self) -> NaiveDate {
        self.date
    }
}
