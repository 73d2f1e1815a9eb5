use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::sync::Mutex;

pub const DEFAULT_TIMEZONE: &str = "Asia/Kolkata";
pub const DEFAULT_TIMEZONE_LABEL: &str = "IST";

const MISSING_TIMESTAMP: &str = "N/A";
const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    #[error("unknown timezone `{0}`")]
    UnknownZone(String),
    #[error("local time {time} does not exist in {zone}")]
    NonexistentLocalTime { time: NaiveDateTime, zone: String },
}

/// Civil timezone used for day bucketing and display.
///
/// Everything persisted is UTC. Naive values handed to [`LocalZone::to_utc`]
/// are read as local wall-clock time, naive values handed to
/// [`LocalZone::to_local`] are read as UTC.
#[derive(Clone, Debug)]
pub struct LocalZone {
    tz: Tz,
    label: String,
}

impl LocalZone {
    pub fn new(name: &str, label: &str) -> Result<Self, ClockError> {
        let tz = name
            .trim()
            .parse::<Tz>()
            .map_err(|_| ClockError::UnknownZone(name.to_string()))?;
        Ok(Self {
            tz,
            label: label.trim().to_string(),
        })
    }

    pub fn name(&self) -> &'static str {
        self.tz.name()
    }

    /// `Asia/Kolkata (IST)`
    pub fn description(&self) -> String {
        format!("{} ({})", self.name(), self.label)
    }

    pub fn to_utc(&self, local: NaiveDateTime) -> Result<DateTime<Utc>, ClockError> {
        self.tz
            .from_local_datetime(&local)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| ClockError::NonexistentLocalTime {
                time: local,
                zone: self.tz.name().to_string(),
            })
    }

    pub fn to_local(&self, utc: NaiveDateTime) -> DateTime<Tz> {
        self.tz.from_utc_datetime(&utc)
    }

    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.tz).date_naive()
    }

    /// `2024-05-10 17:30:00 IST`, or `N/A` when there is no timestamp.
    pub fn format_stamp(&self, utc: Option<NaiveDateTime>) -> String {
        match utc {
            Some(utc) => format!(
                "{} {}",
                self.to_local(utc).format("%Y-%m-%d %H:%M:%S"),
                self.label
            ),
            None => MISSING_TIMESTAMP.to_string(),
        }
    }

    /// `17:30:00 IST`
    pub fn format_clock(&self, utc: NaiveDateTime) -> String {
        format!("{} {}", self.to_local(utc).format(TIME_FORMAT), self.label)
    }

    pub fn format_time(&self, utc: Option<NaiveDateTime>) -> String {
        match utc {
            Some(utc) => self.to_local(utc).format(TIME_FORMAT).to_string(),
            None => MISSING_TIMESTAMP.to_string(),
        }
    }
}

impl Default for LocalZone {
    fn default() -> Self {
        Self {
            tz: chrono_tz::Asia::Kolkata,
            label: DEFAULT_TIMEZONE_LABEL.to_string(),
        }
    }
}

/// Parses a `YYYY-MM-DD` local civil date.
pub fn parse_local_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

/// Hours between two UTC instants, rounded to two decimals. Never negative.
pub fn elapsed_hours(login: NaiveDateTime, logout: NaiveDateTime) -> f64 {
    let seconds = (logout - login).num_milliseconds().max(0) as f64 / 1000.0;
    (seconds / 3600.0 * 100.0).round() / 100.0
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(at) }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = at;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}
