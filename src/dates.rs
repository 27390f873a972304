//! Date range for the 5-day outlook

use chrono::{DateTime, Days, Local, NaiveDate, SecondsFormat, Utc};

/// Number of days between the first and last day of the outlook
const OUTLOOK_SPAN_DAYS: u64 = 4;

/// The outlook window: today and today+4, in the host's local timezone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Resolve the range from the local clock
    pub fn today() -> Option<Self> {
        Self::starting(Local::now().date_naive())
    }

    /// Build the range starting on an explicit date. None if the last day
    /// of the outlook is past the end of the calendar.
    pub fn starting(start: NaiveDate) -> Option<Self> {
        let end = start.checked_add_days(Days::new(OUTLOOK_SPAN_DAYS))?;
        Some(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// "Saturday, June 1, 2024"
    pub fn long_start(&self) -> String {
        format_long(self.start())
    }

    /// "June 1, 2024"
    pub fn short_start(&self) -> String {
        format_short(self.start())
    }

    /// "June 5, 2024"
    pub fn short_end(&self) -> String {
        format_short(self.end())
    }

    /// Label for "Day N" of the outlook, e.g. "Saturday, June 1" for day 1.
    ///
    /// Day N is `n - 1` days after the start. Returns None if the offset
    /// falls outside the calendar.
    pub fn day_label(&self, day: i64) -> Option<String> {
        let offset = day.checked_sub(1)?;
        let date = if offset >= 0 {
            self.start.checked_add_days(Days::new(offset as u64))?
        } else {
            self.start.checked_sub_days(Days::new(offset.unsigned_abs()))?
        };
        Some(date.format("%A, %B %-d").to_string())
    }
}

pub fn format_long(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}

pub fn format_short(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Clock readings logged at the start of a run, to debug timezone surprises
/// on CI hosts.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    pub local: String,
    pub utc_offset: String,
    pub utc_iso: String,
}

impl Diagnostics {
    pub fn capture() -> Self {
        let now = Local::now();
        Self::from_instant(now.with_timezone(&Utc), now.offset().to_string(), now.to_rfc2822())
    }

    fn from_instant(instant: DateTime<Utc>, utc_offset: String, local: String) -> Self {
        Self {
            local,
            utc_offset,
            utc_iso: instant.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}
