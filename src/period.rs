//! Closed date ranges used to scope every report request.

use chrono::{Datelike, Duration, Local, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, Result};

/// Earliest date the Reporting API accepts.
pub fn first_reporting_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2005, 1, 1).unwrap_or(NaiveDate::MIN)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Period {
    start_date: NaiveDate,
    end_date: NaiveDate,
}

impl Period {
    pub fn create(start_date: NaiveDate, end_date: NaiveDate) -> Result<Self> {
        if start_date > end_date {
            return Err(AnalyticsError::InvalidRange {
                start: start_date,
                end: end_date,
            });
        }

        Ok(Self {
            start_date,
            end_date,
        })
    }

    pub fn custom(start_date: NaiveDate, end_date: NaiveDate) -> Result<Self> {
        Self::create(start_date, end_date)
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn today() -> Self {
        Self::today_at(current_date())
    }

    pub fn yesterday() -> Self {
        Self::yesterday_at(current_date())
    }

    pub fn this_week() -> Self {
        Self::this_week_at(current_date())
    }

    pub fn this_month() -> Self {
        Self::this_month_at(current_date())
    }

    pub fn this_year() -> Self {
        Self::this_year_at(current_date())
    }

    pub fn last_days(days: u32) -> Self {
        Self::last_days_at(current_date(), days)
    }

    pub fn last_months(months: u32) -> Self {
        Self::last_months_at(current_date(), months)
    }

    pub fn last_years(years: u32) -> Self {
        Self::last_months_at(current_date(), years.saturating_mul(12))
    }

    pub fn year_to_date() -> Self {
        Self::year_to_date_at(current_date())
    }

    pub fn until_today() -> Self {
        Self::until_today_at(current_date())
    }

    pub fn until_yesterday() -> Self {
        Self::until_yesterday_at(current_date())
    }

    // Anchored variants. Every named range is a pure function of "today".

    pub fn today_at(today: NaiveDate) -> Self {
        Self::spanning(today, today)
    }

    pub fn yesterday_at(today: NaiveDate) -> Self {
        let yesterday = previous_day(today);
        Self::spanning(yesterday, yesterday)
    }

    /// Monday through Sunday of the week containing `today`.
    pub fn this_week_at(today: NaiveDate) -> Self {
        let monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
        Self::spanning(monday, monday + Duration::days(6))
    }

    pub fn this_month_at(today: NaiveDate) -> Self {
        let first = today.with_day(1).unwrap_or(today);
        let last = first
            .checked_add_months(Months::new(1))
            .map(previous_day)
            .unwrap_or(today);
        Self::spanning(first, last)
    }

    pub fn this_year_at(today: NaiveDate) -> Self {
        let first = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
        let last = NaiveDate::from_ymd_opt(today.year(), 12, 31).unwrap_or(today);
        Self::spanning(first, last)
    }

    pub fn last_days_at(today: NaiveDate, days: u32) -> Self {
        let start = today
            .checked_sub_signed(Duration::days(i64::from(days)))
            .unwrap_or(NaiveDate::MIN);
        Self::spanning(start, today)
    }

    pub fn last_months_at(today: NaiveDate, months: u32) -> Self {
        let start = today
            .checked_sub_months(Months::new(months))
            .unwrap_or(NaiveDate::MIN);
        Self::spanning(start, today)
    }

    pub fn year_to_date_at(today: NaiveDate) -> Self {
        let first = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
        Self::spanning(first, today)
    }

    pub fn until_today_at(today: NaiveDate) -> Self {
        Self::spanning(first_reporting_date().min(today), today)
    }

    pub fn until_yesterday_at(today: NaiveDate) -> Self {
        let yesterday = previous_day(today);
        Self::spanning(first_reporting_date().min(yesterday), yesterday)
    }

    /// Callers guarantee `start <= end`.
    fn spanning(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        debug_assert!(start_date <= end_date);
        Self {
            start_date,
            end_date,
        }
    }
}

/// A period picked by name, as accepted by the HTTP API and the CLI.
///
/// `start` and `end` together take precedence over `period`. Without either the
/// selection defaults to the last 7 days.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSelector {
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub days: Option<u32>,
    #[serde(default)]
    pub months: Option<u32>,
    #[serde(default)]
    pub years: Option<u32>,
    #[serde(default)]
    pub start: Option<NaiveDate>,
    #[serde(default)]
    pub end: Option<NaiveDate>,
}

impl PeriodSelector {
    pub const DEFAULT_DAYS: u32 = 7;

    pub fn resolve(&self) -> Result<Period> {
        self.resolve_at(current_date())
    }

    pub fn resolve_at(&self, today: NaiveDate) -> Result<Period> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => return Period::create(start, end),
            (Some(_), None) | (None, Some(_)) => {
                return Err(AnalyticsError::InvalidPeriod(
                    "custom periods need both start and end".to_string(),
                ))
            }
            (None, None) => {}
        }

        let name = self
            .period
            .as_deref()
            .map(|p| p.trim().to_lowercase().replace('-', "_"));

        let period = match name.as_deref() {
            None | Some("last_days") => {
                Period::last_days_at(today, self.days.unwrap_or(Self::DEFAULT_DAYS))
            }
            Some("last_months") => Period::last_months_at(today, self.months.unwrap_or(1)),
            Some("last_years") => {
                Period::last_months_at(today, self.years.unwrap_or(1).saturating_mul(12))
            }
            Some("today") => Period::today_at(today),
            Some("yesterday") => Period::yesterday_at(today),
            Some("this_week") => Period::this_week_at(today),
            Some("this_month") => Period::this_month_at(today),
            Some("this_year") => Period::this_year_at(today),
            Some("year_to_date") => Period::year_to_date_at(today),
            Some("until_today") => Period::until_today_at(today),
            Some("until_yesterday") => Period::until_yesterday_at(today),
            Some(other) => {
                return Err(AnalyticsError::InvalidPeriod(format!(
                    "unknown period '{other}'"
                )))
            }
        };

        Ok(period)
    }
}

fn current_date() -> NaiveDate {
    Local::now().date_naive()
}

fn previous_day(date: NaiveDate) -> NaiveDate {
    date.pred_opt().unwrap_or(date)
}
