//! Typed records produced from flattened report rows.

use chrono::NaiveDate;
use serde::ser::{Serialize, SerializeMap, Serializer};

pub type RowResult<T> = std::result::Result<T, String>;

fn column(row: &[String], index: usize) -> RowResult<&str> {
    row.get(index)
        .map(String::as_str)
        .ok_or_else(|| format!("expected at least {} columns, got {}", index + 1, row.len()))
}

/// Integer-cast semantics: the leading run of digits, or 0 when there is none.
pub fn coerce_count(raw: &str) -> u64 {
    let digits: String = raw.trim().chars().take_while(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}

pub fn coerce_rate(raw: &str) -> f64 {
    raw.trim().parse().unwrap_or(0.0)
}

fn parse_date(raw: &str) -> RowResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y%m%d").map_err(|e| format!("invalid date '{raw}': {e}"))
}

/// `20240101` -> `Mon, Jan 1, 2024`
pub fn long_date(raw: &str) -> RowResult<String> {
    Ok(parse_date(raw)?.format("%a, %b %-d, %Y").to_string())
}

/// `20240101` -> `1 Jan`
pub fn short_date(raw: &str) -> RowResult<String> {
    Ok(parse_date(raw)?.format("%-d %b").to_string())
}

/// `2024010113` -> (`Monday`, `13`)
pub fn weekday_and_hour(raw: &str) -> RowResult<(String, String)> {
    let invalid = || format!("invalid dateHour '{raw}'");

    if raw.len() != 10 || !raw.is_char_boundary(8) {
        return Err(invalid());
    }
    let (date, hour) = raw.split_at(8);
    let date = parse_date(date)?;
    let hour: u32 = hour.parse().map_err(|_| invalid())?;
    if hour > 23 {
        return Err(invalid());
    }

    Ok((date.format("%A").to_string(), format!("{hour:02}")))
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorsAndPageViews {
    pub date: String,
    pub page_title: String,
    pub visitors: u64,
    pub page_views: u64,
}

impl VisitorsAndPageViews {
    pub fn from_row(row: &[String]) -> RowResult<Self> {
        Ok(Self {
            date: long_date(column(row, 0)?)?,
            page_title: column(row, 1)?.to_string(),
            visitors: coerce_count(column(row, 2)?),
            page_views: coerce_count(column(row, 3)?),
        })
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalVisitorsAndPageViews {
    pub date: String,
    pub visitors: u64,
    pub page_views: u64,
}

impl TotalVisitorsAndPageViews {
    pub fn from_row(row: &[String]) -> RowResult<Self> {
        Ok(Self {
            date: long_date(column(row, 0)?)?,
            visitors: coerce_count(column(row, 1)?),
            page_views: coerce_count(column(row, 2)?),
        })
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageViews {
    pub url: String,
    pub page_title: String,
    pub page_views: u64,
}

impl PageViews {
    pub fn from_row(row: &[String]) -> RowResult<Self> {
        Ok(Self {
            url: column(row, 0)?.to_string(),
            page_title: column(row, 1)?.to_string(),
            page_views: coerce_count(column(row, 2)?),
        })
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Referrer {
    pub url: String,
    pub page_views: u64,
}

impl Referrer {
    pub fn from_row(row: &[String]) -> RowResult<Self> {
        Ok(Self {
            url: column(row, 0)?.to_string(),
            page_views: coerce_count(column(row, 1)?),
        })
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct BrowserSessions {
    pub browser: String,
    pub sessions: u64,
}

impl BrowserSessions {
    pub const OTHERS: &'static str = "Others";

    pub fn from_row(row: &[String]) -> RowResult<Self> {
        Ok(Self {
            browser: column(row, 0)?.to_string(),
            sessions: coerce_count(column(row, 1)?),
        })
    }
}

/// Keep the first `max_results - 1` browsers and fold the rest into one "Others" entry.
///
/// Input is expected in descending session order. Lists that already fit, and a
/// `max_results` of 0, leave the input unchanged.
pub fn summarize_top_browsers(
    mut browsers: Vec<BrowserSessions>,
    max_results: usize,
) -> Vec<BrowserSessions> {
    if max_results == 0 || browsers.len() <= max_results {
        return browsers;
    }

    let rest = browsers.split_off(max_results.saturating_sub(1));
    browsers.push(BrowserSessions {
        browser: BrowserSessions::OTHERS.to_string(),
        sessions: rest.iter().map(|b| b.sessions).sum(),
    });
    browsers
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Demographic {
    pub user_age_bracket: String,
    pub user_gender: String,
    pub visitors: u64,
}

impl Demographic {
    pub fn from_row(row: &[String]) -> RowResult<Self> {
        Ok(Self {
            user_age_bracket: column(row, 0)?.to_string(),
            user_gender: column(row, 1)?.to_string(),
            visitors: coerce_count(column(row, 2)?),
        })
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct GeoVisitors {
    pub language: String,
    pub city: String,
    pub country: String,
    pub visitors: u64,
}

impl GeoVisitors {
    pub fn from_row(row: &[String]) -> RowResult<Self> {
        Ok(Self {
            language: column(row, 0)?.to_string(),
            city: column(row, 1)?.to_string(),
            country: column(row, 2)?.to_string(),
            visitors: coerce_count(column(row, 3)?),
        })
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct LanguageVisitors {
    pub language: String,
    pub visitors: u64,
}

impl LanguageVisitors {
    pub fn from_row(row: &[String]) -> RowResult<Self> {
        Ok(Self {
            language: column(row, 0)?.to_string(),
            visitors: coerce_count(column(row, 1)?),
        })
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CityVisitors {
    /// `"<city>, <country>"`
    pub city: String,
    pub visitors: u64,
}

impl CityVisitors {
    pub fn from_row(row: &[String]) -> RowResult<Self> {
        Ok(Self {
            city: format!("{}, {}", column(row, 0)?, column(row, 1)?),
            visitors: coerce_count(column(row, 2)?),
        })
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CountryVisitors {
    pub country: String,
    pub visitors: u64,
}

impl CountryVisitors {
    pub fn from_row(row: &[String]) -> RowResult<Self> {
        Ok(Self {
            country: column(row, 0)?.to_string(),
            visitors: coerce_count(column(row, 1)?),
        })
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficSummary {
    pub date: String,
    pub visitors: u64,
    pub page_views: u64,
    pub sessions: u64,
    pub bounce_rate: f64,
}

impl TrafficSummary {
    pub fn from_row(row: &[String]) -> RowResult<Self> {
        Ok(Self {
            date: short_date(column(row, 0)?)?,
            visitors: coerce_count(column(row, 1)?),
            page_views: coerce_count(column(row, 2)?),
            sessions: coerce_count(column(row, 3)?),
            bounce_rate: coerce_rate(column(row, 4)?),
        })
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct HourlyVisitors {
    /// `"00"` to `"23"`
    pub hour: String,
    pub visitors: u64,
}

/// Visitors per hour, grouped by weekday name.
///
/// Weekdays appear in the order they were first seen and hours keep the
/// provider's row order. Serializes as a JSON object in that same order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrafficByDayHour {
    days: Vec<(String, Vec<HourlyVisitors>)>,
}

impl TrafficByDayHour {
    pub fn from_rows(rows: &[Vec<String>]) -> RowResult<Self> {
        let mut traffic = Self::default();
        for row in rows {
            let (weekday, hour) = weekday_and_hour(column(row, 0)?)?;
            let visitors = coerce_count(column(row, 1)?);
            traffic.push(weekday, HourlyVisitors { hour, visitors });
        }
        Ok(traffic)
    }

    fn push(&mut self, weekday: String, entry: HourlyVisitors) {
        match self.days.iter_mut().find(|(day, _)| *day == weekday) {
            Some((_, hours)) => hours.push(entry),
            None => self.days.push((weekday, vec![entry])),
        }
    }

    pub fn get(&self, weekday: &str) -> Option<&[HourlyVisitors]> {
        self.days
            .iter()
            .find(|(day, _)| day == weekday)
            .map(|(_, hours)| hours.as_slice())
    }

    pub fn weekdays(&self) -> impl Iterator<Item = &str> {
        self.days.iter().map(|(day, _)| day.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

impl Serialize for TrafficByDayHour {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.days.len()))?;
        for (day, hours) in &self.days {
            map.serialize_entry(day, hours)?;
        }
        map.end()
    }
}
