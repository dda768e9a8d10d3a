//! Named reports: a table of metric/dimension recipes and one executor for all of them.

pub mod records;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;

use crate::client::AnalyticsClient;
use crate::error::{AnalyticsError, Result};
use crate::period::Period;
use crate::provider::ReportingService;
use crate::query::{Extras, FlatRow, QueryDescriptor};

pub use records::{
    summarize_top_browsers, BrowserSessions, CityVisitors, CountryVisitors, Demographic,
    GeoVisitors, HourlyVisitors, LanguageVisitors, PageViews, Referrer, TotalVisitorsAndPageViews,
    TrafficByDayHour, TrafficSummary, VisitorsAndPageViews,
};

pub const DEFAULT_TOP_BROWSERS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    VisitorsAndPageViews,
    TotalVisitorsAndPageViews,
    MostVisitedPages,
    TopReferrers,
    TopBrowsers,
    Demographics,
    Geo,
    Languages,
    Cities,
    Countries,
    TrafficSummary,
    TrafficByDayHour,
}

/// What a named report asks the provider for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportSpec {
    pub metrics: &'static [&'static str],
    pub dimensions: &'static [&'static str],
    pub sort_by: Option<&'static str>,
    /// Whether the caller's `max_results` becomes the request's page size
    pub forwards_max_results: bool,
}

impl ReportKind {
    pub const ALL: [ReportKind; 12] = [
        ReportKind::VisitorsAndPageViews,
        ReportKind::TotalVisitorsAndPageViews,
        ReportKind::MostVisitedPages,
        ReportKind::TopReferrers,
        ReportKind::TopBrowsers,
        ReportKind::Demographics,
        ReportKind::Geo,
        ReportKind::Languages,
        ReportKind::Cities,
        ReportKind::Countries,
        ReportKind::TrafficSummary,
        ReportKind::TrafficByDayHour,
    ];

    pub const fn spec(self) -> ReportSpec {
        match self {
            ReportKind::VisitorsAndPageViews => ReportSpec {
                metrics: &["users", "pageviews"],
                dimensions: &["date", "pageTitle"],
                sort_by: Some("pageviews"),
                forwards_max_results: true,
            },
            ReportKind::TotalVisitorsAndPageViews => ReportSpec {
                metrics: &["users", "pageviews"],
                dimensions: &["date"],
                sort_by: Some("pageviews"),
                forwards_max_results: true,
            },
            ReportKind::MostVisitedPages => ReportSpec {
                metrics: &["pageviews"],
                dimensions: &["pagePath", "pageTitle"],
                sort_by: Some("pageviews"),
                forwards_max_results: true,
            },
            ReportKind::TopReferrers => ReportSpec {
                metrics: &["pageviews"],
                dimensions: &["fullReferrer"],
                sort_by: Some("pageviews"),
                forwards_max_results: true,
            },
            // Every browser is fetched so the tail can be summed into "Others".
            ReportKind::TopBrowsers => ReportSpec {
                metrics: &["sessions"],
                dimensions: &["browser"],
                sort_by: Some("sessions"),
                forwards_max_results: false,
            },
            ReportKind::Demographics => ReportSpec {
                metrics: &["users"],
                dimensions: &["userAgeBracket", "userGender"],
                sort_by: None,
                forwards_max_results: false,
            },
            ReportKind::Geo => ReportSpec {
                metrics: &["users"],
                dimensions: &["language", "city", "country"],
                sort_by: Some("users"),
                forwards_max_results: true,
            },
            ReportKind::Languages => ReportSpec {
                metrics: &["users"],
                dimensions: &["language"],
                sort_by: Some("users"),
                forwards_max_results: true,
            },
            ReportKind::Cities => ReportSpec {
                metrics: &["users"],
                dimensions: &["city", "country"],
                sort_by: Some("users"),
                forwards_max_results: true,
            },
            ReportKind::Countries => ReportSpec {
                metrics: &["users"],
                dimensions: &["country"],
                sort_by: Some("users"),
                forwards_max_results: true,
            },
            ReportKind::TrafficSummary => ReportSpec {
                metrics: &["users", "pageviews", "sessions", "bounceRate"],
                dimensions: &["date"],
                sort_by: None,
                forwards_max_results: false,
            },
            ReportKind::TrafficByDayHour => ReportSpec {
                metrics: &["users"],
                dimensions: &["dateHour"],
                sort_by: None,
                forwards_max_results: false,
            },
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            ReportKind::VisitorsAndPageViews => "visitors_and_page_views",
            ReportKind::TotalVisitorsAndPageViews => "total_visitors_and_page_views",
            ReportKind::MostVisitedPages => "most_visited_pages",
            ReportKind::TopReferrers => "top_referrers",
            ReportKind::TopBrowsers => "top_browsers",
            ReportKind::Demographics => "demographics",
            ReportKind::Geo => "geo",
            ReportKind::Languages => "languages",
            ReportKind::Cities => "cities",
            ReportKind::Countries => "countries",
            ReportKind::TrafficSummary => "traffic_summary",
            ReportKind::TrafficByDayHour => "traffic_by_day_hour",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ReportKind {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        ReportKind::ALL
            .into_iter()
            .find(|kind| kind.name() == normalized)
            .ok_or_else(|| AnalyticsError::UnknownReport(s.to_string()))
    }
}

/// Output of any named report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Report {
    VisitorsAndPageViews(Vec<VisitorsAndPageViews>),
    TotalVisitorsAndPageViews(Vec<TotalVisitorsAndPageViews>),
    MostVisitedPages(Vec<PageViews>),
    TopReferrers(Vec<Referrer>),
    TopBrowsers(Vec<BrowserSessions>),
    Demographics(Vec<Demographic>),
    Geo(Vec<GeoVisitors>),
    Languages(Vec<LanguageVisitors>),
    Cities(Vec<CityVisitors>),
    Countries(Vec<CountryVisitors>),
    TrafficSummary(Vec<TrafficSummary>),
    TrafficByDayHour(TrafficByDayHour),
}

fn map_rows<T>(
    kind: ReportKind,
    rows: &[FlatRow],
    map: fn(&[String]) -> records::RowResult<T>,
) -> Result<Vec<T>> {
    rows.iter()
        .map(|row| map(row))
        .collect::<records::RowResult<Vec<T>>>()
        .map_err(|reason| AnalyticsError::MalformedRow {
            report: kind.name(),
            reason,
        })
}

/// Entry point for report queries against one view.
#[derive(Clone)]
pub struct Analytics {
    client: AnalyticsClient,
    view_id: String,
}

impl Analytics {
    pub fn new(client: AnalyticsClient, view_id: impl Into<String>) -> Self {
        Self {
            client,
            view_id: view_id.into(),
        }
    }

    pub fn set_view_id(&mut self, view_id: impl Into<String>) -> &mut Self {
        self.view_id = view_id.into();
        self
    }

    pub fn view_id(&self) -> &str {
        &self.view_id
    }

    /// Raw query for anything the named reports don't cover.
    pub async fn perform_query<M, D, S>(
        &self,
        period: Period,
        metrics: M,
        dimensions: D,
        sort_by_field: Option<&str>,
        max_results: Option<u32>,
        extra: Extras,
    ) -> Result<Vec<FlatRow>>
    where
        M: IntoIterator<Item = S>,
        D: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let query = QueryDescriptor::builder(self.view_id.as_str(), period)
            .metrics(metrics)
            .dimensions(dimensions)
            .sort_by(sort_by_field)
            .max_results(max_results)
            .extra(extra)
            .build()?;

        self.client.perform_query(&query).await
    }

    /// Flattened rows for a named report, per its [`ReportSpec`].
    pub async fn report_rows(
        &self,
        kind: ReportKind,
        period: Period,
        max_results: Option<u32>,
    ) -> Result<Vec<FlatRow>> {
        let spec = kind.spec();
        let max_results = max_results.filter(|_| spec.forwards_max_results);

        self.perform_query(
            period,
            spec.metrics.iter().copied(),
            spec.dimensions.iter().copied(),
            spec.sort_by,
            max_results,
            Extras::new(),
        )
        .await
    }

    /// Run any named report. `max_results` is ignored by reports that take no limit.
    pub async fn fetch_report(
        &self,
        kind: ReportKind,
        period: Period,
        max_results: Option<u32>,
    ) -> Result<Report> {
        Ok(match kind {
            ReportKind::VisitorsAndPageViews => Report::VisitorsAndPageViews(
                self.fetch_visitors_and_page_views(period, max_results).await?,
            ),
            ReportKind::TotalVisitorsAndPageViews => Report::TotalVisitorsAndPageViews(
                self.fetch_total_visitors_and_page_views(period, max_results)
                    .await?,
            ),
            ReportKind::MostVisitedPages => Report::MostVisitedPages(
                self.fetch_most_visited_pages(period, max_results).await?,
            ),
            ReportKind::TopReferrers => {
                Report::TopReferrers(self.fetch_top_referrers(period, max_results).await?)
            }
            ReportKind::TopBrowsers => Report::TopBrowsers(
                self.fetch_top_browsers(period, max_results.unwrap_or(DEFAULT_TOP_BROWSERS))
                    .await?,
            ),
            ReportKind::Demographics => Report::Demographics(self.fetch_demographics(period).await?),
            ReportKind::Geo => Report::Geo(self.fetch_geo(period, max_results).await?),
            ReportKind::Languages => {
                Report::Languages(self.fetch_languages(period, max_results).await?)
            }
            ReportKind::Cities => Report::Cities(self.fetch_cities(period, max_results).await?),
            ReportKind::Countries => {
                Report::Countries(self.fetch_countries(period, max_results).await?)
            }
            ReportKind::TrafficSummary => {
                Report::TrafficSummary(self.fetch_traffic_summary(period).await?)
            }
            ReportKind::TrafficByDayHour => {
                Report::TrafficByDayHour(self.fetch_traffic_by_day_hour(period).await?)
            }
        })
    }

    async fn fetch_mapped<T>(
        &self,
        kind: ReportKind,
        period: Period,
        max_results: Option<u32>,
        map: fn(&[String]) -> records::RowResult<T>,
    ) -> Result<Vec<T>> {
        let rows = self.report_rows(kind, period, max_results).await?;
        map_rows(kind, &rows, map)
    }

    pub async fn fetch_visitors_and_page_views(
        &self,
        period: Period,
        max_results: Option<u32>,
    ) -> Result<Vec<VisitorsAndPageViews>> {
        self.fetch_mapped(
            ReportKind::VisitorsAndPageViews,
            period,
            max_results,
            VisitorsAndPageViews::from_row,
        )
        .await
    }

    pub async fn fetch_total_visitors_and_page_views(
        &self,
        period: Period,
        max_results: Option<u32>,
    ) -> Result<Vec<TotalVisitorsAndPageViews>> {
        self.fetch_mapped(
            ReportKind::TotalVisitorsAndPageViews,
            period,
            max_results,
            TotalVisitorsAndPageViews::from_row,
        )
        .await
    }

    pub async fn fetch_most_visited_pages(
        &self,
        period: Period,
        max_results: Option<u32>,
    ) -> Result<Vec<PageViews>> {
        self.fetch_mapped(
            ReportKind::MostVisitedPages,
            period,
            max_results,
            PageViews::from_row,
        )
        .await
    }

    pub async fn fetch_top_referrers(
        &self,
        period: Period,
        max_results: Option<u32>,
    ) -> Result<Vec<Referrer>> {
        self.fetch_mapped(
            ReportKind::TopReferrers,
            period,
            max_results,
            Referrer::from_row,
        )
        .await
    }

    /// At most `max_results` entries; the tail past `max_results - 1` is folded into "Others".
    pub async fn fetch_top_browsers(
        &self,
        period: Period,
        max_results: u32,
    ) -> Result<Vec<BrowserSessions>> {
        let browsers = self
            .fetch_mapped(
                ReportKind::TopBrowsers,
                period,
                None,
                BrowserSessions::from_row,
            )
            .await?;

        Ok(summarize_top_browsers(browsers, max_results as usize))
    }

    pub async fn fetch_demographics(&self, period: Period) -> Result<Vec<Demographic>> {
        self.fetch_mapped(
            ReportKind::Demographics,
            period,
            None,
            Demographic::from_row,
        )
        .await
    }

    pub async fn fetch_geo(
        &self,
        period: Period,
        max_results: Option<u32>,
    ) -> Result<Vec<GeoVisitors>> {
        self.fetch_mapped(ReportKind::Geo, period, max_results, GeoVisitors::from_row)
            .await
    }

    pub async fn fetch_languages(
        &self,
        period: Period,
        max_results: Option<u32>,
    ) -> Result<Vec<LanguageVisitors>> {
        self.fetch_mapped(
            ReportKind::Languages,
            period,
            max_results,
            LanguageVisitors::from_row,
        )
        .await
    }

    pub async fn fetch_cities(
        &self,
        period: Period,
        max_results: Option<u32>,
    ) -> Result<Vec<CityVisitors>> {
        self.fetch_mapped(
            ReportKind::Cities,
            period,
            max_results,
            CityVisitors::from_row,
        )
        .await
    }

    pub async fn fetch_countries(
        &self,
        period: Period,
        max_results: Option<u32>,
    ) -> Result<Vec<CountryVisitors>> {
        self.fetch_mapped(
            ReportKind::Countries,
            period,
            max_results,
            CountryVisitors::from_row,
        )
        .await
    }

    pub async fn fetch_traffic_summary(&self, period: Period) -> Result<Vec<TrafficSummary>> {
        self.fetch_mapped(
            ReportKind::TrafficSummary,
            period,
            None,
            TrafficSummary::from_row,
        )
        .await
    }

    pub async fn fetch_traffic_by_day_hour(&self, period: Period) -> Result<TrafficByDayHour> {
        let rows = self
            .report_rows(ReportKind::TrafficByDayHour, period, None)
            .await?;

        TrafficByDayHour::from_rows(&rows).map_err(|reason| AnalyticsError::MalformedRow {
            report: ReportKind::TrafficByDayHour.name(),
            reason,
        })
    }

    /// The underlying reporting handle.
    pub fn service(&self) -> Arc<dyn ReportingService> {
        self.client.service()
    }
}
