//! Normalized report query descriptors.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use crate::error::{AnalyticsError, Result};
use crate::period::Period;
use crate::provider::wire::RESERVED_FIELDS;

/// Additional ReportRequest fields passed through verbatim (e.g. `filtersExpression`).
pub type Extras = BTreeMap<String, Value>;

/// One row of a flattened report: dimension values followed by metric values.
pub type FlatRow = Vec<String>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryDescriptor {
    view_id: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    metrics: Vec<String>,
    dimensions: Vec<String>,
    sort_by_field: Option<String>,
    max_results: Option<u32>,
    extra: Extras,
}

impl QueryDescriptor {
    pub fn builder(view_id: impl Into<String>, period: Period) -> QueryBuilder {
        QueryBuilder {
            view_id: view_id.into(),
            period,
            metrics: Vec::new(),
            dimensions: Vec::new(),
            sort_by_field: None,
            max_results: None,
            extra: Extras::new(),
        }
    }

    pub fn view_id(&self) -> &str {
        &self.view_id
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn metrics(&self) -> &[String] {
        &self.metrics
    }

    pub fn dimensions(&self) -> &[String] {
        &self.dimensions
    }

    pub fn sort_by_field(&self) -> Option<&str> {
        self.sort_by_field.as_deref()
    }

    pub fn max_results(&self) -> Option<u32> {
        self.max_results
    }

    pub fn extra(&self) -> &Extras {
        &self.extra
    }
}

pub struct QueryBuilder {
    view_id: String,
    period: Period,
    metrics: Vec<String>,
    dimensions: Vec<String>,
    sort_by_field: Option<String>,
    max_results: Option<u32>,
    extra: Extras,
}

impl QueryBuilder {
    pub fn metrics<I, S>(mut self, metrics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metrics = metrics.into_iter().map(Into::into).collect();
        self
    }

    pub fn dimensions<I, S>(mut self, dimensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dimensions = dimensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn sort_by(mut self, field: Option<&str>) -> Self {
        self.sort_by_field = field.map(str::to_string);
        self
    }

    pub fn max_results(mut self, max_results: Option<u32>) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn extra(mut self, extra: Extras) -> Self {
        self.extra = extra;
        self
    }

    /// Fails with [`AnalyticsError::EmptyMetrics`] when no metric was requested, and with
    /// [`AnalyticsError::ReservedExtraField`] when an extra would shadow a built field.
    /// Metric and dimension names are not checked against the provider.
    pub fn build(self) -> Result<QueryDescriptor> {
        if self.metrics.is_empty() {
            return Err(AnalyticsError::EmptyMetrics);
        }

        if let Some(field) = self
            .extra
            .keys()
            .find(|key| RESERVED_FIELDS.contains(&key.as_str()))
        {
            return Err(AnalyticsError::ReservedExtraField(field.clone()));
        }

        Ok(QueryDescriptor {
            view_id: self.view_id,
            start_date: self.period.start_date(),
            end_date: self.period.end_date(),
            metrics: self.metrics,
            dimensions: self.dimensions,
            sort_by_field: self.sort_by_field,
            max_results: self.max_results,
            extra: self.extra,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period() -> Period {
        Period::today_at(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
    }

    #[test]
    fn build_keeps_argument_order() {
        let query = QueryDescriptor::builder("12345", period())
            .metrics(["users", "pageviews"])
            .dimensions(["date", "pageTitle"])
            .sort_by(Some("pageviews"))
            .max_results(Some(20))
            .build()
            .unwrap();

        assert_eq!(query.view_id(), "12345");
        assert_eq!(query.metrics(), ["users", "pageviews"]);
        assert_eq!(query.dimensions(), ["date", "pageTitle"]);
        assert_eq!(query.sort_by_field(), Some("pageviews"));
        assert_eq!(query.max_results(), Some(20));
    }

    #[test]
    fn build_allows_no_dimensions() {
        let query = QueryDescriptor::builder("12345", period())
            .metrics(["sessions"])
            .build()
            .unwrap();
        assert!(query.dimensions().is_empty());
        assert_eq!(query.sort_by_field(), None);
    }

    #[test]
    fn build_rejects_empty_metrics() {
        let err = QueryDescriptor::builder("12345", period())
            .dimensions(["date"])
            .build()
            .unwrap_err();
        assert!(matches!(err, AnalyticsError::EmptyMetrics));
    }

    #[test]
    fn build_rejects_extras_that_shadow_built_fields() {
        let mut extra = Extras::new();
        extra.insert("viewId".to_string(), Value::from("99999"));

        let err = QueryDescriptor::builder("12345", period())
            .metrics(["users"])
            .extra(extra)
            .build()
            .unwrap_err();

        assert!(matches!(err, AnalyticsError::ReservedExtraField(ref field) if field == "viewId"));
    }

    #[test]
    fn build_accepts_pass_through_extras() {
        let mut extra = Extras::new();
        extra.insert("filtersExpression".to_string(), Value::from("ga:country==Norway"));
        extra.insert("includeEmptyRows".to_string(), Value::from(true));

        let query = QueryDescriptor::builder("12345", period())
            .metrics(["users"])
            .extra(extra.clone())
            .build()
            .unwrap();

        assert_eq!(query.extra(), &extra);
    }
}
