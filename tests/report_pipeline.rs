//! End-to-end tests of the report pipeline: query building, caching,
//! request construction, flattening and the named report presenters.

mod common;

use chrono::NaiveDate;
use common::{client, report, FakeReportingService};
use ganalytics::cache::{CacheStore, MemoryCache};
use ganalytics::provider::ReportingService;
use ganalytics::query::Extras;
use ganalytics::reports::{BrowserSessions, HourlyVisitors, Report};
use ganalytics::{Analytics, AnalyticsClient, AnalyticsError, Period, ReportKind};
use serde_json::json;
use std::sync::Arc;

fn january() -> Period {
    Period::create(
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
    )
    .unwrap()
}

#[tokio::test]
async fn cached_queries_hit_the_provider_once() {
    let service = FakeReportingService::returning(report(
        &["ga:date"],
        &["users"],
        &[(&["20240101"], &["5"])],
    ));
    let analytics = Analytics::new(client(service.clone(), 60), "12345");

    let first = analytics
        .perform_query(january(), ["users"], ["date"], None, None, Extras::new())
        .await
        .unwrap();
    let second = analytics
        .perform_query(january(), ["users"], ["date"], None, None, Extras::new())
        .await
        .unwrap();

    assert_eq!(first, vec![vec!["20240101".to_string(), "5".to_string()]]);
    assert_eq!(first, second);
    assert_eq!(service.calls(), 1);
}

#[tokio::test]
async fn different_arguments_are_cached_separately() {
    let service = FakeReportingService::returning(report(&["ga:date"], &["users"], &[]));
    let analytics = Analytics::new(client(service.clone(), 60), "12345");

    analytics
        .perform_query(january(), ["users"], ["date"], None, None, Extras::new())
        .await
        .unwrap();
    analytics
        .perform_query(january(), ["users"], ["date"], None, Some(10), Extras::new())
        .await
        .unwrap();

    assert_eq!(service.calls(), 2);
}

#[tokio::test]
async fn zero_cache_lifetime_refetches_every_time() {
    let service = FakeReportingService::returning(report(
        &["ga:date"],
        &["users", "pageviews"],
        &[(&["20240101"], &["5", "12"])],
    ));
    let analytics = Analytics::new(client(service.clone(), 0), "12345");

    for _ in 0..2 {
        analytics
            .fetch_total_visitors_and_page_views(january(), None)
            .await
            .unwrap();
    }

    assert_eq!(service.calls(), 2);
}

#[tokio::test]
async fn empty_metrics_fail_before_any_remote_call() {
    let service = FakeReportingService::returning(report(&[], &[], &[]));
    let analytics = Analytics::new(client(service.clone(), 60), "12345");

    let err = analytics
        .perform_query(
            january(),
            Vec::<String>::new(),
            vec!["date".to_string()],
            None,
            None,
            Extras::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AnalyticsError::EmptyMetrics));
    assert_eq!(service.calls(), 0);
}

#[tokio::test]
async fn remote_failures_propagate_and_are_not_cached() {
    let service = FakeReportingService::failing(429);
    let analytics = Analytics::new(client(service.clone(), 60), "12345");

    for _ in 0..2 {
        let err = analytics.fetch_top_referrers(january(), None).await.unwrap_err();
        assert!(matches!(err, AnalyticsError::RemoteQuery { status: Some(429), .. }));
        assert!(err.is_retryable());
    }

    assert_eq!(service.calls(), 2);
}

#[tokio::test]
async fn request_carries_namespaced_fields_sort_and_page_size() {
    let service = FakeReportingService::returning(report(
        &["ga:pagePath", "ga:pageTitle"],
        &["pageviews"],
        &[],
    ));
    let analytics = Analytics::new(client(service.clone(), 60), "12345");

    analytics
        .fetch_most_visited_pages(january(), Some(20))
        .await
        .unwrap();

    assert_eq!(
        service.last_request(),
        json!({
            "reportRequests": [{
                "viewId": "12345",
                "dateRanges": [{"startDate": "2024-01-01", "endDate": "2024-01-31"}],
                "metrics": [{"expression": "ga:pageviews", "alias": "pageviews"}],
                "dimensions": [{"name": "ga:pagePath"}, {"name": "ga:pageTitle"}],
                "orderBys": [{
                    "fieldName": "ga:pageviews",
                    "orderType": "VALUE",
                    "sortOrder": "DESCENDING"
                }],
                "pageSize": 20
            }]
        })
    );
}

#[tokio::test]
async fn zero_cache_lifetime_evicts_entries_stored_by_other_clients() {
    let service = FakeReportingService::returning(report(
        &["ga:country"],
        &["users"],
        &[(&["Norway"], &["12"])],
    ));
    let cache: Arc<dyn CacheStore> = Arc::new(MemoryCache::new(1_000));
    let caching = AnalyticsClient::new(service.clone(), Arc::clone(&cache))
        .with_cache_lifetime_in_minutes(60);
    let uncached = AnalyticsClient::new(service.clone(), Arc::clone(&cache));

    let warm = Analytics::new(caching, "12345");
    warm.fetch_countries(january(), None).await.unwrap();
    warm.fetch_countries(january(), None).await.unwrap();
    assert_eq!(service.calls(), 1);

    let cold = Analytics::new(uncached, "12345");
    cold.fetch_countries(january(), None).await.unwrap();
    assert_eq!(service.calls(), 2);

    // The uncached client dropped the shared entry on its way through.
    warm.fetch_countries(january(), None).await.unwrap();
    assert_eq!(service.calls(), 3);
}

#[tokio::test]
async fn demographics_request_is_unsorted_and_unbounded() {
    let service = FakeReportingService::returning(report(
        &["ga:userAgeBracket", "ga:userGender"],
        &["users"],
        &[(&["25-34", "female"], &["40"])],
    ));
    let analytics = Analytics::new(client(service.clone(), 60), "12345");

    let demographics = analytics
        .fetch_report(ReportKind::Demographics, january(), Some(5))
        .await
        .unwrap();

    assert_eq!(
        serde_json::to_value(&demographics).unwrap(),
        json!([{"userAgeBracket": "25-34", "userGender": "female", "visitors": 40}])
    );
    let sent = &service.last_request()["reportRequests"][0];
    assert!(sent.get("pageSize").is_none());
    assert!(sent.get("orderBys").is_none());
}

#[tokio::test]
async fn set_view_id_changes_the_requested_view() {
    let service = FakeReportingService::returning(report(&["ga:country"], &["users"], &[]));
    let mut analytics = Analytics::new(client(service.clone(), 60), "12345");

    analytics.set_view_id("67890");
    analytics.fetch_countries(january(), None).await.unwrap();

    assert_eq!(service.last_request()["reportRequests"][0]["viewId"], "67890");
}

#[tokio::test]
async fn visitors_and_page_views_are_mapped() {
    let service = FakeReportingService::returning(report(
        &["ga:date", "ga:pageTitle"],
        &["users", "pageviews"],
        &[
            (&["20240101", "Home"], &["5", "12"]),
            (&["20240102", "Pricing"], &["2", "3"]),
        ],
    ));
    let analytics = Analytics::new(client(service, 60), "12345");

    let records = analytics
        .fetch_visitors_and_page_views(january(), None)
        .await
        .unwrap();

    assert_eq!(
        serde_json::to_value(&records).unwrap(),
        json!([
            {"date": "Mon, Jan 1, 2024", "pageTitle": "Home", "visitors": 5, "pageViews": 12},
            {"date": "Tue, Jan 2, 2024", "pageTitle": "Pricing", "visitors": 2, "pageViews": 3}
        ])
    );
}

#[tokio::test]
async fn top_browsers_are_summarized_past_the_limit() {
    let sessions = ["100", "90", "80", "70", "60", "50", "40", "30", "20", "10", "5", "1"];
    let names: Vec<String> = (0..sessions.len()).map(|i| format!("Browser {i}")).collect();

    let body = json!({
        "reports": [{
            "columnHeader": {
                "dimensions": ["ga:browser"],
                "metricHeader": {"metricHeaderEntries": [{"name": "sessions", "type": "INTEGER"}]}
            },
            "data": {
                "rows": names.iter().zip(sessions).map(|(name, count)| json!({
                    "dimensions": [name],
                    "metrics": [{"values": [count]}]
                })).collect::<Vec<_>>()
            }
        }]
    });
    let service = FakeReportingService::returning(body);
    let analytics = Analytics::new(client(service.clone(), 60), "12345");

    let browsers = analytics.fetch_top_browsers(january(), 10).await.unwrap();

    assert_eq!(browsers.len(), 10);
    assert_eq!(browsers[0].browser, "Browser 0");
    assert_eq!(browsers[8].sessions, 20);
    assert_eq!(
        browsers[9],
        BrowserSessions {
            browser: "Others".to_string(),
            sessions: 16,
        }
    );

    // The limit is applied after fetching, never sent as a page size.
    assert!(service.last_request()["reportRequests"][0].get("pageSize").is_none());
}

#[tokio::test]
async fn traffic_by_day_hour_groups_rows_by_weekday() {
    let service = FakeReportingService::returning(report(
        &["ga:dateHour"],
        &["users"],
        &[(&["2024010100"], &["5"]), (&["2024010101"], &["7"])],
    ));
    let analytics = Analytics::new(client(service, 60), "12345");

    let traffic = analytics.fetch_traffic_by_day_hour(january()).await.unwrap();

    assert_eq!(
        traffic.get("Monday").unwrap(),
        &[
            HourlyVisitors {
                hour: "00".to_string(),
                visitors: 5
            },
            HourlyVisitors {
                hour: "01".to_string(),
                visitors: 7
            },
        ]
    );
    assert_eq!(traffic.weekdays().count(), 1);
}

#[tokio::test]
async fn missing_report_yields_empty_records() {
    let service = FakeReportingService::returning(json!({}));
    let analytics = Analytics::new(client(service, 60), "12345");

    assert!(analytics.fetch_geo(january(), None).await.unwrap().is_empty());
    assert!(analytics
        .fetch_traffic_by_day_hour(january())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn malformed_dates_surface_as_errors() {
    let service = FakeReportingService::returning(report(
        &["ga:date"],
        &["users", "pageviews", "sessions", "bounceRate"],
        &[(&["not-a-date"], &["1", "2", "3", "40.0"])],
    ));
    let analytics = Analytics::new(client(service, 60), "12345");

    let err = analytics.fetch_traffic_summary(january()).await.unwrap_err();
    assert!(matches!(
        err,
        AnalyticsError::MalformedRow {
            report: "traffic_summary",
            ..
        }
    ));
}

#[tokio::test]
async fn fetch_report_dispatches_by_kind() {
    let service = FakeReportingService::returning(report(
        &["ga:city", "ga:country"],
        &["users"],
        &[(&["Oslo", "Norway"], &["31"])],
    ));
    let analytics = Analytics::new(client(service, 60), "12345");

    let report = analytics
        .fetch_report("cities".parse::<ReportKind>().unwrap(), january(), Some(5))
        .await
        .unwrap();

    match &report {
        Report::Cities(cities) => {
            assert_eq!(cities.len(), 1);
            assert_eq!(cities[0].city, "Oslo, Norway");
            assert_eq!(cities[0].visitors, 31);
        }
        other => panic!("unexpected report {other:?}"),
    }
    assert_eq!(
        serde_json::to_value(&report).unwrap(),
        json!([{"city": "Oslo, Norway", "visitors": 31}])
    );
}

#[tokio::test]
async fn service_passthrough_exposes_the_provider_handle() {
    let service = FakeReportingService::returning(report(&[], &["users"], &[]));
    let analytics = Analytics::new(client(service.clone(), 60), "12345");

    let request = serde_json::from_value(json!({
        "reportRequests": [{
            "viewId": "12345",
            "dateRanges": [{"startDate": "2024-01-01", "endDate": "2024-01-02"}],
            "metrics": [{"expression": "ga:users", "alias": "users"}]
        }]
    }))
    .unwrap();

    analytics.service().batch_get(&request).await.unwrap();

    assert_eq!(service.calls(), 1);
}
