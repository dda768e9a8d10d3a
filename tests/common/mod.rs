//! Shared fixtures: an in-process reporting service that records every request.

#![allow(dead_code)]

use async_trait::async_trait;
use ganalytics::cache::{CacheStore, MemoryCache};
use ganalytics::provider::wire::GetReportsResponse;
use ganalytics::provider::{GetReportsRequest, ReportingService};
use ganalytics::{AnalyticsClient, AnalyticsError};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub struct FakeReportingService {
    response: GetReportsResponse,
    failure: Option<u16>,
    calls: AtomicUsize,
    requests: Mutex<Vec<GetReportsRequest>>,
}

impl FakeReportingService {
    pub fn returning(response: Value) -> Arc<Self> {
        Arc::new(Self {
            response: serde_json::from_value(response).unwrap(),
            failure: None,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(status: u16) -> Arc<Self> {
        Arc::new(Self {
            response: GetReportsResponse::default(),
            failure: Some(status),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Value {
        let requests = self.requests.lock().unwrap();
        serde_json::to_value(requests.last().expect("no request was sent")).unwrap()
    }
}

#[async_trait]
impl ReportingService for FakeReportingService {
    async fn batch_get(&self, request: &GetReportsRequest) -> ganalytics::Result<GetReportsResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        match self.failure {
            Some(status) => Err(AnalyticsError::remote(Some(status), "quota exceeded")),
            None => Ok(self.response.clone()),
        }
    }
}

/// A single-report response with the given headers and rows.
pub fn report(dimensions: &[&str], metrics: &[&str], rows: &[(&[&str], &[&str])]) -> Value {
    let rows: Vec<Value> = rows
        .iter()
        .map(|(dims, values)| {
            json!({
                "dimensions": dims,
                "metrics": [{ "values": values }]
            })
        })
        .collect();

    let entries: Vec<Value> = metrics
        .iter()
        .map(|name| json!({ "name": name, "type": "INTEGER" }))
        .collect();

    json!({
        "reports": [{
            "columnHeader": {
                "dimensions": dimensions,
                "metricHeader": { "metricHeaderEntries": entries }
            },
            "data": { "rows": rows, "rowCount": rows.len() }
        }]
    })
}

pub fn client(service: Arc<FakeReportingService>, cache_minutes: u64) -> AnalyticsClient {
    let cache: Arc<dyn CacheStore> = Arc::new(MemoryCache::new(1_000));
    AnalyticsClient::new(service, cache).with_cache_lifetime_in_minutes(cache_minutes)
}
