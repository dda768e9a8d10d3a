use serde_json::json;
use sha2::{Digest, Sha256};

use crate::query::QueryDescriptor;

/// Namespace separating report entries from anything else sharing the store.
pub const KEY_PREFIX: &str = "ganalytics.report.";

/// Derive the cache key for a query.
///
/// The key hashes the query arguments as a positional array in the exact order
/// the fetcher receives them. Absent optional arguments serialize as `null`, so
/// leaving one out and passing a non-null default yield different keys.
pub fn derive_key(query: &QueryDescriptor) -> String {
    let arguments = json!([
        query.view_id(),
        query.start_date().format("%Y-%m-%d").to_string(),
        query.end_date().format("%Y-%m-%d").to_string(),
        query.metrics(),
        query.dimensions(),
        query.sort_by_field(),
        query.max_results(),
        query.extra(),
    ]);

    let digest = Sha256::digest(arguments.to_string().as_bytes());
    format!("{KEY_PREFIX}{digest:x}")
}
