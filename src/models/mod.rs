use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Canonical advertisement record, one row per `external_id`.
///
/// Only `price`, `mileage`, `date_updated` and `is_active` are refreshed on
/// re-observation; descriptive fields keep their first-seen values.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Advertisement {
    /// Stable per-source listing identifier, used as the upsert key.
    pub external_id: String,
    /// Coarse chassis-family tag (e.g. "W123"), derived from title/URL.
    pub model: String,
    pub year: Option<i32>,
    /// Odometer reading in kilometers.
    pub mileage: Option<i64>,
    pub price: Option<f64>,
    pub currency: String,
    pub location: Option<String>,
    pub country: String,
    pub source: String,
    /// Canonical absolute URL of the original listing; required for persistence.
    pub source_url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    /// Set by the store at first insert, never changed afterwards.
    pub date_added: Option<DateTime<Utc>>,
    /// Set by the store on every successful re-observation.
    pub date_updated: Option<DateTime<Utc>>,
    pub is_active: bool,
}

/// Raw per-site fragments for one candidate listing, before normalization.
///
/// Every site exposes a different subset of these; an empty string means the
/// fragment was not available and the extractors treat it as unknown.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawListing {
    pub title: String,
    pub description: String,
    pub price_text: String,
    pub year_text: String,
    pub mileage_text: String,
    /// Combined detail string (tag row, key-figure lines) some sites expose
    /// instead of dedicated year/mileage fields.
    pub detail_text: String,
    pub location: String,
    pub image_url: String,
    /// Site-native listing id, when one could be read from the page or URL.
    pub native_id: String,
    /// Absolute URL of the listing.
    pub url: String,
}

/// Store-level aggregates served by the statistics endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statistics {
    pub total_active: i64,
    pub by_country: BTreeMap<String, i64>,
    pub last_update: Option<DateTime<Utc>>,
}

/// Totals for one collection run, reported at run end.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RunReport {
    /// Candidates returned by collectors.
    pub found: usize,
    /// Records accepted and written (new or refreshed).
    pub saved: usize,
    /// Candidates dropped by the classification filter.
    pub rejected: usize,
    /// Collector queries that failed and contributed zero results.
    pub failed_queries: usize,
}
