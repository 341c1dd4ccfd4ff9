//! Record normalizer: raw per-site fragments to a canonical advertisement.

use crate::config::SearchConfig;
use crate::models::{Advertisement, RawListing};
use crate::pipeline::classify::Classifier;
use crate::pipeline::extract::{extract_mileage, extract_price, extract_year};
use sha2::{Digest, Sha256};
use std::ops::RangeInclusive;

const CURRENCY: &str = "EUR";

/// Assembles canonical [`Advertisement`] records from whatever fragments a
/// collector managed to scrape, and gates them through the classifier.
#[derive(Debug, Clone)]
pub struct Normalizer {
    classifier: Classifier,
    model_tags: Vec<String>,
    family_label: String,
    recognition_years: RangeInclusive<i32>,
}

impl Normalizer {
    pub fn new(search: &SearchConfig) -> Self {
        Self {
            classifier: Classifier::new(search),
            model_tags: search.model_tags.clone(),
            family_label: search.family_label.clone(),
            recognition_years: search.recognition_years(),
        }
    }

    /// Normalize one candidate. Returns `None` when the candidate has no URL
    /// to link back to or fails classification; both are silent drops, not
    /// errors.
    ///
    /// `source` is the marketplace display name, `prefix` the short tag that
    /// scopes external ids to this source, `country` the ISO-ish country code.
    pub fn normalize(
        &self,
        source: &str,
        prefix: &str,
        country: &str,
        raw: &RawListing,
    ) -> Option<Advertisement> {
        if raw.url.trim().is_empty() {
            return None;
        }

        // Year: dedicated fragment first, then the combined detail string,
        // then title and description.
        let year = [&raw.year_text, &raw.detail_text, &raw.title, &raw.description]
            .into_iter()
            .find_map(|text| extract_year(text, &self.recognition_years));

        let price = extract_price(&raw.price_text);
        let mileage = [&raw.mileage_text, &raw.detail_text]
            .into_iter()
            .find_map(|text| extract_mileage(text));

        let haystack = format!(
            "{} {} {}",
            raw.title,
            raw.description,
            url_path(&raw.url)
        );
        if !self.classifier.classify(&haystack, year) {
            return None;
        }

        let model = self.model_tag(&format!("{} {}", raw.title, raw.url));
        let native_id = if raw.native_id.trim().is_empty() {
            url_digest(&raw.url)
        } else {
            raw.native_id.trim().to_string()
        };

        Some(Advertisement {
            external_id: format!("{prefix}-{native_id}"),
            model,
            year,
            mileage,
            price,
            currency: CURRENCY.to_string(),
            location: non_empty(&raw.location),
            country: country.to_string(),
            source: source.to_string(),
            source_url: raw.url.trim().to_string(),
            title: non_empty(&raw.title),
            description: non_empty(&raw.description),
            image_url: non_empty(&raw.image_url),
            date_added: None,
            date_updated: None,
            is_active: true,
        })
    }

    /// First configured chassis-code tag found in the text wins; the combined
    /// family label is the fallback.
    fn model_tag(&self, text: &str) -> String {
        let lower = text.to_lowercase();
        self.model_tags
            .iter()
            .find(|tag| lower.contains(&tag.to_lowercase()))
            .cloned()
            .unwrap_or_else(|| self.family_label.clone())
    }
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Path-and-query portion of a URL, used as classifier haystack. Sites often
/// put the trim name only in the URL slug.
fn url_path(url: &str) -> &str {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    rest.split_once('/').map_or("", |(_, path)| path)
}

/// Stable short digest of the listing URL, for sites without a native id.
fn url_digest(url: &str) -> String {
    let digest = Sha256::digest(url.trim().as_bytes());
    hex::encode(&digest[..6])
}
