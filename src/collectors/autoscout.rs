//! AutoScout24 collector.
//!
//! The search-results page embeds its listing data in a `__NEXT_DATA__` JSON
//! blob, which is far more stable than the rendered markup; the collector
//! pulls the script tag out with a selector and walks the JSON.

use crate::collectors::http_client;
use crate::collectors::traits::Collector;
use crate::collectors::types::SearchQuery;
use crate::config::Config;
use crate::models::RawListing;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use serde_json::Value;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// AutoScout24 listing ids are UUIDs embedded at the end of the URL slug.
fn listing_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"([a-f0-9]{8}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{12})")
            .expect("static regex")
    })
}

/// National AutoScout24 portal to search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Market {
    Germany,
    Netherlands,
}

impl Market {
    fn domain(self) -> &'static str {
        match self {
            Market::Germany => "www.autoscout24.de",
            Market::Netherlands => "www.autoscout24.nl",
        }
    }
}

pub struct AutoScoutCollector {
    client: Client,
    market: Market,
    year_from: i32,
    year_to: i32,
}

impl AutoScoutCollector {
    pub fn new(config: &Config, market: Market) -> Result<Self> {
        Ok(Self {
            client: http_client(&config.scraping)?,
            market,
            year_from: config.search.year_from,
            year_to: config.search.year_to,
        })
    }

    fn search_url(&self, query: &SearchQuery) -> String {
        format!(
            "https://{}/lst/mercedes-benz?atype=C&fuel=D&fregfrom={}&fregto={}&desc=0&ustate=N%2CU&q={}",
            self.market.domain(),
            self.year_from,
            self.year_to,
            query.term
        )
    }

    /// Pull the `__NEXT_DATA__` blob out of the page and map its listings to
    /// raw fragments. Individual malformed listings are skipped, not fatal.
    fn parse_listings(&self, html: &str) -> Result<Vec<RawListing>> {
        let document = Html::parse_document(html);
        let selector = Selector::parse("script#__NEXT_DATA__")
            .map_err(|e| anyhow!("Invalid __NEXT_DATA__ selector: {e}"))?;
        let script = document
            .select(&selector)
            .next()
            .ok_or_else(|| anyhow!("No __NEXT_DATA__ script on search page"))?;
        let data: Value = serde_json::from_str(&script.inner_html())
            .context("Failed to parse __NEXT_DATA__ JSON")?;

        let listings = data
            .pointer("/props/pageProps/listings")
            .and_then(Value::as_array)
            .ok_or_else(|| anyhow!("__NEXT_DATA__ has no listings array"))?;

        debug!(count = listings.len(), "AutoScout24 listings in JSON");

        Ok(listings
            .iter()
            .filter_map(|listing| self.raw_listing(listing))
            .collect())
    }

    fn raw_listing(&self, listing: &Value) -> Option<RawListing> {
        let path = listing.get("url").and_then(Value::as_str).unwrap_or("");
        if path.is_empty() {
            return None;
        }
        let url = if path.starts_with('/') {
            format!("https://{}{}", self.market.domain(), path)
        } else {
            path.to_string()
        };

        let vehicle = listing.get("vehicle").cloned().unwrap_or(Value::Null);
        let tracking = listing.get("tracking").cloned().unwrap_or(Value::Null);

        // Some portals ship listings without a title; the URL slug still
        // carries make, trim and chassis code.
        let mut title = text_at(&vehicle, "title");
        if title.trim().is_empty() {
            let make = text_at(&tracking, "make");
            let model = text_at(&tracking, "model");
            title = format!("{make} {model}").trim().to_string();
        }
        if title.trim().is_empty() {
            title = path
                .trim_start_matches("/angebote/")
                .split('?')
                .next()
                .unwrap_or("")
                .replace('-', " ");
        }

        let price_text = listing
            .pointer("/price/priceFormatted")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| listing.get("price").and_then(Value::as_f64).map(|p| format!("€ {p}")))
            .unwrap_or_default();

        let year_text = [
            text_at(&tracking, "firstRegistrationYear"),
            text_at(&vehicle, "firstRegistration"),
            text_at(&tracking, "firstRegistration"),
        ]
        .into_iter()
        .find(|t| !t.is_empty())
        .unwrap_or_default();

        let mileage_text = [
            text_at(&tracking, "mileage"),
            text_at(&vehicle, "mileage"),
        ]
        .into_iter()
        .find(|t| !t.is_empty())
        .map(|t| if t.to_lowercase().contains("km") { t } else { format!("{t} km") })
        .unwrap_or_default();

        let native_id = listing_id_re()
            .captures(path)
            .map(|caps| caps[1].to_string())
            .or_else(|| path.rsplit('/').next().map(str::to_string))
            .unwrap_or_default();

        Some(RawListing {
            title,
            description: text_at(&vehicle, "description"),
            price_text,
            year_text,
            mileage_text,
            detail_text: String::new(),
            location: listing
                .pointer("/seller/city")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string(),
            image_url: listing
                .pointer("/images/0")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string(),
            native_id,
            url,
        })
    }
}

/// String form of a field that may be a string or a number in the JSON.
fn text_at(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

#[async_trait]
impl Collector for AutoScoutCollector {
    async fn collect(&self, query: &SearchQuery) -> Result<Vec<RawListing>> {
        let url = self.search_url(query);
        debug!(%url, "Fetching AutoScout24 search page");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch AutoScout24 search page")?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "AutoScout24 returned an error status");
            anyhow::bail!("AutoScout24 search returned {}", response.status());
        }

        let html = response.text().await.context("Failed to read response body")?;
        self.parse_listings(&html)
    }

    fn source_name(&self) -> &'static str {
        "AutoScout24"
    }

    fn source_tag(&self) -> &'static str {
        match self.market {
            Market::Germany => "as24-de",
            Market::Netherlands => "as24-nl",
        }
    }

    fn country(&self) -> &'static str {
        match self.market {
            Market::Germany => "DE",
            Market::Netherlands => "NL",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collector() -> AutoScoutCollector {
        AutoScoutCollector::new(&Config::default(), Market::Germany).expect("client")
    }

    fn page_with(listings: &str) -> String {
        format!(
            r#"<html><body>
            <script id="__NEXT_DATA__" type="application/json">
            {{"props":{{"pageProps":{{"listings":[{listings}]}}}}}}
            </script>
            </body></html>"#
        )
    }

    #[test]
    fn parses_listing_from_next_data() {
        let html = page_with(
            r#"{
                "url": "/angebote/mercedes-benz-240-d-w123-0f721096-6a1b-4c71-a8f5-9d2e3b1c4d5e",
                "vehicle": {"title": "Mercedes-Benz 240 D W123", "firstRegistration": "03/1984"},
                "tracking": {"mileage": 210000},
                "price": {"priceFormatted": "€ 4.500,-"},
                "seller": {"city": "Hamburg"},
                "images": ["https://img.example/1.jpg"]
            }"#,
        );

        let listings = collector().parse_listings(&html).unwrap();
        assert_eq!(listings.len(), 1);
        let raw = &listings[0];
        assert_eq!(raw.title, "Mercedes-Benz 240 D W123");
        assert_eq!(raw.year_text, "03/1984");
        assert_eq!(raw.mileage_text, "210000 km");
        assert_eq!(raw.price_text, "€ 4.500,-");
        assert_eq!(raw.location, "Hamburg");
        assert_eq!(raw.native_id, "0f721096-6a1b-4c71-a8f5-9d2e3b1c4d5e");
        assert!(raw.url.starts_with("https://www.autoscout24.de/angebote/"));
    }

    #[test]
    fn builds_title_from_url_slug_when_absent() {
        let html = page_with(r#"{"url": "/angebote/mercedes-benz-240-d-w123-limo"}"#);
        let listings = collector().parse_listings(&html).unwrap();
        assert_eq!(listings[0].title, "mercedes benz 240 d w123 limo");
    }

    #[test]
    fn skips_listing_without_url() {
        let html = page_with(r#"{"vehicle": {"title": "Mercedes-Benz 240 D"}}"#);
        let listings = collector().parse_listings(&html).unwrap();
        assert!(listings.is_empty());
    }

    #[test]
    fn page_without_next_data_is_an_error() {
        assert!(collector().parse_listings("<html><body></body></html>").is_err());
    }

    #[test]
    fn search_url_carries_profile_bounds() {
        let url = collector().search_url(&SearchQuery::new("w123"));
        assert!(url.contains("fregfrom=1979"));
        assert!(url.contains("fregto=1986"));
        assert!(url.contains("fuel=D"));
        assert!(url.contains("q=w123"));
    }
}
