//! Kleinanzeigen.de collector.
//!
//! Classified ads rendered as plain HTML; each result is an `article` node
//! with the listing id in a `data-adid` attribute.

use crate::collectors::http_client;
use crate::collectors::traits::Collector;
use crate::collectors::types::SearchQuery;
use crate::config::Config;
use crate::models::RawListing;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

const BASE_URL: &str = "https://www.kleinanzeigen.de";

pub struct KleinanzeigenCollector {
    client: Client,
}

impl KleinanzeigenCollector {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: http_client(&config.scraping)?,
        })
    }

    fn search_url(&self, query: &SearchQuery) -> String {
        // c216 is the cars category
        format!("{BASE_URL}/s-autos/mercedes-{}/k0c216", query.term)
    }

    fn parse_listings(&self, html: &str) -> Result<Vec<RawListing>> {
        let document = Html::parse_document(html);
        let item_sel = sel("article.aditem")?;
        let title_sel = sel("a.ellipsis")?;
        let price_sel = sel("p.aditem-main--middle--price-shipping--price")?;
        let desc_sel = sel("p.aditem-main--middle--description")?;
        let location_sel = sel("div.aditem-main--top--left")?;
        let tag_sel = sel("div.aditem-main--bottom span.simpletag")?;
        let image_sel = sel("div.imagebox img")?;

        let mut listings = Vec::new();
        for item in document.select(&item_sel) {
            let Some(anchor) = item.select(&title_sel).next() else {
                continue;
            };
            let title = element_text(&anchor);
            let href = anchor.value().attr("href").unwrap_or("");
            if href.is_empty() {
                continue;
            }
            let url = if href.starts_with('/') {
                format!("{BASE_URL}{href}")
            } else {
                href.to_string()
            };

            // Year and mileage live in the tag row ("1984", "210.000 km").
            let detail_text = item
                .select(&tag_sel)
                .map(|tag| element_text(&tag))
                .collect::<Vec<_>>()
                .join(" · ");

            listings.push(RawListing {
                title,
                description: item.select(&desc_sel).next().map(|e| element_text(&e)).unwrap_or_default(),
                price_text: item.select(&price_sel).next().map(|e| element_text(&e)).unwrap_or_default(),
                year_text: String::new(),
                mileage_text: String::new(),
                detail_text,
                location: item.select(&location_sel).next().map(|e| element_text(&e)).unwrap_or_default(),
                image_url: item
                    .select(&image_sel)
                    .next()
                    .and_then(|img| img.value().attr("src").or_else(|| img.value().attr("data-imgsrc")))
                    .unwrap_or("")
                    .to_string(),
                native_id: item.value().attr("data-adid").unwrap_or("").to_string(),
                url,
            });
        }

        debug!(count = listings.len(), "Kleinanzeigen listings parsed");
        Ok(listings)
    }
}

fn sel(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| anyhow!("Invalid selector {selector}: {e}"))
}

/// Whitespace-normalized text content of an element.
fn element_text(element: &ElementRef) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[async_trait]
impl Collector for KleinanzeigenCollector {
    async fn collect(&self, query: &SearchQuery) -> Result<Vec<RawListing>> {
        let url = self.search_url(query);
        debug!(%url, "Fetching Kleinanzeigen search page");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch Kleinanzeigen search page")?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "Kleinanzeigen returned an error status");
            anyhow::bail!("Kleinanzeigen search returned {}", response.status());
        }

        let html = response.text().await.context("Failed to read response body")?;
        self.parse_listings(&html)
    }

    fn source_name(&self) -> &'static str {
        "Kleinanzeigen"
    }

    fn source_tag(&self) -> &'static str {
        "ka"
    }

    fn country(&self) -> &'static str {
        "DE"
    }
}
