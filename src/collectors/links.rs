//! Search-redirect placeholders for marketplaces that block scrapers.
//!
//! These rows point users at a prepared search page instead of an individual
//! listing. They carry the `search-` external-id prefix so the top-listing
//! queries can exclude them.

use crate::models::Advertisement;
use crate::store::{AdvertisementStore, SEARCH_LINK_PREFIX};
use anyhow::Result;
use tracing::info;

struct SearchLink {
    slug: &'static str,
    model: &'static str,
    country: &'static str,
    location: &'static str,
    source: &'static str,
    url: &'static str,
    title: &'static str,
}

const SEARCH_LINKS: &[SearchLink] = &[
    SearchLink {
        slug: "ebay-de-w123",
        model: "W123",
        country: "DE",
        location: "Duitsland",
        source: "eBay.de",
        url: "https://www.ebay.de/sch/9801/i.html?_nkw=mercedes+w123+diesel&_sop=10",
        title: "Zoek Mercedes W123 Diesel op eBay.de",
    },
    SearchLink {
        slug: "ebay-de-w124",
        model: "W124",
        country: "DE",
        location: "Duitsland",
        source: "eBay.de",
        url: "https://www.ebay.de/sch/9801/i.html?_nkw=mercedes+w124+diesel&_sop=10",
        title: "Zoek Mercedes W124 Diesel op eBay.de",
    },
    SearchLink {
        slug: "gaspedaal-w123",
        model: "W123",
        country: "NL",
        location: "Nederland",
        source: "Gaspedaal.nl",
        url: "https://www.gaspedaal.nl/mercedes-benz?q=w123+diesel",
        title: "Zoek Mercedes W123 Diesel op Gaspedaal.nl",
    },
    SearchLink {
        slug: "gaspedaal-w124",
        model: "W124",
        country: "NL",
        location: "Nederland",
        source: "Gaspedaal.nl",
        url: "https://www.gaspedaal.nl/mercedes-benz?q=w124+diesel",
        title: "Zoek Mercedes W124 Diesel op Gaspedaal.nl",
    },
    SearchLink {
        slug: "2dehands-w123",
        model: "W123",
        country: "BE",
        location: "België",
        source: "2dehands.be",
        url: "https://www.2dehands.be/l/auto-s/q/mercedes+w123+diesel/",
        title: "Zoek Mercedes W123 Diesel op 2dehands.be",
    },
    SearchLink {
        slug: "autotrack-w123",
        model: "W123",
        country: "NL",
        location: "Nederland",
        source: "AutoTrack.nl",
        url: "https://www.autotrack.nl/aanbod/mercedes-benz?zoekterm=w123",
        title: "Zoek Mercedes W123 Diesel op AutoTrack.nl",
    },
];

/// Upsert the fixed set of search-page records. Returns how many rows were
/// written.
pub async fn seed_search_links(store: &AdvertisementStore) -> Result<usize> {
    let mut seeded = 0;
    for link in SEARCH_LINKS {
        let ad = Advertisement {
            external_id: format!("{SEARCH_LINK_PREFIX}{}", link.slug),
            model: link.model.to_string(),
            year: None,
            mileage: None,
            price: None,
            currency: "EUR".to_string(),
            location: Some(link.location.to_string()),
            country: link.country.to_string(),
            source: link.source.to_string(),
            source_url: link.url.to_string(),
            title: Some(link.title.to_string()),
            description: None,
            image_url: None,
            date_added: None,
            date_updated: None,
            is_active: true,
        };
        if store.upsert(&ad).await? {
            seeded += 1;
        }
    }
    info!(seeded, "Seeded search-redirect links");
    Ok(seeded)
}
