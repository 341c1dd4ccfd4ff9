//! One collection run: every collector, every search term, sequentially.

use crate::collectors::traits::Collector;
use crate::collectors::types::SearchQuery;
use crate::collectors::{AutoScoutCollector, KleinanzeigenCollector, Market};
use crate::config::Config;
use crate::models::RunReport;
use crate::pipeline::Normalizer;
use crate::store::AdvertisementStore;
use anyhow::Result;
use std::time::Duration;
use tracing::{info, warn};

/// Drives the collectors and feeds every candidate through the shared
/// normalize → classify → upsert pipeline.
///
/// A failing query or site is logged and contributes zero results; the run
/// itself always completes and reports what succeeded.
pub struct CollectionSession {
    store: AdvertisementStore,
    normalizer: Normalizer,
    collectors: Vec<Box<dyn Collector>>,
    queries: Vec<SearchQuery>,
    delay: Duration,
}

impl CollectionSession {
    /// Session over the built-in collector set.
    pub fn new(config: &Config, store: AdvertisementStore) -> Result<Self> {
        let collectors: Vec<Box<dyn Collector>> = vec![
            Box::new(AutoScoutCollector::new(config, Market::Germany)?),
            Box::new(AutoScoutCollector::new(config, Market::Netherlands)?),
            Box::new(KleinanzeigenCollector::new(config)?),
        ];
        Ok(Self::with_collectors(config, store, collectors))
    }

    pub fn with_collectors(
        config: &Config,
        store: AdvertisementStore,
        collectors: Vec<Box<dyn Collector>>,
    ) -> Self {
        Self {
            store,
            normalizer: Normalizer::new(&config.search),
            collectors,
            queries: config
                .search
                .search_terms
                .iter()
                .map(SearchQuery::new)
                .collect(),
            delay: Duration::from_secs(config.scraping.request_delay_secs),
        }
    }

    /// Run collection, optionally restricted to one country code.
    pub async fn run(&self, country: Option<&str>) -> RunReport {
        let mut report = RunReport::default();

        for collector in &self.collectors {
            if let Some(filter) = country {
                if !collector.country().eq_ignore_ascii_case(filter) {
                    continue;
                }
            }

            info!(
                source = collector.source_name(),
                country = collector.country(),
                "Collecting"
            );
            let mut found: i64 = 0;
            let mut saved: i64 = 0;
            let mut failed_queries = 0;

            for query in &self.queries {
                match collector.collect(query).await {
                    Ok(candidates) => {
                        found += candidates.len() as i64;
                        report.found += candidates.len();
                        for raw in &candidates {
                            let normalized = self.normalizer.normalize(
                                collector.source_name(),
                                collector.source_tag(),
                                collector.country(),
                                raw,
                            );
                            match normalized {
                                Some(ad) => match self.store.upsert(&ad).await {
                                    Ok(true) => {
                                        saved += 1;
                                        report.saved += 1;
                                    }
                                    Ok(false) => {}
                                    Err(e) => {
                                        warn!(error = %e, "Failed to persist advertisement")
                                    }
                                },
                                None => report.rejected += 1,
                            }
                        }
                    }
                    Err(e) => {
                        warn!(
                            source = collector.source_name(),
                            term = %query.term,
                            error = %e,
                            "Query failed, continuing with next"
                        );
                        failed_queries += 1;
                        report.failed_queries += 1;
                    }
                }
                tokio::time::sleep(self.delay).await;
            }

            let status = if failed_queries == 0 {
                "success".to_string()
            } else {
                format!("error: {failed_queries} queries failed")
            };
            if let Err(e) = self
                .store
                .log_scrape(collector.country(), collector.source_name(), found, saved, &status)
                .await
            {
                warn!(error = %e, "Failed to log scrape history");
            }
            info!(
                source = collector.source_name(),
                found, saved, "Source finished"
            );
        }

        info!(
            found = report.found,
            saved = report.saved,
            rejected = report.rejected,
            failed_queries = report.failed_queries,
            "Collection run completed"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawListing;
    use anyhow::anyhow;
    use async_trait::async_trait;

    struct StubCollector {
        listings: Vec<RawListing>,
        fail: bool,
    }

    #[async_trait]
    impl Collector for StubCollector {
        async fn collect(&self, _query: &SearchQuery) -> Result<Vec<RawListing>> {
            if self.fail {
                return Err(anyhow!("connection reset"));
            }
            Ok(self.listings.clone())
        }

        fn source_name(&self) -> &'static str {
            "StubMarket"
        }

        fn source_tag(&self) -> &'static str {
            "stub"
        }

        fn country(&self) -> &'static str {
            "DE"
        }
    }

    fn test_config() -> Config {
        let mut config = Config::default();
        config.scraping.request_delay_secs = 0;
        config.search.search_terms = vec!["w123".into()];
        config
    }

    fn classic() -> RawListing {
        RawListing {
            title: "Mercedes-Benz W123 240D".into(),
            year_text: "EZ 03/1984".into(),
            price_text: "€ 4.500,-".into(),
            mileage_text: "210.000 km".into(),
            native_id: "42".into(),
            url: "https://stub.example/anzeige/42".into(),
            ..RawListing::default()
        }
    }

    fn modern() -> RawListing {
        RawListing {
            title: "Mercedes-Benz GLC 300e Hybrid".into(),
            native_id: "43".into(),
            url: "https://stub.example/anzeige/43".into(),
            ..RawListing::default()
        }
    }

    #[tokio::test]
    async fn run_persists_accepted_and_drops_rejected() {
        let config = test_config();
        let store = AdvertisementStore::in_memory().await.unwrap();
        let session = CollectionSession::with_collectors(
            &config,
            store.clone(),
            vec![Box::new(StubCollector {
                listings: vec![classic(), modern()],
                fail: false,
            })],
        );

        let report = session.run(None).await;
        assert_eq!(report.found, 2);
        assert_eq!(report.saved, 1);
        assert_eq!(report.rejected, 1);
        assert_eq!(report.failed_queries, 0);

        let active = store.query_active(None, None).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].external_id, "stub-42");
        assert_eq!(active[0].source, "StubMarket");
    }

    #[tokio::test]
    async fn failing_collector_contributes_zero_results() {
        let config = test_config();
        let store = AdvertisementStore::in_memory().await.unwrap();
        let session = CollectionSession::with_collectors(
            &config,
            store.clone(),
            vec![
                Box::new(StubCollector {
                    listings: vec![],
                    fail: true,
                }),
                Box::new(StubCollector {
                    listings: vec![classic()],
                    fail: false,
                }),
            ],
        );

        let report = session.run(None).await;
        assert_eq!(report.failed_queries, 1);
        assert_eq!(report.saved, 1);
    }

    #[tokio::test]
    async fn country_filter_skips_other_collectors() {
        let config = test_config();
        let store = AdvertisementStore::in_memory().await.unwrap();
        let session = CollectionSession::with_collectors(
            &config,
            store.clone(),
            vec![Box::new(StubCollector {
                listings: vec![classic()],
                fail: false,
            })],
        );

        let report = session.run(Some("NL")).await;
        assert_eq!(report.found, 0);
        assert!(store.query_active(None, None).await.unwrap().is_empty());

        let report = session.run(Some("de")).await;
        assert_eq!(report.found, 1);
    }

    #[tokio::test]
    async fn rerunning_is_idempotent() {
        let config = test_config();
        let store = AdvertisementStore::in_memory().await.unwrap();
        let session = CollectionSession::with_collectors(
            &config,
            store.clone(),
            vec![Box::new(StubCollector {
                listings: vec![classic()],
                fail: false,
            })],
        );

        session.run(None).await;
        session.run(None).await;
        assert_eq!(store.query_active(None, None).await.unwrap().len(), 1);
    }
}
