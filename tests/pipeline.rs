//! End-to-end pipeline scenarios: raw fragments through normalization,
//! classification and the upsert store.

use diesel_scout::config::Config;
use diesel_scout::models::RawListing;
use diesel_scout::pipeline::Normalizer;
use diesel_scout::store::AdvertisementStore;

fn normalizer() -> Normalizer {
    Normalizer::new(&Config::default().search)
}

fn w123_listing() -> RawListing {
    RawListing {
        title: "Mercedes-Benz W123 240D".into(),
        year_text: "EZ 03/1984".into(),
        price_text: "€ 4.500,-".into(),
        mileage_text: "210.000 km".into(),
        location: "Hamburg".into(),
        native_id: "1001".into(),
        url: "https://www.example.de/anzeige/1001".into(),
        ..RawListing::default()
    }
}

#[tokio::test]
async fn classic_diesel_flows_into_the_store() {
    let store = AdvertisementStore::in_memory().await.unwrap();

    let ad = normalizer()
        .normalize("AutoScout24", "as24-de", "DE", &w123_listing())
        .expect("in-scope candidate");
    assert_eq!(ad.model, "W123");
    assert_eq!(ad.year, Some(1984));
    assert_eq!(ad.price, Some(4500.0));
    assert_eq!(ad.mileage, Some(210_000));

    assert!(store.upsert(&ad).await.unwrap());

    let config = Config::default();
    let top = store
        .query_top(10, &config.search.inclusion_years(), config.search.min_price)
        .await
        .unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].external_id, "as24-de-1001");
    assert_eq!(top[0].country, "DE");
}

#[tokio::test]
async fn out_of_window_year_is_rejected_despite_matching_keywords() {
    let mut raw = w123_listing();
    raw.year_text = "EZ 03/1998".into();
    assert!(normalizer().normalize("AutoScout24", "as24-de", "DE", &raw).is_none());
}

#[tokio::test]
async fn modern_hybrid_is_rejected_regardless_of_year() {
    let raw = RawListing {
        title: "Mercedes-Benz C300e Hybrid".into(),
        year_text: "EZ 03/1984".into(),
        url: "https://www.example.de/anzeige/1002".into(),
        native_id: "1002".into(),
        ..RawListing::default()
    };
    assert!(normalizer().normalize("AutoScout24", "as24-de", "DE", &raw).is_none());
}

#[tokio::test]
async fn reobservation_refreshes_volatile_fields_only() {
    let store = AdvertisementStore::in_memory().await.unwrap();
    let normalizer = normalizer();

    let first = normalizer
        .normalize("AutoScout24", "as24-de", "DE", &w123_listing())
        .unwrap();
    store.upsert(&first).await.unwrap();
    let stored_first = store.query_active(None, None).await.unwrap().remove(0);

    // Same listing, scraped again later: price dropped, odometer moved,
    // seller rewrote the title.
    let mut raw = w123_listing();
    raw.price_text = "€ 3.950,-".into();
    raw.mileage_text = "212.500 km".into();
    raw.title = "Mercedes-Benz W123 240D — PRICE DROP".into();
    let second = normalizer.normalize("AutoScout24", "as24-de", "DE", &raw).unwrap();
    store.upsert(&second).await.unwrap();

    let rows = store.query_active(None, None).await.unwrap();
    assert_eq!(rows.len(), 1, "same external id must stay one row");
    let row = &rows[0];
    assert_eq!(row.price, Some(3950.0));
    assert_eq!(row.mileage, Some(212_500));
    assert_eq!(row.title.as_deref(), Some("Mercedes-Benz W123 240D"));
    assert_eq!(row.date_added, stored_first.date_added);
}

#[tokio::test]
async fn two_sources_with_the_same_native_id_do_not_collide() {
    let store = AdvertisementStore::in_memory().await.unwrap();
    let normalizer = normalizer();

    let german = normalizer
        .normalize("AutoScout24", "as24-de", "DE", &w123_listing())
        .unwrap();
    let mut raw = w123_listing();
    raw.url = "https://www.example.nl/aanbod/1001".into();
    let dutch = normalizer.normalize("AutoScout24", "as24-nl", "NL", &raw).unwrap();

    store.upsert(&german).await.unwrap();
    store.upsert(&dutch).await.unwrap();

    let rows = store.query_active(None, None).await.unwrap();
    assert_eq!(rows.len(), 2);
}

#[tokio::test]
async fn statistics_reflect_the_business_filter() {
    let store = AdvertisementStore::in_memory().await.unwrap();
    let normalizer = normalizer();
    let config = Config::default();

    store
        .upsert(&normalizer.normalize("AutoScout24", "as24-de", "DE", &w123_listing()).unwrap())
        .await
        .unwrap();

    // parts listing: in-scope keywords, near-zero price
    let mut parts = w123_listing();
    parts.price_text = "€ 150".into();
    parts.native_id = "1003".into();
    parts.url = "https://www.example.de/anzeige/1003".into();
    store
        .upsert(&normalizer.normalize("AutoScout24", "as24-de", "DE", &parts).unwrap())
        .await
        .unwrap();

    let stats = store
        .statistics(&config.search.inclusion_years(), config.search.min_price)
        .await
        .unwrap();
    assert_eq!(stats.total_active, 1);
    assert_eq!(stats.by_country.get("DE"), Some(&1));
    assert!(stats.last_update.is_some());
}
