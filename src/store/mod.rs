//! Deduplication/upsert store over SQLite.
//!
//! One row per `external_id`. A re-observation refreshes the volatile fields
//! (price, mileage, update timestamp, active flag) and leaves the first-seen
//! descriptive fields alone. Rows are never deleted here; collaborators may
//! archive independently.

use crate::models::{Advertisement, Statistics};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::path::Path;
use tracing::warn;

/// External-id prefix of seeded search-page records; the serving queries
/// exclude them from top listings.
pub const SEARCH_LINK_PREFIX: &str = "search-";

#[derive(Clone)]
pub struct AdvertisementStore {
    pool: SqlitePool,
}

impl AdvertisementStore {
    /// Open (creating if necessary) the database file at `path` and run the
    /// schema migration.
    pub async fn connect(path: &str) -> Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .context("Failed to create database directory")?;
            }
        }
        if !Path::new(path).exists() {
            std::fs::File::create(path).context("Failed to create database file")?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&format!("sqlite:{path}"))
            .await
            .context("Failed to open SQLite database")?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// In-memory database, for tests. A single connection keeps every query
    /// on the same in-memory instance.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .context("Failed to open in-memory SQLite database")?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS advertisements (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                external_id TEXT UNIQUE NOT NULL,
                model TEXT NOT NULL,
                year INTEGER,
                mileage INTEGER,
                price REAL,
                currency TEXT NOT NULL DEFAULT 'EUR',
                location TEXT,
                country TEXT NOT NULL,
                source TEXT NOT NULL,
                source_url TEXT NOT NULL,
                title TEXT,
                description TEXT,
                image_url TEXT,
                date_added TEXT NOT NULL,
                date_updated TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS scrape_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                scrape_date TEXT NOT NULL,
                country TEXT NOT NULL,
                source TEXT NOT NULL,
                ads_found INTEGER NOT NULL,
                ads_new INTEGER NOT NULL,
                status TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_ads_country ON advertisements (country)",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_ads_date_updated ON advertisements (date_updated)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert a new record, or refresh the volatile fields of an existing one
    /// with the same `external_id`.
    ///
    /// Returns `true` when a row was written. Records missing their identity
    /// fields are refused quietly: `false`, nothing written, never an error.
    pub async fn upsert(&self, ad: &Advertisement) -> Result<bool> {
        if ad.external_id.trim().is_empty() || ad.source_url.trim().is_empty() {
            warn!(
                source = %ad.source,
                "Refusing advertisement without external_id/source_url"
            );
            return Ok(false);
        }

        let now = Utc::now();
        let result = sqlx::query(
            r"
            INSERT INTO advertisements
                (external_id, model, year, mileage, price, currency, location,
                 country, source, source_url, title, description, image_url,
                 date_added, date_updated, is_active)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1)
            ON CONFLICT(external_id) DO UPDATE SET
                price = excluded.price,
                mileage = excluded.mileage,
                date_updated = excluded.date_updated,
                is_active = 1
            ",
        )
        .bind(ad.external_id.trim())
        .bind(&ad.model)
        .bind(ad.year)
        .bind(ad.mileage)
        .bind(ad.price)
        .bind(&ad.currency)
        .bind(&ad.location)
        .bind(&ad.country)
        .bind(&ad.source)
        .bind(ad.source_url.trim())
        .bind(&ad.title)
        .bind(&ad.description)
        .bind(&ad.image_url)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to upsert advertisement")?;

        Ok(result.rows_affected() > 0)
    }

    /// Active records, optionally filtered by country, newest update first.
    pub async fn query_active(
        &self,
        country: Option<&str>,
        limit: Option<i64>,
    ) -> Result<Vec<Advertisement>> {
        let limit = limit.unwrap_or(100);
        let ads = match country {
            Some(country) => {
                sqlx::query_as::<_, Advertisement>(
                    r"
                    SELECT * FROM advertisements
                    WHERE is_active = 1 AND country = ?
                    ORDER BY date_updated DESC
                    LIMIT ?
                    ",
                )
                .bind(country)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Advertisement>(
                    r"
                    SELECT * FROM advertisements
                    WHERE is_active = 1
                    ORDER BY date_updated DESC
                    LIMIT ?
                    ",
                )
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(ads)
    }

    /// Top listings under the business filter: search-link placeholders out,
    /// year unknown-or-in-bound, price unknown-or-above-floor (cheap rows are
    /// parts, not cars). Newest model year first, then most recent update.
    pub async fn query_top(
        &self,
        limit: i64,
        years: &RangeInclusive<i32>,
        min_price: f64,
    ) -> Result<Vec<Advertisement>> {
        let ads = sqlx::query_as::<_, Advertisement>(
            r"
            SELECT * FROM advertisements
            WHERE is_active = 1
              AND external_id NOT LIKE ? || '%'
              AND (year IS NULL OR (year >= ? AND year <= ?))
              AND (price IS NULL OR price > ?)
            ORDER BY year DESC, date_updated DESC
            LIMIT ?
            ",
        )
        .bind(SEARCH_LINK_PREFIX)
        .bind(*years.start())
        .bind(*years.end())
        .bind(min_price)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(ads)
    }

    /// [`query_top`] restricted to one country.
    pub async fn query_country_top(
        &self,
        country: &str,
        limit: i64,
        years: &RangeInclusive<i32>,
        min_price: f64,
    ) -> Result<Vec<Advertisement>> {
        let ads = sqlx::query_as::<_, Advertisement>(
            r"
            SELECT * FROM advertisements
            WHERE is_active = 1
              AND external_id NOT LIKE ? || '%'
              AND country = ?
              AND (year IS NULL OR (year >= ? AND year <= ?))
              AND (price IS NULL OR price > ?)
            ORDER BY year DESC, date_updated DESC
            LIMIT ?
            ",
        )
        .bind(SEARCH_LINK_PREFIX)
        .bind(country)
        .bind(*years.start())
        .bind(*years.end())
        .bind(min_price)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(ads)
    }

    /// Aggregate counts under the same business filter as [`query_top`], plus
    /// the most recent update timestamp across all active rows.
    pub async fn statistics(
        &self,
        years: &RangeInclusive<i32>,
        min_price: f64,
    ) -> Result<Statistics> {
        let total_active: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM advertisements
            WHERE is_active = 1
              AND external_id NOT LIKE ? || '%'
              AND (year IS NULL OR (year >= ? AND year <= ?))
              AND (price IS NULL OR price > ?)
            ",
        )
        .bind(SEARCH_LINK_PREFIX)
        .bind(*years.start())
        .bind(*years.end())
        .bind(min_price)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query(
            r"
            SELECT country, COUNT(*) AS count FROM advertisements
            WHERE is_active = 1
              AND external_id NOT LIKE ? || '%'
              AND (year IS NULL OR (year >= ? AND year <= ?))
              AND (price IS NULL OR price > ?)
            GROUP BY country
            ",
        )
        .bind(SEARCH_LINK_PREFIX)
        .bind(*years.start())
        .bind(*years.end())
        .bind(min_price)
        .fetch_all(&self.pool)
        .await?;

        let mut by_country = BTreeMap::new();
        for row in rows {
            by_country.insert(row.try_get::<String, _>("country")?, row.try_get("count")?);
        }

        let last_update: Option<DateTime<Utc>> = sqlx::query_scalar(
            "SELECT MAX(date_updated) FROM advertisements WHERE is_active = 1",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(Statistics {
            total_active,
            by_country,
            last_update,
        })
    }

    /// Append one row to the scrape history log.
    pub async fn log_scrape(
        &self,
        country: &str,
        source: &str,
        ads_found: i64,
        ads_new: i64,
        status: &str,
    ) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO scrape_history (scrape_date, country, source, ads_found, ads_new, status)
            VALUES (?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(Utc::now())
        .bind(country)
        .bind(source)
        .bind(ads_found)
        .bind(ads_new)
        .bind(status)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Flip `is_active` off for every row whose external id is not in `keep`.
    ///
    /// The collection session deliberately never calls this: listings that
    /// could not be re-scraped stay visible. Returns the number of rows
    /// deactivated.
    pub async fn deactivate_missing(&self, keep: &[String]) -> Result<u64> {
        if keep.is_empty() {
            return Ok(0);
        }
        let placeholders = vec!["?"; keep.len()].join(",");
        let sql = format!(
            "UPDATE advertisements SET is_active = 0 WHERE external_id NOT IN ({placeholders})"
        );
        let mut query = sqlx::query(&sql);
        for id in keep {
            query = query.bind(id);
        }
        let result = query.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}
