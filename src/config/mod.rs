//! Configuration for diesel-scout.
//!
//! Loaded from a TOML file when one exists; every section falls back to the
//! built-in search profile (classic Mercedes 190/200-series diesels).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::Path;

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub scraping: ScrapingConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

impl Config {
    /// Read configuration from `path`, or use the defaults when the file does
    /// not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }
}

/// The vehicle search profile: which listings are in scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Inclusive year bound a classified listing must fall in.
    pub year_from: i32,
    pub year_to: i32,
    /// Wider window for *reading* a year out of free text; numbers outside it
    /// are treated as non-years (phone numbers, prices, zip codes). Must
    /// extend past the inclusion bound: an out-of-bound year has to be read
    /// so the classifier can reject it, rather than dissolve into "unknown"
    /// and slip through.
    pub recognize_from: i32,
    pub recognize_to: i32,
    /// Chassis-code tags in precedence order; the first tag found in a title
    /// or URL wins.
    pub model_tags: Vec<String>,
    /// Fallback model label when no single chassis code is identified.
    pub family_label: String,
    /// Positive identifiers of the target family.
    pub classic_keywords: Vec<String>,
    /// Identifiers of newer model lines; any hit vetoes a match.
    pub modern_keywords: Vec<String>,
    /// Petrol trim codes that lexically collide with diesel ones; any hit
    /// vetoes a match.
    pub excluded_powertrain_keywords: Vec<String>,
    /// Terms fed to each collector's search URL.
    pub search_terms: Vec<String>,
    /// Listings cheaper than this are assumed to be parts, not cars.
    pub min_price: f64,
}

impl SearchConfig {
    pub fn inclusion_years(&self) -> RangeInclusive<i32> {
        self.year_from..=self.year_to
    }

    pub fn recognition_years(&self) -> RangeInclusive<i32> {
        self.recognize_from..=self.recognize_to
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            year_from: 1979,
            year_to: 1986,
            recognize_from: 1970,
            recognize_to: 2005,
            model_tags: vec!["W123".into(), "W124".into(), "W201".into()],
            family_label: "W123/W124".into(),
            classic_keywords: vec![
                "w123".into(),
                "w124".into(),
                "w115".into(),
                "w201".into(),
                "200d".into(),
                "240d".into(),
                "250d".into(),
                "300d".into(),
                "300td".into(),
                "190d".into(),
                "200-serie".into(),
                "300-serie".into(),
            ],
            modern_keywords: vec![
                "v-klasse".into(),
                "vito".into(),
                "sprinter".into(),
                "amg line".into(),
                "4matic".into(),
                "glc".into(),
                "gle".into(),
                "gla".into(),
                "glb".into(),
                "cls".into(),
                "cla".into(),
                "hybrid".into(),
                "e-klasse".into(),
                "c-klasse".into(),
                "a-klasse".into(),
                "b-klasse".into(),
                "s-klasse".into(),
            ],
            excluded_powertrain_keywords: vec![
                "200e".into(),
                "230e".into(),
                "260e".into(),
                "280e".into(),
                "300e".into(),
                "320e".into(),
                "benzine".into(),
                "petrol".into(),
                "gasoline".into(),
            ],
            search_terms: vec![
                "w123".into(),
                "w124".into(),
                "200d".into(),
                "240d".into(),
                "300d".into(),
                "190d".into(),
            ],
            min_price: 500.0,
        }
    }
}

/// Request pacing and client settings shared by all collectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapingConfig {
    /// Fixed delay between search requests, in seconds.
    pub request_delay_secs: u64,
    /// Per-request timeout, in seconds; a timed-out request is abandoned.
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            request_delay_secs: 2,
            request_timeout_secs: 30,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "diesel_scout.db".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub listen_addr: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:5000".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Local wall-clock time of the daily collection run, "HH:MM".
    pub daily_at: String,
    /// Run immediately at startup when the last update is older than this.
    pub startup_catchup_hours: i64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            daily_at: "06:00".into(),
            startup_catchup_hours: 24,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profile_targets_classic_diesels() {
        let config = Config::default();
        assert_eq!(config.search.inclusion_years(), 1979..=1986);
        assert!(config.search.classic_keywords.contains(&"w123".to_string()));
        assert!(config.search.modern_keywords.contains(&"hybrid".to_string()));
    }

    #[test]
    fn partial_toml_keeps_section_defaults() {
        let config: Config = toml::from_str(
            r#"
            [search]
            year_from = 1976
            year_to = 1990
            recognize_from = 1970
            recognize_to = 1997
            model_tags = ["W123"]
            family_label = "W123"
            classic_keywords = ["w123"]
            modern_keywords = []
            excluded_powertrain_keywords = []
            search_terms = ["w123"]
            min_price = 250.0
            "#,
        )
        .expect("valid toml");
        assert_eq!(config.search.year_from, 1976);
        assert_eq!(config.scraping.request_delay_secs, 2);
        assert_eq!(config.http.listen_addr, "0.0.0.0:5000");
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = Config::load(Path::new("/nonexistent/diesel-scout.toml")).unwrap();
        assert_eq!(config.database.path, "diesel_scout.db");
    }
}
