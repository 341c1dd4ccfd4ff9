use crate::collectors::types::SearchQuery;
use crate::models::RawListing;
use anyhow::Result;
use async_trait::async_trait;

/// Common trait for all marketplace collectors.
///
/// A collector owns the site-specific knowledge (URLs, selectors, embedded
/// JSON shapes) and hands raw fragments to the shared pipeline; it does no
/// classification or persistence of its own. Adding a marketplace means
/// adding one implementation of this trait.
#[async_trait]
pub trait Collector: Send + Sync {
    /// Fetch candidate listings for one search query. A failure here is
    /// caught at the session boundary and counts as zero results.
    async fn collect(&self, query: &SearchQuery) -> Result<Vec<RawListing>>;

    /// Marketplace display name, e.g. "AutoScout24".
    fn source_name(&self) -> &'static str;

    /// Short tag scoping external ids to this source, e.g. "as24-de".
    fn source_tag(&self) -> &'static str;

    /// Country code the collector searches in.
    fn country(&self) -> &'static str;
}
