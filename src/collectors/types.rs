use serde::{Deserialize, Serialize};

/// One search term fed to a collector, e.g. a chassis code or trim name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    pub term: String,
}

impl SearchQuery {
    pub fn new(term: impl Into<String>) -> Self {
        Self { term: term.into() }
    }
}
