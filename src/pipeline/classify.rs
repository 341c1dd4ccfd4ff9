//! Classification filter: in-scope vs out-of-scope for a candidate listing.

use crate::config::SearchConfig;
use std::ops::RangeInclusive;

/// Keyword-based allow/deny classifier.
///
/// A candidate is in scope when at least one classic keyword matches, no
/// modern-model keyword matches, no excluded-powertrain keyword matches, and
/// its year (when known) falls within the inclusion bound. False positives
/// are worse than false negatives here: titles are the only discriminant at
/// scrape time, so the deny lists deliberately trade recall for precision.
#[derive(Debug, Clone)]
pub struct Classifier {
    classic: Vec<String>,
    modern: Vec<String>,
    excluded_powertrain: Vec<String>,
    years: RangeInclusive<i32>,
}

impl Classifier {
    pub fn new(search: &SearchConfig) -> Self {
        let lower = |words: &[String]| words.iter().map(|w| w.to_lowercase()).collect();
        Self {
            classic: lower(&search.classic_keywords),
            modern: lower(&search.modern_keywords),
            excluded_powertrain: lower(&search.excluded_powertrain_keywords),
            years: search.inclusion_years(),
        }
    }

    /// Decide whether a candidate is in scope. `text` is the concatenation of
    /// whatever title, description and URL-path text is available; matching
    /// is case-insensitive substring containment.
    pub fn classify(&self, text: &str, year: Option<i32>) -> bool {
        let haystack = text.to_lowercase();
        if haystack.trim().is_empty() {
            return false;
        }
        let contains_any = |words: &[String]| words.iter().any(|w| haystack.contains(w.as_str()));

        contains_any(&self.classic)
            && !contains_any(&self.modern)
            && !contains_any(&self.excluded_powertrain)
            && year.map_or(true, |y| self.years.contains(&y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> Classifier {
        Classifier::new(&SearchConfig::default())
    }

    #[test]
    fn accepts_classic_diesel() {
        assert!(classifier().classify("Mercedes-Benz W123 240D", Some(1984)));
    }

    #[test]
    fn accepts_unknown_year() {
        assert!(classifier().classify("Mercedes-Benz W123 240D", None));
    }

    #[test]
    fn rejects_year_out_of_bound() {
        assert!(!classifier().classify("Mercedes-Benz W123 240D", Some(1998)));
        assert!(!classifier().classify("Mercedes-Benz W123 240D", Some(1978)));
    }

    #[test]
    fn rejects_without_classic_keyword() {
        assert!(!classifier().classify("Mercedes-Benz C300e Hybrid", Some(1984)));
    }

    #[test]
    fn rejects_modern_model_even_with_classic_keyword() {
        assert!(!classifier().classify("Mercedes E-Klasse, W123-look", Some(1984)));
    }

    #[test]
    fn rejects_petrol_trim() {
        assert!(!classifier().classify("Mercedes-Benz W123 230E", Some(1984)));
    }

    #[test]
    fn rejects_empty_text() {
        assert!(!classifier().classify("", Some(1984)));
        assert!(!classifier().classify("   ", None));
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert!(classifier().classify("MERCEDES W123 240D", None));
    }

    #[test]
    fn adding_modern_keyword_only_narrows() {
        // Monotonicity: a modern keyword that matches can only flip an accept
        // into a reject, never the other way around.
        let mut search = SearchConfig::default();
        let text = "Mercedes W123 240D kombi";
        assert!(Classifier::new(&search).classify(text, None));

        search.modern_keywords.push("kombi".into());
        assert!(!Classifier::new(&search).classify(text, None));

        search.modern_keywords.push("cabrio".into());
        assert!(!Classifier::new(&search).classify(text, None));
    }
}
