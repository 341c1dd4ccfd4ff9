//! Field extractors: raw text fragments in, typed optional values out.
//!
//! All three are total functions. Malformed, empty or unrecognizable input
//! yields `None`; nothing in this module returns an error or panics on user
//! data.

use regex::Regex;
use std::ops::RangeInclusive;
use std::sync::OnceLock;

/// Odometer readings above this are misparsed concatenated numbers, not cars.
const MAX_PLAUSIBLE_KM: i64 = 2_000_000;

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+\.?\d*").expect("static regex"))
}

fn mileage_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d[\d.]*)\s*km").expect("static regex"))
}

/// Registration-style marker, optional month, then the year.
fn marked_year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:ez|erstzulassung|baujahr|bouwjaar|bj|first\s+registration|model\s*year)\.?:?\s*(?:\d{1,2}\s*[./-]\s*)?(\d{4})\b",
        )
        .expect("static regex")
    })
}

/// ISO-like "year-month" ordering.
fn iso_year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(\d{4})\s*[-/]\s*\d{1,2}\b").expect("static regex"))
}

fn bare_year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(\d{4})\b").expect("static regex"))
}

/// Parse a locale-formatted price.
///
/// Currency symbols, whitespace and thousands-separator periods are stripped,
/// then any remaining comma is read as the decimal point and the first run of
/// digits (with at most one decimal point) is the value.
///
/// `"€ 12.500,00"` → `12500.00`, `"€ 4.500,-"` → `4500.0`.
pub fn extract_price(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| !matches!(c, '€' | '$' | '£' | '.') && !c.is_whitespace())
        .collect();
    let cleaned = cleaned.replace(',', ".");
    let matched = number_re().find(&cleaned)?;
    matched.as_str().parse::<f64>().ok()
}

/// Parse an odometer reading: the first numeral sequence followed by a `km`
/// marker, thousands-separator periods stripped. Implausibly large values are
/// extraction noise and resolve to unknown.
pub fn extract_mileage(text: &str) -> Option<i64> {
    let lower = text.to_lowercase();
    let caps = mileage_re().captures(&lower)?;
    let value: i64 = caps[1].replace('.', "").parse().ok()?;
    (value <= MAX_PLAUSIBLE_KM).then_some(value)
}

/// Find a 4-digit year within `window`.
///
/// Three shapes are tried in order of specificity: a registration-style
/// marker ("EZ 03/1984", "Bouwjaar 1983") capturing only the year group, an
/// ISO-like "1984-03" ordering, and finally any bare 4-digit year. The first
/// shape that yields an in-window year wins.
pub fn extract_year(text: &str, window: &RangeInclusive<i32>) -> Option<i32> {
    for re in [marked_year_re(), iso_year_re(), bare_year_re()] {
        let hit = re
            .captures_iter(text)
            .filter_map(|caps| caps[1].parse::<i32>().ok())
            .find(|year| window.contains(year));
        if hit.is_some() {
            return hit;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: RangeInclusive<i32> = 1970..=1997;

    #[test]
    fn parses_grouped_price_with_decimal_comma() {
        assert_eq!(extract_price("€ 12.500,00"), Some(12500.00));
    }

    #[test]
    fn parses_price_with_trailing_dash() {
        assert_eq!(extract_price("€ 4.500,-"), Some(4500.0));
    }

    #[test]
    fn parses_bare_price() {
        assert_eq!(extract_price("7900"), Some(7900.0));
    }

    #[test]
    fn price_without_digits_is_unknown() {
        assert_eq!(extract_price("Prijs op aanvraag"), None);
        assert_eq!(extract_price(""), None);
    }

    #[test]
    fn parses_grouped_mileage() {
        assert_eq!(extract_mileage("210.000 km"), Some(210_000));
    }

    #[test]
    fn mileage_marker_is_case_insensitive() {
        assert_eq!(extract_mileage("82.034 KM"), Some(82_034));
    }

    #[test]
    fn mileage_requires_km_marker() {
        assert_eq!(extract_mileage("210.000"), None);
    }

    #[test]
    fn implausible_mileage_is_unknown() {
        assert_eq!(extract_mileage("2.000.001 km"), None);
        assert_eq!(extract_mileage("2.000.000 km"), Some(2_000_000));
    }

    #[test]
    fn parses_registration_marker_year() {
        assert_eq!(extract_year("EZ 03/1984", &WINDOW), Some(1984));
        assert_eq!(extract_year("Erstzulassung 02/1986", &WINDOW), Some(1986));
        assert_eq!(extract_year("Bouwjaar 1983", &WINDOW), Some(1983));
        assert_eq!(extract_year("Bj. 1985", &WINDOW), Some(1985));
    }

    #[test]
    fn marker_year_beats_bare_year() {
        // Restored in 2019 must not shadow the registration year.
        let text = "Full restoration 1995, EZ 04/1982";
        assert_eq!(extract_year(text, &WINDOW), Some(1982));
    }

    #[test]
    fn parses_iso_year_month() {
        assert_eq!(extract_year("1986-02", &WINDOW), Some(1986));
    }

    #[test]
    fn falls_back_to_bare_year() {
        assert_eq!(extract_year("Mercedes 240D uit 1984, nette staat", &WINDOW), Some(1984));
    }

    #[test]
    fn out_of_window_years_are_skipped() {
        assert_eq!(extract_year("Bouwjaar 2004", &WINDOW), None);
        // The marker shape fails on 2004, the bare shape then finds 1984.
        assert_eq!(extract_year("Bouwjaar 2004, motor uit 1984", &WINDOW), Some(1984));
    }

    #[test]
    fn empty_text_is_unknown() {
        assert_eq!(extract_year("", &WINDOW), None);
    }
}
