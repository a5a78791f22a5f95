//! Predefined symbol universe and display names.

use super::Symbol;

/// Ticker symbols refreshed by the rotation scheduler unless overridden,
/// paired with their display names. Order is the rotation order.
const KNOWN_INSTRUMENTS: &[(&str, &str)] = &[
    ("AAPL", "Apple Inc"),
    ("MSFT", "Microsoft Corporation"),
    ("GOOGL", "Alphabet Inc"),
    ("AMZN", "Amazon.com Inc"),
    ("META", "Meta Platforms Inc"),
    ("TSLA", "Tesla Inc"),
    ("JPM", "JPMorgan Chase & Co"),
    ("V", "Visa Inc"),
    ("PG", "Procter & Gamble Co"),
    ("JNJ", "Johnson & Johnson"),
    ("WMT", "Walmart Inc"),
    ("BAC", "Bank of America Corp"),
    ("KO", "Coca-Cola Co"),
    ("DIS", "Walt Disney Co"),
    ("NFLX", "Netflix Inc"),
    ("INTC", "Intel Corporation"),
    ("VZ", "Verizon Communications Inc"),
    ("T", "AT&T Inc"),
    ("PFE", "Pfizer Inc"),
    ("MRK", "Merck & Co Inc"),
];

/// Default predefined symbol list, in rotation order.
pub const DEFAULT_SYMBOLS: [&str; 20] = [
    "AAPL", "MSFT", "GOOGL", "AMZN", "META", "TSLA", "JPM", "V", "PG", "JNJ", "WMT", "BAC", "KO",
    "DIS", "NFLX", "INTC", "VZ", "T", "PFE", "MRK",
];

/// Look up the display name for a symbol, falling back to the symbol itself.
#[must_use]
pub fn display_name(symbol: &str) -> &str {
    KNOWN_INSTRUMENTS
        .iter()
        .find(|(known, _)| *known == symbol)
        .map_or(symbol, |&(_, name)| name)
}

/// Normalize user input into a symbol (trimmed, uppercase).
///
/// Returns `None` for blank input.
#[must_use]
pub fn normalize_symbol(raw: &str) -> Option<Symbol> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test]
    fn default_symbols_match_known_instruments() {
        assert_eq!(DEFAULT_SYMBOLS.len(), KNOWN_INSTRUMENTS.len());
        for (symbol, (known, _)) in DEFAULT_SYMBOLS.iter().zip(KNOWN_INSTRUMENTS) {
            assert_eq!(symbol, known);
        }
    }

    #[test_case("AAPL", "Apple Inc"; "apple")]
    #[test_case("T", "AT&T Inc"; "single letter ticker")]
    #[test_case("MRK", "Merck & Co Inc"; "last in list")]
    #[test_case("XYZ", "XYZ"; "unknown falls back to symbol")]
    fn display_names(symbol: &str, expected: &str) {
        assert_eq!(display_name(symbol), expected);
    }

    #[test_case(" aapl ", Some("AAPL"); "trims and uppercases")]
    #[test_case("Msft", Some("MSFT"); "mixed case")]
    #[test_case("   ", None; "whitespace only")]
    #[test_case("", None; "empty")]
    fn normalization(raw: &str, expected: Option<&str>) {
        assert_eq!(normalize_symbol(raw).as_deref(), expected);
    }
}
