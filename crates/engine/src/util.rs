//! Internal helpers for model validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so the engine enforces consistent invariants.

use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::{Currency, EngineError, ResultEngine};

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::InvalidId(format!("invalid {label} id")))
}

/// Parse a currency code stored in the DB into a strongly typed `Currency`.
pub(crate) fn model_currency(value: &str) -> ResultEngine<Currency> {
    Currency::try_from(value)
        .map_err(|_| EngineError::UnsupportedCurrency(format!("stored currency: {value}")))
}

/// Trim and NFC-normalize a user supplied name, rejecting empty values.
pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let normalized: String = value.trim().nfc().collect();
    if normalized.is_empty() {
        return Err(EngineError::InvalidName(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(normalized)
}

/// Trim optional free text; blank becomes `None`.
pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_trimmed_and_composed() {
        // "e" followed by a combining acute accent
        let decomposed = "  Cafe\u{301}  ";
        assert_eq!(
            normalize_required_name(decomposed, "account").unwrap(),
            "Caf\u{e9}"
        );
    }

    #[test]
    fn blank_names_are_rejected() {
        assert_eq!(
            normalize_required_name("   ", "account").unwrap_err(),
            EngineError::InvalidName("account name must not be empty".to_string())
        );
    }

    #[test]
    fn blank_text_becomes_none() {
        assert_eq!(normalize_optional_text(Some("  ")), None);
        assert_eq!(
            normalize_optional_text(Some(" rent ")),
            Some("rent".to_string())
        );
        assert_eq!(normalize_optional_text(None), None);
    }
}
