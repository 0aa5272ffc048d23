use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

const SEPARATOR: char = '-';

/// Composite identifier addressing one card record:
/// `<release-number>-<catalog-number>-<variant-code>-<frame-code>`,
/// e.g. `1-025-N-S`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CardId {
    release_number: String,
    catalog_number: String,
    variant_code: String,
    frame_code: String,
}

impl CardId {
    /// Variant and frame codes are stored upper-case. The catalog number is
    /// zero-padded by caller convention; its width is not enforced here.
    pub fn new(
        release_number: impl Into<String>,
        catalog_number: impl Into<String>,
        variant_code: &str,
        frame_code: &str,
    ) -> Self {
        Self {
            release_number: release_number.into(),
            catalog_number: catalog_number.into(),
            variant_code: variant_code.to_uppercase(),
            frame_code: frame_code.to_uppercase(),
        }
    }

    /// Splits on the separator. `None` unless exactly four non-empty
    /// components result; absence is the only failure signal.
    pub fn parse(raw: &str) -> Option<Self> {
        let parts: Vec<&str> = raw.split(SEPARATOR).collect();
        if parts.len() != 4 || parts.iter().any(|part| part.is_empty()) {
            return None;
        }
        Some(Self {
            release_number: parts[0].to_string(),
            catalog_number: parts[1].to_string(),
            variant_code: parts[2].to_string(),
            frame_code: parts[3].to_string(),
        })
    }

    pub fn release_number(&self) -> &str {
        &self.release_number
    }

    pub fn catalog_number(&self) -> &str {
        &self.catalog_number
    }

    pub fn variant_code(&self) -> &str {
        &self.variant_code
    }

    pub fn frame_code(&self) -> &str {
        &self.frame_code
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{sep}{}{sep}{}{sep}{}",
            self.release_number,
            self.catalog_number,
            self.variant_code,
            self.frame_code,
            sep = SEPARATOR
        )
    }
}

impl Serialize for CardId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CardId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        CardId::parse(&raw)
            .ok_or_else(|| de::Error::custom(format!("malformed card identifier: {raw}")))
    }
}

#[cfg(test)]
mod tests {
    use super::CardId;
    use proptest::prelude::*;

    #[test]
    fn new_joins_components_and_upcases_codes() {
        let id = CardId::new("123", "001", "n", "s");
        assert_eq!(id.to_string(), "123-001-N-S");
    }

    #[test]
    fn parse_recovers_components_verbatim() {
        let id = CardId::parse("123-025-R-F").expect("well-formed identifier");
        assert_eq!(id.release_number(), "123");
        assert_eq!(id.catalog_number(), "025");
        assert_eq!(id.variant_code(), "R");
        assert_eq!(id.frame_code(), "F");
    }

    #[test]
    fn parse_rejects_anything_but_four_nonempty_components() {
        assert_eq!(CardId::parse("invalid-uuid"), None);
        assert_eq!(CardId::parse(""), None);
        assert_eq!(CardId::parse("1--N-S"), None);
        assert_eq!(CardId::parse("1-025-N"), None);
        assert_eq!(CardId::parse("1-025-N-S-X"), None);
    }

    #[test]
    fn serde_roundtrips_through_the_string_form() {
        let id = CardId::new("2", "006", "H", "F");
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"2-006-H-F\"");
        let back: CardId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, id);
    }

    proptest! {
        #[test]
        fn parse_recovers_encoded_components(
            release in "[0-9]{1,3}",
            catalog in "[0-9]{1,4}",
            variant in "[a-zA-Z]{1,2}",
            frame in "[a-zA-Z]{1,2}",
        ) {
            let id = CardId::new(release.clone(), catalog.clone(), &variant, &frame);
            let parsed = CardId::parse(&id.to_string()).expect("well-formed identifier");
            prop_assert_eq!(parsed.release_number(), release.as_str());
            prop_assert_eq!(parsed.catalog_number(), catalog.as_str());
            let variant_upper = variant.to_uppercase();
            let frame_upper = frame.to_uppercase();
            prop_assert_eq!(parsed.variant_code(), variant_upper.as_str());
            prop_assert_eq!(parsed.frame_code(), frame_upper.as_str());
            // upper-casing is idempotent across a second round trip
            let again = CardId::parse(&parsed.to_string()).expect("well-formed identifier");
            prop_assert_eq!(again, parsed);
        }
    }
}
