//! Fragment isolation heuristic (§4.2): splits an ingredient note into a
//! unit fragment and a food fragment using a dictionary built from the
//! cached unit catalog.

use crate::model::Unit;
use std::collections::HashSet;

/// Known unit spellings (name, abbreviation, and common plural forms),
/// lowercased for case-insensitive matching.
pub struct UnitDictionary {
    known: HashSet<String>,
}

impl UnitDictionary {
    #[must_use]
    pub fn from_units(units: &[Unit]) -> Self {
        let mut known = HashSet::new();
        for unit in units {
            known.insert(unit.name.to_lowercase());
            if let Some(abbrev) = &unit.abbreviation {
                known.insert(abbrev.to_lowercase());
            }
        }
        Self { known }
    }

    fn contains(&self, token: &str) -> bool {
        if self.known.contains(token) {
            return true;
        }
        // Simple plural normalization: "cups" -> "cup".
        token
            .strip_suffix('s')
            .is_some_and(|singular| self.known.contains(singular))
    }
}

/// Tokenizes `text` on whitespace and punctuation; tokens matching the unit
/// dictionary become the unit fragment (joined in original order), the
/// remainder becomes the food fragment. Deterministic and pure.
#[must_use]
pub fn isolate_unit_fragment(text: &str, dictionary: &UnitDictionary) -> (String, String) {
    let tokens: Vec<&str> = text
        .split(|c: char| c.is_whitespace() || (c.is_ascii_punctuation() && c != '\''))
        .filter(|t| !t.is_empty())
        .collect();

    let mut unit_tokens = Vec::new();
    let mut food_tokens = Vec::new();

    for token in tokens {
        if dictionary.contains(&token.to_lowercase()) {
            unit_tokens.push(token);
        } else {
            food_tokens.push(token);
        }
    }

    (unit_tokens.join(" "), food_tokens.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(name: &str, abbrev: Option<&str>) -> Unit {
        Unit {
            id: "u1".to_string(),
            name: name.to_string(),
            abbreviation: abbrev.map(String::from),
        }
    }

    #[test]
    fn test_isolate_unit_fragment_matches_abbreviation() {
        let dict = UnitDictionary::from_units(&[unit("teaspoon", Some("tsp"))]);
        let (unit_frag, food_frag) = isolate_unit_fragment("2 tsp salt", &dict);
        assert_eq!(unit_frag, "tsp");
        assert_eq!(food_frag, "2 salt");
    }

    #[test]
    fn test_isolate_unit_fragment_handles_plural() {
        let dict = UnitDictionary::from_units(&[unit("cup", None)]);
        let (unit_frag, _) = isolate_unit_fragment("3 cups flour", &dict);
        assert_eq!(unit_frag, "cups");
    }

    #[test]
    fn test_isolate_unit_fragment_empty_when_no_match() {
        let dict = UnitDictionary::from_units(&[unit("teaspoon", Some("tsp"))]);
        let (unit_frag, food_frag) = isolate_unit_fragment("a knob of butter", &dict);
        assert_eq!(unit_frag, "");
        assert_eq!(food_frag, "a knob of butter");
    }
}
