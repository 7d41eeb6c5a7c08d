//! Helpers for KBase style identifiers, which carry a compartment suffix such as `_c0`
use std::sync::LazyLock;

use regex::Regex;

static COMPARTMENT_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_[a-z]\d").unwrap());
static TRAILING_COMPARTMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_([a-z]\d?)$").unwrap());

/// Strip every `_<letter><digit>` compartment suffix, `cpd00027_e0` becomes `cpd00027`
pub(crate) fn base_id(id: &str) -> String {
    COMPARTMENT_SUFFIX.replace_all(id, "").into_owned()
}

/// Compartment encoded at the end of an id, `rxn00001_c0` gives `c0` and `cpd00001_c` gives `c`
pub(crate) fn compartment_of(id: &str) -> Option<&str> {
    TRAILING_COMPARTMENT
        .captures(id)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_suffix() {
        assert_eq!(base_id("cpd00027_e0"), "cpd00027");
        assert_eq!(base_id("cpd00027_c1"), "cpd00027");
        assert_eq!(base_id("cpd00027"), "cpd00027");
        assert_eq!(base_id("cpd00027_c"), "cpd00027_c");
    }

    #[test]
    fn compartment() {
        assert_eq!(compartment_of("rxn00001_c0"), Some("c0"));
        assert_eq!(compartment_of("cpd00013_c"), Some("c"));
        assert_eq!(compartment_of("EX_glc_e"), Some("e"));
        assert_eq!(compartment_of("PFK"), None);
    }
}
