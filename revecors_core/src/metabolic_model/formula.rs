//! Parse chemical formulas into element counts
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use thiserror::Error;

static ELEMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([A-Z][a-z]*)(\d*)").unwrap());

/// Parse a Hill style chemical formula (e.g. `C6H12O6`) into a map of element to count
///
/// Elements repeated in the formula are summed, and a missing count means one atom.
/// Polymer marks (`*`) are ignored. Formulas containing bracketed groups or other
/// characters cannot be expanded and produce an error.
///
/// # Examples
/// ```rust
/// use revecors_core::metabolic_model::formula::parse_formula;
/// let elements = parse_formula("C6H12O6").unwrap();
/// assert_eq!(elements["H"], 12.);
/// ```
pub fn parse_formula(formula: &str) -> Result<IndexMap<String, f64>, FormulaError> {
    let formula = formula.trim().replace('*', "");
    if let Some(c) = formula.chars().find(|c| !c.is_ascii_alphanumeric()) {
        return Err(FormulaError::UnsupportedCharacter {
            formula: formula.clone(),
            character: c,
        });
    }
    if formula.starts_with(|c: char| !c.is_ascii_uppercase()) {
        return Err(FormulaError::Malformed(formula.clone()));
    }
    let mut elements: IndexMap<String, f64> = IndexMap::new();
    for cap in ELEMENT.captures_iter(&formula) {
        let count = match &cap[2] {
            "" => 1.,
            digits => digits
                .parse::<f64>()
                .map_err(|_| FormulaError::Malformed(formula.clone()))?,
        };
        *elements.entry(cap[1].to_string()).or_insert(0.) += count;
    }
    Ok(elements)
}

#[derive(Debug, Error, PartialEq)]
pub enum FormulaError {
    #[error("Formula {formula} contains unsupported character '{character}'")]
    UnsupportedCharacter { formula: String, character: char },
    #[error("Unable to parse formula {0}")]
    Malformed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_formula() {
        let elements = parse_formula("C6H12O6").unwrap();
        assert_eq!(elements.len(), 3);
        assert_eq!(elements["C"], 6.);
        assert_eq!(elements["H"], 12.);
        assert_eq!(elements["O"], 6.);
    }

    #[test]
    fn implicit_counts_and_two_letter_elements() {
        let elements = parse_formula("NaCl").unwrap();
        assert_eq!(elements["Na"], 1.);
        assert_eq!(elements["Cl"], 1.);
        let water = parse_formula("HOH").unwrap();
        assert_eq!(water["H"], 2.);
        assert_eq!(water["O"], 1.);
    }

    #[test]
    fn empty_and_polymer() {
        assert!(parse_formula("").unwrap().is_empty());
        let elements = parse_formula("C5H8O4*").unwrap();
        assert_eq!(elements["C"], 5.);
    }

    #[test]
    fn unsupported() {
        assert!(matches!(
            parse_formula("C2(H2O)3"),
            Err(FormulaError::UnsupportedCharacter { character: '(', .. })
        ));
        assert!(matches!(parse_formula("2H"), Err(FormulaError::Malformed(_))));
    }
}
