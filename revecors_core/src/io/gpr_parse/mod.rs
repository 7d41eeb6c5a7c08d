//! Module for parsing gene reaction rules into GPR trees

use crate::io::gpr_parse::lexer::LexerError;
use crate::io::gpr_parse::parser::ParseError;
use crate::metabolic_model::gene::Gene;
use crate::metabolic_model::model::Gpr;
use indexmap::IndexMap;
use thiserror::Error;

mod lexer;
pub mod parser;
mod token;

/// Parse a gene reaction rule string into a GPR Tree
///
/// # Parameters
/// - `input`: &str representing the gene reaction rule
/// - `gene_map`: map of gene id strings to genes, genes named by the rule but missing from the
///     map are added to it
///
/// # Returns
/// Parse result which is
/// - `Ok`: The root node of the GPR tree
/// - `Err`: Returns the GprParseError describing the issue with the GPR rule which
///     was being parsed.
///
/// # Examples
/// ```rust
/// use indexmap::IndexMap;
/// use revecors_core::io::gpr_parse::parse_gpr;
/// let gpr: &str = "Org_CDS_1 and Org_CDS_2";
/// let mut gene_map = IndexMap::new();
/// let gpr_tree = parse_gpr(gpr, &mut gene_map).unwrap();
/// assert_eq!(gene_map.len(), 2);
/// ```
pub fn parse_gpr(input: &str, gene_map: &mut IndexMap<String, Gene>) -> Result<Gpr, GprParseError> {
    // Convert the GPR string into tokens
    let tokens = lexer::Lexer::new(input).lex()?;

    // Now parse those tokens into a GPR tree
    let mut parser = parser::GprParser::new(tokens, gene_map);
    let gpr = parser.parse()?;
    Ok(gpr)
}

/// Enum representing possible lex and parse errors
#[derive(Debug, Error)]
pub enum GprParseError {
    /// Lexing Error
    #[error("Error occurred during lexing (conversion of GPR string to tokens)")]
    LexingError(#[from] LexerError),
    /// Parsing Error
    #[error("Error occurred during parsing (conversion of tokens to GPR tree)")]
    ParsingError(#[from] ParseError),
}

#[cfg(test)]
mod tests {
    use crate::io::gpr_parse::parse_gpr;
    use crate::metabolic_model::gene::Gene;
    use crate::metabolic_model::model::{Gpr, GprOperation};
    use indexmap::IndexMap;

    #[test]
    fn test_parse_gpr() {
        let gpr = "Rv0001 and (Rv0002 or Rv0003)";
        let mut gene_map: IndexMap<String, Gene> = IndexMap::new();
        gene_map.insert(
            "Rv0001".to_string(),
            Gene::new("Rv0001".to_string(), Some("dnaA".to_string())),
        );
        let gpr_tree = parse_gpr(gpr, &mut gene_map).unwrap();
        match gpr_tree {
            Gpr::Operation(GprOperation::And { left, right }) => {
                assert_eq!(*left, Gpr::GeneNode("Rv0001".to_string()));
                match *right {
                    Gpr::Operation(GprOperation::Or { .. }) => {}
                    _ => panic!("Incorrect Parse"),
                }
            }
            _ => panic!("Incorrect gpr parse"),
        }
        // Existing genes are kept, new ones are added
        assert_eq!(gene_map.len(), 3);
        assert_eq!(gene_map["Rv0001"].name.as_deref(), Some("dnaA"));
    }

    #[test]
    fn test_lex_error() {
        let mut gene_map: IndexMap<String, Gene> = IndexMap::new();
        assert!(parse_gpr("Rv0001 && Rv0002", &mut gene_map).is_err());
    }
}
