//! Module providing Token struct for lexing

/// Represents Tokens in a gene reaction rule
#[derive(Debug, PartialEq, Clone, Eq, Hash)]
pub enum Token {
    /// A gene locus, e.g. `Org_CDS_12`
    Identifier(String),
    And,
    Or,
    Not,
    LeftParen,
    RightParen,
    /// End of the rule
    Eof,
}
