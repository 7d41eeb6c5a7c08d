use crate::io::gpr_parse::token::Token;
use crate::metabolic_model::gene::Gene;
use crate::metabolic_model::model::{Gpr, GprError, GprOperatorType};

use indexmap::IndexMap;
use thiserror::Error;
/*
GPR Grammar:
expression -> binary
binary -> unary (("AND" | "OR") unary )*;
unary -> "NOT" unary | primary  ;
primary -> GENE | "(" expression ")" ;

e.g. ( Org_CDS_1 AND Org_CDS_2) OR (Org_CDS_3 AND NOT Org_CDS_4)
 */

static EOF: Token = Token::Eof;

/// Recursive descent parser turning GPR tokens into a [`Gpr`] tree
///
/// Genes named by the rule which are missing from the gene map are added to it.
pub struct GprParser<'gm> {
    tokens: Vec<Token>,
    /// Index of the next token to consume
    position: usize,
    pub(crate) gene_map: &'gm mut IndexMap<String, Gene>,
}

impl<'gm> GprParser<'gm> {
    /// Create a parser over `tokens`, which must end with [`Token::Eof`]
    pub fn new(tokens: Vec<Token>, gene_map: &'gm mut IndexMap<String, Gene>) -> GprParser<'gm> {
        GprParser {
            tokens,
            position: 0,
            gene_map,
        }
    }

    /// Parse the full token stream into a GPR tree
    pub fn parse(&mut self) -> Result<Gpr, ParseError> {
        let gpr = self.binary()?;
        match self.peek() {
            Token::Eof => Ok(gpr),
            _ => Err(ParseError::EarlyTermination),
        }
    }

    fn binary(&mut self) -> Result<Gpr, ParseError> {
        let mut expr = self.unary()?;
        loop {
            let operator = match self.peek() {
                Token::And => GprOperatorType::And,
                Token::Or => GprOperatorType::Or,
                _ => return Ok(expr),
            };
            self.position += 1;
            let right = self.unary()?;
            expr = Gpr::new_binary_operation(expr, operator, right)?;
        }
    }

    fn unary(&mut self) -> Result<Gpr, ParseError> {
        if *self.peek() == Token::Not {
            self.position += 1;
            let operand = self.unary()?;
            return Gpr::new_unary_operation(GprOperatorType::Not, operand).map_err(ParseError::from);
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Gpr, ParseError> {
        match self.peek().clone() {
            Token::Identifier(gene) => {
                self.position += 1;
                if !self.gene_map.contains_key(&gene) {
                    self.gene_map
                        .insert(gene.clone(), Gene::new(gene.clone(), None));
                }
                Ok(Gpr::GeneNode(gene))
            }
            Token::LeftParen => {
                self.position += 1;
                let expr = self.binary()?;
                if *self.peek() != Token::RightParen {
                    return Err(ParseError::MissingToken(
                        "Expect ')' after expression.".to_string(),
                    ));
                }
                self.position += 1;
                Ok(expr)
            }
            _ => Err(ParseError::ExpectedExpression),
        }
    }

    /// The next token, [`Token::Eof`] once the stream is exhausted
    fn peek(&self) -> &Token {
        self.tokens.get(self.position).unwrap_or(&EOF)
    }
}

impl From<GprError> for ParseError {
    fn from(err: GprError) -> Self {
        match err {
            GprError::InvalidBinaryOp => ParseError::InvalidBinaryOperator,
            GprError::InvalidUnaryOp => ParseError::InvalidUnaryOperator,
        }
    }
}

/// Enum representing possible parse errors
#[derive(Debug, Error, PartialEq, Clone)]
pub enum ParseError {
    /// Token was expected to be a binary operator but was not
    #[error("Invalid binary operator encountered, expected only `and` and `or`")]
    InvalidBinaryOperator,
    /// Token was expected to be a unary operator but was not
    #[error("Invalid unary operator encountered, expected only `not`")]
    InvalidUnaryOperator,
    /// Missing expected token (e.g. a right parenthesis)
    #[error("Missing expected token: {0}")]
    MissingToken(String),
    /// No expression found when one was expected
    #[error("No expression found, check that the GPR string is not empty")]
    ExpectedExpression,
    /// Expression was not completed when parsing terminated
    #[error("Parsing terminated early, check for a `not` between two gene identifiers/grouped expressions")]
    EarlyTermination,
}
