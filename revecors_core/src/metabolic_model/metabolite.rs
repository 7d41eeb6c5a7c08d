//! This module provides the metabolite struct representing a metabolite

use derive_builder::Builder;
use indexmap::IndexMap;

use crate::metabolic_model::formula::{parse_formula, FormulaError};

/// Represents a metabolite
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct Metabolite {
    /// Used to identify the metabolite (must be unique)
    pub id: String,
    /// Human Readable name of the metabolite
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Which compartment the metabolite is in
    #[builder(default = "None")]
    pub compartment: Option<String>,
    /// Electrical charge of the Metabolite
    #[builder(default = "0")]
    pub charge: i32,
    /// Chemical Formula of the metabolite
    #[builder(default = "None")]
    pub formula: Option<String>,
    /// Notes about the metabolite
    #[builder(default = "None")]
    pub notes: Option<String>,
    /// Metabolite annotations
    #[builder(default = "None")]
    pub annotation: Option<String>,
}

impl Metabolite {
    /// Create a metabolite with only an id and a compartment
    pub fn new(id: String, compartment: Option<String>) -> Metabolite {
        Metabolite {
            id,
            name: None,
            compartment,
            charge: 0,
            formula: None,
            notes: None,
            annotation: None,
        }
    }

    /// Element counts of the metabolite's formula, empty if it has no formula
    pub fn elements(&self) -> Result<IndexMap<String, f64>, FormulaError> {
        match self.formula {
            Some(ref formula) => parse_formula(formula),
            None => Ok(IndexMap::new()),
        }
    }
}
