//! This module provides a struct for representing reactions
use std::str::FromStr;

use derive_builder::Builder;
use indexmap::{IndexMap, IndexSet};
use thiserror::Error;

use super::model::Gpr;
use crate::configuration::{default_lower_bound, default_upper_bound};
use crate::utils::ids::compartment_of;

/// Represents a reaction in the metabolic model
#[derive(Builder, Debug, Clone)]
pub struct Reaction {
    /// Used to identify the reaction
    pub id: String,
    /// Metabolite stoichiometry of the reaction
    #[builder(default = "IndexMap::new()")]
    pub metabolites: IndexMap<String, f64>,
    /// Human-readable reaction name
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Gene Protein Reaction rule, `None` when the reaction has no gene support
    #[builder(default = "None")]
    pub gpr: Option<Gpr>,
    /// Lower flux bound
    #[builder(default = "default_lower_bound()")]
    pub lower_bound: f64,
    /// Upper flux bound
    #[builder(default = "default_upper_bound()")]
    pub upper_bound: f64,
    /// Reaction subsystem
    #[builder(default = "None")]
    pub subsystem: Option<String>,
    /// Notes about the reaction
    #[builder(default = "None")]
    pub notes: Option<String>,
    /// Reaction Annotations
    #[builder(default = "None")]
    pub annotation: Option<String>,
}

impl Reaction {
    /// Ids of the metabolites consumed by the reaction (negative coefficient)
    pub fn reactants(&self) -> Vec<&str> {
        self.metabolites
            .iter()
            .filter(|(_, &coef)| coef < 0.)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Ids of the metabolites produced by the reaction (positive coefficient)
    pub fn products(&self) -> Vec<&str> {
        self.metabolites
            .iter()
            .filter(|(_, &coef)| coef > 0.)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// A reaction is reversible when its flux can take both signs
    pub fn is_reversible(&self) -> bool {
        self.lower_bound < 0. && 0. < self.upper_bound
    }

    /// Compartment encoded in the reaction id suffix, e.g. `c0` for `rxn00001_c0`
    pub fn compartment(&self) -> Option<&str> {
        compartment_of(&self.id)
    }

    /// The gene reaction rule as a string, empty if the reaction has no GPR
    pub fn gene_reaction_rule(&self) -> String {
        self.gpr
            .as_ref()
            .map(|rule| rule.to_string_id())
            .unwrap_or_default()
    }

    /// Ids of every gene mentioned in the reaction's GPR
    pub fn gene_ids(&self) -> IndexSet<String> {
        let mut genes = IndexSet::new();
        if let Some(ref gpr) = self.gpr {
            gpr.collect_genes(&mut genes);
        }
        genes
    }

    /// Add stoichiometry to the reaction, combining with existing coefficients
    ///
    /// Metabolites whose combined coefficient becomes zero are dropped from the reaction.
    pub fn add_metabolites<I>(&mut self, metabolites: I)
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        for (id, coef) in metabolites {
            let combined = self.metabolites.get(&id).copied().unwrap_or(0.) + coef;
            if combined == 0. {
                self.metabolites.shift_remove(&id);
            } else {
                self.metabolites.insert(id, combined);
            }
        }
    }

    /// Remove a metabolite from the reaction, returning its coefficient if it participated
    pub fn pop_metabolite(&mut self, id: &str) -> Option<f64> {
        self.metabolites.shift_remove(id)
    }

    /// Set the bounds of the reaction to match a reaction arrow
    pub fn set_direction(&mut self, direction: Direction) {
        match direction {
            Direction::Reversible => {
                if self.lower_bound >= 0. {
                    self.lower_bound = default_lower_bound();
                }
                if self.upper_bound <= 0. {
                    self.upper_bound = default_upper_bound();
                }
            }
            Direction::Forward => {
                self.lower_bound = 0.;
                if self.upper_bound <= 0. {
                    self.upper_bound = default_upper_bound();
                }
            }
            Direction::Backward => {
                self.upper_bound = 0.;
                if self.lower_bound >= 0. {
                    self.lower_bound = default_lower_bound();
                }
            }
        }
    }

    /// The arrow matching the reaction's bounds
    pub fn direction(&self) -> Direction {
        if self.is_reversible() {
            Direction::Reversible
        } else if self.upper_bound <= 0. && self.lower_bound < 0. {
            Direction::Backward
        } else {
            Direction::Forward
        }
    }

    /// Generate a human readable equation, e.g. `2.0 cpd00023_c0 + cpd11621_c0 <=> cpd00024_c0`
    pub fn build_reaction_string(&self) -> String {
        let side = |ids: Vec<&str>| -> String {
            ids.iter()
                .map(|id| {
                    let coef = self.metabolites[*id].abs();
                    if coef == 1. {
                        id.to_string()
                    } else {
                        format!("{} {}", format_coefficient(coef), id)
                    }
                })
                .collect::<Vec<String>>()
                .join(" + ")
        };
        format!(
            "{} {} {}",
            side(self.reactants()),
            self.direction().arrow(),
            side(self.products())
        )
        .trim()
        .to_string()
    }
}

fn format_coefficient(coef: f64) -> String {
    if coef.fract() == 0. {
        format!("{:.1}", coef)
    } else {
        format!("{}", coef)
    }
}

/// Arrow of a reaction equation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// `<=>`
    Reversible,
    /// `-->`
    Forward,
    /// `<--`
    Backward,
}

impl Direction {
    pub fn arrow(&self) -> &'static str {
        match self {
            Direction::Reversible => "<=>",
            Direction::Forward => "-->",
            Direction::Backward => "<--",
        }
    }
}

/// A parsed reaction equation such as `cpd00007_c0 + cpd00033_c0 <=> 3.0 cpd00067_c0`
#[derive(Clone, Debug, PartialEq)]
pub struct ReactionEquation {
    /// Metabolite id to signed coefficient, reactants first
    pub metabolites: IndexMap<String, f64>,
    /// Arrow of the equation
    pub direction: Direction,
}

impl FromStr for ReactionEquation {
    type Err = EquationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (left, direction, right) = [
            ("<=>", Direction::Reversible),
            ("-->", Direction::Forward),
            ("<--", Direction::Backward),
        ]
        .into_iter()
        .find_map(|(arrow, direction)| {
            s.split_once(arrow)
                .map(|(left, right)| (left, direction, right))
        })
        .ok_or_else(|| EquationError::MissingArrow(s.to_string()))?;

        let mut metabolites = IndexMap::new();
        for (half, sign) in [(left, -1.), (right, 1.)] {
            for term in half.split(" + ").map(str::trim).filter(|t| !t.is_empty()) {
                let (coef, id) = match term.split_once(char::is_whitespace) {
                    Some((coef, id)) => (
                        coef.parse::<f64>()
                            .map_err(|_| EquationError::InvalidTerm(term.to_string()))?,
                        id.trim(),
                    ),
                    None => (1., term),
                };
                *metabolites.entry(id.to_string()).or_insert(0.) += sign * coef;
            }
        }
        Ok(ReactionEquation {
            metabolites,
            direction,
        })
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum EquationError {
    #[error("Reaction equation {0} has no arrow (<=>, --> or <--)")]
    MissingArrow(String),
    #[error("Unable to parse reaction equation term {0}")]
    InvalidTerm(String),
}
