//! This module provides the Model struct for representing an entire metabolic model
use std::fmt::{Display, Formatter};

use indexmap::{IndexMap, IndexSet};
use thiserror::Error;

use crate::configuration::tolerance;
use crate::metabolic_model::formula::FormulaError;
use crate::metabolic_model::gene::Gene;
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::reaction::{Reaction, ReactionEquation};
use crate::utils::ids::compartment_of;

/// Represents a Genome Scale Metabolic Model
#[derive(Clone, Debug)]
pub struct Model {
    /// Map of reaction ids to Reaction Objects
    pub reactions: IndexMap<String, Reaction>,
    /// Map of gene ids to Gene Objects
    pub genes: IndexMap<String, Gene>,
    /// Map of metabolite ids to Metabolite Objects
    pub metabolites: IndexMap<String, Metabolite>,
    /// Map of reaction ids to objective function coefficients
    pub objective: IndexMap<String, f64>,
    /// Id associated with the Model
    pub id: Option<String>,
    /// Human readable name of the Model
    pub name: Option<String>,
    /// Compartments in the model
    ///
    /// An IndexMap<String, String> of {short name: long name}
    pub compartments: Option<IndexMap<String, String>>,
    /// A version identifier for the Model, stored as a string
    pub version: Option<String>,
}

impl Model {
    pub fn new_empty() -> Self {
        Model {
            reactions: IndexMap::new(),
            genes: IndexMap::new(),
            metabolites: IndexMap::new(),
            objective: IndexMap::new(),
            id: None,
            name: None,
            compartments: None,
            version: None,
        }
    }

    /// Add a reaction to the model
    ///
    /// Metabolites and genes referenced by the reaction which are not yet part of the
    /// model are created.
    ///
    /// # Examples
    /// ```rust
    /// use revecors_core::metabolic_model::model::Model;
    /// use revecors_core::metabolic_model::reaction::ReactionBuilder;
    /// let mut model = Model::new_empty();
    /// let new_reaction = ReactionBuilder::default().id("new_reaction".to_string()).build().unwrap();
    /// model.add_reaction(new_reaction);
    /// ```
    pub fn add_reaction(&mut self, reaction: Reaction) {
        for met in reaction.metabolites.keys() {
            self.ensure_metabolite(met);
        }
        for gene in reaction.gene_ids() {
            if !self.genes.contains_key(&gene) {
                self.add_gene(Gene::new(gene, None));
            }
        }
        let id = reaction.id.clone();
        self.reactions.insert(id, reaction);
    }

    /// Add a gene to the model
    ///
    /// # Examples
    /// ```rust
    /// use revecors_core::metabolic_model::gene::GeneBuilder;
    /// use revecors_core::metabolic_model::model::Model;
    /// let mut model=Model::new_empty();
    /// let new_gene = GeneBuilder::default().id("new_gene".to_string()).build().unwrap();
    /// model.add_gene(new_gene);
    /// ```
    pub fn add_gene(&mut self, gene: Gene) {
        let id = gene.id.clone();
        self.genes.insert(id, gene);
    }

    /// Add a metabolite to the model
    pub fn add_metabolite(&mut self, metabolite: Metabolite) {
        let id = metabolite.id.clone();
        self.metabolites.insert(id, metabolite);
    }

    /// Get a metabolite, creating it in the compartment given by its id suffix if it is missing
    pub fn ensure_metabolite(&mut self, id: &str) -> &mut Metabolite {
        self.metabolites
            .entry(id.to_string())
            .or_insert_with(|| Metabolite::new(id.to_string(), compartment_of(id).map(String::from)))
    }

    /// Gene, metabolite, and reaction counts, in that order
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.genes.len(), self.metabolites.len(), self.reactions.len())
    }

    /// Ids of the reactions whose GPR references `gene_id`
    pub fn gene_reactions(&self, gene_id: &str) -> Vec<&str> {
        self.reactions
            .values()
            .filter(|r| r.gene_ids().contains(gene_id))
            .map(|r| r.id.as_str())
            .collect()
    }

    /// Remove reactions from the model
    ///
    /// Duplicate and unknown ids are ignored. When `remove_orphans` is true, the genes and
    /// metabolites of the removed reactions which no remaining reaction references are
    /// removed as well.
    ///
    /// # Returns
    /// The number of reactions removed
    pub fn remove_reactions<I, S>(&mut self, ids: I, remove_orphans: bool) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut touched_metabolites: IndexSet<String> = IndexSet::new();
        let mut touched_genes: IndexSet<String> = IndexSet::new();
        let mut removed = 0;
        for id in ids {
            if let Some(rxn) = self.reactions.shift_remove(id.as_ref()) {
                touched_metabolites.extend(rxn.metabolites.keys().cloned());
                touched_genes.extend(rxn.gene_ids());
                removed += 1;
            }
        }
        if remove_orphans {
            let (used_metabolites, _) = self.referenced_ids();
            for met in touched_metabolites.difference(&used_metabolites) {
                self.metabolites.shift_remove(met);
            }
            let orphan_genes: Vec<String> = touched_genes
                .into_iter()
                .filter(|gene| self.gene_reactions(gene).is_empty())
                .collect();
            for gene in orphan_genes {
                self.genes.shift_remove(&gene);
            }
        }
        removed
    }

    /// Remove a metabolite from the model and from every reaction it participates in
    ///
    /// Reactions are kept even when they lose all their metabolites.
    pub fn remove_metabolite(&mut self, id: &str) -> Option<Metabolite> {
        let met = self.metabolites.shift_remove(id)?;
        for rxn in self.reactions.values_mut() {
            rxn.pop_metabolite(id);
        }
        Some(met)
    }

    /// Remove reactions which have no metabolites
    pub fn prune_unused_reactions(&mut self) -> usize {
        let empty: Vec<String> = self
            .reactions
            .values()
            .filter(|r| r.metabolites.is_empty())
            .map(|r| r.id.clone())
            .collect();
        self.remove_reactions(empty, false)
    }

    /// Remove every gene and metabolite no reaction references
    pub fn remove_orphans(&mut self) -> (usize, usize) {
        let (used_metabolites, used_genes) = self.referenced_ids();
        let genes_before = self.genes.len();
        let metabolites_before = self.metabolites.len();
        self.genes.retain(|id, _| used_genes.contains(id));
        self.metabolites.retain(|id, _| used_metabolites.contains(id));
        (
            genes_before - self.genes.len(),
            metabolites_before - self.metabolites.len(),
        )
    }

    /// Replace the stoichiometry and direction of a reaction with a parsed equation
    pub fn set_reaction_equation(
        &mut self,
        reaction_id: &str,
        equation: &ReactionEquation,
    ) -> Result<(), ModelError> {
        for met in equation.metabolites.keys() {
            self.ensure_metabolite(met);
        }
        let rxn = self
            .reactions
            .get_mut(reaction_id)
            .ok_or_else(|| ModelError::ReactionNotFound(reaction_id.to_string()))?;
        rxn.metabolites = equation.metabolites.clone();
        rxn.set_direction(equation.direction);
        Ok(())
    }

    /// Compute the elemental and charge imbalance of a reaction
    ///
    /// For every element the sum of coefficient times atom count is computed over all
    /// participants, and the same for charge under the key `charge`. Entries within the
    /// configured tolerance of zero are dropped, so a balanced reaction gives an empty map.
    pub fn check_mass_balance(&self, reaction_id: &str) -> Result<IndexMap<String, f64>, ModelError> {
        let rxn = self
            .reactions
            .get(reaction_id)
            .ok_or_else(|| ModelError::ReactionNotFound(reaction_id.to_string()))?;
        let mut imbalance: IndexMap<String, f64> = IndexMap::new();
        for (met_id, coef) in &rxn.metabolites {
            let met = self
                .metabolites
                .get(met_id)
                .ok_or_else(|| ModelError::MetaboliteNotFound(met_id.clone()))?;
            for (element, count) in met.elements()? {
                *imbalance.entry(element).or_insert(0.) += coef * count;
            }
            *imbalance.entry("charge".to_string()).or_insert(0.) += coef * met.charge as f64;
        }
        let tol = tolerance();
        imbalance.retain(|_, v| v.abs() > tol);
        Ok(imbalance)
    }

    /// Metabolite and gene ids referenced by any reaction
    fn referenced_ids(&self) -> (IndexSet<String>, IndexSet<String>) {
        let mut metabolites = IndexSet::new();
        let mut genes = IndexSet::new();
        for rxn in self.reactions.values() {
            metabolites.extend(rxn.metabolites.keys().cloned());
            genes.extend(rxn.gene_ids());
        }
        (metabolites, genes)
    }
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Reaction {0} is not present in the model")]
    ReactionNotFound(String),
    #[error("Metabolite {0} is not present in the model")]
    MetaboliteNotFound(String),
    #[error("Unable to read metabolite formula")]
    Formula(#[from] FormulaError),
}

// region GPR Functionality
/// Representation of a Gene Protein Reaction Rule as an AST
#[derive(Clone, Debug, PartialEq)]
pub enum Gpr {
    /// Operation on two genes (see [`GprOperation`])
    Operation(GprOperation),
    /// A terminal gene Node (see [`Gene`])
    GeneNode(String),
}

impl Display for Gpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_string_id())
    }
}

impl Gpr {
    /// Create a new binary operation node
    pub fn new_binary_operation(
        left: Gpr,
        operator: GprOperatorType,
        right: Gpr,
    ) -> Result<Gpr, GprError> {
        let op = match operator {
            GprOperatorType::Or => GprOperation::Or {
                left: Box::new(left),
                right: Box::new(right),
            },
            GprOperatorType::And => GprOperation::And {
                left: Box::new(left),
                right: Box::new(right),
            },
            GprOperatorType::Not => return Err(GprError::InvalidBinaryOp),
        };
        Ok(Gpr::Operation(op))
    }

    /// Create a new unary operation node
    pub fn new_unary_operation(operator: GprOperatorType, operand: Gpr) -> Result<Gpr, GprError> {
        let op = match operator {
            GprOperatorType::Not => GprOperation::Not {
                val: Box::new(operand),
            },
            _ => return Err(GprError::InvalidUnaryOp),
        };
        Ok(Gpr::Operation(op))
    }

    /// Create a new gene node
    pub fn new_gene_node(gene: &str) -> Gpr {
        Gpr::GeneNode(gene.to_string())
    }

    /// Generate a GPR string with gene ids from the GPR AST
    pub fn to_string_id(&self) -> String {
        match self {
            Gpr::Operation(op) => match op {
                GprOperation::Or { left, right } => {
                    format!("({} or {})", left.to_string_id(), right.to_string_id())
                }
                GprOperation::And { left, right } => {
                    format!("({} and {})", left.to_string_id(), right.to_string_id())
                }
                GprOperation::Not { val } => {
                    format!("(not {})", val)
                }
            },
            Gpr::GeneNode(gene_ref) => gene_ref.to_string(),
        }
    }

    /// Insert the id of every gene in the tree into `genes`
    pub fn collect_genes(&self, genes: &mut IndexSet<String>) {
        match self {
            Gpr::Operation(GprOperation::Or { left, right })
            | Gpr::Operation(GprOperation::And { left, right }) => {
                left.collect_genes(genes);
                right.collect_genes(genes);
            }
            Gpr::Operation(GprOperation::Not { val }) => val.collect_genes(genes),
            Gpr::GeneNode(gene) => {
                genes.insert(gene.clone());
            }
        }
    }
}

/// Possible operations on genes
#[derive(Clone, Debug, PartialEq)]
pub enum GprOperation {
    Or { left: Box<Gpr>, right: Box<Gpr> },
    And { left: Box<Gpr>, right: Box<Gpr> },
    Not { val: Box<Gpr> },
}

/// Types of Allowed GPR Operations
pub enum GprOperatorType {
    /// Or, gene products are interchangeable
    Or,
    /// And, both gene products are required
    And,
    /// Not, the gene product must be absent
    Not,
}

#[derive(Clone, Debug, Error)]
pub enum GprError {
    #[error("Inavlid Binary Operation")]
    InvalidBinaryOp,
    #[error("Inavlid Unary Operation")]
    InvalidUnaryOp,
}

// endregion GPR Functionality
