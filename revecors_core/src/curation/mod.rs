//! Rule based curation of draft KBase models
//!
//! Curation runs in stages, each taking the model by `&mut` reference:
//!
//! 1. [`filter::filter_reactions`] removes exchange, transport and otherwise
//!    non-physiological reactions
//! 2. [`balance::correct_balance`] fixes formulas, charges and known bad
//!    stoichiometries, then corrects proton-only imbalances
//! 3. [`normalize::normalize_identifiers`] drops the compartment index from ids
//!
//! The pruning of currency metabolites ([`currency::prune_currency`]) is run as a
//! separate pass on the curated model.
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::io::tables::{CompoundTable, ReferenceTables, TableError};
use crate::metabolic_model::model::{Model, ModelError};
use crate::metabolic_model::reaction::{EquationError, Reaction};
use crate::utils::ids::base_id;

pub mod balance;
pub mod currency;
pub mod filter;
pub mod normalize;

/// Current version of the rule file format
pub const RULES_VERSION: u32 = 1;

/// Rule tables driving curation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurationRules {
    /// Version of the rule file format
    pub version: u32,
    /// A reaction matching any of these rules is removed by the filter
    pub exclusion_rules: Vec<ExclusionRule>,
    /// Reaction id to the equation replacing its stoichiometry
    pub stoichiometry_overrides: IndexMap<String, String>,
    /// Compound id of the proton, without compartment
    pub proton_base_id: String,
    /// Compartment used for reactions whose id carries none
    pub default_compartment: String,
    /// Amino transfer pairs are kept in reactions involving this compound
    pub amino_exclusion_base: String,
}

/// A named reaction exclusion rule
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExclusionRule {
    pub name: String,
    pub criterion: Criterion,
}

/// The test a reaction is subjected to by an [`ExclusionRule`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Criterion {
    /// Reaction id starts with the prefix
    IdPrefix { prefix: String },
    /// Reaction has no gene reaction rule
    EmptyGeneRule,
    /// Reaction id is one of the listed ids
    IdIn { ids: Vec<String> },
    /// Gene reaction rule is exactly this string
    GeneRuleEquals { rule: String },
    /// Reaction name contains any of the keywords (case sensitive)
    NameContains { keywords: Vec<String> },
    /// A compound appears in more than one compartment of the reaction
    SelfTransport { ignore: Vec<String> },
}

impl Criterion {
    pub fn matches(&self, reaction: &Reaction) -> bool {
        match self {
            Criterion::IdPrefix { prefix } => reaction.id.starts_with(prefix.as_str()),
            Criterion::EmptyGeneRule => reaction.gene_reaction_rule().trim().is_empty(),
            Criterion::IdIn { ids } => ids.iter().any(|id| *id == reaction.id),
            Criterion::GeneRuleEquals { rule } => reaction.gene_reaction_rule() == *rule,
            Criterion::NameContains { keywords } => match reaction.name {
                Some(ref name) => keywords.iter().any(|k| name.contains(k.as_str())),
                None => false,
            },
            Criterion::SelfTransport { ignore } => is_self_transport(reaction, ignore),
        }
    }
}

/// Whether a compound participates in a reaction in more than one compartment
///
/// Compartment suffixes are stripped from every participant and ids in `ignore` are
/// skipped before looking for a repeated compound.
pub fn is_self_transport(reaction: &Reaction, ignore: &[String]) -> bool {
    let mut seen: Vec<String> = Vec::with_capacity(reaction.metabolites.len());
    for id in reaction.metabolites.keys() {
        let base = base_id(id);
        if ignore.contains(&base) {
            continue;
        }
        if seen.contains(&base) {
            return true;
        }
        seen.push(base);
    }
    false
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl Default for CurationRules {
    fn default() -> Self {
        let exclusion_rules = vec![
            ExclusionRule {
                name: "exchange".to_string(),
                criterion: Criterion::IdPrefix {
                    prefix: "EX_".to_string(),
                },
            },
            ExclusionRule {
                name: "no gene reaction rule".to_string(),
                criterion: Criterion::EmptyGeneRule,
            },
            ExclusionRule {
                name: "biosynthesis".to_string(),
                criterion: Criterion::IdIn {
                    ids: strings(&["rxn13782_c0", "rxn13783_c0", "rxn13784_c0"]),
                },
            },
            ExclusionRule {
                name: "spontaneous".to_string(),
                criterion: Criterion::GeneRuleEquals {
                    rule: "Unknown".to_string(),
                },
            },
            ExclusionRule {
                name: "transport by name".to_string(),
                criterion: Criterion::NameContains {
                    keywords: strings(&[
                        "transport",
                        "permease",
                        "symport",
                        "diffusion",
                        "excretion",
                        "export",
                        "secretion",
                        "uptake",
                        "antiport",
                    ]),
                },
            },
            ExclusionRule {
                name: "transport by id".to_string(),
                criterion: Criterion::IdIn {
                    ids: strings(&[
                        "rxn05226_c0",
                        "rxn05292_c0",
                        "rxn05305_c0",
                        "rxn05312_c0",
                        "rxn05315_c0",
                        "rxn10945_c0",
                        "rxn10116_c0",
                    ]),
                },
            },
            ExclusionRule {
                name: "self transport".to_string(),
                criterion: Criterion::SelfTransport {
                    ignore: strings(&["cpd00067"]),
                },
            },
        ];
        let mut stoichiometry_overrides = IndexMap::new();
        for (rxn, equation) in [
            ("rxn05893_c0", "4.0 cpd00001_c0 + 2.0 cpd00013_c0 + 6.0 cpd11621_c0 <=> 16.0 cpd00067_c0 + 2.0 cpd00075_c0 + 6.0 cpd11620_c0"),
            ("rxn07295_c0", "cpd00007_c0 + cpd00033_c0 <=> cpd00025_c0 + 3.0 cpd00067_c0 + cpd14545_c0"),
            ("rxn08808_c0", "cpd00001_c0 + cpd15341_c0 <=> cpd00067_c0 + cpd00908_c0 + cpd01080_c0"),
            ("rxn12822_c0", "2.0 cpd00023_c0 + cpd11621_c0 <=> cpd00024_c0 + cpd00053_c0 + 2.0 cpd00067_c0 + cpd11620_c0"),
        ] {
            stoichiometry_overrides.insert(rxn.to_string(), equation.to_string());
        }
        CurationRules {
            version: RULES_VERSION,
            exclusion_rules,
            stoichiometry_overrides,
            proton_base_id: "cpd00067".to_string(),
            default_compartment: "c0".to_string(),
            amino_exclusion_base: "cpd00013".to_string(),
        }
    }
}

impl CurationRules {
    /// Read rules from a JSON file
    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<Self, CurationError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| CurationError::RulesIo {
            path: path.to_path_buf(),
            source,
        })?;
        let rules: CurationRules =
            serde_json::from_str(&text).map_err(|source| CurationError::RulesFormat {
                path: path.to_path_buf(),
                source,
            })?;
        if rules.version != RULES_VERSION {
            return Err(CurationError::RulesVersion {
                path: path.to_path_buf(),
                found: rules.version,
            });
        }
        Ok(rules)
    }
}

/// Result of curating a single model
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CurationOutcome {
    /// Number of reactions removed by the filter
    pub removed_reactions: usize,
    /// Whether every remaining reaction is mass and charge balanced
    pub balanced: bool,
}

/// Filter, balance and normalize a freshly loaded model
pub fn curate_model(
    model: &mut Model,
    tables: &ReferenceTables,
    compounds: &CompoundTable,
    rules: &CurationRules,
) -> Result<CurationOutcome, CurationError> {
    let removed_reactions = filter::filter_reactions(model, rules);
    filter::log_extracellular(model);
    let balanced = balance::correct_balance(model, tables, compounds, rules)?;
    normalize::normalize_identifiers(model)?;
    let (genes, metabolites, reactions) = model.counts();
    info!(
        "Curated model has {} genes, {} metabolites and {} reactions",
        genes, metabolites, reactions
    );
    Ok(CurationOutcome {
        removed_reactions,
        balanced,
    })
}

#[derive(Debug, Error)]
pub enum CurationError {
    #[error("Unable to read rule file {path}")]
    RulesIo {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid rule file {path}")]
    RulesFormat {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Rule file {path} has version {found}, expected {}", RULES_VERSION)]
    RulesVersion { path: PathBuf, found: u32 },
    #[error("Compound {compound} of metabolite {metabolite} is missing from the compound table")]
    MissingCompound {
        metabolite: String,
        compound: String,
    },
    #[error("Metabolite {0} has a corrected formula but no corrected charge")]
    MissingCharge(String),
    #[error("Invalid stoichiometry override for reaction {reaction}")]
    Equation {
        reaction: String,
        source: EquationError,
    },
    #[error("Both {first} and another {kind} normalize to the id {id}")]
    IdCollision {
        kind: &'static str,
        first: String,
        id: String,
    },
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Table(#[from] TableError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metabolic_model::reaction::ReactionBuilder;
    use std::path::PathBuf;

    fn reaction(id: &str, mets: &[&str]) -> Reaction {
        ReactionBuilder::default()
            .id(id.to_string())
            .metabolites(mets.iter().map(|m| (m.to_string(), -1.)).collect())
            .build()
            .unwrap()
    }

    #[test]
    fn self_transport() {
        let ignore = vec!["cpd00067".to_string()];
        let mut rxn = reaction("rxn1", &["A_c1", "B_c1"]);
        rxn.metabolites.insert("A_c2".to_string(), 1.);
        assert!(is_self_transport(&rxn, &ignore));

        let rxn = reaction("rxn2", &["A_c0", "B_c0", "C_c0"]);
        assert!(!is_self_transport(&rxn, &ignore));

        let rxn = reaction("rxn3", &["cpd00067_c0", "cpd00067_e0", "A_c0"]);
        assert!(!is_self_transport(&rxn, &ignore));
    }

    #[test]
    fn criteria() {
        let mut rxn = reaction("rxn05226_c0", &["A_c0"]);
        rxn.name = Some("Na+ symport_c0".to_string());
        assert!(Criterion::IdIn {
            ids: vec!["rxn05226_c0".to_string()]
        }
        .matches(&rxn));
        assert!(Criterion::EmptyGeneRule.matches(&rxn));
        assert!(Criterion::NameContains {
            keywords: vec!["symport".to_string()]
        }
        .matches(&rxn));
        assert!(!Criterion::NameContains {
            keywords: vec!["Symport".to_string()]
        }
        .matches(&rxn));
        assert!(!Criterion::IdPrefix {
            prefix: "EX_".to_string()
        }
        .matches(&rxn));
    }

    #[test]
    fn default_rules_match_golden_file() {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("test_data")
            .join("default_rules.json");
        let rules = CurationRules::read_json(path).unwrap();
        assert_eq!(rules, CurationRules::default());
    }

    #[test]
    fn rules_round_trip_and_version_check() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        let mut rules = CurationRules::default();
        rules.proton_base_id = "h".to_string();
        fs::write(&path, serde_json::to_string(&rules).unwrap()).unwrap();
        assert_eq!(CurationRules::read_json(&path).unwrap(), rules);

        rules.version = RULES_VERSION + 1;
        fs::write(&path, serde_json::to_string(&rules).unwrap()).unwrap();
        assert!(matches!(
            CurationRules::read_json(&path),
            Err(CurationError::RulesVersion { .. })
        ));
    }
}
