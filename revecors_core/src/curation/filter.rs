//! Removal of reactions which do not belong in a topological network
use indexmap::IndexSet;
use tracing::{debug, info};

use super::CurationRules;
use crate::metabolic_model::model::Model;

/// Ids of the reactions matching at least one exclusion rule, each listed once
pub fn flagged_reactions(model: &Model, rules: &CurationRules) -> IndexSet<String> {
    let mut flagged = IndexSet::new();
    for rule in &rules.exclusion_rules {
        let before = flagged.len();
        flagged.extend(
            model
                .reactions
                .values()
                .filter(|rxn| rule.criterion.matches(rxn))
                .map(|rxn| rxn.id.clone()),
        );
        debug!("Rule '{}' flagged {} new reactions", rule.name, flagged.len() - before);
    }
    flagged
}

/// Remove every reaction matching an exclusion rule
///
/// Genes and metabolites left without reactions by the removal are removed too.
///
/// # Returns
/// The number of reactions removed
pub fn filter_reactions(model: &mut Model, rules: &CurationRules) -> usize {
    let flagged = flagged_reactions(model, rules);
    let removed = model.remove_reactions(&flagged, true);
    info!("Removed {} reactions", removed);
    removed
}

/// Log the extracellular metabolites still present in the model
pub fn log_extracellular(model: &Model) -> Vec<&str> {
    let extracellular: Vec<&str> = model
        .metabolites
        .keys()
        .filter(|id| id.ends_with("_e0"))
        .map(|id| id.as_str())
        .collect();
    if !extracellular.is_empty() {
        info!(
            "{} extracellular metabolites remain: {}",
            extracellular.len(),
            extracellular.join(", ")
        );
    }
    extracellular
}
