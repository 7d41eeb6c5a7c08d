//! Pruning of currency metabolites from a curated model
use tracing::{debug, info};

use super::CurationRules;
use crate::io::tables::ReferenceTables;
use crate::metabolic_model::model::Model;
use crate::metabolic_model::reaction::Reaction;

/// Counts of what the pruner removed
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PruneReport {
    /// Currency pairs removed from reactions
    pub currency_pairs: usize,
    /// Amino transfer pairs removed from reactions
    pub amino_pairs: usize,
    /// Singleton currency metabolites removed from the model
    pub singletons: usize,
    /// Reactions left without any participant
    pub empty_reactions: usize,
    /// Reactions left without reactants or without products
    pub degenerate_reactions: usize,
    pub genes: usize,
    pub metabolites: usize,
}

/// Remove both members of every pair the reaction contains in full
fn remove_pairs<'p, I>(reaction: &mut Reaction, pairs: I) -> usize
where
    I: IntoIterator<Item = &'p (String, String)>,
{
    let mut removed = 0;
    for (first, second) in pairs {
        if reaction.metabolites.contains_key(first) && reaction.metabolites.contains_key(second) {
            reaction.pop_metabolite(first);
            reaction.pop_metabolite(second);
            removed += 1;
        }
    }
    removed
}

/// Thin a curated model down to its physiologically meaningful arcs
///
/// Currency pairs are removed from every reaction containing both members. Amino
/// transfer pairs are removed likewise, except from reactions involving ammonia.
/// Singleton currency metabolites are removed from the model outright. Finally
/// reactions left empty or without reactants or products are removed, followed by
/// every gene and metabolite no reaction references.
pub fn prune_currency(
    model: &mut Model,
    tables: &ReferenceTables,
    rules: &CurationRules,
) -> PruneReport {
    let mut report = PruneReport::default();
    for rxn in model.reactions.values_mut() {
        report.currency_pairs += remove_pairs(rxn, &tables.currency_pairs);
        let ammonia = match rxn.compartment() {
            Some(compartment) => format!("{}_{}", rules.amino_exclusion_base, compartment),
            None => rules.amino_exclusion_base.clone(),
        };
        if !rxn.metabolites.contains_key(&ammonia) {
            report.amino_pairs += remove_pairs(rxn, &tables.amino_pairs);
        }
    }
    for singleton in &tables.singletons {
        if model.remove_metabolite(singleton).is_some() {
            debug!("Removed currency metabolite {}", singleton);
            report.singletons += 1;
        }
    }

    report.empty_reactions = model.prune_unused_reactions();
    let degenerate: Vec<String> = model
        .reactions
        .values()
        .filter(|rxn| rxn.reactants().is_empty() || rxn.products().is_empty())
        .map(|rxn| rxn.id.clone())
        .collect();
    report.degenerate_reactions = model.remove_reactions(&degenerate, false);
    (report.genes, report.metabolites) = model.remove_orphans();
    info!(
        "Removed {} currency pairs, {} amino pairs and {} singletons, then {} reactions",
        report.currency_pairs,
        report.amino_pairs,
        report.singletons,
        report.empty_reactions + report.degenerate_reactions
    );
    report
}
