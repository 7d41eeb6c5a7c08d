//! Removal of the compartment index from identifiers, `cpd00001_c0` becomes `cpd00001_c`
use std::sync::LazyLock;

use indexmap::{IndexMap, IndexSet};
use regex::Regex;
use tracing::debug;

use super::CurationError;
use crate::metabolic_model::model::Model;

static NAME_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_[a-z]\d$").unwrap());
static LABEL_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_\d$").unwrap());

/// Drop a single trailing digit
pub fn strip_index(id: &str) -> &str {
    match id.strip_suffix(|c: char| c.is_ascii_digit()) {
        Some(stripped) => stripped,
        None => id,
    }
}

/// Drop a trailing compartment suffix such as `_c0` from a display name
pub fn strip_name_suffix(name: &str) -> String {
    NAME_SUFFIX.replace(name, "").into_owned()
}

/// Fail on the first identifier whose normalized form is already taken
fn check_collisions<'a>(
    ids: impl Iterator<Item = &'a String>,
    kind: &'static str,
) -> Result<(), CurationError> {
    let mut seen = IndexSet::new();
    for id in ids {
        let new_id = strip_index(id);
        if !seen.insert(new_id) {
            return Err(CurationError::IdCollision {
                kind,
                first: id.clone(),
                id: new_id.to_string(),
            });
        }
    }
    Ok(())
}

fn rekey<T>(map: IndexMap<String, T>, mut update: impl FnMut(&mut T, &str)) -> IndexMap<String, T> {
    map.into_iter()
        .map(|(id, mut value)| {
            let new_id = strip_index(&id).to_string();
            update(&mut value, &new_id);
            (new_id, value)
        })
        .collect()
}

/// Strip the compartment index from compartment, metabolite and reaction identifiers
///
/// Names lose their trailing `_<compartment>` suffix and compartment labels their `_<index>`.
/// Two identifiers collapsing onto the same normalized identifier is an error.
pub fn normalize_identifiers(model: &mut Model) -> Result<(), CurationError> {
    if let Some(ref compartments) = model.compartments {
        check_collisions(compartments.keys(), "compartment")?;
    }
    check_collisions(model.metabolites.keys(), "metabolite")?;
    check_collisions(model.reactions.keys(), "reaction")?;

    if let Some(compartments) = model.compartments.take() {
        model.compartments = Some(rekey(compartments, |label, _| {
            *label = LABEL_SUFFIX.replace(label.as_str(), "").into_owned();
        }));
    }

    let metabolites = std::mem::take(&mut model.metabolites);
    model.metabolites = rekey(metabolites, |met, new_id| {
        met.id = new_id.to_string();
        met.compartment = met.compartment.as_deref().map(|c| strip_index(c).to_string());
        met.name = met.name.as_deref().map(strip_name_suffix);
    });

    let reactions = std::mem::take(&mut model.reactions);
    model.reactions = rekey(reactions, |rxn, new_id| {
        rxn.id = new_id.to_string();
        rxn.name = rxn.name.as_deref().map(strip_name_suffix);
        rxn.metabolites = std::mem::take(&mut rxn.metabolites)
            .into_iter()
            .map(|(met, coef)| (strip_index(&met).to_string(), coef))
            .collect();
    });

    model.objective = std::mem::take(&mut model.objective)
        .into_iter()
        .map(|(rxn, coef)| (strip_index(&rxn).to_string(), coef))
        .collect();
    debug!("Normalized identifiers of {} reactions", model.reactions.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metabolic_model::metabolite::Metabolite;
    use crate::metabolic_model::reaction::ReactionBuilder;

    #[test]
    fn strip_helpers() {
        assert_eq!(strip_index("cpd00001_c0"), "cpd00001_c");
        assert_eq!(strip_index("c0"), "c");
        assert_eq!(strip_index("cpd00001_c"), "cpd00001_c");
        assert_eq!(strip_name_suffix("H2O_c0"), "H2O");
        assert_eq!(strip_name_suffix("Ferredoxin nitrite reductase_c0"), "Ferredoxin nitrite reductase");
        assert_eq!(strip_name_suffix("D-Glucose"), "D-Glucose");
    }

    #[test]
    fn normalize_model() {
        let mut model = Model::new_empty();
        let mut compartments = IndexMap::new();
        compartments.insert("c0".to_string(), "Cytosol_0".to_string());
        model.compartments = Some(compartments);
        let rxn = ReactionBuilder::default()
            .id("rxn00001_c0".to_string())
            .name(Some("diphosphate phosphohydrolase_c0".to_string()))
            .metabolites(
                [("cpd00012_c0".to_string(), -1.), ("cpd00009_c0".to_string(), 2.)]
                    .into_iter()
                    .collect(),
            )
            .build()
            .unwrap();
        model.add_reaction(rxn);
        model.metabolites["cpd00012_c0"].name = Some("PPi_c0".to_string());
        model.objective.insert("rxn00001_c0".to_string(), 1.);

        normalize_identifiers(&mut model).unwrap();
        assert_eq!(model.compartments.as_ref().unwrap()["c"], "Cytosol");
        let met = &model.metabolites["cpd00012_c"];
        assert_eq!(met.id, "cpd00012_c");
        assert_eq!(met.compartment.as_deref(), Some("c"));
        assert_eq!(met.name.as_deref(), Some("PPi"));
        let rxn = &model.reactions["rxn00001_c"];
        assert_eq!(rxn.id, "rxn00001_c");
        assert_eq!(rxn.name.as_deref(), Some("diphosphate phosphohydrolase"));
        assert_eq!(rxn.metabolites["cpd00009_c"], 2.);
        assert_eq!(model.objective["rxn00001_c"], 1.);
    }

    #[test]
    fn collision_is_an_error() {
        let mut model = Model::new_empty();
        model.add_metabolite(Metabolite::new("cpd00001_c0".to_string(), Some("c0".to_string())));
        model.add_metabolite(Metabolite::new("cpd00001_c1".to_string(), Some("c1".to_string())));
        assert!(matches!(
            normalize_identifiers(&mut model),
            Err(CurationError::IdCollision { kind: "metabolite", .. })
        ));
        // Nothing is rekeyed when a collision is found
        assert_eq!(model.metabolites.len(), 2);
        assert!(model.metabolites.contains_key("cpd00001_c0"));
    }
}
