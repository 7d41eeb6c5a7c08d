//! Mass and charge balance correction
use tracing::{debug, info, warn};

use super::{CurationError, CurationRules};
use crate::configuration::tolerance;
use crate::io::tables::{CompoundTable, ReferenceTables};
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::model::{Model, ModelError};
use crate::metabolic_model::reaction::ReactionEquation;
use crate::utils::ids::{base_id, compartment_of};

/// Reactions touched by the proton balance heuristic
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BalanceReport {
    /// Reactions made balanced by adjusting their proton coefficient
    pub corrected: Vec<String>,
    /// Reactions left unbalanced
    pub unbalanced: Vec<String>,
}

impl BalanceReport {
    pub fn is_balanced(&self) -> bool {
        self.unbalanced.is_empty()
    }
}

/// Set the formula of every metabolite from the compound table of its model
///
/// Metabolites are looked up by their id without compartment suffix. A metabolite
/// missing from the table is an error.
pub fn import_compound_formulas(
    model: &mut Model,
    compounds: &CompoundTable,
) -> Result<(), CurationError> {
    for met in model.metabolites.values_mut() {
        let compound = base_id(&met.id);
        match compounds.formula(&compound) {
            Some(formula) => met.formula = formula.map(String::from),
            None => {
                return Err(CurationError::MissingCompound {
                    metabolite: met.id.clone(),
                    compound,
                })
            }
        }
    }
    Ok(())
}

/// Overwrite formulas and charges of the metabolites listed in the reference tables
///
/// # Returns
/// The number of metabolites corrected
pub fn apply_reference_corrections(
    model: &mut Model,
    tables: &ReferenceTables,
) -> Result<usize, CurationError> {
    let mut corrected = 0;
    for met in model.metabolites.values_mut() {
        if let Some(formula) = tables.formulas.get(&met.id) {
            let charge = tables
                .charges
                .get(&met.id)
                .ok_or_else(|| CurationError::MissingCharge(met.id.clone()))?;
            met.formula = Some(formula.clone());
            met.charge = *charge;
            corrected += 1;
        }
    }
    debug!("Corrected formula and charge of {} metabolites", corrected);
    Ok(corrected)
}

/// Replace the stoichiometry of the reactions with a configured override
///
/// # Returns
/// The number of reactions rewritten
pub fn apply_stoichiometry_overrides(
    model: &mut Model,
    rules: &CurationRules,
) -> Result<usize, CurationError> {
    let mut applied = 0;
    for (reaction, equation) in &rules.stoichiometry_overrides {
        if !model.reactions.contains_key(reaction) {
            continue;
        }
        let equation: ReactionEquation =
            equation.parse().map_err(|source| CurationError::Equation {
                reaction: reaction.clone(),
                source,
            })?;
        model.set_reaction_equation(reaction, &equation)?;
        debug!("Replaced stoichiometry of {}", reaction);
        applied += 1;
    }
    Ok(applied)
}

/// Correct reactions whose only imbalance is an equal amount of hydrogen and charge
///
/// The proton of the reaction's compartment is added with the opposite of the
/// imbalance, creating the proton metabolite if needed. Every other imbalanced
/// reaction is reported as unbalanced.
pub fn balance_protons(model: &mut Model, rules: &CurationRules) -> Result<BalanceReport, CurationError> {
    let mut report = BalanceReport::default();
    let reaction_ids: Vec<String> = model.reactions.keys().cloned().collect();
    for rxn_id in reaction_ids {
        let imbalance = match imbalance_of(model, &rxn_id)? {
            Some(imbalance) => imbalance,
            None => {
                report.unbalanced.push(rxn_id);
                continue;
            }
        };
        if imbalance.is_empty() {
            continue;
        }
        let proton_only = imbalance.len() == 2
            && matches!(
                (imbalance.get("H"), imbalance.get("charge")),
                (Some(h), Some(charge)) if (h - charge).abs() <= tolerance()
            );
        if !proton_only {
            warn!("Reaction {} is unbalanced: {:?}", rxn_id, imbalance);
            report.unbalanced.push(rxn_id);
            continue;
        }
        let compartment = compartment_of(&rxn_id).unwrap_or(rules.default_compartment.as_str());
        let proton = format!("{}_{}", rules.proton_base_id, compartment);
        ensure_proton(model, &proton, compartment);
        let excess = imbalance["H"];
        if let Some(rxn) = model.reactions.get_mut(&rxn_id) {
            rxn.add_metabolites([(proton, -excess)]);
        }
        match imbalance_of(model, &rxn_id)? {
            Some(remaining) if remaining.is_empty() => {
                debug!("Balanced {} with {} protons", rxn_id, -excess);
                report.corrected.push(rxn_id);
            }
            _ => {
                warn!("Reaction {} is unbalanced after proton correction", rxn_id);
                report.unbalanced.push(rxn_id);
            }
        }
    }
    Ok(report)
}

/// Imbalance of a reaction, `None` when a participant formula cannot be read
fn imbalance_of(
    model: &Model,
    rxn_id: &str,
) -> Result<Option<indexmap::IndexMap<String, f64>>, CurationError> {
    match model.check_mass_balance(rxn_id) {
        Ok(imbalance) => Ok(Some(imbalance)),
        Err(ModelError::Formula(err)) => {
            warn!("Unable to check balance of {}: {}", rxn_id, err);
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

fn ensure_proton(model: &mut Model, id: &str, compartment: &str) {
    if model.metabolites.contains_key(id) {
        return;
    }
    let mut proton = Metabolite::new(id.to_string(), Some(compartment.to_string()));
    proton.name = Some("H+".to_string());
    proton.formula = Some("H".to_string());
    proton.charge = 1;
    model.add_metabolite(proton);
}

/// Run every balance correction in order
///
/// # Returns
/// Whether every reaction of the model is balanced afterwards
pub fn correct_balance(
    model: &mut Model,
    tables: &ReferenceTables,
    compounds: &CompoundTable,
    rules: &CurationRules,
) -> Result<bool, CurationError> {
    import_compound_formulas(model, compounds)?;
    apply_reference_corrections(model, tables)?;
    apply_stoichiometry_overrides(model, rules)?;
    let report = balance_protons(model, rules)?;
    info!(
        "Proton correction balanced {} reactions, {} remain unbalanced",
        report.corrected.len(),
        report.unbalanced.len()
    );
    Ok(report.is_balanced())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metabolic_model::metabolite::MetaboliteBuilder;
    use crate::metabolic_model::reaction::ReactionBuilder;

    fn metabolite(id: &str, formula: &str, charge: i32) -> Metabolite {
        MetaboliteBuilder::default()
            .id(id.to_string())
            .formula(Some(formula.to_string()))
            .charge(charge)
            .build()
            .unwrap()
    }

    fn model_with(rxn_id: &str, mets: &[(&str, f64)]) -> Model {
        let mut model = Model::new_empty();
        model.add_metabolite(metabolite("cpd00002_c0", "C10H13N5O13P3", -3));
        model.add_metabolite(metabolite("cpd00008_c0", "C10H12N5O10P2", -3));
        model.add_metabolite(metabolite("cpd00009_c0", "HO4P", -2));
        model.add_metabolite(metabolite("cpd00001_c0", "H2O", 0));
        model.add_metabolite(metabolite("cpd00067_c0", "H", 1));
        let rxn = ReactionBuilder::default()
            .id(rxn_id.to_string())
            .metabolites(mets.iter().map(|(m, c)| (m.to_string(), *c)).collect())
            .build()
            .unwrap();
        model.add_reaction(rxn);
        model
    }

    #[test]
    fn proton_correction() {
        // ATP + H2O -> ADP + Pi + 4 H+ carries two excess protons
        let mut model = model_with(
            "rxn00062_c0",
            &[
                ("cpd00002_c0", -1.),
                ("cpd00001_c0", -1.),
                ("cpd00008_c0", 1.),
                ("cpd00009_c0", 1.),
                ("cpd00067_c0", 4.),
            ],
        );
        let imbalance = model.check_mass_balance("rxn00062_c0").unwrap();
        assert_eq!(imbalance["H"], 2.);
        assert_eq!(imbalance["charge"], 2.);
        let report = balance_protons(&mut model, &CurationRules::default()).unwrap();
        assert_eq!(report.corrected, vec!["rxn00062_c0"]);
        assert!(report.is_balanced());
        assert!(model.check_mass_balance("rxn00062_c0").unwrap().is_empty());
        assert_eq!(model.reactions["rxn00062_c0"].metabolites["cpd00067_c0"], 2.);
    }

    #[test]
    fn proton_created_when_missing() {
        let mut model = model_with(
            "rxn00062_c0",
            &[
                ("cpd00002_c0", -1.),
                ("cpd00001_c0", -1.),
                ("cpd00008_c0", 1.),
                ("cpd00009_c0", 1.),
            ],
        );
        model.metabolites.shift_remove("cpd00067_c0");
        let report = balance_protons(&mut model, &CurationRules::default()).unwrap();
        assert!(report.is_balanced());
        assert_eq!(model.metabolites["cpd00067_c0"].charge, 1);
        assert_eq!(model.reactions["rxn00062_c0"].metabolites["cpd00067_c0"], 2.);
    }

    #[test]
    fn fractional_proton_imbalance() {
        let mut model = Model::new_empty();
        model.add_metabolite(metabolite("cpd00001_c0", "H", 0));
        model.add_metabolite(metabolite("cpd00002_c0", "H2", 0));
        model.add_metabolite(Metabolite {
            charge: 1,
            ..Metabolite::new("cpd00003_c0".to_string(), Some("c0".to_string()))
        });
        model.add_metabolite(metabolite("cpd00067_c0", "H", 1));
        let rxn = ReactionBuilder::default()
            .id("rxn1_c0".to_string())
            .metabolites(
                [("cpd00001_c0", 0.1), ("cpd00002_c0", 0.1), ("cpd00003_c0", 0.3)]
                    .iter()
                    .map(|(m, c)| (m.to_string(), *c))
                    .collect(),
            )
            .build()
            .unwrap();
        model.add_reaction(rxn);
        let imbalance = model.check_mass_balance("rxn1_c0").unwrap();
        assert_ne!(imbalance["H"], imbalance["charge"]);

        let report = balance_protons(&mut model, &CurationRules::default()).unwrap();
        assert_eq!(report.corrected, vec!["rxn1_c0"]);
        assert!(report.is_balanced());
        assert!((model.reactions["rxn1_c0"].metabolites["cpd00067_c0"] + 0.3).abs() < 1e-9);
    }

    #[test]
    fn other_imbalances_are_reported() {
        let mut model = model_with("rxn00001_c0", &[("cpd00001_c0", -1.), ("cpd00009_c0", 1.)]);
        let report = balance_protons(&mut model, &CurationRules::default()).unwrap();
        assert_eq!(report.unbalanced, vec!["rxn00001_c0"]);
        assert!(!report.is_balanced());
        assert_eq!(model.reactions["rxn00001_c0"].metabolites.len(), 2);
    }

    #[test]
    fn reference_corrections() {
        let mut model = model_with("rxn00001_c0", &[("cpd00001_c0", -1.)]);
        let mut tables = ReferenceTables::default();
        tables
            .formulas
            .insert("cpd00009_c0".to_string(), "HO4P".to_string());
        assert!(matches!(
            apply_reference_corrections(&mut model, &tables),
            Err(CurationError::MissingCharge(_))
        ));
        tables.charges.insert("cpd00009_c0".to_string(), -1);
        assert_eq!(apply_reference_corrections(&mut model, &tables).unwrap(), 1);
        assert_eq!(model.metabolites["cpd00009_c0"].charge, -1);
    }

    #[test]
    fn compound_import() {
        let mut model = model_with("rxn00001_c0", &[("cpd00001_c0", -1.)]);
        let mut entries = vec![
            ("cpd00001".to_string(), Some("H2O".to_string())),
            ("cpd00002".to_string(), Some("C10H13N5O13P3".to_string())),
            ("cpd00008".to_string(), None),
            ("cpd00067".to_string(), Some("H".to_string())),
        ];
        let compounds: CompoundTable = entries.clone().into_iter().collect();
        assert!(matches!(
            import_compound_formulas(&mut model, &compounds),
            Err(CurationError::MissingCompound { .. })
        ));
        entries.push(("cpd00009".to_string(), Some("HO4P".to_string())));
        let compounds: CompoundTable = entries.into_iter().collect();
        import_compound_formulas(&mut model, &compounds).unwrap();
        assert_eq!(model.metabolites["cpd00008_c0"].formula, None);
        assert_eq!(model.metabolites["cpd00009_c0"].formula.as_deref(), Some("HO4P"));
    }

    #[test]
    fn overrides() {
        let mut model = model_with("rxn07295_c0", &[("cpd00001_c0", -1.)]);
        let applied = apply_stoichiometry_overrides(&mut model, &CurationRules::default()).unwrap();
        assert_eq!(applied, 1);
        let rxn = &model.reactions["rxn07295_c0"];
        assert_eq!(rxn.metabolites["cpd00067_c0"], 3.);
        assert!(rxn.is_reversible());
        assert!(model.metabolites.contains_key("cpd14545_c0"));
        assert_eq!(model.metabolites["cpd14545_c0"].compartment.as_deref(), Some("c0"));

        let mut rules = CurationRules::default();
        rules
            .stoichiometry_overrides
            .insert("rxn07295_c0".to_string(), "cpd00001_c0 cpd00009_c0".to_string());
        assert!(matches!(
            apply_stoichiometry_overrides(&mut model, &rules),
            Err(CurationError::Equation { .. })
        ));
    }
}
