//! # Generation Engine
//!
//! [`GenerationContext`] bundles everything one verification run reads: the
//! frozen action catalog, the code profile, and the trigger patterns that let
//! not-determinant actions lead. There is no global state, so independent
//! runs (one per design scenario) can share a process.
//!
//! Each family is a pure function of the context. A failed family is recorded
//! in the diagnostics and never stops its siblings.
//!
//! ## Example
//!
//! ```rust
//! use loadcomb_core::actions::{Action, ActionCatalog};
//! use loadcomb_core::combinations::LimitStateFamily;
//! use loadcomb_core::engine::GenerationContext;
//! use loadcomb_core::factors::preset;
//!
//! let catalog = ActionCatalog::from_actions([
//!     Action::permanent("G1"),
//!     Action::variable("Q1", "A"),
//!     Action::variable("S1", "snow"),
//! ])
//! .unwrap()
//! .freeze()
//! .unwrap();
//! let profile = preset("en1990").unwrap();
//!
//! let result = GenerationContext::new(&catalog, profile).run(&LimitStateFamily::ALL);
//! assert!(result.diagnostics.is_success());
//!
//! let first = &result.container.family(LimitStateFamily::UlsPersistent)[0];
//! assert_eq!(first.label, "ULS-PT-001");
//! assert_eq!(first.expression, "1.35*G1 + 1.5*Q1 + 0.75*S1");
//! ```

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::actions::{FrozenCatalog, Pattern};
use crate::combinations::{generator, CombinationContainer, CombinationDraft, LimitStateFamily};
use crate::diagnostics::{FamilyOutcome, RunDiagnostics};
use crate::errors::ComboResult;
use crate::factors::CodeProfile;

/// Inputs of one generation run.
#[derive(Debug, Clone)]
pub struct GenerationContext<'a> {
    pub catalog: &'a FrozenCatalog,
    pub profile: &'a CodeProfile,
    /// Not-determinant actions matched by one of these may take the leading slot
    pub triggers: Vec<Pattern>,
}

/// Combinations and diagnostics of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub diagnostics: RunDiagnostics,
    pub container: CombinationContainer,
}

impl<'a> GenerationContext<'a> {
    /// Create a context without triggers
    pub fn new(catalog: &'a FrozenCatalog, profile: &'a CodeProfile) -> Self {
        GenerationContext {
            catalog,
            profile,
            triggers: Vec::new(),
        }
    }

    /// Add a trigger pattern (builder pattern)
    pub fn with_trigger(mut self, pattern: impl Into<Pattern>) -> Self {
        self.triggers.push(pattern.into());
        self
    }

    /// Generate the drafts of one family, in generation order.
    ///
    /// # Errors
    ///
    /// - `ComboError::Configuration` (tagged with the family) when a needed
    ///   γ or ψ entry is missing from the profile.
    /// - `ComboError::EnumerationLimit` when exhaustive sense enumeration has
    ///   too many origin groups.
    pub fn generate_family(&self, family: LimitStateFamily) -> ComboResult<Vec<CombinationDraft>> {
        generator::generate(self, family)
    }

    /// Generate the requested families one after another.
    ///
    /// A family requested twice is generated once.
    pub fn run(&self, families: &[LimitStateFamily]) -> RunResult {
        let mut diagnostics = self.start_diagnostics();
        let generated: Vec<_> = unique(families)
            .into_iter()
            .map(|family| (family, self.generate_logged(family)))
            .collect();
        let container = collect(generated, &mut diagnostics);
        RunResult {
            diagnostics,
            container,
        }
    }

    /// Generate the requested families on the rayon pool.
    ///
    /// Results are inserted in request order, so the output matches [`run`](Self::run).
    pub fn run_parallel(&self, families: &[LimitStateFamily]) -> RunResult {
        let mut diagnostics = self.start_diagnostics();
        let generated: Vec<_> = unique(families)
            .into_par_iter()
            .map(|family| (family, self.generate_logged(family)))
            .collect();
        let container = collect(generated, &mut diagnostics);
        RunResult {
            diagnostics,
            container,
        }
    }

    fn start_diagnostics(&self) -> RunDiagnostics {
        RunDiagnostics::new(self.profile.identifier(), self.catalog.warnings().to_vec())
    }

    fn generate_logged(&self, family: LimitStateFamily) -> ComboResult<Vec<CombinationDraft>> {
        let span = tracing::info_span!("family", family = %family);
        let _guard = span.enter();
        tracing::debug!(
            actions = self.catalog.len(),
            strategy = ?self.profile.sense_strategy.for_family(family),
            "generating"
        );
        let result = self.generate_family(family);
        if let Err(e) = &result {
            tracing::warn!(error = %e, "family failed");
        }
        result
    }
}

fn unique(families: &[LimitStateFamily]) -> Vec<LimitStateFamily> {
    let mut seen = Vec::with_capacity(families.len());
    for &family in families {
        if !seen.contains(&family) {
            seen.push(family);
        }
    }
    seen
}

/// Insert generated drafts in order and record each family's outcome.
fn collect(
    generated: Vec<(LimitStateFamily, ComboResult<Vec<CombinationDraft>>)>,
    diagnostics: &mut RunDiagnostics,
) -> CombinationContainer {
    let mut container = CombinationContainer::new();
    for (family, result) in generated {
        let outcome = match result {
            Ok(drafts) => {
                container.open_family(family);
                let total = drafts.len();
                let mut combinations = 0;
                for draft in drafts {
                    if container.insert(draft).is_some() {
                        combinations += 1;
                    }
                }
                let duplicates_discarded = total - combinations;
                tracing::info!(
                    family = %family,
                    combinations,
                    duplicates_discarded,
                    "family generated"
                );
                FamilyOutcome::Generated {
                    combinations,
                    duplicates_discarded,
                }
            }
            Err(error) => FamilyOutcome::Failed { error },
        };
        diagnostics.record(family, outcome);
    }
    container
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::actions::{Action, ActionCatalog, ActionCategory};
    use crate::combinations::{Combination, FamilyStatus};
    use crate::errors::{ComboError, ConfigTable};
    use crate::factors::{preset, AccidentalRule, SenseStrategies, SenseStrategy};

    fn freeze(actions: Vec<Action>) -> FrozenCatalog {
        ActionCatalog::from_actions(actions).unwrap().freeze().unwrap()
    }

    fn en1990() -> CodeProfile {
        preset("en1990").unwrap().clone()
    }

    fn with_strategy(strategy: SenseStrategy) -> CodeProfile {
        en1990().with_sense_strategy(SenseStrategies::uniform(strategy))
    }

    fn family(catalog: &FrozenCatalog, profile: &CodeProfile, family: LimitStateFamily) -> Vec<Combination> {
        let result = GenerationContext::new(catalog, profile).run(&[family]);
        assert!(result.diagnostics.is_success(), "{:?}", result.diagnostics);
        result.container.family(family).to_vec()
    }

    fn terms(combo: &Combination) -> Vec<(&str, f64)> {
        combo.terms.iter().map(|t| (t.action_id.as_str(), t.coefficient)).collect()
    }

    // ------------------------------------------------------------------
    // Scenarios
    // ------------------------------------------------------------------

    #[test]
    fn test_permanent_only_exhaustive_and_shortcut() {
        let catalog = freeze(vec![Action::permanent("G1").in_origin_group("g1")]);

        let exhaustive = family(&catalog, &with_strategy(SenseStrategy::Exhaustive), LimitStateFamily::UlsPersistent);
        assert_eq!(exhaustive.len(), 2);
        assert_eq!(terms(&exhaustive[0]), vec![("G1", 1.35)]);
        assert_eq!(terms(&exhaustive[1]), vec![("G1", 1.0)]);
        assert!(exhaustive[0].leading.is_none());

        let shortcut = family(&catalog, &with_strategy(SenseStrategy::Shortcut), LimitStateFamily::UlsPersistent);
        assert_eq!(shortcut.len(), 1);
        assert_eq!(terms(&shortcut[0]), vec![("G1", 1.35)]);
    }

    #[test]
    fn test_mutually_incompatible_variables() {
        let actions = vec![
            Action::permanent("G1"),
            Action::variable("Q1", "A").incompatible_with("Q.*"),
            Action::variable("Q2", "A").incompatible_with("Q.*"),
        ];
        let catalog = freeze(actions);

        let shortcut = family(&catalog, &with_strategy(SenseStrategy::Shortcut), LimitStateFamily::UlsPersistent);
        assert_eq!(shortcut.len(), 2);
        assert_eq!(shortcut[0].leading.as_deref(), Some("Q1"));
        assert_eq!(shortcut[1].leading.as_deref(), Some("Q2"));
        assert_eq!(terms(&shortcut[0]), vec![("G1", 1.35), ("Q1", 1.5)]);

        let exhaustive = family(&catalog, &with_strategy(SenseStrategy::Exhaustive), LimitStateFamily::UlsPersistent);
        assert_eq!(exhaustive.len(), 4);
        for combo in shortcut.iter().chain(&exhaustive) {
            assert!(!(combo.contains("Q1") && combo.contains("Q2")), "{}", combo.expression);
        }
    }

    #[test]
    fn test_dependent_action_never_alone() {
        let catalog = freeze(vec![
            Action::permanent("G1"),
            Action::variable("Q1", "A"),
            Action::variable("F1", "A").depends_on("Q1"),
        ]);
        let result = GenerationContext::new(&catalog, preset("en1990").unwrap()).run(&LimitStateFamily::ALL);
        assert!(result.diagnostics.is_success());

        let mut seen_f1 = false;
        for combo in result.container.iter() {
            if combo.contains("F1") {
                seen_f1 = true;
                assert!(combo.contains("Q1"), "{}: {}", combo.label, combo.expression);
            }
        }
        assert!(seen_f1);
    }

    #[test]
    fn test_quasi_permanent_single_combination() {
        let catalog = freeze(vec![
            Action::permanent("G1"),
            Action::variable("Q1", "A"),
            Action::variable("Q2", "C"),
        ]);
        let combos = family(&catalog, &en1990(), LimitStateFamily::SlsQuasiPermanent);
        assert_eq!(combos.len(), 1);
        assert_eq!(terms(&combos[0]), vec![("G1", 1.0), ("Q1", 0.3), ("Q2", 0.6)]);
        assert!(combos[0].leading.is_none());
    }

    #[test]
    fn test_missing_psi_group_fails_only_families_that_need_it() {
        let catalog = freeze(vec![Action::permanent("G1"), Action::variable("Q1", "Z")]);
        let profile = en1990();
        let result = GenerationContext::new(&catalog, &profile).run(&LimitStateFamily::ALL);
        let diagnostics = &result.diagnostics;

        for failed in [LimitStateFamily::SlsFrequent, LimitStateFamily::SlsQuasiPermanent] {
            let expected = ComboError::configuration(ConfigTable::CombinationFactors, "group 'Z'", "Q1")
                .in_family(failed);
            assert_eq!(diagnostics.error(failed), Some(&expected));
            assert_eq!(result.container.status(failed), FamilyStatus::NotRequested);
        }
        for ok in [LimitStateFamily::UlsPersistent, LimitStateFamily::SlsCharacteristic] {
            assert!(diagnostics.outcome(ok).unwrap().is_success());
            assert!(!result.container.family(ok).is_empty());
        }
        // No accidental or seismic actions: successful and empty
        assert_eq!(
            diagnostics.outcome(LimitStateFamily::UlsSeismic),
            Some(&FamilyOutcome::Generated { combinations: 0, duplicates_discarded: 0 })
        );
        assert_eq!(result.container.status(LimitStateFamily::UlsSeismic), FamilyStatus::Empty);
    }

    // ------------------------------------------------------------------
    // Family rules
    // ------------------------------------------------------------------

    #[test]
    fn test_persistent_accompanying_alternatives() {
        // Snow and wind exclude each other; imposed load goes with both
        let catalog = freeze(vec![
            Action::permanent("G1"),
            Action::variable("Q1", "A"),
            Action::variable("S1", "snow").incompatible_with("W*"),
            Action::variable("W1", "wind"),
        ]);
        let combos = family(&catalog, &with_strategy(SenseStrategy::Shortcut), LimitStateFamily::UlsPersistent);
        let expressions: Vec<_> = combos.iter().map(|c| c.expression.as_str()).collect();
        assert_eq!(
            expressions,
            vec![
                "1.35*G1 + 1.5*Q1 + 0.75*S1",
                "1.35*G1 + 1.5*Q1 + 0.9*W1",
                "1.35*G1 + 1.05*Q1 + 1.5*S1",
                "1.35*G1 + 1.05*Q1 + 1.5*W1",
            ]
        );
    }

    #[test]
    fn test_persistent_one_full_variable_per_combination() {
        let catalog = freeze(vec![
            Action::permanent("G1"),
            Action::prestressing("P1"),
            Action::variable("Q1", "A"),
            Action::variable("Q2", "B"),
            Action::variable("W1", "wind"),
        ]);
        let profile = en1990();
        let combos = family(&catalog, &profile, LimitStateFamily::UlsPersistent);
        // 3 leads x 2 senses of G1; prestressing is 1.0 either way
        assert_eq!(combos.len(), 6);
        for combo in &combos {
            let lead = combo.leading.as_deref().unwrap();
            assert_eq!(combo.coefficient(lead), 1.5);
            let full = combo
                .action_ids()
                .filter(|id| catalog.get(id).unwrap().category() == ActionCategory::Variable)
                .filter(|id| combo.coefficient(id) == 1.5)
                .count();
            assert_eq!(full, 1, "{}", combo.expression);
        }
    }

    #[test]
    fn test_origin_group_shares_sense() {
        let catalog = freeze(vec![
            Action::permanent("G1").in_origin_group("deck"),
            Action::permanent("G2").in_origin_group("deck"),
            Action::permanent_non_constant("E1"),
            Action::variable("Q1", "A"),
        ]);
        let combos = family(&catalog, &en1990(), LimitStateFamily::UlsPersistent);
        assert_eq!(combos.len(), 4);
        for combo in &combos {
            assert_eq!(combo.coefficient("G1"), combo.coefficient("G2"));
        }
    }

    #[test]
    fn test_not_determinant_needs_trigger() {
        let catalog = freeze(vec![
            Action::permanent("G1"),
            Action::variable("Q1", "A"),
            Action::variable("T1", "temperature").not_determinant(),
        ]);
        let profile = with_strategy(SenseStrategy::Shortcut);

        let plain = GenerationContext::new(&catalog, &profile).run(&[LimitStateFamily::UlsPersistent]);
        let combos = plain.container.family(LimitStateFamily::UlsPersistent);
        assert_eq!(combos.len(), 1);
        assert_eq!(combos[0].expression, "1.35*G1 + 1.5*Q1 + 0.9*T1");

        let triggered = GenerationContext::new(&catalog, &profile)
            .with_trigger("T*")
            .run(&[LimitStateFamily::UlsPersistent]);
        let combos = triggered.container.family(LimitStateFamily::UlsPersistent);
        assert_eq!(combos.len(), 2);
        assert_eq!(combos[1].leading.as_deref(), Some("T1"));
    }

    #[test]
    fn test_accidental_rule_variants() {
        let catalog = freeze(vec![
            Action::permanent("G1"),
            Action::variable("Q1", "A"),
            Action::variable("S1", "snow"),
            Action::accidental("A1"),
        ]);
        let profile = with_strategy(SenseStrategy::Shortcut);
        let combos = family(&catalog, &profile, LimitStateFamily::UlsAccidental);
        let expressions: Vec<_> = combos.iter().map(|c| c.expression.as_str()).collect();
        assert_eq!(
            expressions,
            vec!["1*G1 + 0.5*Q1 + 1*A1", "1*G1 + 0.3*Q1 + 0.2*S1 + 1*A1"]
        );
        assert!(combos.iter().all(|c| c.leading.as_deref() == Some("A1")));

        let psi2 = profile.with_accidental_rule(AccidentalRule::Psi2All);
        let combos = family(&catalog, &psi2, LimitStateFamily::UlsAccidental);
        assert_eq!(combos.len(), 1);
        assert_eq!(combos[0].expression, "1*G1 + 0.3*Q1 + 1*A1");
    }

    #[test]
    fn test_accidentals_exclude_each_other_unless_dependent() {
        let catalog = freeze(vec![
            Action::permanent("G1"),
            Action::variable("Q1", "A"),
            Action::accidental("A1"),
            Action::accidental("A2"),
            Action::accidental("A3").depends_on("A1"),
        ]);
        let profile = with_strategy(SenseStrategy::Shortcut).with_accidental_rule(AccidentalRule::Psi2All);
        let combos = family(&catalog, &profile, LimitStateFamily::UlsAccidental);
        let expressions: Vec<_> = combos.iter().map(|c| c.expression.as_str()).collect();
        assert_eq!(
            expressions,
            vec![
                "1*G1 + 0.3*Q1 + 1*A1 + 1*A3",
                "1*G1 + 0.3*Q1 + 1*A2",
            ]
        );
    }

    #[test]
    fn test_persistent_includes_dependent_accidental() {
        let catalog = freeze(vec![
            Action::permanent("G1"),
            Action::variable("Q1", "A"),
            Action::variable("W1", "wind"),
            Action::accidental("A1").depends_on("W1"),
        ]);
        let combos = family(&catalog, &with_strategy(SenseStrategy::Shortcut), LimitStateFamily::UlsPersistent);
        assert_eq!(combos.len(), 2);
        for combo in &combos {
            assert!(combo.contains("W1"));
            assert_eq!(combo.coefficient("A1"), 1.0);
        }
    }

    #[test]
    fn test_seismic_uses_psi_e_with_psi2_fallback() {
        let catalog = freeze(vec![
            Action::permanent("G1"),
            Action::variable("Q1", "A"),
            Action::variable("Q2", "storage"),
            Action::seismic("E1"),
            Action::accidental("A1"),
        ]);
        let mut profile = with_strategy(SenseStrategy::Shortcut);
        profile.combination_factors = profile
            .combination_factors
            .clone()
            .with_group("storage", crate::factors::CombinationFactors::new(1.0, 0.9, 0.8).with_psi_e(0.4));

        let combos = family(&catalog, &profile, LimitStateFamily::UlsSeismic);
        assert_eq!(combos.len(), 1);
        assert_eq!(combos[0].expression, "1*G1 + 0.3*Q1 + 0.4*Q2 + 1*E1");
        assert!(!combos[0].contains("A1"));
    }

    #[test]
    fn test_frequent_and_characteristic() {
        let catalog = freeze(vec![
            Action::permanent("G1"),
            Action::variable("Q1", "A"),
            Action::variable("W1", "wind"),
        ]);
        let profile = en1990();

        let characteristic = family(&catalog, &profile, LimitStateFamily::SlsCharacteristic);
        let expressions: Vec<_> = characteristic.iter().map(|c| c.expression.as_str()).collect();
        assert_eq!(expressions, vec!["1*G1 + 1*Q1 + 0.6*W1", "1*G1 + 0.7*Q1 + 1*W1"]);

        // ψ2 of wind is 0, so W1 drops out of the Q1-leading combination
        let frequent = family(&catalog, &profile, LimitStateFamily::SlsFrequent);
        let expressions: Vec<_> = frequent.iter().map(|c| c.expression.as_str()).collect();
        assert_eq!(expressions, vec!["1*G1 + 0.5*Q1", "1*G1 + 0.3*Q1 + 0.2*W1"]);
    }

    #[test]
    fn test_frequent_zero_leading_is_dropped_but_kept() {
        let catalog = freeze(vec![Action::permanent("G1"), Action::variable("R1", "H")]);
        let combos = family(&catalog, &en1990(), LimitStateFamily::SlsFrequent);
        assert_eq!(combos.len(), 1);
        assert_eq!(combos[0].expression, "1*G1");
        assert!(combos[0].leading.is_none());
    }

    #[test]
    fn test_leading_pruned_by_missing_dependency_is_discarded() {
        let catalog = freeze(vec![
            Action::permanent("G1"),
            Action::variable("Q1", "A").incompatible_with("F1"),
            Action::variable("F1", "A").depends_on("Q1"),
        ]);
        let combos = family(&catalog, &with_strategy(SenseStrategy::Shortcut), LimitStateFamily::UlsPersistent);
        assert_eq!(combos.len(), 1);
        assert_eq!(combos[0].leading.as_deref(), Some("Q1"));
        assert!(!combos[0].contains("F1"));
    }

    #[test]
    fn test_zero_coefficient_does_not_block_dependent() {
        // R1 sits at γψ0 = 0 beside Q1 and must not keep A1 out
        let catalog = freeze(vec![
            Action::permanent("G1"),
            Action::variable("Q1", "A"),
            Action::variable("R1", "H"),
            Action::accidental("A1").depends_on("Q1").incompatible_with("R1"),
        ]);
        let profile = with_strategy(SenseStrategy::Shortcut);
        let combos = family(&catalog, &profile, LimitStateFamily::UlsPersistent);
        let expressions: Vec<_> = combos.iter().map(|c| c.expression.as_str()).collect();
        assert_eq!(
            expressions,
            vec!["1.35*G1 + 1.5*Q1 + 1*A1", "1.35*G1 + 1.05*Q1 + 1.5*R1"]
        );

        // Snow has ψ2 = 0 and must not keep A3 out of the accidental combination
        let catalog = freeze(vec![
            Action::permanent("G1"),
            Action::variable("S1", "snow"),
            Action::accidental("A1"),
            Action::accidental("A3").depends_on("A1").incompatible_with("S1"),
        ]);
        let psi2 = profile.with_accidental_rule(AccidentalRule::Psi2All);
        let combos = family(&catalog, &psi2, LimitStateFamily::UlsAccidental);
        assert_eq!(combos.len(), 1);
        assert_eq!(combos[0].expression, "1*G1 + 1*A1 + 1*A3");
    }

    #[test]
    fn test_zero_coefficient_does_not_split_accompanying() {
        let catalog = freeze(vec![
            Action::permanent("G1"),
            Action::variable("Q1", "A"),
            Action::variable("R1", "H").incompatible_with("S1"),
            Action::variable("S1", "snow"),
        ]);
        let combos = family(&catalog, &with_strategy(SenseStrategy::Shortcut), LimitStateFamily::UlsPersistent);
        let expressions: Vec<_> = combos.iter().map(|c| c.expression.as_str()).collect();
        assert_eq!(
            expressions,
            vec![
                "1.35*G1 + 1.5*Q1 + 0.75*S1",
                "1.35*G1 + 1.05*Q1 + 1.5*R1",
                "1.35*G1 + 1.05*Q1 + 1.5*S1",
            ]
        );
        let q1_leading = combos.iter().filter(|c| c.leading.as_deref() == Some("Q1")).count();
        assert_eq!(q1_leading, 1);
    }

    #[test]
    fn test_accidental_main_at_zero_psi2_is_not_dominated() {
        // Snow joins as main at ψ1; a second snow-free combination would be dominated
        let catalog = freeze(vec![
            Action::permanent("G1"),
            Action::variable("S1", "snow"),
            Action::accidental("A1"),
        ]);
        let combos = family(&catalog, &with_strategy(SenseStrategy::Shortcut), LimitStateFamily::UlsAccidental);
        assert_eq!(combos.len(), 1);
        assert_eq!(combos[0].expression, "1*G1 + 0.2*S1 + 1*A1");
    }

    #[test]
    fn test_no_leading_candidate_falls_back_to_permanent() {
        let catalog = freeze(vec![
            Action::permanent("G1"),
            Action::variable("T1", "temperature").not_determinant(),
        ]);
        let profile = with_strategy(SenseStrategy::Exhaustive);

        let persistent = family(&catalog, &profile, LimitStateFamily::UlsPersistent);
        let expressions: Vec<_> = persistent.iter().map(|c| c.expression.as_str()).collect();
        assert_eq!(expressions, vec!["1.35*G1", "1*G1"]);
        assert!(persistent.iter().all(|c| c.leading.is_none()));

        for sls in [LimitStateFamily::SlsCharacteristic, LimitStateFamily::SlsFrequent] {
            let combos = family(&catalog, &profile, sls);
            assert_eq!(combos.len(), 1, "{sls}");
            assert_eq!(combos[0].expression, "1*G1");
            assert!(combos[0].leading.is_none());
        }

        let triggered = GenerationContext::new(&catalog, &profile)
            .with_trigger("T*")
            .run(&[LimitStateFamily::SlsCharacteristic]);
        let combos = triggered.container.family(LimitStateFamily::SlsCharacteristic);
        assert_eq!(combos.len(), 1);
        assert_eq!(combos[0].expression, "1*G1 + 1*T1");
        assert_eq!(combos[0].leading.as_deref(), Some("T1"));
    }

    #[test]
    fn test_exhaustive_limit_fails_family_only() {
        let mut actions: Vec<Action> = (0..17).map(|i| Action::permanent(format!("G{i}"))).collect();
        actions.push(Action::variable("Q1", "A"));
        let catalog = freeze(actions);
        let profile = en1990();

        let result = GenerationContext::new(&catalog, &profile)
            .run(&[LimitStateFamily::UlsPersistent, LimitStateFamily::SlsCharacteristic]);
        assert!(matches!(
            result.diagnostics.error(LimitStateFamily::UlsPersistent),
            Some(ComboError::EnumerationLimit { groups: 17, .. })
        ));
        assert_eq!(result.container.family(LimitStateFamily::SlsCharacteristic).len(), 1);
    }

    #[test]
    fn test_empty_catalog_is_success() {
        let catalog = freeze(Vec::new());
        let result = GenerationContext::new(&catalog, preset("en1990").unwrap()).run(&LimitStateFamily::ALL);
        assert!(result.diagnostics.is_success());
        assert!(result.container.is_empty());
        for family in LimitStateFamily::ALL {
            assert_eq!(result.container.status(family), FamilyStatus::Empty);
        }
    }

    // ------------------------------------------------------------------
    // Run-level properties
    // ------------------------------------------------------------------

    fn building() -> FrozenCatalog {
        freeze(vec![
            Action::permanent("G1").in_origin_group("structure"),
            Action::permanent("G2").in_origin_group("structure"),
            Action::permanent_non_constant("E1"),
            Action::prestressing("P1"),
            Action::variable("Q1", "A").incompatible_with("Q.*"),
            Action::variable("Q2", "A").incompatible_with("Q.*"),
            Action::variable("S1", "snow").incompatible_with("W*"),
            Action::variable("W1", "wind"),
            Action::variable("W2", "wind").incompatible_with("W1"),
            Action::variable("F1", "E").depends_on("Q1").not_determinant(),
            Action::accidental("A1"),
            Action::accidental("A2").depends_on("W?"),
            Action::seismic("AE1"),
            Action::variable("T1", "temperature").incompatible_with("Crane*"),
        ])
    }

    #[test]
    fn test_run_is_idempotent_and_parallel_matches() {
        let catalog = building();
        let profile = en1990();
        let context = GenerationContext::new(&catalog, &profile);

        let first = context.run(&LimitStateFamily::ALL);
        let second = context.run(&LimitStateFamily::ALL);
        let parallel = context.run_parallel(&LimitStateFamily::ALL);

        assert_eq!(first.container, second.container);
        assert_eq!(first.container, parallel.container);
        assert_eq!(first.diagnostics.outcomes, parallel.diagnostics.outcomes);
        assert_ne!(first.diagnostics.run_id, second.diagnostics.run_id);
        assert_eq!(first.diagnostics.warnings.len(), 1);
    }

    #[test]
    fn test_invariants_hold_on_building() {
        let catalog = building();
        let profile = en1990();
        let result = GenerationContext::new(&catalog, &profile).run(&LimitStateFamily::ALL);
        assert!(result.diagnostics.is_success(), "{:?}", result.diagnostics);

        for family in LimitStateFamily::ALL {
            let combos = result.container.family(family);
            let mut keys: Vec<_> = combos.iter().map(Combination::canonical_key).collect();
            keys.sort();
            keys.dedup();
            assert_eq!(keys.len(), combos.len(), "duplicates in {}", family);
        }

        for combo in result.container.iter() {
            let ids: Vec<&str> = combo.action_ids().collect();
            for (n, a) in ids.iter().enumerate() {
                for b in &ids[n + 1..] {
                    assert!(!catalog.are_incompatible(a, b), "{}: {}", combo.label, combo.expression);
                }
            }
            assert!(combo.terms.iter().all(|t| t.coefficient != 0.0));
            assert_eq!(combo.coefficient("G1"), combo.coefficient("G2"));
            if combo.contains("F1") {
                assert!(combo.contains("Q1"));
            }
            if combo.contains("A2") {
                assert!(combo.contains("W1") || combo.contains("W2"));
            }
        }
    }

    #[test]
    fn test_duplicate_family_request_runs_once() {
        let catalog = freeze(vec![Action::permanent("G1")]);
        let profile = en1990();
        let result = GenerationContext::new(&catalog, &profile)
            .run(&[LimitStateFamily::SlsCharacteristic, LimitStateFamily::SlsCharacteristic]);
        assert_eq!(result.container.len(), 1);
        assert_eq!(result.diagnostics.outcomes.len(), 1);
    }

    #[test]
    fn test_duplicates_are_counted() {
        // ψ1 = ψ2, so choosing either variable as main gives the same combination
        let catalog = freeze(vec![
            Action::permanent("G1"),
            Action::variable("Q1", "crane"),
            Action::variable("Q2", "crane"),
            Action::accidental("A1"),
        ]);
        let mut profile = with_strategy(SenseStrategy::Shortcut);
        profile.combination_factors = profile
            .combination_factors
            .clone()
            .with_group("crane", crate::factors::CombinationFactors::new(1.0, 0.9, 0.9));
        let result = GenerationContext::new(&catalog, &profile).run(&[LimitStateFamily::UlsAccidental]);
        assert_eq!(
            result.diagnostics.outcome(LimitStateFamily::UlsAccidental),
            Some(&FamilyOutcome::Generated { combinations: 1, duplicates_discarded: 1 })
        );
        assert_eq!(
            result.container.family(LimitStateFamily::UlsAccidental)[0].expression,
            "1*G1 + 0.9*Q1 + 0.9*Q2 + 1*A1"
        );

        let uniform = with_strategy(SenseStrategy::Uniform);
        let catalog = freeze(vec![Action::prestressing("P1"), Action::variable("Q1", "A")]);
        let result = GenerationContext::new(&catalog, &uniform).run(&[LimitStateFamily::UlsPersistent]);
        // Prestressing is 1.0 in both senses
        assert_eq!(
            result.diagnostics.outcome(LimitStateFamily::UlsPersistent),
            Some(&FamilyOutcome::Generated { combinations: 1, duplicates_discarded: 1 })
        );
    }

    #[test]
    fn test_superposition_over_family() {
        let catalog = freeze(vec![
            Action::permanent("G1"),
            Action::variable("W1", "wind"),
        ]);
        let profile = en1990();
        let result = GenerationContext::new(&catalog, &profile).run(&[LimitStateFamily::UlsPersistent]);

        // Uplift: wind suction on a light roof
        let effects: HashMap<String, f64> =
            [("G1".to_string(), 10.0), ("W1".to_string(), -20.0)].into_iter().collect();
        let governing = result
            .container
            .governing_min_max(LimitStateFamily::UlsPersistent, &effects)
            .unwrap();
        assert_eq!(governing.min_value, -20.0);
        assert_eq!(result.container.get(&governing.min_label).unwrap().coefficient("G1"), 1.0);
    }
}
