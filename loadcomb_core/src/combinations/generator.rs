//! Per-family combination generation.
//!
//! Every family follows the same skeleton:
//!
//! 1. enumerate sense outcomes for the origin groups (ULS only),
//! 2. pick each eligible leading action in catalog order,
//! 3. split the variables compatible with it into maximal compatible subsets,
//! 4. build one candidate per (outcome, subset) and finalize it.
//!
//! Finalizing drops zero terms, prunes actions whose dependencies are not
//! present (to a fixpoint) and re-checks incompatibility. Drafts come out in
//! generation order; de-duplication and labeling happen in the container.

use std::collections::BTreeMap;

use crate::actions::{Action, ActionCategory, FrozenCatalog, Pattern};
use crate::engine::GenerationContext;
use crate::errors::ComboResult;
use crate::factors::{AccidentalRule, CodeProfile, CombinationFactors, Sense};

use super::combination::{round_coefficient, CombinationDraft};
use super::senses::{self, OriginGroup};
use super::subsets::maximal_compatible_subsets;
use super::LimitStateFamily;

/// Candidate terms keyed by catalog index (so iteration is catalog order)
type Candidate = BTreeMap<usize, f64>;

/// Generate the drafts of one family.
///
/// Configuration errors are tagged with the family.
pub(crate) fn generate(
    context: &GenerationContext<'_>,
    family: LimitStateFamily,
) -> ComboResult<Vec<CombinationDraft>> {
    FamilyGenerator::new(context, family)
        .run()
        .map_err(|e| e.in_family(family))
}

/// γ and ψ lookups for one family. Copied into the coefficient closures so
/// they do not borrow the generator.
#[derive(Clone, Copy)]
struct Factors<'a> {
    catalog: &'a FrozenCatalog,
    profile: &'a CodeProfile,
    family: LimitStateFamily,
}

impl<'a> Factors<'a> {
    fn gamma(&self, index: usize, sense: Sense) -> ComboResult<f64> {
        self.profile.safety_factors.factor(
            self.catalog.action(index),
            self.family.limit_state(),
            self.family.situation(),
            sense,
        )
    }

    fn psi(&self, index: usize) -> ComboResult<CombinationFactors> {
        self.profile.combination_factors.factors(self.catalog.action(index))
    }
}

struct FamilyGenerator<'a> {
    catalog: &'a FrozenCatalog,
    profile: &'a CodeProfile,
    factors: Factors<'a>,
    triggers: &'a [Pattern],
    family: LimitStateFamily,
    groups: Vec<OriginGroup<'a>>,
    variables: Vec<usize>,
    accidentals: Vec<usize>,
    seismics: Vec<usize>,
    drafts: Vec<CombinationDraft>,
}

impl<'a> FamilyGenerator<'a> {
    fn new(context: &'a GenerationContext<'a>, family: LimitStateFamily) -> Self {
        let catalog = context.catalog;
        let of_category = |category: ActionCategory| -> Vec<usize> {
            catalog
                .actions()
                .iter()
                .enumerate()
                .filter(|(_, a)| a.category() == category)
                .map(|(i, _)| i)
                .collect()
        };

        FamilyGenerator {
            catalog,
            profile: context.profile,
            factors: Factors {
                catalog,
                profile: context.profile,
                family,
            },
            triggers: &context.triggers,
            family,
            groups: senses::origin_groups(catalog),
            variables: of_category(ActionCategory::Variable),
            accidentals: of_category(ActionCategory::Accidental),
            seismics: of_category(ActionCategory::Seismic),
            drafts: Vec::new(),
        }
    }

    fn run(mut self) -> ComboResult<Vec<CombinationDraft>> {
        match self.family {
            LimitStateFamily::UlsPersistent => self.persistent()?,
            LimitStateFamily::UlsAccidental => self.accidental()?,
            LimitStateFamily::UlsSeismic => self.seismic()?,
            LimitStateFamily::SlsCharacteristic => self.characteristic()?,
            LimitStateFamily::SlsFrequent => self.frequent()?,
            LimitStateFamily::SlsQuasiPermanent => self.quasi_permanent()?,
        }
        Ok(self.drafts)
    }

    // ------------------------------------------------------------------
    // Families
    // ------------------------------------------------------------------

    /// EN 1990 (6.10): Σγ_G G + γ_Q,1 Q_1 + Σγ_Q ψ_0 Q_i
    fn persistent(&mut self) -> ComboResult<()> {
        let outcomes = self.sense_outcomes()?;
        let extras = self.dependent(&self.accidentals, None);
        let leads = self.leading_candidates(&self.variables);

        if leads.is_empty() {
            for outcome in &outcomes {
                let mut candidate = self.permanent_terms(outcome)?;
                self.add_dependent(&mut candidate, &extras)?;
                self.finalize(candidate, None);
            }
            return Ok(());
        }

        for lead in leads {
            let lead_gamma = self.gamma(lead, Sense::Neutral)?;
            let factors = self.factors;
            let accompanying = move |m: usize| -> ComboResult<f64> {
                Ok(factors.gamma(m, Sense::Neutral)? * factors.psi(m)?.psi0)
            };
            let subsets = self.accompanying_subsets(lead, &[], accompanying)?;
            for outcome in &outcomes {
                let permanent = self.permanent_terms(outcome)?;
                for subset in &subsets {
                    let mut candidate = permanent.clone();
                    candidate.insert(lead, lead_gamma);
                    for &m in subset {
                        candidate.insert(m, accompanying(m)?);
                    }
                    self.add_dependent(&mut candidate, &extras)?;
                    self.finalize(candidate, Some(lead));
                }
            }
        }
        Ok(())
    }

    /// EN 1990 (6.11b): ΣG + A_d + (ψ_1,1 or ψ_2,1) Q_1 + Σψ_2 Q_i
    ///
    /// Under [`AccidentalRule::Psi1MainPsi2Others`] each eligible variable
    /// takes the main (ψ1) slot in turn, accompanied by the maximal
    /// compatible sets of the others at ψ2. A set at ψ2 alone is emitted only
    /// when no main variable could join it.
    fn accidental(&mut self) -> ComboResult<()> {
        let outcomes = self.sense_outcomes()?;
        let rule = self.profile.accidental_rule;
        let factors = self.factors;
        let frequent = move |m: usize| -> ComboResult<f64> {
            Ok(factors.gamma(m, Sense::Neutral)? * factors.psi(m)?.psi1)
        };
        let quasi_permanent = move |m: usize| -> ComboResult<f64> {
            Ok(factors.gamma(m, Sense::Neutral)? * factors.psi(m)?.psi2)
        };

        for lead in self.leading_candidates(&self.accidentals) {
            let extras = self.dependent(&self.accidentals, Some(lead));

            // (main, accompanying sets) in emission order
            let mut choices: Vec<(Option<usize>, Vec<Vec<usize>>)> = Vec::new();
            let mains = match rule {
                AccidentalRule::Psi2All => Vec::new(),
                AccidentalRule::Psi1MainPsi2Others => {
                    let eligible = self
                        .variables
                        .iter()
                        .copied()
                        .filter(|&m| self.compatible(lead, m) && self.is_leading_eligible(m));
                    self.nonzero(eligible, frequent)?
                }
            };
            for &main in &mains {
                let subsets = self.accompanying_subsets(lead, &[main], quasi_permanent)?;
                choices.push((Some(main), subsets));
            }
            let unled: Vec<Vec<usize>> = self
                .accompanying_subsets(lead, &[], quasi_permanent)?
                .into_iter()
                .filter(|subset| {
                    !mains
                        .iter()
                        .any(|&main| subset.iter().all(|&m| m == main || self.compatible(main, m)))
                })
                .collect();
            choices.push((None, unled));

            for outcome in &outcomes {
                let permanent = self.permanent_terms(outcome)?;
                for (main, subsets) in &choices {
                    for subset in subsets {
                        let mut candidate = permanent.clone();
                        candidate.insert(lead, 1.0);
                        if let Some(main) = *main {
                            candidate.insert(main, frequent(main)?);
                        }
                        for &m in subset {
                            candidate.insert(m, quasi_permanent(m)?);
                        }
                        self.add_dependent(&mut candidate, &extras)?;
                        self.finalize(candidate, Some(lead));
                    }
                }
            }
        }
        Ok(())
    }

    /// EN 1990 (6.12b): ΣG + A_Ed + Σψ_E Q_i
    fn seismic(&mut self) -> ComboResult<()> {
        let outcomes = self.sense_outcomes()?;
        let factors = self.factors;
        let accompanying = move |m: usize| -> ComboResult<f64> {
            Ok(factors.gamma(m, Sense::Neutral)? * factors.psi(m)?.seismic())
        };

        for lead in self.leading_candidates(&self.seismics) {
            let extras = self.dependent(&self.seismics, Some(lead));
            let subsets = self.accompanying_subsets(lead, &[], accompanying)?;
            for outcome in &outcomes {
                let permanent = self.permanent_terms(outcome)?;
                for subset in &subsets {
                    let mut candidate = permanent.clone();
                    candidate.insert(lead, 1.0);
                    for &m in subset {
                        candidate.insert(m, accompanying(m)?);
                    }
                    self.add_dependent(&mut candidate, &extras)?;
                    self.finalize(candidate, Some(lead));
                }
            }
        }
        Ok(())
    }

    /// EN 1990 (6.14b): ΣG + Q_1 + Σψ_0 Q_i
    fn characteristic(&mut self) -> ComboResult<()> {
        self.serviceability_with_leading(|_| Ok(1.0), |psi| psi.psi0)
    }

    /// EN 1990 (6.15b): ΣG + ψ_1,1 Q_1 + Σψ_2 Q_i
    fn frequent(&mut self) -> ComboResult<()> {
        let factors = self.factors;
        self.serviceability_with_leading(move |lead| Ok(factors.psi(lead)?.psi1), |psi| psi.psi2)
    }

    /// EN 1990 (6.16b): ΣG + Σψ_2 Q_i
    fn quasi_permanent(&mut self) -> ComboResult<()> {
        let permanent = self.serviceability_permanent_terms();
        let factors = self.factors;
        let present = self.nonzero(self.variables.iter().copied(), move |m| Ok(factors.psi(m)?.psi2))?;
        for subset in self.compatible_subsets(&present) {
            let mut candidate = permanent.clone();
            for &m in &subset {
                candidate.insert(m, self.psi(m)?.psi2);
            }
            self.finalize(candidate, None);
        }
        Ok(())
    }

    /// Shared shape of SLS-C and SLS-F: γ = 1 throughout, one leading variable.
    fn serviceability_with_leading(
        &mut self,
        leading_factor: impl Fn(usize) -> ComboResult<f64>,
        accompanying_factor: impl Fn(&CombinationFactors) -> f64,
    ) -> ComboResult<()> {
        let permanent = self.serviceability_permanent_terms();
        let leads = self.leading_candidates(&self.variables);

        if leads.is_empty() {
            self.finalize(permanent, None);
            return Ok(());
        }

        let factors = self.factors;
        let accompanying_factor = &accompanying_factor;
        let accompanying = move |m: usize| -> ComboResult<f64> {
            Ok(accompanying_factor(&factors.psi(m)?))
        };
        for lead in leads {
            let lead_value = leading_factor(lead)?;
            for subset in self.accompanying_subsets(lead, &[], accompanying)? {
                let mut candidate = permanent.clone();
                candidate.insert(lead, lead_value);
                for &m in &subset {
                    candidate.insert(m, accompanying(m)?);
                }
                self.finalize(candidate, Some(lead));
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Building blocks
    // ------------------------------------------------------------------

    fn action(&self, index: usize) -> &'a Action {
        self.catalog.action(index)
    }

    fn gamma(&self, index: usize, sense: Sense) -> ComboResult<f64> {
        self.factors.gamma(index, sense)
    }

    fn psi(&self, index: usize) -> ComboResult<CombinationFactors> {
        self.factors.psi(index)
    }

    fn sense_outcomes(&self) -> ComboResult<Vec<Vec<Sense>>> {
        senses::enumerate(
            &self.groups,
            &self.profile.safety_factors,
            self.profile.sense_strategy.for_family(self.family),
            self.family,
        )
    }

    /// Permanent-like terms at γ for one sense outcome
    fn permanent_terms(&self, outcome: &[Sense]) -> ComboResult<Candidate> {
        let mut terms = Candidate::new();
        for (group, &sense) in self.groups.iter().zip(outcome) {
            for &member in &group.members {
                terms.insert(member, self.gamma(member, sense)?);
            }
        }
        Ok(terms)
    }

    /// Permanent-like terms at 1.0 (SLS)
    fn serviceability_permanent_terms(&self) -> Candidate {
        self.groups
            .iter()
            .flat_map(|g| g.members.iter().map(|&m| (m, 1.0)))
            .collect()
    }

    /// Whether an action may take the leading slot: determinant, or matched
    /// by one of the context's trigger patterns.
    fn is_leading_eligible(&self, index: usize) -> bool {
        let action = self.action(index);
        !action.not_determinant || self.triggers.iter().any(|p| p.matches(&action.id))
    }

    fn leading_candidates(&self, pool: &[usize]) -> Vec<usize> {
        pool.iter()
            .copied()
            .filter(|&i| self.is_leading_eligible(i))
            .collect()
    }

    fn compatible(&self, i: usize, j: usize) -> bool {
        !self.catalog.graph().are_incompatible(i, j)
    }

    fn compatible_subsets(&self, pool: &[usize]) -> Vec<Vec<usize>> {
        maximal_compatible_subsets(pool, |i, j| self.compatible(i, j))
    }

    /// Members of `pool` whose rounded coefficient is nonzero. A member at
    /// zero never appears in a combination, so it must not split the
    /// compatible subsets either.
    fn nonzero(
        &self,
        pool: impl IntoIterator<Item = usize>,
        coefficient: impl Fn(usize) -> ComboResult<f64>,
    ) -> ComboResult<Vec<usize>> {
        let mut present = Vec::new();
        for m in pool {
            if round_coefficient(coefficient(m)?) != 0.0 {
                present.push(m);
            }
        }
        Ok(present)
    }

    /// Maximal compatible subsets of the variables that can accompany `lead`
    /// and every action of `with`, skipping those at zero coefficient.
    fn accompanying_subsets(
        &self,
        lead: usize,
        with: &[usize],
        coefficient: impl Fn(usize) -> ComboResult<f64>,
    ) -> ComboResult<Vec<Vec<usize>>> {
        let others = self.variables.iter().copied().filter(|&m| {
            m != lead
                && !with.contains(&m)
                && self.compatible(lead, m)
                && with.iter().all(|&w| self.compatible(w, m))
        });
        let present = self.nonzero(others, coefficient)?;
        Ok(self.compatible_subsets(&present))
    }

    /// Actions of the pool (other than the lead) that only join when their
    /// dependencies are present.
    fn dependent(&self, pool: &[usize], lead: Option<usize>) -> Vec<usize> {
        pool.iter()
            .copied()
            .filter(|&i| Some(i) != lead && self.catalog.graph().has_dependencies(i))
            .collect()
    }

    /// Add dependent actions whose requirements are met and which conflict
    /// with nothing already present; repeat until nothing changes.
    fn add_dependent(&self, candidate: &mut Candidate, extras: &[usize]) -> ComboResult<()> {
        let graph = self.catalog.graph();
        drop_zero_terms(candidate);
        loop {
            let mut added = false;
            for &extra in extras {
                if candidate.contains_key(&extra) {
                    continue;
                }
                let fits = candidate.keys().all(|&k| self.compatible(extra, k))
                    && graph.is_satisfied(extra, |j| candidate.contains_key(&j));
                if fits {
                    let gamma = self.gamma(extra, Sense::Neutral)?;
                    candidate.insert(extra, gamma);
                    added = true;
                }
            }
            if !added {
                return Ok(());
            }
        }
    }

    /// Round, prune and re-check a candidate; keep it as a draft if anything is left.
    fn finalize(&mut self, mut candidate: Candidate, lead: Option<usize>) {
        drop_zero_terms(&mut candidate);

        let lead = lead.filter(|l| candidate.contains_key(l));
        self.prune_dependencies(&mut candidate);

        if let Some(l) = lead {
            if !candidate.contains_key(&l) {
                tracing::debug!(
                    family = %self.family,
                    leading = %self.action(l).id,
                    "candidate discarded: leading action lacks its dependencies"
                );
                return;
            }
        }

        let indices: Vec<usize> = candidate.keys().copied().collect();
        for (n, &i) in indices.iter().enumerate() {
            if let Some(&j) = indices[n + 1..].iter().find(|&&j| !self.compatible(i, j)) {
                tracing::warn!(
                    family = %self.family,
                    a = %self.action(i).id,
                    b = %self.action(j).id,
                    "candidate discarded: incompatible actions"
                );
                return;
            }
        }

        if candidate.is_empty() {
            return;
        }

        let mut draft = CombinationDraft::new(self.family);
        for (index, value) in candidate {
            draft.push(self.action(index).id.clone(), value);
        }
        if let Some(l) = lead {
            draft.set_leading(self.action(l).id.clone());
        }
        self.drafts.push(draft);
    }

    /// Remove actions with unmet dependencies until none remain.
    fn prune_dependencies(&self, candidate: &mut Candidate) {
        let graph = self.catalog.graph();
        loop {
            let unmet: Vec<usize> = candidate
                .keys()
                .copied()
                .filter(|&i| !graph.is_satisfied(i, |j| candidate.contains_key(&j)))
                .collect();
            if unmet.is_empty() {
                return;
            }
            for i in unmet {
                tracing::debug!(
                    family = %self.family,
                    action = %self.action(i).id,
                    "pruned: dependency not present"
                );
                candidate.remove(&i);
            }
        }
    }
}

/// Round every coefficient and drop the ones that became zero.
fn drop_zero_terms(candidate: &mut Candidate) {
    for value in candidate.values_mut() {
        *value = round_coefficient(*value);
    }
    candidate.retain(|_, value| *value != 0.0);
}
