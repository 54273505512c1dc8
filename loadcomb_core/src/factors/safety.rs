//! Partial safety factors (γ).
//!
//! Entries are keyed by (category, limit state, situation). Permanent-like
//! categories carry both an unfavorable (γ_sup) and a favorable (γ_inf)
//! value; other categories only use the unfavorable value.
//!
//! # Example
//! ```
//! use loadcomb_core::actions::{Action, ActionCategory};
//! use loadcomb_core::factors::{LimitState, SafetyFactorEntry, SafetyFactorPolicy, Sense, Situation};
//!
//! let policy = SafetyFactorPolicy::new(vec![
//!     SafetyFactorEntry::pair(ActionCategory::Permanent, LimitState::Ultimate,
//!         Situation::PersistentTransient, 1.35, 1.00),
//! ]);
//!
//! let g1 = Action::permanent("G1");
//! let gamma = policy
//!     .factor(&g1, LimitState::Ultimate, Situation::PersistentTransient, Sense::Favorable)
//!     .unwrap();
//! assert_eq!(gamma, 1.0);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{LimitState, Sense, Situation};
use crate::actions::{Action, ActionCategory};
use crate::errors::{ComboError, ComboResult, ConfigTable};

/// One row of the partial factor table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyFactorEntry {
    pub category: ActionCategory,
    pub limit_state: LimitState,
    pub situation: Situation,
    /// γ when the action is unfavorable (also used for sense-less categories)
    pub unfavorable: f64,
    /// γ when a permanent-like action is favorable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favorable: Option<f64>,
}

impl SafetyFactorEntry {
    /// Entry for a category without senses
    pub fn single(category: ActionCategory, limit_state: LimitState, situation: Situation, gamma: f64) -> Self {
        SafetyFactorEntry {
            category,
            limit_state,
            situation,
            unfavorable: gamma,
            favorable: None,
        }
    }

    /// Entry with unfavorable and favorable values
    pub fn pair(
        category: ActionCategory,
        limit_state: LimitState,
        situation: Situation,
        unfavorable: f64,
        favorable: f64,
    ) -> Self {
        SafetyFactorEntry {
            category,
            limit_state,
            situation,
            unfavorable,
            favorable: Some(favorable),
        }
    }
}

/// Resolves γ for an action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SafetyFactorPolicy {
    pub entries: Vec<SafetyFactorEntry>,

    /// Origin groups that are always taken in one sense
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub pinned_senses: BTreeMap<String, Sense>,
}

impl SafetyFactorPolicy {
    /// Create a policy from table entries
    pub fn new(entries: Vec<SafetyFactorEntry>) -> Self {
        SafetyFactorPolicy {
            entries,
            pinned_senses: BTreeMap::new(),
        }
    }

    /// Pin an origin group to a single sense (builder pattern)
    pub fn with_pinned_sense(mut self, origin_group: impl Into<String>, sense: Sense) -> Self {
        self.pinned_senses.insert(origin_group.into(), sense);
        self
    }

    fn entry(&self, category: ActionCategory, limit_state: LimitState, situation: Situation) -> Option<&SafetyFactorEntry> {
        self.entries
            .iter()
            .find(|e| e.category == category && e.limit_state == limit_state && e.situation == situation)
    }

    /// Partial factor for an action.
    ///
    /// # Errors
    ///
    /// - `ComboError::Configuration` when the table has no entry for the
    ///   (category, limit state, situation) key, or no favorable value for a
    ///   favorable permanent-like lookup.
    /// - `ComboError::InvalidInput` when a permanent-like action is looked up
    ///   with [`Sense::Neutral`].
    pub fn factor(
        &self,
        action: &Action,
        limit_state: LimitState,
        situation: Situation,
        sense: Sense,
    ) -> ComboResult<f64> {
        let category = action.category();
        let key = format!("({}, {}, {})", category, limit_state, situation);
        let entry = self
            .entry(category, limit_state, situation)
            .ok_or_else(|| ComboError::configuration(ConfigTable::SafetyFactors, key.clone(), &action.id))?;

        if !category.is_permanent_like() {
            return Ok(entry.unfavorable);
        }

        match sense {
            Sense::Unfavorable => Ok(entry.unfavorable),
            Sense::Favorable => entry.favorable.ok_or_else(|| {
                ComboError::configuration(
                    ConfigTable::SafetyFactors,
                    format!("{} favorable", key),
                    &action.id,
                )
            }),
            Sense::Neutral => Err(ComboError::invalid_input(
                "sense",
                sense.to_string(),
                format!("{} '{}' needs a favorable or unfavorable sense", category.description(), action.id),
            )),
        }
    }

    /// Senses to enumerate for an origin group: the pinned sense, or both.
    pub fn origin_group_senses(&self, origin_group: &str) -> Vec<Sense> {
        match self.pinned_senses.get(origin_group) {
            Some(sense) => vec![*sense],
            None => vec![Sense::Unfavorable, Sense::Favorable],
        }
    }

    /// Whether a group has a pinned sense
    pub fn is_pinned(&self, origin_group: &str) -> bool {
        self.pinned_senses.contains_key(origin_group)
    }

    /// Check that all factors are non-negative and pinned senses are directional.
    pub fn validate(&self) -> ComboResult<()> {
        for entry in &self.entries {
            let values = std::iter::once(entry.unfavorable).chain(entry.favorable);
            for gamma in values {
                if !(gamma >= 0.0 && gamma.is_finite()) {
                    return Err(ComboError::invalid_input(
                        format!("gamma ({}, {}, {})", entry.category, entry.limit_state, entry.situation),
                        gamma.to_string(),
                        "Partial factors must be finite and non-negative",
                    ));
                }
            }
        }
        if let Some((group, _)) = self.pinned_senses.iter().find(|(_, s)| **s == Sense::Neutral) {
            return Err(ComboError::invalid_input(
                format!("pinned_senses.{}", group),
                "neutral",
                "An origin group can only be pinned favorable or unfavorable",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> SafetyFactorPolicy {
        SafetyFactorPolicy::new(vec![
            SafetyFactorEntry::pair(
                ActionCategory::Permanent,
                LimitState::Ultimate,
                Situation::PersistentTransient,
                1.35,
                1.0,
            ),
            SafetyFactorEntry::single(
                ActionCategory::Variable,
                LimitState::Ultimate,
                Situation::PersistentTransient,
                1.5,
            ),
            SafetyFactorEntry::single(
                ActionCategory::Prestressing,
                LimitState::Ultimate,
                Situation::PersistentTransient,
                1.0,
            ),
        ])
    }

    #[test]
    fn test_permanent_senses() {
        let g = Action::permanent("G1");
        let p = policy();
        let ls = LimitState::Ultimate;
        let sit = Situation::PersistentTransient;
        assert_eq!(p.factor(&g, ls, sit, Sense::Unfavorable).unwrap(), 1.35);
        assert_eq!(p.factor(&g, ls, sit, Sense::Favorable).unwrap(), 1.0);
    }

    #[test]
    fn test_variable_ignores_sense() {
        let q = Action::variable("Q1", "A");
        let p = policy();
        for sense in [Sense::Neutral, Sense::Favorable, Sense::Unfavorable] {
            assert_eq!(
                p.factor(&q, LimitState::Ultimate, Situation::PersistentTransient, sense).unwrap(),
                1.5
            );
        }
    }

    #[test]
    fn test_missing_entry_names_key() {
        let g = Action::permanent("G1");
        let err = policy()
            .factor(&g, LimitState::Ultimate, Situation::Accidental, Sense::Unfavorable)
            .unwrap_err();
        match err {
            ComboError::Configuration { table, key, action_id, family } => {
                assert_eq!(table, ConfigTable::SafetyFactors);
                assert_eq!(key, "(Permanent, Ultimate, Accidental)");
                assert_eq!(action_id, "G1");
                assert!(family.is_none());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_favorable_value() {
        let p = Action::prestressing("P1");
        let err = policy()
            .factor(&p, LimitState::Ultimate, Situation::PersistentTransient, Sense::Favorable)
            .unwrap_err();
        assert_eq!(err.error_code(), "CONFIGURATION");
        assert!(err.to_string().contains("favorable"));
    }

    #[test]
    fn test_neutral_sense_rejected_for_permanent() {
        let g = Action::permanent("G1");
        let err = policy()
            .factor(&g, LimitState::Ultimate, Situation::PersistentTransient, Sense::Neutral)
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_pinned_senses() {
        let p = policy().with_pinned_sense("ballast", Sense::Favorable);
        assert_eq!(p.origin_group_senses("ballast"), vec![Sense::Favorable]);
        assert_eq!(
            p.origin_group_senses("deck"),
            vec![Sense::Unfavorable, Sense::Favorable]
        );
        assert!(p.is_pinned("ballast"));
    }

    #[test]
    fn test_validate() {
        assert!(policy().validate().is_ok());

        let mut bad = policy();
        bad.entries[0].favorable = Some(-0.1);
        assert!(bad.validate().is_err());

        let neutral = policy().with_pinned_sense("g", Sense::Neutral);
        assert!(neutral.validate().is_err());
    }
}
