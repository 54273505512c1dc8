//! Combination records.
//!
//! The generator produces [`CombinationDraft`]s; the container turns accepted
//! drafts into labeled, immutable [`Combination`]s.
//!
//! # Example
//! ```
//! use std::collections::HashMap;
//! use loadcomb_core::combinations::{CombinationContainer, CombinationDraft, LimitStateFamily};
//!
//! let mut draft = CombinationDraft::new(LimitStateFamily::UlsPersistent);
//! draft.push("G1", 1.35);
//! draft.push("Q1", 1.5);
//! draft.set_leading("Q1");
//!
//! let mut container = CombinationContainer::new();
//! let combo = container.insert(draft).unwrap();
//! assert_eq!(combo.label, "ULS-PT-001");
//! assert_eq!(combo.expression, "1.35*G1 + 1.5*Q1");
//!
//! // Moment at midspan per unit action, superposed
//! let effects: HashMap<String, f64> =
//!     [("G1".to_string(), 10.0), ("Q1".to_string(), 4.0)].into_iter().collect();
//! assert!((combo.apply(&effects) - 19.5).abs() < 1e-9);
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::LimitStateFamily;

/// Coefficients are compared and stored at this resolution.
pub const COEFFICIENT_RESOLUTION: f64 = 1e-9;

const SCALE: f64 = 1e9;

/// Round a coefficient to [`COEFFICIENT_RESOLUTION`].
///
/// `1.5 * 0.7` is `1.0499999999999998` in binary floating point; rounding
/// makes it compare equal to `1.05`.
pub fn round_coefficient(value: f64) -> f64 {
    (value * SCALE).round() / SCALE
}

fn quantize(value: f64) -> i64 {
    (value * SCALE).round() as i64
}

/// One action with its coefficient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    pub action_id: String,
    pub coefficient: f64,
}

/// Identity of a combination for de-duplication: (id, quantized coefficient)
/// pairs sorted by id, zeros dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalKey(Vec<(String, i64)>);

impl CanonicalKey {
    fn from_terms(terms: &[Term]) -> Self {
        let mut pairs: Vec<(String, i64)> = terms
            .iter()
            .map(|t| (t.action_id.clone(), quantize(t.coefficient)))
            .filter(|(_, q)| *q != 0)
            .collect();
        pairs.sort();
        CanonicalKey(pairs)
    }

    /// Whether the key has no terms
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A combination before labeling.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinationDraft {
    pub family: LimitStateFamily,
    /// Terms in catalog order
    pub terms: Vec<Term>,
    /// The action at full representative value, if the family has one
    pub leading: Option<String>,
}

impl CombinationDraft {
    /// Create an empty draft
    pub fn new(family: LimitStateFamily) -> Self {
        CombinationDraft {
            family,
            terms: Vec::new(),
            leading: None,
        }
    }

    /// Append a term. The coefficient is rounded; zero terms are skipped.
    pub fn push(&mut self, action_id: impl Into<String>, coefficient: f64) {
        let coefficient = round_coefficient(coefficient);
        if coefficient != 0.0 {
            self.terms.push(Term {
                action_id: action_id.into(),
                coefficient,
            });
        }
    }

    /// Mark the leading action
    pub fn set_leading(&mut self, action_id: impl Into<String>) {
        self.leading = Some(action_id.into());
    }

    pub fn canonical_key(&self) -> CanonicalKey {
        CanonicalKey::from_terms(&self.terms)
    }

    /// Coefficient of an action (0.0 if absent)
    pub fn coefficient(&self, action_id: &str) -> f64 {
        coefficient_of(&self.terms, action_id)
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// A labeled, immutable load combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combination {
    /// Family-scoped label (e.g. "ULS-PT-003")
    pub label: String,
    pub family: LimitStateFamily,
    /// Nonzero terms in catalog order
    pub terms: Vec<Term>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leading: Option<String>,
    /// Human-readable form, e.g. "1.35*G1 + 1.5*Q1 + 1.05*Q2"
    pub expression: String,
}

impl Combination {
    pub(crate) fn from_draft(label: String, draft: CombinationDraft) -> Self {
        let expression = expression(&draft.terms);
        Combination {
            label,
            family: draft.family,
            terms: draft.terms,
            leading: draft.leading,
            expression,
        }
    }

    /// Coefficient of an action (0.0 if absent)
    pub fn coefficient(&self, action_id: &str) -> f64 {
        coefficient_of(&self.terms, action_id)
    }

    /// Whether the action appears with a nonzero coefficient
    pub fn contains(&self, action_id: &str) -> bool {
        self.terms.iter().any(|t| t.action_id == action_id)
    }

    /// Action ids in catalog order
    pub fn action_ids(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(|t| t.action_id.as_str())
    }

    /// Coefficients in the caller's order, zero-filled for absent actions.
    pub fn coefficient_vector(&self, order: &[&str]) -> Vec<f64> {
        order.iter().map(|id| self.coefficient(id)).collect()
    }

    pub fn canonical_key(&self) -> CanonicalKey {
        CanonicalKey::from_terms(&self.terms)
    }

    /// Superpose per-action effects (e.g. a bending moment per unit action).
    ///
    /// Actions without an effect contribute 0.
    pub fn apply(&self, effects: &HashMap<String, f64>) -> f64 {
        self.terms
            .iter()
            .map(|t| t.coefficient * effects.get(&t.action_id).copied().unwrap_or(0.0))
            .sum()
    }
}

fn coefficient_of(terms: &[Term], action_id: &str) -> f64 {
    terms
        .iter()
        .find(|t| t.action_id == action_id)
        .map(|t| t.coefficient)
        .unwrap_or(0.0)
}

fn expression(terms: &[Term]) -> String {
    terms
        .iter()
        .map(|t| format!("{}*{}", t.coefficient, t.action_id))
        .collect::<Vec<_>>()
        .join(" + ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(terms: &[(&str, f64)]) -> CombinationDraft {
        let mut d = CombinationDraft::new(LimitStateFamily::UlsPersistent);
        for (id, c) in terms {
            d.push(*id, *c);
        }
        d
    }

    #[test]
    fn test_push_rounds_and_skips_zero() {
        let d = draft(&[("G1", 1.35), ("Q1", 1.5 * 0.7), ("W1", 1.5 * 0.0)]);
        assert_eq!(d.terms.len(), 2);
        assert_eq!(d.coefficient("Q1"), 1.05);
        assert_eq!(d.coefficient("W1"), 0.0);
    }

    #[test]
    fn test_canonical_key_ignores_order() {
        let a = draft(&[("G1", 1.35), ("Q1", 1.5)]);
        let b = draft(&[("Q1", 1.5), ("G1", 1.35)]);
        let c = draft(&[("G1", 1.0), ("Q1", 1.5)]);
        assert_eq!(a.canonical_key(), b.canonical_key());
        assert_ne!(a.canonical_key(), c.canonical_key());
    }

    #[test]
    fn test_canonical_key_within_resolution() {
        let a = draft(&[("Q1", 1.05)]);
        let b = draft(&[("Q1", 1.0500000000001)]);
        assert_eq!(a.canonical_key(), b.canonical_key());
    }

    #[test]
    fn test_expression() {
        let combo = Combination::from_draft(
            "ULS-PT-001".to_string(),
            draft(&[("G1", 1.35), ("Q1", 1.5), ("Q2", 1.05)]),
        );
        assert_eq!(combo.expression, "1.35*G1 + 1.5*Q1 + 1.05*Q2");
    }

    #[test]
    fn test_coefficient_vector_zero_fill() {
        let combo = Combination::from_draft("SLS-C-001".into(), draft(&[("G1", 1.0), ("Q2", 0.7)]));
        assert_eq!(
            combo.coefficient_vector(&["Q1", "G1", "Q2", "A1"]),
            vec![0.0, 1.0, 0.7, 0.0]
        );
    }

    #[test]
    fn test_apply_missing_effects_are_zero() {
        let combo = Combination::from_draft("X-001".into(), draft(&[("G1", 1.35), ("Q1", 1.5)]));
        let effects: HashMap<String, f64> = [("G1".to_string(), 20.0)].into_iter().collect();
        assert!((combo.apply(&effects) - 27.0).abs() < 1e-9);
    }
}
