//! Per-family storage of accepted combinations.
//!
//! The container is append-only: it de-duplicates drafts by canonical key,
//! labels the survivors `<prefix>-NNN` in insertion order, and never mutates
//! or reorders a combination once accepted. Downstream consumers (report
//! writers, response superposition) only use the read-only API.
//!
//! # Example
//! ```
//! use loadcomb_core::combinations::{
//!     CombinationContainer, CombinationDraft, FamilyStatus, LimitStateFamily,
//! };
//!
//! let mut container = CombinationContainer::new();
//! container.open_family(LimitStateFamily::UlsSeismic);
//!
//! let mut draft = CombinationDraft::new(LimitStateFamily::SlsQuasiPermanent);
//! draft.push("G1", 1.0);
//! draft.push("Q1", 0.3);
//! assert!(container.insert(draft.clone()).is_some());
//! assert!(container.insert(draft).is_none()); // duplicate
//!
//! assert_eq!(container.status(LimitStateFamily::SlsQuasiPermanent), FamilyStatus::Populated { count: 1 });
//! assert_eq!(container.status(LimitStateFamily::UlsSeismic), FamilyStatus::Empty);
//! assert_eq!(container.status(LimitStateFamily::SlsFrequent), FamilyStatus::NotRequested);
//!
//! let vector = container.coefficient_vector("SLS-QP-001", &["Q1", "Q2", "G1"]).unwrap();
//! assert_eq!(vector, vec![0.3, 0.0, 1.0]);
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::combination::{CanonicalKey, Combination, CombinationDraft};
use super::LimitStateFamily;

/// Whether a family was requested, and what it holds.
///
/// Failures are reported by [`RunDiagnostics`](crate::diagnostics::RunDiagnostics),
/// not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum FamilyStatus {
    /// Never opened
    NotRequested,
    /// Requested, no combinations
    Empty,
    Populated { count: usize },
}

/// Governing combinations for one scalar effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoverningResults {
    /// Largest combined effect
    pub max_value: f64,
    /// Label of the combination giving the largest effect
    pub max_label: String,
    /// Smallest combined effect (uplift, reversal)
    pub min_value: f64,
    /// Label of the combination giving the smallest effect
    pub min_label: String,
}

/// Ordered, de-duplicated combinations per family.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<LimitStateFamily, Vec<Combination>>",
    into = "BTreeMap<LimitStateFamily, Vec<Combination>>"
)]
pub struct CombinationContainer {
    families: BTreeMap<LimitStateFamily, Vec<Combination>>,
    keys: HashMap<LimitStateFamily, HashSet<CanonicalKey>>,
    labels: HashMap<String, (LimitStateFamily, usize)>,
}

impl CombinationContainer {
    /// Create an empty container
    pub fn new() -> Self {
        CombinationContainer::default()
    }

    /// Mark a family as requested, so an empty family reads as
    /// [`FamilyStatus::Empty`] rather than [`FamilyStatus::NotRequested`].
    pub fn open_family(&mut self, family: LimitStateFamily) {
        self.families.entry(family).or_default();
        self.keys.entry(family).or_default();
    }

    /// Accept a draft unless an equal combination already exists in its family.
    ///
    /// Returns the labeled combination, or `None` for a duplicate (or an
    /// empty draft). Opens the family if needed.
    pub fn insert(&mut self, draft: CombinationDraft) -> Option<&Combination> {
        let family = draft.family;
        let key = draft.canonical_key();
        self.open_family(family);
        if key.is_empty() {
            return None;
        }
        if !self.keys.entry(family).or_default().insert(key) {
            return None;
        }

        let list = self.families.entry(family).or_default();
        let position = list.len();
        let label = format!("{}-{:03}", family.prefix(), position + 1);
        self.labels.insert(label.clone(), (family, position));
        list.push(Combination::from_draft(label, draft));
        list.last()
    }

    /// Requested/empty/populated state of a family.
    ///
    /// The container only holds families that generated successfully; a
    /// family whose generation failed is never opened and reads
    /// [`FamilyStatus::NotRequested`]. Its error is in
    /// [`RunDiagnostics`](crate::diagnostics::RunDiagnostics).
    pub fn status(&self, family: LimitStateFamily) -> FamilyStatus {
        match self.families.get(&family) {
            None => FamilyStatus::NotRequested,
            Some(list) if list.is_empty() => FamilyStatus::Empty,
            Some(list) => FamilyStatus::Populated { count: list.len() },
        }
    }

    /// Combinations of one family in generation order
    pub fn family(&self, family: LimitStateFamily) -> &[Combination] {
        self.families.get(&family).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Families that were opened, in standard order
    pub fn families(&self) -> impl Iterator<Item = LimitStateFamily> + '_ {
        self.families.keys().copied()
    }

    /// Look up a combination by label
    pub fn get(&self, label: &str) -> Option<&Combination> {
        let (family, position) = self.labels.get(label)?;
        self.families.get(family)?.get(*position)
    }

    /// Coefficients of a combination in the caller's action order,
    /// zero-filled for absent actions. `None` if the label is unknown.
    pub fn coefficient_vector(&self, label: &str, order: &[&str]) -> Option<Vec<f64>> {
        self.get(label).map(|c| c.coefficient_vector(order))
    }

    /// All combinations: families in standard order, then generation order
    pub fn iter(&self) -> impl Iterator<Item = &Combination> {
        self.families.values().flatten()
    }

    /// Total number of combinations
    pub fn len(&self) -> usize {
        self.families.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum and minimum superposed effect over one family.
    ///
    /// `effects` maps action id to its effect under a unit action; missing
    /// actions contribute 0. `None` if the family has no combinations.
    pub fn governing_min_max(
        &self,
        family: LimitStateFamily,
        effects: &HashMap<String, f64>,
    ) -> Option<GoverningResults> {
        let mut results: Option<GoverningResults> = None;
        for combo in self.family(family) {
            let value = combo.apply(effects);
            match results.as_mut() {
                None => {
                    results = Some(GoverningResults {
                        max_value: value,
                        max_label: combo.label.clone(),
                        min_value: value,
                        min_label: combo.label.clone(),
                    })
                }
                Some(r) => {
                    if value > r.max_value {
                        r.max_value = value;
                        r.max_label = combo.label.clone();
                    }
                    if value < r.min_value {
                        r.min_value = value;
                        r.min_label = combo.label.clone();
                    }
                }
            }
        }
        results
    }
}

impl From<BTreeMap<LimitStateFamily, Vec<Combination>>> for CombinationContainer {
    fn from(families: BTreeMap<LimitStateFamily, Vec<Combination>>) -> Self {
        let mut keys: HashMap<LimitStateFamily, HashSet<CanonicalKey>> = HashMap::new();
        let mut labels = HashMap::new();
        for (family, list) in &families {
            let family_keys = keys.entry(*family).or_default();
            for (position, combo) in list.iter().enumerate() {
                family_keys.insert(combo.canonical_key());
                labels.insert(combo.label.clone(), (*family, position));
            }
        }
        CombinationContainer {
            families,
            keys,
            labels,
        }
    }
}

impl From<CombinationContainer> for BTreeMap<LimitStateFamily, Vec<Combination>> {
    fn from(container: CombinationContainer) -> Self {
        container.families
    }
}
