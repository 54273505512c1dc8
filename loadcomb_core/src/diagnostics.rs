//! # Run Diagnostics
//!
//! What happened during a generation run: one outcome per requested family
//! plus the non-fatal pattern warnings collected while freezing the catalog.
//! A failed family never hides its siblings; callers can use whichever
//! families succeeded.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::actions::{Action, Pattern, RelationKind};
use crate::combinations::LimitStateFamily;
use crate::errors::ComboError;

/// A relation pattern that matched no action. The pattern is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternWarning {
    /// Action declaring the pattern
    pub action_id: String,
    pub relation: RelationKind,
    pub pattern: String,
}

impl PatternWarning {
    pub(crate) fn new(action: &Action, relation: RelationKind, pattern: &Pattern) -> Self {
        PatternWarning {
            action_id: action.id.clone(),
            relation,
            pattern: pattern.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for PatternWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let relation = match self.relation {
            RelationKind::Incompatibility => "incompatibility",
            RelationKind::Dependency => "dependency",
        };
        write!(
            f,
            "{}: {} pattern '{}' matches no action",
            self.action_id, relation, self.pattern
        )
    }
}

/// Result of generating one family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum FamilyOutcome {
    /// Generation finished; zero combinations is still a success
    Generated {
        combinations: usize,
        duplicates_discarded: usize,
    },
    /// Generation aborted; sibling families are unaffected
    Failed { error: ComboError },
}

impl FamilyOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FamilyOutcome::Generated { .. })
    }
}

/// Diagnostics of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunDiagnostics {
    /// Unique id of the run
    pub run_id: Uuid,

    /// Profile identifier, e.g. "EN 1990 [ES CTE DB-SE] v1.0.0"
    pub profile: String,

    pub started_at: DateTime<Utc>,

    /// Outcome per requested family
    pub outcomes: BTreeMap<LimitStateFamily, FamilyOutcome>,

    /// Unmatched relation patterns
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<PatternWarning>,
}

impl RunDiagnostics {
    /// Start diagnostics for a new run
    pub fn new(profile: impl Into<String>, warnings: Vec<PatternWarning>) -> Self {
        RunDiagnostics {
            run_id: Uuid::new_v4(),
            profile: profile.into(),
            started_at: Utc::now(),
            outcomes: BTreeMap::new(),
            warnings,
        }
    }

    /// Record the outcome of a family
    pub fn record(&mut self, family: LimitStateFamily, outcome: FamilyOutcome) {
        self.outcomes.insert(family, outcome);
    }

    /// Outcome of a family, if it was requested
    pub fn outcome(&self, family: LimitStateFamily) -> Option<&FamilyOutcome> {
        self.outcomes.get(&family)
    }

    /// Error of a family, if it failed
    pub fn error(&self, family: LimitStateFamily) -> Option<&ComboError> {
        match self.outcomes.get(&family)? {
            FamilyOutcome::Failed { error } => Some(error),
            FamilyOutcome::Generated { .. } => None,
        }
    }

    /// Families that failed, with their errors
    pub fn failures(&self) -> impl Iterator<Item = (LimitStateFamily, &ComboError)> {
        self.outcomes.iter().filter_map(|(family, outcome)| match outcome {
            FamilyOutcome::Failed { error } => Some((*family, error)),
            FamilyOutcome::Generated { .. } => None,
        })
    }

    /// Whether every requested family succeeded
    pub fn is_success(&self) -> bool {
        self.outcomes.values().all(FamilyOutcome::is_success)
    }
}
