//! Actions, the action catalog, and the relations between actions.
//!
//! # Overview
//!
//! - [`ActionCategory`] - Classification of actions (G, G*, Q, A, AE, P)
//! - [`Action`] - One classified action with its relation patterns
//! - [`Pattern`] - Prefix/glob matcher for relation patterns
//! - [`ActionCatalog`] - Registry of actions, frozen into a [`FrozenCatalog`]
//! - [`RelationGraph`] - Resolved incompatibility and dependency constraints
//!
//! # Example
//!
//! ```
//! use loadcomb_core::actions::{Action, ActionCatalog, ActionCategory};
//!
//! let mut catalog = ActionCatalog::new();
//! catalog.register(Action::permanent("G1").named("Self-weight")).unwrap();
//! catalog.register(Action::variable("Q1", "A").incompatible_with("Q.*")).unwrap();
//! catalog.register(Action::variable("Q2", "A").incompatible_with("Q.*")).unwrap();
//!
//! assert_eq!(catalog.by_category(ActionCategory::Variable).len(), 2);
//!
//! let frozen = catalog.freeze().unwrap();
//! assert!(frozen.are_incompatible("Q1", "Q2"));
//! ```

pub mod catalog;
pub mod pattern;
pub mod relations;

pub use catalog::{ActionCatalog, FrozenCatalog};
pub use pattern::Pattern;
pub use relations::{Relation, RelationGraph, RelationKind};

use serde::{Deserialize, Serialize};

/// Action categories per EN 1990 Section 4.1.1
///
/// # Example
/// ```
/// use loadcomb_core::actions::ActionCategory;
///
/// assert_eq!(ActionCategory::Variable.code(), "Q");
/// assert!(ActionCategory::Prestressing.is_permanent_like());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ActionCategory {
    /// G - Permanent action (self-weight, fixed equipment)
    Permanent,
    /// G* - Permanent action whose magnitude is not constant (e.g. earth pressure)
    PermanentNonConstant,
    /// Q - Variable action (imposed, snow, wind, temperature)
    Variable,
    /// A - Accidental action (impact, fire, explosion)
    Accidental,
    /// AE - Seismic action
    Seismic,
    /// P - Prestressing
    Prestressing,
}

impl ActionCategory {
    /// All categories in standard order
    pub const ALL: [ActionCategory; 6] = [
        ActionCategory::Permanent,
        ActionCategory::PermanentNonConstant,
        ActionCategory::Variable,
        ActionCategory::Accidental,
        ActionCategory::Seismic,
        ActionCategory::Prestressing,
    ];

    /// Standard symbol (G, G*, Q, A, AE, P)
    pub fn code(&self) -> &'static str {
        match self {
            ActionCategory::Permanent => "G",
            ActionCategory::PermanentNonConstant => "G*",
            ActionCategory::Variable => "Q",
            ActionCategory::Accidental => "A",
            ActionCategory::Seismic => "AE",
            ActionCategory::Prestressing => "P",
        }
    }

    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            ActionCategory::Permanent => "Permanent action",
            ActionCategory::PermanentNonConstant => "Non-constant permanent action",
            ActionCategory::Variable => "Variable action",
            ActionCategory::Accidental => "Accidental action",
            ActionCategory::Seismic => "Seismic action",
            ActionCategory::Prestressing => "Prestressing",
        }
    }

    /// Whether actions of this category belong to an origin group and take a
    /// favorable/unfavorable sense.
    pub fn is_permanent_like(&self) -> bool {
        matches!(
            self,
            ActionCategory::Permanent
                | ActionCategory::PermanentNonConstant
                | ActionCategory::Prestressing
        )
    }
}

impl std::fmt::Display for ActionCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Category-specific data of an action.
///
/// Serialized internally tagged by `category`, so a JSON action reads
/// `{"id": "Q1", "category": "Variable", "psi_group": "A"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category")]
pub enum ActionKind {
    Permanent {
        /// Actions sharing an origin group always take the same sense.
        /// Defaults to the action's own id.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        origin_group: Option<String>,
    },
    PermanentNonConstant {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        origin_group: Option<String>,
    },
    Prestressing {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        origin_group: Option<String>,
    },
    Variable {
        /// Key into the code profile's combination-factor table
        psi_group: String,
    },
    Accidental,
    Seismic,
}

/// A classified action.
///
/// # JSON Format
/// ```json
/// {
///   "id": "F1",
///   "name": "Crane braking",
///   "category": "Variable",
///   "psi_group": "E",
///   "depends_on": ["Q_crane"],
///   "not_determinant": true
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Unique id within the catalog
    pub id: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Free-text description
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(flatten)]
    pub kind: ActionKind,

    /// Patterns of action ids this action may never be combined with
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub incompatible_with: Vec<Pattern>,

    /// Patterns of action ids that must be present for this action to appear
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<Pattern>,

    /// Never takes the leading slot unless triggered
    #[serde(default)]
    pub not_determinant: bool,
}

impl Action {
    fn with_kind(id: impl Into<String>, kind: ActionKind) -> Self {
        let id = id.into();
        Action {
            name: id.clone(),
            id,
            description: String::new(),
            kind,
            incompatible_with: Vec::new(),
            depends_on: Vec::new(),
            not_determinant: false,
        }
    }

    /// A permanent action in its own origin group
    pub fn permanent(id: impl Into<String>) -> Self {
        Action::with_kind(id, ActionKind::Permanent { origin_group: None })
    }

    /// A non-constant permanent action in its own origin group
    pub fn permanent_non_constant(id: impl Into<String>) -> Self {
        Action::with_kind(id, ActionKind::PermanentNonConstant { origin_group: None })
    }

    /// A prestressing action in its own origin group
    pub fn prestressing(id: impl Into<String>) -> Self {
        Action::with_kind(id, ActionKind::Prestressing { origin_group: None })
    }

    /// A variable action using the given combination-factor group
    pub fn variable(id: impl Into<String>, psi_group: impl Into<String>) -> Self {
        Action::with_kind(
            id,
            ActionKind::Variable {
                psi_group: psi_group.into(),
            },
        )
    }

    /// An accidental action
    pub fn accidental(id: impl Into<String>) -> Self {
        Action::with_kind(id, ActionKind::Accidental)
    }

    /// A seismic action
    pub fn seismic(id: impl Into<String>) -> Self {
        Action::with_kind(id, ActionKind::Seismic)
    }

    /// Set the display name (builder pattern)
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the description (builder pattern)
    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Place a permanent-like action in an origin group (builder pattern).
    ///
    /// Has no effect on other categories.
    pub fn in_origin_group(mut self, group: impl Into<String>) -> Self {
        match &mut self.kind {
            ActionKind::Permanent { origin_group }
            | ActionKind::PermanentNonConstant { origin_group }
            | ActionKind::Prestressing { origin_group } => *origin_group = Some(group.into()),
            _ => {}
        }
        self
    }

    /// Add an incompatibility pattern (builder pattern)
    pub fn incompatible_with(mut self, pattern: impl Into<Pattern>) -> Self {
        self.incompatible_with.push(pattern.into());
        self
    }

    /// Add a dependency pattern (builder pattern)
    pub fn depends_on(mut self, pattern: impl Into<Pattern>) -> Self {
        self.depends_on.push(pattern.into());
        self
    }

    /// Flag the action as not determinant (builder pattern)
    pub fn not_determinant(mut self) -> Self {
        self.not_determinant = true;
        self
    }

    /// The action's category
    pub fn category(&self) -> ActionCategory {
        match self.kind {
            ActionKind::Permanent { .. } => ActionCategory::Permanent,
            ActionKind::PermanentNonConstant { .. } => ActionCategory::PermanentNonConstant,
            ActionKind::Prestressing { .. } => ActionCategory::Prestressing,
            ActionKind::Variable { .. } => ActionCategory::Variable,
            ActionKind::Accidental => ActionCategory::Accidental,
            ActionKind::Seismic => ActionCategory::Seismic,
        }
    }

    /// Effective origin group for permanent-like actions, `None` otherwise.
    pub fn origin_group(&self) -> Option<&str> {
        match &self.kind {
            ActionKind::Permanent { origin_group }
            | ActionKind::PermanentNonConstant { origin_group }
            | ActionKind::Prestressing { origin_group } => {
                Some(origin_group.as_deref().unwrap_or(&self.id))
            }
            _ => None,
        }
    }

    /// Combination-factor group, for variable actions
    pub fn psi_group(&self) -> Option<&str> {
        match &self.kind {
            ActionKind::Variable { psi_group } => Some(psi_group),
            _ => None,
        }
    }
}
