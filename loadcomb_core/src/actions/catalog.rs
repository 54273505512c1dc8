//! Action registry.
//!
//! An [`ActionCatalog`] is filled once per verification run from upstream
//! model data and then frozen. Freezing resolves every relation pattern into a
//! [`RelationGraph`] and rejects cyclic dependencies; the resulting
//! [`FrozenCatalog`] is read-only and can be shared between threads.

use std::collections::HashMap;

use super::relations::{Relation, RelationGraph};
use super::{Action, ActionCategory, Pattern};
use crate::diagnostics::PatternWarning;
use crate::errors::{ComboError, ComboResult};

/// Mutable registry of actions, in registration order.
#[derive(Debug, Clone, Default)]
pub struct ActionCatalog {
    actions: Vec<Action>,
    index: HashMap<String, usize>,
}

impl ActionCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        ActionCatalog::default()
    }

    /// Build a catalog from a sequence of actions, failing on the first duplicate id.
    pub fn from_actions(actions: impl IntoIterator<Item = Action>) -> ComboResult<Self> {
        let mut catalog = ActionCatalog::new();
        for action in actions {
            catalog.register(action)?;
        }
        Ok(catalog)
    }

    /// Register an action.
    ///
    /// # Errors
    ///
    /// `ComboError::DuplicateAction` if the id is already present, and
    /// `ComboError::InvalidInput` for an empty id or an empty ψ group name.
    pub fn register(&mut self, action: Action) -> ComboResult<()> {
        if action.id.trim().is_empty() {
            return Err(ComboError::invalid_input(
                "id",
                format!("{:?}", action.id),
                "Action id cannot be empty",
            ));
        }
        if action.psi_group().is_some_and(|g| g.trim().is_empty()) {
            return Err(ComboError::invalid_input(
                "psi_group",
                action.id.clone(),
                "Variable actions need a combination-factor group",
            ));
        }
        if self.index.contains_key(&action.id) {
            return Err(ComboError::DuplicateAction { id: action.id });
        }
        self.index.insert(action.id.clone(), self.actions.len());
        self.actions.push(action);
        Ok(())
    }

    /// All actions in registration order
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Look up an action by id
    pub fn get(&self, id: &str) -> Option<&Action> {
        self.index.get(id).map(|&i| &self.actions[i])
    }

    /// Position of an action in registration order
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Actions of one category, in registration order
    pub fn by_category(&self, category: ActionCategory) -> Vec<&Action> {
        self.actions
            .iter()
            .filter(|a| a.category() == category)
            .collect()
    }

    /// Number of registered actions
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether the catalog has no actions
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Concrete ids excluded by the action's own incompatibility patterns.
    ///
    /// This is the one-sided view; the frozen [`RelationGraph`] also applies
    /// the symmetric direction.
    pub fn resolve_incompatibility(&self, action: &Action) -> Vec<&str> {
        self.resolve_all(&action.incompatible_with, &action.id)
    }

    /// Concrete ids matched by the action's dependency patterns.
    pub fn resolve_dependency(&self, action: &Action) -> Vec<&str> {
        self.resolve_all(&action.depends_on, &action.id)
    }

    fn resolve_all(&self, patterns: &[Pattern], own_id: &str) -> Vec<&str> {
        let mut hits: Vec<usize> = patterns
            .iter()
            .flat_map(|p| self.resolve_pattern(p, own_id))
            .collect();
        hits.sort_unstable();
        hits.dedup();
        hits.into_iter().map(|i| self.actions[i].id.as_str()).collect()
    }

    /// Indices matched by one pattern. An action never matches itself.
    pub(crate) fn resolve_pattern(&self, pattern: &Pattern, own_id: &str) -> Vec<usize> {
        self.actions
            .iter()
            .enumerate()
            .filter(|(_, a)| a.id != own_id && pattern.matches(&a.id))
            .map(|(i, _)| i)
            .collect()
    }

    /// Resolve all relations and make the catalog read-only.
    ///
    /// # Errors
    ///
    /// `ComboError::CyclicDependency` if the dependency relation has a cycle.
    pub fn freeze(self) -> ComboResult<FrozenCatalog> {
        let (relations, warnings) = RelationGraph::build(&self)?;
        for warning in &warnings {
            tracing::warn!(
                action = %warning.action_id,
                pattern = %warning.pattern,
                relation = ?warning.relation,
                "relation pattern matches no action"
            );
        }
        Ok(FrozenCatalog {
            catalog: self,
            relations,
            warnings,
        })
    }
}

/// Read-only catalog with resolved relations.
#[derive(Debug, Clone)]
pub struct FrozenCatalog {
    catalog: ActionCatalog,
    relations: RelationGraph,
    warnings: Vec<PatternWarning>,
}

impl FrozenCatalog {
    /// The underlying catalog
    pub fn catalog(&self) -> &ActionCatalog {
        &self.catalog
    }

    /// All actions in registration order
    pub fn actions(&self) -> &[Action] {
        self.catalog.actions()
    }

    /// Action at a registration index
    pub fn action(&self, index: usize) -> &Action {
        &self.catalog.actions()[index]
    }

    /// Look up an action by id
    pub fn get(&self, id: &str) -> Option<&Action> {
        self.catalog.get(id)
    }

    /// Resolved relation graph (index based)
    pub fn graph(&self) -> &RelationGraph {
        &self.relations
    }

    /// Patterns that matched nothing while freezing
    pub fn warnings(&self) -> &[PatternWarning] {
        &self.warnings
    }

    /// Whether two actions may never appear together. Unknown ids are never incompatible.
    pub fn are_incompatible(&self, a: &str, b: &str) -> bool {
        match (self.catalog.index_of(a), self.catalog.index_of(b)) {
            (Some(i), Some(j)) => self.relations.are_incompatible(i, j),
            _ => false,
        }
    }

    /// Ids an action may never be combined with (symmetric closure)
    pub fn excluded_by(&self, id: &str) -> Vec<&str> {
        match self.catalog.index_of(id) {
            Some(i) => self
                .relations
                .excluded_by(i)
                .map(|j| self.action(j).id.as_str())
                .collect(),
            None => Vec::new(),
        }
    }

    /// All resolved relations, with ids, for reports and the `check` command
    pub fn relations(&self) -> Vec<Relation> {
        self.relations.describe(self.catalog.actions())
    }

    /// Number of actions
    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::RelationKind;

    #[test]
    fn test_register_rejects_duplicates() {
        let mut catalog = ActionCatalog::new();
        catalog.register(Action::permanent("G1")).unwrap();
        let err = catalog.register(Action::variable("G1", "A")).unwrap_err();
        assert_eq!(err, ComboError::DuplicateAction { id: "G1".to_string() });
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_register_rejects_empty_id() {
        let mut catalog = ActionCatalog::new();
        assert!(catalog.register(Action::permanent("  ")).is_err());
        assert!(catalog.register(Action::variable("Q1", "")).is_err());
    }

    #[test]
    fn test_by_category_keeps_order() {
        let catalog = ActionCatalog::from_actions([
            Action::variable("Q2", "A"),
            Action::permanent("G1"),
            Action::variable("Q1", "A"),
        ])
        .unwrap();

        let ids: Vec<_> = catalog
            .by_category(ActionCategory::Variable)
            .iter()
            .map(|a| a.id.as_str())
            .collect();
        assert_eq!(ids, vec!["Q2", "Q1"]);
        assert!(catalog.by_category(ActionCategory::Seismic).is_empty());
    }

    #[test]
    fn test_resolve_incompatibility_excludes_self() {
        let catalog = ActionCatalog::from_actions([
            Action::variable("W1", "wind").incompatible_with("W.*"),
            Action::variable("W2", "wind"),
            Action::variable("Q1", "A"),
        ])
        .unwrap();

        let w1 = catalog.get("W1").unwrap();
        assert_eq!(catalog.resolve_incompatibility(w1), vec!["W2"]);
    }

    #[test]
    fn test_resolve_dependency_merges_patterns() {
        let catalog = ActionCatalog::from_actions([
            Action::variable("Q1", "A"),
            Action::variable("Q2", "A"),
            Action::variable("F1", "A").depends_on("Q1").depends_on("Q*"),
        ])
        .unwrap();

        let f1 = catalog.get("F1").unwrap();
        assert_eq!(catalog.resolve_dependency(f1), vec!["Q1", "Q2"]);
    }

    #[test]
    fn test_freeze_makes_incompatibility_symmetric() {
        let frozen = ActionCatalog::from_actions([
            Action::variable("S1", "snow").incompatible_with("W1"),
            Action::variable("W1", "wind"),
        ])
        .unwrap()
        .freeze()
        .unwrap();

        assert!(frozen.are_incompatible("S1", "W1"));
        assert!(frozen.are_incompatible("W1", "S1"));
        assert_eq!(frozen.excluded_by("W1"), vec!["S1"]);
        assert!(!frozen.are_incompatible("S1", "missing"));
    }

    #[test]
    fn test_freeze_rejects_cycles() {
        let err = ActionCatalog::from_actions([
            Action::variable("A", "A").depends_on("B"),
            Action::variable("B", "A").depends_on("C"),
            Action::variable("C", "A").depends_on("A"),
        ])
        .unwrap()
        .freeze()
        .unwrap_err();

        match err {
            ComboError::CyclicDependency { cycle } => {
                assert_eq!(cycle, vec!["A", "B", "C", "A"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_freeze_collects_unmatched_patterns() {
        let frozen = ActionCatalog::from_actions([
            Action::variable("Q1", "A").incompatible_with("W.*"),
            Action::accidental("A1").depends_on("Crane*"),
        ])
        .unwrap()
        .freeze()
        .unwrap();

        let warnings = frozen.warnings();
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0].action_id, "Q1");
        assert_eq!(warnings[0].relation, RelationKind::Incompatibility);
        assert_eq!(warnings[1].action_id, "A1");
        assert_eq!(warnings[1].relation, RelationKind::Dependency);
        assert_eq!(warnings[1].pattern, "Crane*");
    }
}
