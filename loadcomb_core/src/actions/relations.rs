//! Resolved incompatibility and dependency constraints.
//!
//! Incompatibility is symmetric: if A's patterns match B, neither may appear
//! in a combination with the other. A dependency is directed; each dependency
//! *pattern* of an action is one requirement, satisfied when at least one of
//! the actions it matched is present with a nonzero coefficient. All
//! requirements of an action must hold for it to stay in a combination.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{Action, ActionCatalog};
use crate::diagnostics::PatternWarning;
use crate::errors::{ComboError, ComboResult};

/// Which relation a pattern belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationKind {
    Incompatibility,
    Dependency,
}

/// A resolved relation, expressed with action ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Relation {
    /// The two actions never co-occur
    Incompatibility { a: String, b: String },
    /// `action` needs at least one of `required` present
    Dependency { action: String, required: Vec<String> },
}

/// Index-based relation graph over a frozen catalog.
#[derive(Debug, Clone, Default)]
pub struct RelationGraph {
    excludes: Vec<BTreeSet<usize>>,
    requires: Vec<Vec<BTreeSet<usize>>>,
}

impl RelationGraph {
    /// Resolve every pattern in the catalog.
    ///
    /// Returns the graph plus a warning for each pattern that matched nothing;
    /// such patterns are ignored.
    pub(crate) fn build(catalog: &ActionCatalog) -> ComboResult<(Self, Vec<PatternWarning>)> {
        let n = catalog.len();
        let mut graph = RelationGraph {
            excludes: vec![BTreeSet::new(); n],
            requires: vec![Vec::new(); n],
        };
        let mut warnings = Vec::new();

        for (i, action) in catalog.actions().iter().enumerate() {
            for pattern in &action.incompatible_with {
                let hits = catalog.resolve_pattern(pattern, &action.id);
                if hits.is_empty() {
                    warnings.push(PatternWarning::new(action, RelationKind::Incompatibility, pattern));
                }
                for j in hits {
                    graph.excludes[i].insert(j);
                    graph.excludes[j].insert(i);
                }
            }
            for pattern in &action.depends_on {
                let hits = catalog.resolve_pattern(pattern, &action.id);
                if hits.is_empty() {
                    warnings.push(PatternWarning::new(action, RelationKind::Dependency, pattern));
                } else {
                    graph.requires[i].push(hits.into_iter().collect());
                }
            }
        }

        if let Some(cycle) = graph.find_cycle() {
            let cycle = cycle
                .into_iter()
                .map(|i| catalog.actions()[i].id.clone())
                .collect();
            return Err(ComboError::CyclicDependency { cycle });
        }

        Ok((graph, warnings))
    }

    /// Whether actions `i` and `j` may never appear together
    pub fn are_incompatible(&self, i: usize, j: usize) -> bool {
        self.excludes.get(i).is_some_and(|set| set.contains(&j))
    }

    /// Indices excluded by action `i` (none for an unknown index)
    pub fn excluded_by(&self, i: usize) -> impl Iterator<Item = usize> + '_ {
        self.excludes.get(i).into_iter().flatten().copied()
    }

    /// Whether action `i` declares any resolved dependency
    pub fn has_dependencies(&self, i: usize) -> bool {
        self.requires.get(i).is_some_and(|requirements| !requirements.is_empty())
    }

    /// Whether every requirement of action `i` has a present member.
    /// An unknown index has no requirements.
    pub fn is_satisfied(&self, i: usize, present: impl Fn(usize) -> bool) -> bool {
        self.requires.get(i).map_or(true, |requirements| {
            requirements
                .iter()
                .all(|requirement| requirement.iter().any(|&j| present(j)))
        })
    }

    /// Depth-first search over dependency edges; returns the first cycle as
    /// a closed path of indices (first == last).
    fn find_cycle(&self) -> Option<Vec<usize>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            New,
            Active,
            Done,
        }

        fn visit(
            graph: &RelationGraph,
            node: usize,
            marks: &mut [Mark],
            path: &mut Vec<usize>,
        ) -> Option<Vec<usize>> {
            marks[node] = Mark::Active;
            path.push(node);
            let targets: BTreeSet<usize> = graph.requires[node].iter().flatten().copied().collect();
            for next in targets {
                match marks[next] {
                    Mark::Active => {
                        let start = path.iter().position(|&p| p == next).unwrap_or(0);
                        let mut cycle = path[start..].to_vec();
                        cycle.push(next);
                        return Some(cycle);
                    }
                    Mark::New => {
                        if let Some(cycle) = visit(graph, next, marks, path) {
                            return Some(cycle);
                        }
                    }
                    Mark::Done => {}
                }
            }
            path.pop();
            marks[node] = Mark::Done;
            None
        }

        let mut marks = vec![Mark::New; self.requires.len()];
        let mut path = Vec::new();
        for start in 0..self.requires.len() {
            if marks[start] == Mark::New {
                if let Some(cycle) = visit(self, start, &mut marks, &mut path) {
                    return Some(cycle);
                }
            }
        }
        None
    }

    /// Relations with ids; each incompatible pair is listed once.
    pub(crate) fn describe(&self, actions: &[Action]) -> Vec<Relation> {
        let mut relations = Vec::new();
        for (i, excluded) in self.excludes.iter().enumerate() {
            for &j in excluded.range(i + 1..) {
                relations.push(Relation::Incompatibility {
                    a: actions[i].id.clone(),
                    b: actions[j].id.clone(),
                });
            }
        }
        for (i, requirements) in self.requires.iter().enumerate() {
            for requirement in requirements {
                relations.push(Relation::Dependency {
                    action: actions[i].id.clone(),
                    required: requirement.iter().map(|&j| actions[j].id.clone()).collect(),
                });
            }
        }
        relations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(actions: Vec<Action>) -> RelationGraph {
        let catalog = ActionCatalog::from_actions(actions).unwrap();
        RelationGraph::build(&catalog).unwrap().0
    }

    #[test]
    fn test_requirements_are_and_of_ors() {
        let g = graph(vec![
            Action::variable("Q1", "A"),
            Action::variable("Q2", "A"),
            Action::variable("S1", "snow"),
            Action::variable("F1", "A").depends_on("Q*").depends_on("S1"),
        ]);

        assert!(g.has_dependencies(3));
        assert!(!g.has_dependencies(0));
        // Q2 + S1 present
        assert!(g.is_satisfied(3, |j| j == 1 || j == 2));
        // Only Q1
        assert!(!g.is_satisfied(3, |j| j == 0));
        // Only S1
        assert!(!g.is_satisfied(3, |j| j == 2));
    }

    #[test]
    fn test_unknown_index_has_no_relations() {
        let g = graph(vec![
            Action::variable("Q1", "A").incompatible_with("Q2"),
            Action::variable("Q2", "A"),
        ]);

        assert_eq!(g.excluded_by(1).collect::<Vec<_>>(), vec![0]);
        assert_eq!(g.excluded_by(7).count(), 0);
        assert!(!g.are_incompatible(7, 0));
        assert!(!g.has_dependencies(7));
        assert!(g.is_satisfied(7, |_| false));
    }

    #[test]
    fn test_self_dependency_pattern_is_not_a_cycle() {
        // "Q*" on Q1 cannot match Q1 itself
        let catalog = ActionCatalog::from_actions([
            Action::variable("Q1", "A").depends_on("Q*"),
            Action::variable("Q2", "A"),
        ])
        .unwrap();
        assert!(RelationGraph::build(&catalog).is_ok());
    }

    #[test]
    fn test_two_node_cycle() {
        let catalog = ActionCatalog::from_actions([
            Action::variable("X", "A"),
            Action::variable("F1", "A").depends_on("F2"),
            Action::variable("F2", "A").depends_on("F1"),
        ])
        .unwrap();
        let err = RelationGraph::build(&catalog).unwrap_err();
        assert_eq!(
            err,
            ComboError::CyclicDependency {
                cycle: vec!["F1".into(), "F2".into(), "F1".into()]
            }
        );
    }

    #[test]
    fn test_describe_lists_pairs_once() {
        let catalog = ActionCatalog::from_actions([
            Action::variable("W1", "wind").incompatible_with("W*"),
            Action::variable("W2", "wind").incompatible_with("W*"),
            Action::accidental("A1").depends_on("W1"),
        ])
        .unwrap();
        let (g, warnings) = RelationGraph::build(&catalog).unwrap();
        assert!(warnings.is_empty());

        let relations = g.describe(catalog.actions());
        assert_eq!(
            relations,
            vec![
                Relation::Incompatibility { a: "W1".into(), b: "W2".into() },
                Relation::Dependency { action: "A1".into(), required: vec!["W1".into()] },
            ]
        );
    }
}
