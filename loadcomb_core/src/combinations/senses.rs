//! Favorable/unfavorable sense enumeration over origin groups.
//!
//! Permanent-like actions sharing an origin group always take the same sense.
//! An outcome assigns one sense per group, indexed like the group list.

use crate::actions::FrozenCatalog;
use crate::errors::{ComboError, ComboResult};
use crate::factors::{SafetyFactorPolicy, Sense, SenseStrategy};

use super::LimitStateFamily;

/// Maximum number of unpinned origin groups for exhaustive enumeration (2^16 outcomes).
pub const EXHAUSTIVE_GROUP_LIMIT: usize = 16;

/// Permanent-like actions of one origin group, by catalog index
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct OriginGroup<'a> {
    pub name: &'a str,
    pub members: Vec<usize>,
}

/// Group permanent-like actions by origin group, in order of first appearance.
pub(crate) fn origin_groups(catalog: &FrozenCatalog) -> Vec<OriginGroup<'_>> {
    let mut groups: Vec<OriginGroup<'_>> = Vec::new();
    for (index, action) in catalog.actions().iter().enumerate() {
        let Some(name) = action.origin_group() else {
            continue;
        };
        match groups.iter_mut().find(|g| g.name == name) {
            Some(group) => group.members.push(index),
            None => groups.push(OriginGroup {
                name,
                members: vec![index],
            }),
        }
    }
    groups
}

/// Sense outcomes for the groups under a strategy.
///
/// Always returns at least one outcome (the empty one when there are no
/// groups).
pub(crate) fn enumerate(
    groups: &[OriginGroup<'_>],
    policy: &SafetyFactorPolicy,
    strategy: SenseStrategy,
    family: LimitStateFamily,
) -> ComboResult<Vec<Vec<Sense>>> {
    let options: Vec<Vec<Sense>> = groups
        .iter()
        .map(|g| policy.origin_group_senses(g.name))
        .collect();

    let uniform = |sense: Sense| -> Vec<Sense> {
        groups
            .iter()
            .zip(&options)
            .map(|(g, opts)| if policy.is_pinned(g.name) { opts[0] } else { sense })
            .collect()
    };

    match strategy {
        SenseStrategy::Shortcut => Ok(vec![uniform(Sense::Unfavorable)]),
        SenseStrategy::Uniform => {
            let unfavorable = uniform(Sense::Unfavorable);
            let favorable = uniform(Sense::Favorable);
            if unfavorable == favorable {
                Ok(vec![unfavorable])
            } else {
                Ok(vec![unfavorable, favorable])
            }
        }
        SenseStrategy::Exhaustive => {
            let unpinned = options.iter().filter(|o| o.len() > 1).count();
            if unpinned > EXHAUSTIVE_GROUP_LIMIT {
                return Err(ComboError::EnumerationLimit {
                    family,
                    groups: unpinned,
                    limit: EXHAUSTIVE_GROUP_LIMIT,
                });
            }
            Ok(cartesian(&options))
        }
    }
}

/// Cartesian product in odometer order: the last group changes fastest.
fn cartesian(options: &[Vec<Sense>]) -> Vec<Vec<Sense>> {
    let mut outcomes = Vec::new();
    let mut digits = vec![0usize; options.len()];
    loop {
        outcomes.push(
            digits
                .iter()
                .zip(options)
                .map(|(&d, opts)| opts[d])
                .collect(),
        );

        // Advance from the last position, carrying left
        let mut position = options.len();
        loop {
            if position == 0 {
                return outcomes;
            }
            position -= 1;
            digits[position] += 1;
            if digits[position] < options[position].len() {
                break;
            }
            digits[position] = 0;
        }
    }
}
