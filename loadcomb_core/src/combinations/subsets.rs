//! Maximal mutually compatible subsets of actions.
//!
//! Compatible actions form an undirected graph; the maximal subsets are its
//! maximal cliques, found with Bron–Kerbosch (Tomita pivoting). Results are
//! sorted so generation order is deterministic.

/// Maximal subsets of `candidates` in which every pair is compatible.
///
/// Each subset is in ascending index order; subsets are sorted
/// lexicographically. No candidates gives one empty subset.
pub(crate) fn maximal_compatible_subsets(
    candidates: &[usize],
    compatible: impl Fn(usize, usize) -> bool,
) -> Vec<Vec<usize>> {
    let mut sorted = candidates.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut cliques = Vec::new();
    bron_kerbosch(&mut Vec::new(), sorted, Vec::new(), &compatible, &mut cliques);
    cliques.sort();
    cliques
}

fn bron_kerbosch(
    clique: &mut Vec<usize>,
    candidates: Vec<usize>,
    excluded: Vec<usize>,
    compatible: &impl Fn(usize, usize) -> bool,
    out: &mut Vec<Vec<usize>>,
) {
    if candidates.is_empty() {
        if excluded.is_empty() {
            let mut found = clique.clone();
            found.sort_unstable();
            out.push(found);
        }
        return;
    }

    // Pivot with the most neighbors among the candidates
    let pivot = candidates
        .iter()
        .chain(&excluded)
        .copied()
        .max_by_key(|&u| candidates.iter().filter(|&&v| v != u && compatible(u, v)).count());

    let branches: Vec<usize> = candidates
        .iter()
        .copied()
        .filter(|&v| match pivot {
            Some(u) => v == u || !compatible(u, v),
            None => true,
        })
        .collect();

    let mut candidates = candidates;
    let mut excluded = excluded;
    for v in branches {
        let neighbors = |set: &[usize]| -> Vec<usize> {
            set.iter().copied().filter(|&w| w != v && compatible(v, w)).collect()
        };
        clique.push(v);
        bron_kerbosch(clique, neighbors(&candidates), neighbors(&excluded), compatible, out);
        clique.pop();

        candidates.retain(|&w| w != v);
        excluded.push(v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(excluded: &[(usize, usize)]) -> impl Fn(usize, usize) -> bool + '_ {
        move |a, b| !excluded.iter().any(|&(x, y)| (x, y) == (a, b) || (y, x) == (a, b))
    }

    #[test]
    fn test_all_compatible_is_one_subset() {
        let subsets = maximal_compatible_subsets(&[3, 1, 2], pairs(&[]));
        assert_eq!(subsets, vec![vec![1, 2, 3]]);
    }

    #[test]
    fn test_empty_candidates() {
        let subsets = maximal_compatible_subsets(&[], pairs(&[]));
        assert_eq!(subsets, vec![Vec::<usize>::new()]);
    }

    #[test]
    fn test_one_conflict_splits_in_two() {
        // Snow and wind exclude each other, imposed load goes with both
        let subsets = maximal_compatible_subsets(&[1, 2, 3], pairs(&[(2, 3)]));
        assert_eq!(subsets, vec![vec![1, 2], vec![1, 3]]);
    }

    #[test]
    fn test_mutually_exclusive_family() {
        let subsets = maximal_compatible_subsets(&[0, 1, 2], pairs(&[(0, 1), (0, 2), (1, 2)]));
        assert_eq!(subsets, vec![vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn test_path_graph() {
        // 0-1-2-3 compatible only along the path
        let subsets = maximal_compatible_subsets(&[0, 1, 2, 3], pairs(&[(0, 2), (0, 3), (1, 3)]));
        assert_eq!(subsets, vec![vec![0, 1], vec![1, 2], vec![2, 3]]);
    }
}
