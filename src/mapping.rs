use crate::{Adjacency, Count, Mapping};

/// Whether `target_vertex` is adjacent to every image in `mapped_neighbors`.
///
/// An empty neighbor list is vacuously valid.
#[inline]
pub fn is_valid_mapping<T, I>(target_vertex: usize, mapped_neighbors: I, target: &T) -> bool
where
    T: Adjacency + ?Sized,
    I: IntoIterator<Item = usize>,
{
    mapped_neighbors
        .into_iter()
        .all(|image| target.has_edge(target_vertex, image))
}

/// Whether `mapping` sends every edge of `source` to an edge of `target`.
pub fn is_homomorphism<S, T>(source: &S, target: &T, mapping: &[usize]) -> bool
where
    S: Adjacency + ?Sized,
    T: Adjacency + ?Sized,
{
    let n = source.vertex_count();
    mapping.len() == n
        && (0..n).all(|u| {
            (u..n).all(|v| !source.has_edge(u, v) || target.has_edge(mapping[u], mapping[v]))
        })
}

/// Count homomorphisms by exhaustive backtracking.
///
/// Exponential in the number of source vertices; the reference the DP is
/// checked against.
pub fn count_homomorphisms_brute_force<S, T>(source: &S, target: &T) -> Count
where
    S: Adjacency + ?Sized,
    T: Adjacency + ?Sized,
{
    let mut count: Count = 0;
    let mut current_mapping = vec![0; source.vertex_count()];
    backtrack(0, source, target, &mut current_mapping, &mut |_: &Mapping| count += 1);
    count
}

/// Find all homomorphisms from `source` to `target`
pub fn find_all_homomorphisms<S, T>(source: &S, target: &T) -> Vec<Mapping>
where
    S: Adjacency + ?Sized,
    T: Adjacency + ?Sized,
{
    let mut all_mappings = Vec::new();
    let mut current_mapping = vec![0; source.vertex_count()];
    backtrack(0, source, target, &mut current_mapping, &mut |mapping: &Mapping| {
        all_mappings.push(mapping.clone())
    });
    all_mappings
}

/// Recursive backtracking over source vertices in index order
fn backtrack<S, T, F>(
    vertex_idx: usize,
    source: &S,
    target: &T,
    current_mapping: &mut Mapping,
    on_complete: &mut F,
) where
    S: Adjacency + ?Sized,
    T: Adjacency + ?Sized,
    F: FnMut(&Mapping),
{
    if vertex_idx == source.vertex_count() {
        on_complete(current_mapping);
        return;
    }

    for t in 0..target.vertex_count() {
        current_mapping[vertex_idx] = t;
        // Earlier neighbors plus the vertex itself when it carries a loop.
        let mapped_neighbors = (0..=vertex_idx)
            .filter(|&u| source.has_edge(vertex_idx, u))
            .map(|u| current_mapping[u]);
        if is_valid_mapping(t, mapped_neighbors, target) {
            backtrack(vertex_idx + 1, source, target, current_mapping, on_complete);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Graph;
    use itertools::Itertools;

    fn clique(n: usize) -> Graph {
        let edges: Vec<_> = (0..n).tuple_combinations().collect();
        Graph::from_edges(n, &edges).unwrap()
    }

    fn cycle(n: usize) -> Graph {
        let edges: Vec<_> = (0..n).map(|i| (i, (i + 1) % n)).collect();
        Graph::from_edges(n, &edges).unwrap()
    }

    #[test]
    fn test_valid_mapping_requires_every_edge() {
        let h = cycle(4);
        assert!(is_valid_mapping(0, [1, 3], &h));
        assert!(!is_valid_mapping(0, [1, 2], &h));
        // No loops: a vertex is not adjacent to itself.
        assert!(!is_valid_mapping(0, [0], &h));
    }

    #[test]
    fn test_valid_mapping_vacuous() {
        let h = Graph::new(3);
        assert!(is_valid_mapping(2, [0usize; 0], &h));
    }

    #[test]
    fn test_is_homomorphism() {
        let g = cycle(4);
        let h = clique(2);
        assert!(is_homomorphism(&g, &h, &[0, 1, 0, 1]));
        assert!(!is_homomorphism(&g, &h, &[0, 0, 1, 1]));
        assert!(!is_homomorphism(&g, &h, &[0, 1]));
    }

    #[test]
    fn test_brute_force_counts() {
        assert_eq!(count_homomorphisms_brute_force(&clique(2), &clique(5)), 20);
        assert_eq!(count_homomorphisms_brute_force(&cycle(4), &clique(5)), 260);
        assert_eq!(count_homomorphisms_brute_force(&cycle(4), &cycle(4)), 32);
        assert_eq!(count_homomorphisms_brute_force(&cycle(3), &cycle(4)), 0);
        assert_eq!(count_homomorphisms_brute_force(&Graph::new(0), &clique(3)), 1);
    }

    #[test]
    fn test_source_loop_needs_target_loop() {
        let g = Graph::from_edges(1, &[(0, 0)]).unwrap();
        assert_eq!(count_homomorphisms_brute_force(&g, &clique(3)), 0);
        assert_eq!(count_homomorphisms_brute_force(&g, &clique(3).with_loops()), 3);
    }

    #[test]
    fn test_find_all_homomorphisms() {
        let all = find_all_homomorphisms(&cycle(4), &cycle(4));
        assert_eq!(all.len(), 32);
        assert!(all.iter().all(|m| is_homomorphism(&cycle(4), &cycle(4), m)));

        // The bijective ones are the 8 automorphisms of the 4-cycle.
        let automorphisms = all.iter().filter(|m| m.iter().all_unique()).count();
        assert_eq!(automorphisms, 8);
    }
}
