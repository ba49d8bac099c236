//! Plain tree decompositions and their conversion into nice form.

use std::collections::VecDeque;

use crate::decomposition::{NiceTreeDecomposition, NiceTreeDecompositionBuilder, NodeId};
use crate::{Adjacency, HomError};

/// A tree decomposition: bags of source vertices joined by undirected tree
/// edges between bag indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeDecomposition {
    bags: Vec<Vec<usize>>,
    edges: Vec<(usize, usize)>,
}

impl TreeDecomposition {
    pub fn new(bags: Vec<Vec<usize>>, edges: Vec<(usize, usize)>) -> Self {
        Self { bags, edges }
    }

    /// One bag holding every vertex of an `n`-vertex graph.
    pub fn trivial(n: usize) -> Self {
        if n == 0 {
            return Self::new(Vec::new(), Vec::new());
        }
        Self::new(vec![(0..n).collect()], Vec::new())
    }

    /// Bags connected in a path, in the given order.
    pub fn chain(bags: Vec<Vec<usize>>) -> Self {
        let edges = (1..bags.len()).map(|i| (i - 1, i)).collect();
        Self::new(bags, edges)
    }

    pub fn bags(&self) -> &[Vec<usize>] {
        &self.bags
    }

    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    pub fn width(&self) -> usize {
        self.bags
            .iter()
            .map(Vec::len)
            .max()
            .unwrap_or(0)
            .saturating_sub(1)
    }

    /// Check the tree-decomposition properties against `graph`: the bags form
    /// a tree, every vertex and edge lies in some bag, and the bags holding
    /// any one vertex are connected.
    pub fn validate<G: Adjacency + ?Sized>(&self, graph: &G) -> Result<(), HomError> {
        let n = graph.vertex_count();
        if self.bags.is_empty() {
            return if n == 0 {
                Ok(())
            } else {
                Err(HomError::invalid_td("no bags for a non-empty graph"))
            };
        }

        let neighbors = self.tree_neighbors()?;
        if self.edges.len() != self.bags.len() - 1
            || bfs_order(&neighbors, 0).len() != self.bags.len()
        {
            return Err(HomError::invalid_td("bags do not form a tree"));
        }

        // containing[v] = bags that hold v, in increasing order
        let mut containing = vec![Vec::new(); n];
        for (i, bag) in self.bags.iter().enumerate() {
            for &v in bag {
                if v >= n {
                    return Err(HomError::invalid_td(format!(
                        "bag {} holds vertex {}, but the graph has {} vertices",
                        i, v, n
                    )));
                }
                if containing[v].last() == Some(&i) {
                    return Err(HomError::invalid_td(format!("bag {} repeats vertex {}", i, v)));
                }
                containing[v].push(i);
            }
        }

        // inner_edges[v] = tree edges whose two bags both hold v
        let mut inner_edges = vec![0usize; n];
        for &(a, b) in &self.edges {
            for &v in self.bags[a].iter().filter(|&v| self.bags[b].contains(v)) {
                inner_edges[v] += 1;
            }
        }
        for (v, bags) in containing.iter().enumerate() {
            if bags.is_empty() {
                return Err(HomError::invalid_td(format!("vertex {} is in no bag", v)));
            }
            // A forest on c nodes with c - 1 edges is connected.
            if inner_edges[v] + 1 != bags.len() {
                return Err(HomError::invalid_td(format!(
                    "bags holding vertex {} are not connected",
                    v
                )));
            }
        }

        for u in 0..n {
            for v in graph.adjacent(u).into_iter().filter(|&v| v > u) {
                let (short, long) = if containing[u].len() <= containing[v].len() {
                    (&containing[u], &containing[v])
                } else {
                    (&containing[v], &containing[u])
                };
                if !short.iter().any(|b| long.binary_search(b).is_ok()) {
                    return Err(HomError::invalid_td(format!(
                        "edge ({}, {}) is in no bag",
                        u, v
                    )));
                }
            }
        }

        Ok(())
    }

    /// Convert into a nice tree decomposition rooted at bag 0.
    ///
    /// Leaf bags are built up from an empty leaf by introduces. Along each
    /// tree edge the child's surplus vertices are forgotten before the
    /// parent's missing ones are introduced, and sibling branches are merged
    /// pairwise by joins. The result is finally forgotten down to an empty
    /// root. Bags are processed in reverse BFS order, so no recursion is
    /// involved however deep the tree is.
    pub fn to_nice<G: Adjacency + ?Sized>(
        &self,
        graph: &G,
    ) -> Result<NiceTreeDecomposition, HomError> {
        self.validate(graph)?;

        let mut builder = NiceTreeDecomposition::builder();
        if self.bags.is_empty() {
            let leaf = builder.leaf();
            return builder.build(leaf);
        }

        let neighbors = self.tree_neighbors()?;
        let order = bfs_order(&neighbors, 0);
        let mut parent = vec![None; self.bags.len()];
        for &u in &order {
            for &v in &neighbors[u] {
                if Some(v) != parent[u] {
                    parent[v] = Some(u);
                }
            }
        }

        // top[b] = node whose bag is bag b, once b's subtree is built
        let mut top: Vec<Option<NodeId>> = vec![None; self.bags.len()];
        for &bag_id in order.iter().rev() {
            let node =
                self.build_bag(&neighbors[bag_id], parent[bag_id], bag_id, &top, &mut builder)?;
            top[bag_id] = Some(node);
        }

        let mut current = top[0].ok_or_else(|| HomError::invalid_td("bag 0 was not converted"))?;
        let root_bag = builder.bag(current).to_vec();
        for v in root_bag {
            current = builder.forget(current, v)?;
        }

        tracing::debug!(
            "converted tree decomposition with {} bags into {} nice nodes",
            self.bags.len(),
            builder.len()
        );
        builder.build(current)
    }

    /// Nice nodes for one bag whose child bags are already in `top`.
    fn build_bag(
        &self,
        neighbors: &[usize],
        parent: Option<usize>,
        bag_id: usize,
        top: &[Option<NodeId>],
        builder: &mut NiceTreeDecompositionBuilder,
    ) -> Result<NodeId, HomError> {
        let bag = &self.bags[bag_id];
        let mut branches = Vec::new();
        for &child in neighbors.iter().filter(|&&c| Some(c) != parent) {
            let mut prev = top[child].ok_or_else(|| {
                HomError::invalid_td(format!(
                    "bag {} was reached before its child {}",
                    bag_id, child
                ))
            })?;
            let child_bag = builder.bag(prev).to_vec();
            for &u in child_bag.iter().filter(|&u| !bag.contains(u)) {
                prev = builder.forget(prev, u)?;
            }
            for &u in bag.iter().filter(|&u| !child_bag.contains(u)) {
                prev = builder.introduce(prev, u)?;
            }
            branches.push(prev);
        }

        if branches.is_empty() {
            let mut prev = builder.leaf();
            for &u in bag {
                prev = builder.introduce(prev, u)?;
            }
            return Ok(prev);
        }

        // Pairwise rounds keep join nesting logarithmic in the branch count.
        while branches.len() > 1 {
            let mut merged = Vec::with_capacity(branches.len().div_ceil(2));
            for pair in branches.chunks(2) {
                merged.push(match *pair {
                    [left, right] => builder.join(left, right)?,
                    _ => pair[0],
                });
            }
            branches = merged;
        }
        Ok(branches[0])
    }

    fn tree_neighbors(&self) -> Result<Vec<Vec<usize>>, HomError> {
        let mut neighbors = vec![Vec::new(); self.bags.len()];
        for &(a, b) in &self.edges {
            if a >= self.bags.len() || b >= self.bags.len() || a == b {
                return Err(HomError::invalid_td(format!("bad tree edge ({}, {})", a, b)));
            }
            neighbors[a].push(b);
            neighbors[b].push(a);
        }
        Ok(neighbors)
    }
}

fn bfs_order(neighbors: &[Vec<usize>], start: usize) -> Vec<usize> {
    let mut seen = vec![false; neighbors.len()];
    let mut order = Vec::with_capacity(neighbors.len());
    let mut queue = VecDeque::from([start]);
    seen[start] = true;
    while let Some(u) = queue.pop_front() {
        order.push(u);
        for &v in &neighbors[u] {
            if !seen[v] {
                seen[v] = true;
                queue.push_back(v);
            }
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        count_homomorphisms, CountConfig, Graph, HomomorphismCounter, NodeKind, SparseGraph,
    };

    fn four_cycle() -> Graph {
        Graph::from_edges(4, &[(0, 1), (1, 2), (2, 3), (3, 0)]).unwrap()
    }

    #[test]
    fn test_cycle_decomposition_is_valid() {
        let td = TreeDecomposition::chain(vec![vec![0, 1, 2], vec![0, 2, 3]]);
        assert_eq!(td.width(), 2);
        assert_eq!(td.validate(&four_cycle()), Ok(()));
    }

    #[test]
    fn test_missing_edge_is_rejected() {
        let td = TreeDecomposition::chain(vec![vec![0, 1], vec![1, 2], vec![2, 3]]);
        assert!(matches!(
            td.validate(&four_cycle()),
            Err(HomError::InvalidTreeDecomposition(_))
        ));
    }

    #[test]
    fn test_disconnected_occurrence_is_rejected() {
        let g = Graph::new(2);
        let td = TreeDecomposition::chain(vec![vec![0], vec![1], vec![0]]);
        assert!(td.validate(&g).is_err());
    }

    #[test]
    fn test_non_tree_is_rejected() {
        let g = Graph::new(3);
        let td = TreeDecomposition::new(
            vec![vec![0], vec![1], vec![2]],
            vec![(0, 1), (1, 2), (2, 0)],
        );
        assert!(td.validate(&g).is_err());

        let forest = TreeDecomposition::new(vec![vec![0], vec![1], vec![2]], vec![(0, 1)]);
        assert!(forest.validate(&g).is_err());
    }

    #[test]
    fn test_to_nice_produces_valid_decomposition() {
        let g = four_cycle();
        let td = TreeDecomposition::chain(vec![vec![0, 1, 2], vec![0, 2, 3]]);
        let nice = td.to_nice(&g).unwrap();
        assert_eq!(nice.validate(&g), Ok(()));
        assert_eq!(nice.treewidth(), 2);
        assert!(nice.node(nice.root()).bag().is_empty());
    }

    #[test]
    fn test_to_nice_star_uses_joins() {
        let g = Graph::from_edges(4, &[(0, 1), (0, 2), (0, 3)]).unwrap();
        let td = TreeDecomposition::new(
            vec![vec![0], vec![0, 1], vec![0, 2], vec![0, 3]],
            vec![(0, 1), (0, 2), (0, 3)],
        );
        let nice = td.to_nice(&g).unwrap();
        assert_eq!(nice.validate(&g), Ok(()));
        let joins = nice
            .nodes()
            .iter()
            .filter(|node| matches!(node.kind(), NodeKind::Join { .. }))
            .count();
        assert_eq!(joins, 2);
    }

    #[test]
    fn test_to_nice_long_path() {
        let n = 60_000;
        let edges: Vec<(usize, usize)> = (1..n).map(|i| (i - 1, i)).collect();
        let g = SparseGraph::from_edges(n, &edges).unwrap();
        let td = TreeDecomposition::chain((1..n).map(|i| vec![i - 1, i]).collect());

        let nice = td.to_nice(&g).unwrap();
        assert_eq!(nice.validate(&g), Ok(()));
        assert_eq!(nice.treewidth(), 1);

        let k2 = Graph::from_edges(2, &[(0, 1)]).unwrap();
        assert_eq!(count_homomorphisms(&nice, &g, &k2), Ok(2));
        let parallel = HomomorphismCounter::new(&nice, &g, &k2)
            .with_config(CountConfig::default().parallel(true))
            .count();
        assert_eq!(parallel, Ok(2));
    }

    #[test]
    fn test_to_nice_joins_are_balanced() {
        let leaves = 64;
        let edges: Vec<(usize, usize)> = (1..=leaves).map(|i| (0, i)).collect();
        let g = SparseGraph::from_edges(leaves + 1, &edges).unwrap();
        let td = TreeDecomposition::new(
            std::iter::once(vec![0]).chain((1..=leaves).map(|i| vec![0, i])).collect(),
            (1..=leaves).map(|i| (0, i)).collect(),
        );
        let nice = td.to_nice(&g).unwrap();

        // nesting[id] = joins on the longest path from `id` down to a leaf
        let mut nesting = vec![0usize; nice.len()];
        for id in nice.post_order().unwrap() {
            let node = nice.node(id);
            let below = node.children().map(|c| nesting[c]).max().unwrap_or(0);
            let here = usize::from(matches!(node.kind(), NodeKind::Join { .. }));
            nesting[id] = below + here;
        }
        assert_eq!(nesting[nice.root()], 6);
    }

    #[test]
    fn test_to_nice_empty_graph() {
        let g = Graph::new(0);
        let nice = TreeDecomposition::trivial(0).to_nice(&g).unwrap();
        assert_eq!(nice.len(), 1);
        assert_eq!(nice.node(nice.root()).kind(), NodeKind::Leaf);
    }
}
