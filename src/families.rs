//! Named graph families with ready-made tree decompositions.

use std::fmt;

use itertools::{iproduct, Itertools};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{Graph, HomError, NiceTreeDecomposition, TreeDecomposition};

/// A graph family instance, as accepted on the command line.
#[derive(Debug, Clone, PartialEq)]
pub enum Family {
    /// Path on `n` vertices
    Path(usize),
    /// Cycle on `n >= 3` vertices
    Cycle(usize),
    /// Complete graph on `n` vertices
    Clique(usize),
    /// Star K_{1,n}: center 0 with `n` leaves
    Star(usize),
    /// Complete bipartite graph K_{a,b}
    CompleteBipartite(usize, usize),
    /// `n` isolated vertices
    Edgeless(usize),
    /// Erdős–Rényi G(n, p), seeded
    Gnp { n: usize, p: f64, seed: u64 },
}

impl Family {
    /// Check the parameters can produce a graph.
    pub fn check(&self) -> Result<(), HomError> {
        match *self {
            Family::Cycle(n) if n < 3 => Err(HomError::InvalidFamily(format!(
                "a cycle needs at least 3 vertices, got {}",
                n
            ))),
            Family::Gnp { p, .. } if !(0.0..=1.0).contains(&p) => Err(HomError::InvalidFamily(
                format!("edge probability {} is not in [0, 1]", p),
            )),
            Family::Star(n) if n.checked_add(1).is_none() => Err(HomError::InvalidFamily(
                format!("a star with {} leaves has too many vertices", n),
            )),
            Family::CompleteBipartite(a, b) if a.checked_add(b).is_none() => {
                Err(HomError::InvalidFamily(format!(
                    "K_{{{},{}}} has too many vertices",
                    a, b
                )))
            }
            _ => Ok(()),
        }
    }

    pub fn num_vertices(&self) -> usize {
        match *self {
            Family::Path(n) | Family::Cycle(n) | Family::Clique(n) | Family::Edgeless(n) => n,
            Family::Star(n) => n.saturating_add(1),
            Family::CompleteBipartite(a, b) => a.saturating_add(b),
            Family::Gnp { n, .. } => n,
        }
    }

    pub fn graph(&self) -> Result<Graph, HomError> {
        self.check()?;
        let n = self.num_vertices();
        let edges: Vec<(usize, usize)> = match *self {
            Family::Path(n) => (1..n).map(|i| (i - 1, i)).collect(),
            Family::Cycle(n) => (0..n).map(|i| (i, (i + 1) % n)).collect(),
            Family::Clique(n) => (0..n).tuple_combinations().collect(),
            Family::Star(leaves) => (1..=leaves).map(|i| (0, i)).collect(),
            Family::CompleteBipartite(a, b) => iproduct!(0..a, a..a + b).collect(),
            Family::Edgeless(_) => Vec::new(),
            Family::Gnp { n, p, seed } => {
                let mut rng = StdRng::seed_from_u64(seed);
                (0..n)
                    .tuple_combinations()
                    .filter(|_| rng.gen::<f64>() < p)
                    .collect()
            }
        };
        Graph::from_edges(n, &edges)
    }

    /// A tree decomposition of [`graph`](Self::graph).
    ///
    /// Paths, stars and edgeless graphs get width 1 or less, cycles width 2,
    /// K_{a,b} width `min(a, b)`; cliques and random graphs fall back to a
    /// single bag.
    pub fn tree_decomposition(&self) -> Result<TreeDecomposition, HomError> {
        self.check()?;
        let td = match *self {
            Family::Path(n) if n >= 2 => {
                TreeDecomposition::chain((1..n).map(|i| vec![i - 1, i]).collect())
            }
            Family::Cycle(n) => {
                TreeDecomposition::chain((1..n - 1).map(|i| vec![0, i, i + 1]).collect())
            }
            Family::Star(leaves) if leaves >= 1 => TreeDecomposition::new(
                (1..=leaves).map(|i| vec![0, i]).collect(),
                (1..leaves).map(|i| (0, i)).collect(),
            ),
            Family::CompleteBipartite(a, b) if a > 0 && b > 0 => {
                // Keep the smaller side in every bag.
                let (small, large) = if a <= b { (0..a, a..a + b) } else { (a..a + b, 0..a) };
                TreeDecomposition::chain(
                    large
                        .map(|v| small.clone().chain(std::iter::once(v)).collect())
                        .collect(),
                )
            }
            Family::Edgeless(n) => TreeDecomposition::chain((0..n).map(|v| vec![v]).collect()),
            _ => TreeDecomposition::trivial(self.num_vertices()),
        };
        Ok(td)
    }

    /// The graph together with a nice decomposition of it.
    pub fn with_nice_decomposition(&self) -> Result<(Graph, NiceTreeDecomposition), HomError> {
        let graph = self.graph()?;
        let nice = self.tree_decomposition()?.to_nice(&graph)?;
        Ok((graph, nice))
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Family::Path(n) => write!(f, "path:{}", n),
            Family::Cycle(n) => write!(f, "cycle:{}", n),
            Family::Clique(n) => write!(f, "clique:{}", n),
            Family::Star(n) => write!(f, "star:{}", n),
            Family::CompleteBipartite(a, b) => write!(f, "bipartite:{}:{}", a, b),
            Family::Edgeless(n) => write!(f, "empty:{}", n),
            Family::Gnp { n, p, seed } => write!(f, "gnp:{}:{}:{}", n, p, seed),
        }
    }
}
