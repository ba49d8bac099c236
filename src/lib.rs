use itertools::Itertools;

/// Edge-existence queries on an immutable graph with vertices `0..n`.
///
/// This is all the DP needs from either graph. Implementors are shared
/// across rayon workers when counting in parallel.
pub trait Adjacency: Sync {
    fn vertex_count(&self) -> usize;

    fn has_edge(&self, u: usize, v: usize) -> bool;

    /// Neighbors of `u` in increasing order, `u` itself included if it has a loop.
    fn adjacent(&self, u: usize) -> Vec<usize> {
        (0..self.vertex_count()).filter(|&v| self.has_edge(u, v)).collect()
    }
}

/// Represents an undirected graph with a symmetric adjacency matrix.
///
/// Self-loops are allowed and are stored on the diagonal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Graph {
    /// Number of vertices
    pub n: usize,
    /// Adjacency matrix: adj[i][j] = adj[j][i] = whether i and j are adjacent
    pub adj: Vec<Vec<bool>>,
}

impl Graph {
    pub fn new(n: usize) -> Self {
        Graph {
            n,
            adj: vec![vec![false; n]; n],
        }
    }

    pub fn from_adjacency_matrix(adj: Vec<Vec<bool>>) -> Result<Self, HomError> {
        let n = adj.len();
        if let Some(i) = adj.iter().position(|row| row.len() != n) {
            return Err(HomError::InvalidGraph(format!(
                "row {} has {} entries, expected {}",
                i,
                adj[i].len(),
                n
            )));
        }
        for (i, j) in (0..n).tuple_combinations() {
            if adj[i][j] != adj[j][i] {
                return Err(HomError::InvalidGraph(format!(
                    "matrix is not symmetric at ({}, {})",
                    i, j
                )));
            }
        }
        Ok(Graph { n, adj })
    }

    pub fn from_edges(n: usize, edges: &[(usize, usize)]) -> Result<Self, HomError> {
        let mut g = Graph::new(n);
        for &(u, v) in edges {
            g.add_edge(u, v)?;
        }
        Ok(g)
    }

    pub fn add_edge(&mut self, u: usize, v: usize) -> Result<(), HomError> {
        if u >= self.n || v >= self.n {
            return Err(HomError::InvalidGraph(format!(
                "edge ({}, {}) out of range for {} vertices",
                u, v, self.n
            )));
        }
        self.adj[u][v] = true;
        self.adj[v][u] = true;
        Ok(())
    }

    pub fn num_vertices(&self) -> usize {
        self.n
    }

    /// Number of edges, each loop counted once.
    pub fn num_edges(&self) -> usize {
        (0..self.n)
            .flat_map(|u| (u..self.n).map(move |v| (u, v)))
            .filter(|&(u, v)| self.adj[u][v])
            .count()
    }

    pub fn neighbors(&self, u: usize) -> impl Iterator<Item = usize> + '_ {
        self.adj[u]
            .iter()
            .enumerate()
            .filter_map(|(v, &adjacent)| adjacent.then_some(v))
    }

    /// Fraction of the `n(n-1)/2` vertex pairs that are adjacent; loops are ignored.
    pub fn density(&self) -> f64 {
        if self.n < 2 {
            return 0.0;
        }
        let loops = (0..self.n).filter(|&v| self.adj[v][v]).count();
        let pairs = self.n * (self.n - 1) / 2;
        (self.num_edges() - loops) as f64 / pairs as f64
    }

    /// The same graph with a loop on every vertex.
    pub fn with_loops(&self) -> Self {
        let mut g = self.clone();
        for v in 0..g.n {
            g.adj[v][v] = true;
        }
        g
    }
}

impl Adjacency for Graph {
    fn vertex_count(&self) -> usize {
        self.n
    }

    fn has_edge(&self, u: usize, v: usize) -> bool {
        self.adj[u][v]
    }
}

/// Adjacency-list form of a graph, for sparse targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparseGraph {
    /// Sorted neighbor lists
    adj: Vec<Vec<usize>>,
}

impl SparseGraph {
    /// Build adjacency lists directly, without an `n` x `n` matrix.
    pub fn from_edges(n: usize, edges: &[(usize, usize)]) -> Result<Self, HomError> {
        let mut adj = vec![Vec::new(); n];
        for &(u, v) in edges {
            if u >= n || v >= n {
                return Err(HomError::InvalidGraph(format!(
                    "edge ({}, {}) out of range for {} vertices",
                    u, v, n
                )));
            }
            adj[u].push(v);
            if u != v {
                adj[v].push(u);
            }
        }
        for list in &mut adj {
            list.sort_unstable();
            list.dedup();
        }
        Ok(SparseGraph { adj })
    }

    pub fn neighbors(&self, u: usize) -> &[usize] {
        &self.adj[u]
    }
}

impl From<&Graph> for SparseGraph {
    fn from(g: &Graph) -> Self {
        SparseGraph {
            adj: (0..g.n).map(|u| g.neighbors(u).collect()).collect(),
        }
    }
}

impl Adjacency for SparseGraph {
    fn vertex_count(&self) -> usize {
        self.adj.len()
    }

    fn has_edge(&self, u: usize, v: usize) -> bool {
        self.adj[u].binary_search(&v).is_ok()
    }

    fn adjacent(&self, u: usize) -> Vec<usize> {
        self.adj[u].clone()
    }
}

/// Images of source vertices, indexed by source vertex
pub type Mapping = Vec<usize>;

/// Homomorphism count stored in each table entry
pub type Count = u64;

// Module declarations
pub mod config;
pub mod decomposition;
pub mod dp;
pub mod encoding;
pub mod error;
pub mod families;
pub mod mapping;
pub mod parser;
pub mod tree_decomposition;

pub use config::{CountConfig, OverflowPolicy};
pub use decomposition::{
    NiceTreeDecomposition, NiceTreeDecompositionBuilder, NodeId, NodeKind, TreeNode,
};
pub use dp::{count_homomorphisms, DpTable, HomomorphismCounter};
pub use error::HomError;
pub use tree_decomposition::TreeDecomposition;

/// Count homomorphisms between two concrete graphs.
///
/// Targets sparser than `config.density_threshold` are queried through a
/// `SparseGraph` copy; denser ones through the adjacency matrix.
pub fn count_graph_homomorphisms(
    decomposition: &NiceTreeDecomposition,
    source: &Graph,
    target: &Graph,
    config: &CountConfig,
) -> Result<Count, HomError> {
    if target.density() < config.density_threshold {
        let sparse = SparseGraph::from(target);
        HomomorphismCounter::new(decomposition, source, &sparse)
            .with_config(config.clone())
            .count()
    } else {
        HomomorphismCounter::new(decomposition, source, target)
            .with_config(config.clone())
            .count()
    }
}
