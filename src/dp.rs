//! Dynamic program over a nice tree decomposition.
//!
//! Row `r` of the table belongs to decomposition node `r`. Entry `m` of a
//! row counts the homomorphisms of the graph induced by the node's subtree
//! that map the node's bag according to the encoded mapping `m`. Rows are
//! written once, children strictly before parents; the root's single entry
//! is the total count.

use std::collections::HashMap;

use rayon::prelude::*;

use crate::config::CountConfig;
use crate::decomposition::{NiceTreeDecomposition, NodeId, NodeKind};
use crate::encoding::{extract_digit, insert_digit, remove_digit, row_len};
use crate::mapping::is_valid_mapping;
use crate::{Adjacency, Count, HomError};

/// One table row: counts indexed by bag mapping.
pub type Row = Vec<Count>;

/// Joins nested deeper than this are evaluated without forking.
const MAX_FORK_DEPTH: usize = 32;

/// Rows of every node processed by [`HomomorphismCounter::compute_table`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DpTable {
    rows: Vec<Option<Row>>,
    root: NodeId,
}

impl DpTable {
    /// Row of `node`, if it was computed.
    pub fn row(&self, node: NodeId) -> Option<&[Count]> {
        self.rows.get(node)?.as_deref()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The root's entry: the total homomorphism count.
    pub fn root_count(&self) -> Option<Count> {
        self.row(self.root)?.first().copied()
    }
}

/// Counts homomorphisms from `source` to `target` along a nice tree
/// decomposition of `source`.
pub struct HomomorphismCounter<'a, S: ?Sized, T: ?Sized> {
    decomposition: &'a NiceTreeDecomposition,
    source: &'a S,
    target: &'a T,
    config: CountConfig,
}

impl<'a, S, T> HomomorphismCounter<'a, S, T>
where
    S: Adjacency + ?Sized,
    T: Adjacency + ?Sized,
{
    pub fn new(decomposition: &'a NiceTreeDecomposition, source: &'a S, target: &'a T) -> Self {
        Self {
            decomposition,
            source,
            target,
            config: CountConfig::default(),
        }
    }

    pub fn with_config(mut self, config: CountConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &CountConfig {
        &self.config
    }

    /// Total number of homomorphisms.
    pub fn count(&self) -> Result<Count, HomError> {
        let order = self.prepare()?;
        let root = self.decomposition.root();

        let count = if self.config.parallel {
            self.evaluate_subtree(root, 0)?[0]
        } else {
            let table = self.fill_table(&order)?;
            table
                .root_count()
                .ok_or_else(|| HomError::malformed(root, "root row was not computed"))?
        };

        tracing::info!("homomorphism count: {}", count);
        Ok(count)
    }

    /// Fill every row in post-order and return the whole table.
    pub fn compute_table(&self) -> Result<DpTable, HomError> {
        let order = self.prepare()?;
        self.fill_table(&order)
    }

    /// Validate as configured and produce the processing order.
    fn prepare(&self) -> Result<Vec<NodeId>, HomError> {
        let td = self.decomposition;
        tracing::info!(
            "counting homomorphisms: source vertices: {}, target vertices: {}, \
             decomposition nodes: {}, treewidth: {}",
            self.source.vertex_count(),
            self.target.vertex_count(),
            td.len(),
            td.treewidth()
        );

        if self.config.validate {
            td.validate(self.source)?;
        }
        let order = td.post_order()?;
        let root = td.root();
        if !td.node(root).bag().is_empty() {
            return Err(HomError::malformed(root, "root bag is not empty"));
        }
        Ok(order)
    }

    fn fill_table(&self, order: &[NodeId]) -> Result<DpTable, HomError> {
        let td = self.decomposition;
        let mut rows: Vec<Option<Row>> = vec![None; td.len()];

        for &id in order {
            let row = match td.node(id).kind() {
                NodeKind::Leaf => self.leaf(id)?,
                NodeKind::Introduce { vertex, child } => {
                    self.introduce(id, vertex, stored_row(&rows, id, child)?)?
                }
                NodeKind::Forget { vertex, child } => {
                    self.forget(id, vertex, stored_row(&rows, id, child)?)?
                }
                NodeKind::Join { left, right } => self.join(
                    id,
                    stored_row(&rows, id, left)?,
                    stored_row(&rows, id, right)?,
                )?,
            };
            rows[id] = Some(row);
        }

        Ok(DpTable {
            rows,
            root: td.root(),
        })
    }

    /// Row of the subtree at `id`, forking the two sides of every join.
    ///
    /// Runs of introduce and forget nodes are walked iteratively. Only the
    /// first `MAX_FORK_DEPTH` levels of joins recurse; deeper subtrees go
    /// through [`evaluate_sequential`](Self::evaluate_sequential).
    fn evaluate_subtree(&self, id: NodeId, depth: usize) -> Result<Row, HomError> {
        if depth > MAX_FORK_DEPTH {
            return self.evaluate_sequential(id);
        }
        let td = self.decomposition;
        let mut chain = Vec::new();
        let mut current = id;

        let mut row = loop {
            match td.node(current).kind() {
                NodeKind::Introduce { child, .. } | NodeKind::Forget { child, .. } => {
                    chain.push(current);
                    current = child;
                }
                NodeKind::Leaf => break self.leaf(current)?,
                NodeKind::Join { left, right } => {
                    let (left_row, right_row) = rayon::join(
                        || self.evaluate_subtree(left, depth + 1),
                        || self.evaluate_subtree(right, depth + 1),
                    );
                    break self.join(current, &left_row?, &right_row?)?;
                }
            }
        };

        for &node in chain.iter().rev() {
            row = match td.node(node).kind() {
                NodeKind::Introduce { vertex, .. } => self.introduce(node, vertex, &row)?,
                NodeKind::Forget { vertex, .. } => self.forget(node, vertex, &row)?,
                NodeKind::Leaf | NodeKind::Join { .. } => {
                    return Err(HomError::malformed(node, "chain holds a node with no single child"))
                }
            };
        }
        Ok(row)
    }

    /// Row of the subtree at `id` by an explicit-stack post-order walk.
    ///
    /// A child's row is dropped as soon as its parent is computed.
    fn evaluate_sequential(&self, id: NodeId) -> Result<Row, HomError> {
        let td = self.decomposition;
        let mut rows: HashMap<NodeId, Row> = HashMap::new();

        for node in td.post_order_from(id)? {
            let row = match td.node(node).kind() {
                NodeKind::Leaf => self.leaf(node)?,
                NodeKind::Introduce { vertex, child } => {
                    self.introduce(node, vertex, &take_row(&mut rows, node, child)?)?
                }
                NodeKind::Forget { vertex, child } => {
                    self.forget(node, vertex, &take_row(&mut rows, node, child)?)?
                }
                NodeKind::Join { left, right } => {
                    let left_row = take_row(&mut rows, node, left)?;
                    let right_row = take_row(&mut rows, node, right)?;
                    self.join(node, &left_row, &right_row)?
                }
            };
            rows.insert(node, row);
        }

        rows.remove(&id)
            .ok_or_else(|| HomError::malformed(id, "subtree row was not computed"))
    }

    fn leaf(&self, id: NodeId) -> Result<Row, HomError> {
        self.decomposition.check_node(id)?;
        tracing::debug!("node {}: leaf", id);
        Ok(vec![1])
    }

    /// The new vertex takes every target image adjacent to the images of
    /// its bag neighbors; each entry copies the count of the child mapping
    /// it extends, or stays 0.
    fn introduce(&self, id: NodeId, vertex: usize, child_row: &[Count]) -> Result<Row, HomError> {
        let position = self.changed_position(id)?;
        let bag = self.decomposition.node(id).bag();
        let n = self.target.vertex_count();
        let len = self.row_len(id, bag.len())?;
        if let Some(&u) = bag.iter().find(|&&u| u >= self.source.vertex_count()) {
            return Err(HomError::malformed(id, format!("bag vertex {} is not a source vertex", u)));
        }

        // Includes `position` itself when the source has a loop at `vertex`.
        let neighbor_positions: Vec<usize> = bag
            .iter()
            .enumerate()
            .filter(|&(_, &u)| self.source.has_edge(vertex, u))
            .map(|(i, _)| i)
            .collect();
        tracing::debug!(
            "node {}: introduce vertex {} at position {}, {} bag neighbors, row length {}",
            id,
            vertex,
            position,
            neighbor_positions.len(),
            len
        );

        let target = self.target;
        self.build_row(len, |mapping| {
            let image = extract_digit(mapping, position, n);
            let neighbor_images = neighbor_positions
                .iter()
                .map(|&q| extract_digit(mapping, q, n));
            if is_valid_mapping(image, neighbor_images, target) {
                Ok(child_row[remove_digit(mapping, position, n)])
            } else {
                Ok(0)
            }
        })
    }

    /// Sum the child's counts over every image of the forgotten vertex.
    fn forget(&self, id: NodeId, vertex: usize, child_row: &[Count]) -> Result<Row, HomError> {
        let position = self.changed_position(id)?;
        let n = self.target.vertex_count();
        let len = self.row_len(id, self.decomposition.node(id).width())?;
        tracing::debug!(
            "node {}: forget vertex {} at child position {}, row length {}",
            id,
            vertex,
            position,
            len
        );

        let overflow = self.config.overflow;
        self.build_row(len, |mapping| {
            (0..n).try_fold(0, |sum: Count, image| {
                overflow
                    .add(sum, child_row[insert_digit(image, mapping, position, n)])
                    .ok_or(HomError::Overflow { node: id })
            })
        })
    }

    /// Elementwise product of the two children's rows.
    fn join(&self, id: NodeId, left: &[Count], right: &[Count]) -> Result<Row, HomError> {
        self.decomposition.check_node(id)?;
        if left.len() != right.len() {
            return Err(HomError::malformed(id, "join children rows differ in length"));
        }
        tracing::debug!("node {}: join, row length {}", id, left.len());

        let overflow = self.config.overflow;
        self.build_row(left.len(), |mapping| {
            overflow
                .mul(left[mapping], right[mapping])
                .ok_or(HomError::Overflow { node: id })
        })
    }

    fn changed_position(&self, id: NodeId) -> Result<usize, HomError> {
        self.decomposition
            .check_node(id)?
            .ok_or_else(|| HomError::malformed(id, "node has no changed vertex"))
    }

    fn row_len(&self, id: NodeId, width: usize) -> Result<usize, HomError> {
        let target_size = self.target.vertex_count();
        let limit = self.config.max_row_len;
        row_len(target_size, width)
            .filter(|&len| len <= limit)
            .ok_or(HomError::TableTooLarge {
                node: id,
                target_size,
                width,
                limit,
            })
    }

    fn build_row<F>(&self, len: usize, entry: F) -> Result<Row, HomError>
    where
        F: Fn(usize) -> Result<Count, HomError> + Sync + Send,
    {
        if self.config.parallel {
            (0..len).into_par_iter().map(entry).collect()
        } else {
            (0..len).map(entry).collect()
        }
    }
}

fn stored_row(rows: &[Option<Row>], parent: NodeId, child: NodeId) -> Result<&[Count], HomError> {
    rows[child].as_deref().ok_or_else(|| {
        HomError::malformed(parent, format!("child {} was not processed first", child))
    })
}

fn take_row(
    rows: &mut HashMap<NodeId, Row>,
    parent: NodeId,
    child: NodeId,
) -> Result<Row, HomError> {
    rows.remove(&child).ok_or_else(|| {
        HomError::malformed(parent, format!("child {} was not processed first", child))
    })
}

/// Count homomorphisms from `source` to `target` with the default
/// configuration.
pub fn count_homomorphisms<S, T>(
    decomposition: &NiceTreeDecomposition,
    source: &S,
    target: &T,
) -> Result<Count, HomError>
where
    S: Adjacency + ?Sized,
    T: Adjacency + ?Sized,
{
    HomomorphismCounter::new(decomposition, source, target).count()
}
