//! Nice tree decompositions stored as an arena of nodes.
//!
//! Every node carries an ordered bag and a [`NodeKind`] that holds its child
//! indices inline, so a join without two children cannot be expressed. Bags
//! produced by [`NiceTreeDecompositionBuilder`] are kept sorted; the DP only
//! relies on a node and its children agreeing on the order of shared
//! vertices.

use std::collections::HashSet;

use crate::{Adjacency, HomError};

/// Index of a node in the arena; also its row in the DP table.
pub type NodeId = usize;

/// The four node kinds of a nice tree decomposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// No children, empty bag.
    Leaf,
    /// Bag is the child's bag plus `vertex`.
    Introduce { vertex: usize, child: NodeId },
    /// Bag is the child's bag minus `vertex`.
    Forget { vertex: usize, child: NodeId },
    /// Two children whose bags equal this node's bag.
    Join { left: NodeId, right: NodeId },
}

/// One node of a nice tree decomposition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    bag: Vec<usize>,
    kind: NodeKind,
}

impl TreeNode {
    pub fn new(bag: Vec<usize>, kind: NodeKind) -> Self {
        Self { bag, kind }
    }

    pub fn bag(&self) -> &[usize] {
        &self.bag
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn width(&self) -> usize {
        self.bag.len()
    }

    /// The vertex added or removed relative to the child, if any.
    pub fn changed_vertex(&self) -> Option<usize> {
        match self.kind {
            NodeKind::Introduce { vertex, .. } | NodeKind::Forget { vertex, .. } => Some(vertex),
            NodeKind::Leaf | NodeKind::Join { .. } => None,
        }
    }

    pub fn children(&self) -> impl Iterator<Item = NodeId> {
        let pair = match self.kind {
            NodeKind::Leaf => [None, None],
            NodeKind::Introduce { child, .. } | NodeKind::Forget { child, .. } => {
                [Some(child), None]
            }
            NodeKind::Join { left, right } => [Some(left), Some(right)],
        };
        pair.into_iter().flatten()
    }

    fn position(&self, vertex: usize) -> Option<usize> {
        self.bag.iter().position(|&u| u == vertex)
    }
}

/// A rooted nice tree decomposition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NiceTreeDecomposition {
    nodes: Vec<TreeNode>,
    root: NodeId,
}

impl NiceTreeDecomposition {
    pub fn builder() -> NiceTreeDecompositionBuilder {
        NiceTreeDecompositionBuilder::default()
    }

    /// Wrap nodes built elsewhere. Nothing is checked here; see
    /// [`validate`](Self::validate).
    pub fn from_nodes(nodes: Vec<TreeNode>, root: NodeId) -> Self {
        Self { nodes, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id]
    }

    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Largest bag size minus one (0 for a decomposition of empty bags).
    pub fn treewidth(&self) -> usize {
        self.nodes
            .iter()
            .map(TreeNode::width)
            .max()
            .unwrap_or(0)
            .saturating_sub(1)
    }

    /// Nodes reachable from the root, every child before its parent.
    pub fn post_order(&self) -> Result<Vec<NodeId>, HomError> {
        self.post_order_from(self.root)
    }

    /// Nodes of the subtree at `start`, every child before its parent.
    pub fn post_order_from(&self, start: NodeId) -> Result<Vec<NodeId>, HomError> {
        if start >= self.nodes.len() {
            return Err(HomError::malformed(start, "subtree root is not a node"));
        }

        let mut order = Vec::new();
        let mut seen = vec![false; self.nodes.len()];
        let mut stack = vec![(start, false)];

        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                order.push(id);
                continue;
            }
            if seen[id] {
                return Err(HomError::malformed(id, "node is reachable along two paths"));
            }
            seen[id] = true;
            stack.push((id, true));
            for child in self.nodes[id].children() {
                if child >= self.nodes.len() {
                    return Err(HomError::malformed(id, format!("child {} is not a node", child)));
                }
                stack.push((child, false));
            }
        }

        Ok(order)
    }

    /// Check the shape of one node against its children.
    ///
    /// Returns the bag position of the changed vertex: in this node's bag
    /// for an introduce, in the child's bag for a forget.
    pub(crate) fn check_node(&self, id: NodeId) -> Result<Option<usize>, HomError> {
        let node = &self.nodes[id];
        match node.kind {
            NodeKind::Leaf => {
                if node.bag.is_empty() {
                    Ok(None)
                } else {
                    Err(HomError::malformed(id, "leaf bag is not empty"))
                }
            }
            NodeKind::Introduce { vertex, child } => {
                let position = node.position(vertex).ok_or_else(|| {
                    HomError::malformed(
                        id,
                        format!("introduced vertex {} is not in the bag", vertex),
                    )
                })?;
                if !bag_without(&node.bag, position).eq(self.nodes[child].bag.iter().copied()) {
                    return Err(HomError::malformed(
                        id,
                        format!("bag is not child {}'s bag plus vertex {}", child, vertex),
                    ));
                }
                Ok(Some(position))
            }
            NodeKind::Forget { vertex, child } => {
                let child_node = &self.nodes[child];
                let position = child_node.position(vertex).ok_or_else(|| {
                    HomError::malformed(
                        id,
                        format!("forgotten vertex {} is not in child {}'s bag", vertex, child),
                    )
                })?;
                if !bag_without(&child_node.bag, position).eq(node.bag.iter().copied()) {
                    return Err(HomError::malformed(
                        id,
                        format!("bag is not child {}'s bag minus vertex {}", child, vertex),
                    ));
                }
                Ok(Some(position))
            }
            NodeKind::Join { left, right } => {
                if self.nodes[left].bag != node.bag || self.nodes[right].bag != node.bag {
                    return Err(HomError::malformed(
                        id,
                        format!("join children {} and {} do not share its bag", left, right),
                    ));
                }
                Ok(None)
            }
        }
    }

    /// Check that this is a nice tree decomposition of `source`.
    ///
    /// Beyond the per-node shape this requires: every node reachable from
    /// the root exactly once, an empty root bag, distinct in-range bag
    /// vertices, every source vertex forgotten exactly once (so the nodes
    /// holding it form one subtree), and every edge inside some bag.
    pub fn validate<G: Adjacency + ?Sized>(&self, source: &G) -> Result<(), HomError> {
        let order = self.post_order()?;
        if order.len() != self.nodes.len() {
            let unreachable = (0..self.nodes.len())
                .find(|id| !order.contains(id))
                .unwrap_or(self.root);
            return Err(HomError::malformed(unreachable, "node is not reachable from the root"));
        }
        if !self.nodes[self.root].bag.is_empty() {
            return Err(HomError::malformed(self.root, "root bag is not empty"));
        }

        let n = source.vertex_count();
        let mut forgotten = vec![0usize; n];
        let mut covered: HashSet<(usize, usize)> = HashSet::new();

        for &id in &order {
            let node = &self.nodes[id];
            let mut seen = HashSet::with_capacity(node.bag.len());
            for &v in &node.bag {
                if v >= n {
                    return Err(HomError::malformed(
                        id,
                        format!("bag vertex {} is out of range for {} vertices", v, n),
                    ));
                }
                if !seen.insert(v) {
                    return Err(HomError::malformed(id, format!("vertex {} repeats in the bag", v)));
                }
            }
            self.check_node(id)?;

            if let NodeKind::Forget { vertex, .. } = node.kind {
                forgotten[vertex] += 1;
            }
            for (i, &u) in node.bag.iter().enumerate() {
                for &v in &node.bag[i..] {
                    covered.insert((u.min(v), u.max(v)));
                }
            }
        }

        if let Some(v) = (0..n).find(|&v| forgotten[v] != 1) {
            return Err(HomError::malformed(
                self.root,
                format!("vertex {} is forgotten {} times, expected once", v, forgotten[v]),
            ));
        }
        for u in 0..n {
            for v in source.adjacent(u).into_iter().filter(|&v| v >= u) {
                if !covered.contains(&(u, v)) {
                    return Err(HomError::malformed(
                        self.root,
                        format!("edge ({}, {}) is not contained in any bag", u, v),
                    ));
                }
            }
        }

        Ok(())
    }
}

fn bag_without(bag: &[usize], position: usize) -> impl Iterator<Item = usize> + '_ {
    bag.iter()
        .enumerate()
        .filter(move |&(i, _)| i != position)
        .map(|(_, &u)| u)
}

/// Incremental, checked construction of a nice tree decomposition.
///
/// Children must be created before their parents and may be attached to a
/// single parent only.
#[derive(Debug, Clone, Default)]
pub struct NiceTreeDecompositionBuilder {
    nodes: Vec<TreeNode>,
    has_parent: Vec<bool>,
}

impl NiceTreeDecompositionBuilder {
    pub fn leaf(&mut self) -> NodeId {
        self.push(TreeNode::new(Vec::new(), NodeKind::Leaf))
    }

    /// Add `vertex` to the child's bag, keeping the bag sorted.
    pub fn introduce(&mut self, child: NodeId, vertex: usize) -> Result<NodeId, HomError> {
        self.claim(child)?;
        let mut bag = self.nodes[child].bag.clone();
        match bag.binary_search(&vertex) {
            Ok(_) => {
                self.has_parent[child] = false;
                Err(HomError::malformed(
                    self.nodes.len(),
                    format!("vertex {} is already in child {}'s bag", vertex, child),
                ))
            }
            Err(position) => {
                bag.insert(position, vertex);
                Ok(self.push(TreeNode::new(bag, NodeKind::Introduce { vertex, child })))
            }
        }
    }

    /// Remove `vertex` from the child's bag.
    pub fn forget(&mut self, child: NodeId, vertex: usize) -> Result<NodeId, HomError> {
        self.claim(child)?;
        let mut bag = self.nodes[child].bag.clone();
        match bag.iter().position(|&u| u == vertex) {
            Some(position) => {
                bag.remove(position);
                Ok(self.push(TreeNode::new(bag, NodeKind::Forget { vertex, child })))
            }
            None => {
                self.has_parent[child] = false;
                Err(HomError::malformed(
                    self.nodes.len(),
                    format!("vertex {} is not in child {}'s bag", vertex, child),
                ))
            }
        }
    }

    /// Join two subtrees with identical bags.
    pub fn join(&mut self, left: NodeId, right: NodeId) -> Result<NodeId, HomError> {
        let id = self.nodes.len();
        if left == right {
            return Err(HomError::malformed(id, "join children must be distinct"));
        }
        for child in [left, right] {
            if child >= self.nodes.len() {
                return Err(HomError::malformed(id, format!("child {} is not a node", child)));
            }
            if self.has_parent[child] {
                return Err(HomError::malformed(
                    id,
                    format!("child {} already has a parent", child),
                ));
            }
        }
        if self.nodes[left].bag != self.nodes[right].bag {
            return Err(HomError::malformed(
                id,
                format!("join children {} and {} have different bags", left, right),
            ));
        }
        self.has_parent[left] = true;
        self.has_parent[right] = true;
        let bag = self.nodes[left].bag.clone();
        Ok(self.push(TreeNode::new(bag, NodeKind::Join { left, right })))
    }

    /// Bag of a node created so far.
    pub fn bag(&self, id: NodeId) -> &[usize] {
        &self.nodes[id].bag
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Finish with `root` as the root; every other node must have a parent.
    pub fn build(self, root: NodeId) -> Result<NiceTreeDecomposition, HomError> {
        if root >= self.nodes.len() {
            return Err(HomError::malformed(root, "root is not a node"));
        }
        if self.has_parent[root] {
            return Err(HomError::malformed(root, "root has a parent"));
        }
        if let Some(orphan) = (0..self.nodes.len()).find(|&id| id != root && !self.has_parent[id]) {
            return Err(HomError::malformed(orphan, "node is not attached to the tree"));
        }
        Ok(NiceTreeDecomposition::from_nodes(self.nodes, root))
    }

    fn claim(&mut self, child: NodeId) -> Result<(), HomError> {
        let id = self.nodes.len();
        if child >= id {
            return Err(HomError::malformed(id, format!("child {} is not a node", child)));
        }
        if self.has_parent[child] {
            return Err(HomError::malformed(id, format!("child {} already has a parent", child)));
        }
        self.has_parent[child] = true;
        Ok(())
    }

    fn push(&mut self, node: TreeNode) -> NodeId {
        self.nodes.push(node);
        self.has_parent.push(false);
        self.nodes.len() - 1
    }
}
