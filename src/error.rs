//! Error types for homomorphism counting.
//!
//! Every failure is structural: a malformed decomposition, a count that does
//! not fit the chosen width, or a table that would not fit in memory. None of
//! them is transient, so the whole count is aborted on the first one.

use thiserror::Error;

use crate::decomposition::NodeId;

/// Errors reported by graph construction, decomposition handling and the DP.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HomError {
    /// A nice tree decomposition violates its shape contract at `node`.
    #[error("malformed decomposition at node {node}: {reason}")]
    MalformedDecomposition { node: NodeId, reason: String },

    /// A table entry exceeded `u64` under `OverflowPolicy::Checked`.
    #[error("homomorphism count overflowed at node {node}")]
    Overflow { node: NodeId },

    /// A row of `target_size^width` entries exceeds the configured limit.
    #[error(
        "table row at node {node} needs {target_size}^{width} entries, above the limit of {limit}"
    )]
    TableTooLarge {
        node: NodeId,
        target_size: usize,
        width: usize,
        limit: usize,
    },

    /// A plain tree decomposition is not a tree decomposition of its graph.
    #[error("invalid tree decomposition: {0}")]
    InvalidTreeDecomposition(String),

    /// A graph could not be built from the given data.
    #[error("invalid graph: {0}")]
    InvalidGraph(String),

    /// A graph family descriptor could not be parsed or instantiated.
    #[error("invalid graph family: {0}")]
    InvalidFamily(String),
}

impl HomError {
    /// Create a malformed-decomposition error.
    pub fn malformed(node: NodeId, reason: impl Into<String>) -> Self {
        Self::MalformedDecomposition {
            node,
            reason: reason.into(),
        }
    }

    /// Create an invalid-tree-decomposition error.
    pub fn invalid_td(msg: impl Into<String>) -> Self {
        Self::InvalidTreeDecomposition(msg.into())
    }
}
