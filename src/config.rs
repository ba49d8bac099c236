//! Configuration for a homomorphism count.
//!
//! Quick examples
//!
//! Defaults (checked arithmetic, sequential, full validation):
//! ```ignore
//! use tree_hom_count::CountConfig;
//! let cfg = CountConfig::default();
//! ```
//!
//! Parallel walk that accepts wraparound modulo 2^64:
//! ```ignore
//! use tree_hom_count::{CountConfig, OverflowPolicy};
//! let cfg = CountConfig::default()
//!     .parallel(true)
//!     .overflow(OverflowPolicy::Wrapping);
//! ```

use crate::Count;

/// Default cap on the number of entries in a single table row.
pub const DEFAULT_MAX_ROW_LEN: usize = 1 << 26;

/// What happens when a count no longer fits in a `u64`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Abort the count with `HomError::Overflow`.
    #[default]
    Checked,
    /// Keep going modulo 2^64.
    Wrapping,
}

impl OverflowPolicy {
    /// Add two counts; `None` signals overflow.
    #[inline]
    pub fn add(self, a: Count, b: Count) -> Option<Count> {
        match self {
            Self::Checked => a.checked_add(b),
            Self::Wrapping => Some(a.wrapping_add(b)),
        }
    }

    /// Multiply two counts; `None` signals overflow.
    #[inline]
    pub fn mul(self, a: Count, b: Count) -> Option<Count> {
        match self {
            Self::Checked => a.checked_mul(b),
            Self::Wrapping => Some(a.wrapping_mul(b)),
        }
    }
}

/// Settings for one run of the DP engine.
///
/// - overflow: checked failure (default) or wraparound.
/// - parallel: build rows with rayon and fork subtrees at join nodes.
/// - validate: check the decomposition against the source graph first.
///   The per-node shape checks run regardless.
/// - max_row_len: refuse rows longer than this.
/// - density_threshold: targets sparser than this are switched to
///   adjacency lists by `count_graph_homomorphisms`.
#[derive(Clone, Debug)]
pub struct CountConfig {
    pub overflow: OverflowPolicy,
    pub parallel: bool,
    pub validate: bool,
    pub max_row_len: usize,
    pub density_threshold: f64,
}

impl Default for CountConfig {
    fn default() -> Self {
        Self {
            overflow: OverflowPolicy::Checked,
            parallel: false,
            validate: true,
            max_row_len: DEFAULT_MAX_ROW_LEN,
            density_threshold: 0.5,
        }
    }
}

impl CountConfig {
    pub fn overflow(mut self, overflow: OverflowPolicy) -> Self {
        self.overflow = overflow;
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    pub fn max_row_len(mut self, max_row_len: usize) -> Self {
        self.max_row_len = max_row_len;
        self
    }

    pub fn density_threshold(mut self, density_threshold: f64) -> Self {
        self.density_threshold = density_threshold;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_policy_reports_overflow() {
        let policy = OverflowPolicy::Checked;
        assert_eq!(policy.add(2, 3), Some(5));
        assert_eq!(policy.add(Count::MAX, 1), None);
        assert_eq!(policy.mul(Count::MAX, 2), None);
    }

    #[test]
    fn test_wrapping_policy_wraps() {
        let policy = OverflowPolicy::Wrapping;
        assert_eq!(policy.add(Count::MAX, 2), Some(1));
        assert_eq!(policy.mul(1 << 63, 2), Some(0));
    }

    #[test]
    fn test_builder_setters() {
        let cfg = CountConfig::default()
            .parallel(true)
            .validate(false)
            .max_row_len(10)
            .overflow(OverflowPolicy::Wrapping);
        assert!(cfg.parallel);
        assert!(!cfg.validate);
        assert_eq!(cfg.max_row_len, 10);
        assert_eq!(cfg.overflow, OverflowPolicy::Wrapping);
    }
}
