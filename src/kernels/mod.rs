//! The pure, stateless numeric kernels used by the row and header codecs.

/// Layer 1: Value Reduction
pub mod transform;

/// Header metadata: column summaries
pub mod stats;
