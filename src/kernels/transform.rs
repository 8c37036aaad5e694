//! This module contains the pure, stateless kernels for the per-column integer
//! transform: offset, scale (`multip`), decimal shift, and sequence delta.
//!
//! This is a Layer 1 (Value Reduction) transform. It maps a raw caller value to a
//! small stored integer so the varint/zig-zag wire encoding spends fewer bytes,
//! and maps the stored integer back. Both directions are infallible: falsy input
//! is normalized to zero and out-of-range products saturate; range checks against
//! the wire type happen in the row codec.

use crate::types::TransformSpec;

//==================================================================================
// 1. Public API for Single-Value Operations
//==================================================================================

/// Converts a raw value into its stored integer.
///
/// In sequence mode with a previous raw value, the delta base is that previous
/// value; otherwise it is `spec.offset`. The scaled delta is truncated toward zero.
/// `None` (an absent or falsy cell) is treated as `0`.
pub fn parse(raw: Option<f64>, previous_raw: Option<f64>, spec: &TransformSpec) -> i64 {
    let value = raw.unwrap_or(0.0);
    let delta = match previous_raw {
        Some(prev) if spec.sequence => value - prev,
        _ => value - spec.offset,
    };
    let scaled = delta * spec.multip * 10f64.powi(spec.decimals);
    // `as` saturates at the i64 bounds and maps NaN to 0.
    scaled.trunc() as i64
}

/// Converts a stored integer back into its raw value.
///
/// During a chained decode `previous_raw` must be the previous row's *recovered*
/// value for this column. `None` for `stored` is treated as `0`.
pub fn recover(stored: Option<i64>, previous_raw: Option<f64>, spec: &TransformSpec) -> f64 {
    let stored = stored.unwrap_or(0) as f64;
    let delta = stored / spec.multip / 10f64.powi(spec.decimals);
    match previous_raw {
        Some(prev) if spec.sequence => delta + prev,
        _ => delta + spec.offset,
    }
}
