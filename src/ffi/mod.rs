//! Foreign-language bindings. Each binding is behind its own cargo feature.

#[cfg(feature = "python")]
pub mod python;
