/// Configuration for consolidation runs
///
/// Settings come from built-in defaults, an optional `buildprops.toml` at the
/// root of the build tree, and finally command-line overrides.
pub mod consolidation;

pub use consolidation::{ConfigOverrides, ConsolidationConfig};
