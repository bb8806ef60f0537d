//! The configuration source abstraction.

use crate::types::PartialConfig;

/// A layer of configuration input.
///
/// Implementations never fail: a source that cannot be read yields an empty
/// layer so that credentials supplied later (per call) still work.
pub trait ConfigSource: Send + Sync {
    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Read the layer.
    fn load(&self) -> PartialConfig;
}
