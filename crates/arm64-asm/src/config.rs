//! Layout limits.

/// Limits governing literal-pool placement and the layout fixed point.
///
/// The defaults match the architecture: literal loads reach ±1 MiB and
/// functions are aligned to 16 bytes. Tests shrink the displacement to force
/// pool flushes in small programs.
///
/// # Examples
///
/// ```
/// use arm64_asm::{Assembler, LayoutConfig};
///
/// let cfg = LayoutConfig {
///     max_pc_displacement: 256,
///     ..LayoutConfig::default()
/// };
/// let mut asm = Assembler::new();
/// asm.config(cfg);
/// assert_eq!(asm.layout_config().max_pc_displacement, 256);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayoutConfig {
    /// Alignment of the encoded function size. Must be a power of two.
    /// Default: 16.
    pub function_alignment: u32,
    /// Largest distance, in bytes, between the first instruction referencing
    /// a pending literal and that literal. Default: `0xfffff`.
    pub max_pc_displacement: u32,
    /// Pending pool size at which the pool is flushed regardless of
    /// distance. Default: `0xffff0`.
    pub pool_size_limit: u32,
    /// Maximum number of branch-relaxation passes before layout gives up
    /// with [`AsmError::RelaxationLimit`](crate::AsmError::RelaxationLimit).
    /// Default: 100.
    pub max_passes: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            function_alignment: 16,
            max_pc_displacement: 0xfffff,
            pool_size_limit: 0xffff0,
            max_passes: 100,
        }
    }
}

impl LayoutConfig {
    /// Round `size` up to [`function_alignment`](Self::function_alignment).
    pub fn align_function(&self, size: u32) -> u32 {
        let a = self.function_alignment.max(1);
        (size + a - 1) & !(a - 1)
    }
}
