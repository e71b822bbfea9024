//! Module-level facts verification depends on.

use std::fmt;

use bon::bon;

use crate::encoding::Encoding;
use crate::types::{MemDescType, TensorType};

/// Source of register layouts that can be moved to and from tensor memory
/// with a single `tcgen05.ld`/`tcgen05.st` message.
pub trait TmemLayoutProvider {
    /// Every distributed layout `ty` may use when paired with `memdesc`.
    fn compatible_layouts(&self, ty: &TensorType, memdesc: &MemDescType) -> Vec<Encoding>;

    /// Whether two layouts map the elements of a tensor of `shape` identically.
    fn layouts_equivalent(&self, shape: &[i64], lhs: &Encoding, rhs: &Encoding) -> bool {
        let _ = shape;
        lhs == rhs
    }
}

/// Inputs to verification that live outside a single instruction.
#[derive(Clone, Copy)]
pub struct VerifyContext<'a> {
    num_warps: u32,
    tmem_layouts: Option<&'a dyn TmemLayoutProvider>,
}

#[bon]
impl<'a> VerifyContext<'a> {
    /// Without a layout provider no register layout is TMEM compatible, so
    /// TMEM loads and stores of encoded tensors are rejected.
    #[builder]
    pub fn new(#[builder(default = 4)] num_warps: u32, tmem_layouts: Option<&'a dyn TmemLayoutProvider>) -> Self {
        Self { num_warps, tmem_layouts }
    }
}

impl VerifyContext<'_> {
    /// Warps per CTA of the enclosing module.
    pub fn num_warps(&self) -> u32 {
        self.num_warps
    }

    pub fn tmem_compatible_layouts(&self, ty: &TensorType, memdesc: &MemDescType) -> Vec<Encoding> {
        self.tmem_layouts.map(|provider| provider.compatible_layouts(ty, memdesc)).unwrap_or_default()
    }

    pub fn layouts_equivalent(&self, shape: &[i64], lhs: &Encoding, rhs: &Encoding) -> bool {
        match self.tmem_layouts {
            Some(provider) => provider.layouts_equivalent(shape, lhs, rhs),
            None => lhs == rhs,
        }
    }
}

impl Default for VerifyContext<'_> {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Debug for VerifyContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifyContext")
            .field("num_warps", &self.num_warps)
            .field("tmem_layouts", &self.tmem_layouts.is_some())
            .finish()
    }
}
