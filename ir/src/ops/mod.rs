//! Instruction payloads and their constructors.
//!
//! This module contains the operand/attribute structs wrapped by [`Op`](crate::Op),
//! organized by family:
//! - `dot`: warp-group dot and its wait
//! - `mma`: fifth-generation tensor-core MMA, plain and block-scaled
//! - `barrier`: mbarrier lifecycle
//! - `tma`: bulk copies through tensor descriptors, tensormap creation
//! - `tmem`: tensor-memory allocation, load/store, copy and sub-slicing

use std::rc::Rc;

use crate::value::Value;

pub mod barrier;
pub mod dot;
pub mod mma;
pub mod tma;
pub mod tmem;

pub use barrier::*;
pub use dot::*;
pub use mma::*;
pub use tma::*;
pub use tmem::*;

/// A completion barrier attached to an asynchronous MMA, arrived on when
/// `pred` holds.
///
/// Generic over the operand representation so the parser can produce
/// unresolved names with the same shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompletionBarrier<V = Rc<Value>> {
    pub barrier: V,
    pub pred: V,
}

impl<V> CompletionBarrier<V> {
    pub fn new(barrier: V, pred: V) -> Self {
        Self { barrier, pred }
    }
}

/// Async token of an instruction.
///
/// `Absent` means the instruction has no token result and no dependency.
/// `Present(None)` produces a token without waiting on one; `Present(Some(dep))`
/// additionally depends on `dep`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OptionalToken<V = Rc<Value>> {
    Absent,
    Present(Option<V>),
}

impl<V> OptionalToken<V> {
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    /// The dependency operand, if any.
    pub fn dep(&self) -> Option<&V> {
        match self {
            Self::Present(dep) => dep.as_ref(),
            Self::Absent => None,
        }
    }
}

impl<V> Default for OptionalToken<V> {
    fn default() -> Self {
        Self::Absent
    }
}
