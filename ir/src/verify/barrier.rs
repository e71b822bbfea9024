use snafu::ensure;

use crate::Result;
use crate::error::{ArriveCountSnafu, InvalidBarrierTypeSnafu};
use crate::ops::{ArriveBarrier, BarrierExpect, InitBarrier, InvalBarrier, WaitBarrier};
use crate::types::MemorySpace;
use crate::value::Value;

/// An mbarrier is a single 64-bit integer in shared memory.
pub(crate) fn verify_barrier_type(value: &Value) -> Result<()> {
    let is_barrier = value
        .ty()
        .as_memdesc()
        .is_some_and(|ty| ty.shape() == [1] && ty.dtype().is_integer(64) && ty.space() == MemorySpace::Shared);
    ensure!(is_barrier, InvalidBarrierTypeSnafu { found: value.ty().to_string() });
    Ok(())
}

impl InitBarrier {
    pub fn verify(&self) -> Result<()> {
        verify_barrier_type(&self.alloc)
    }
}

impl InvalBarrier {
    pub fn verify(&self) -> Result<()> {
        verify_barrier_type(&self.alloc)
    }
}

impl BarrierExpect {
    pub fn verify(&self) -> Result<()> {
        verify_barrier_type(&self.alloc)
    }
}

impl WaitBarrier {
    pub fn verify(&self) -> Result<()> {
        verify_barrier_type(&self.alloc)
    }
}

impl ArriveBarrier {
    pub fn verify(&self) -> Result<()> {
        verify_barrier_type(&self.alloc)?;
        ensure!(self.count >= 1, ArriveCountSnafu { count: self.count });
        Ok(())
    }
}
