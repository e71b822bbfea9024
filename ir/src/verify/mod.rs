//! Instruction legality checks.
//!
//! [`Op::verify`] is the entry point the hosting IR calls after building an
//! instruction. Each family has its own submodule with an inherent `verify`
//! per instruction struct; rules run in a fixed order and the first violation
//! is returned.

use nvgpu_dtype::DType;
use snafu::{OptionExt, ensure};
use tracing::{debug, trace};

use crate::Result;
use crate::context::VerifyContext;
use crate::error::*;
use crate::op::Op;
use crate::types::{MemDescType, Shape, TensorType};
use crate::value::Value;

mod barrier;
mod dot;
mod tma;
mod tmem;

pub(crate) use barrier::verify_barrier_type;

impl Op {
    /// Check that the instruction is well formed.
    ///
    /// The returned [`Diagnostic`] names the instruction and carries any notes
    /// the failing rule attached.
    #[tracing::instrument(skip_all, fields(op = self.mnemonic()))]
    pub fn verify(&self, ctx: &VerifyContext<'_>) -> Result<(), Diagnostic> {
        trace!("verifying");
        let result = match self {
            Self::WarpGroupDot(op) => op.verify(ctx),
            // Result types are inferred from the inputs, nothing to check.
            Self::WarpGroupDotWait(_) => Ok(()),
            Self::TcGen5Mma(op) => op.verify(),
            Self::TcGen5MmaScaled(op) => op.verify(),
            Self::InitBarrier(op) => op.verify(),
            Self::InvalBarrier(op) => op.verify(),
            Self::BarrierExpect(op) => op.verify(),
            Self::WaitBarrier(op) => op.verify(),
            Self::ArriveBarrier(op) => op.verify(),
            Self::AsyncTmaCopyGlobalToLocal(op) => op.verify(),
            Self::AsyncTmaGather(op) => op.verify(),
            Self::AsyncTmaScatter(op) => op.verify(),
            Self::TensormapCreate(op) => op.verify(),
            Self::TmemAlloc(op) => op.verify(ctx),
            Self::TmemLoad(op) => op.verify(ctx),
            Self::TmemStore(op) => op.verify(ctx),
            Self::TmemCopy(op) => op.verify(),
            Self::TmemSubSlice(op) => op.verify(),
        };
        result.map_err(|error| {
            debug!(%error, "instruction rejected");
            Diagnostic::new(self.mnemonic(), error)
        })
    }
}

// =========================================================================
// Shared helpers
// =========================================================================

/// The operand's descriptor type, or a type error naming `operand`.
pub(crate) fn expect_memdesc<'v>(value: &'v Value, operand: &'static str) -> Result<&'v MemDescType> {
    value.ty().as_memdesc().context(UnexpectedTypeSnafu {
        operand,
        expected: "a memory descriptor",
        found: value.ty().to_string(),
    })
}

pub(crate) fn expect_tensor<'v>(value: &'v Value, operand: &'static str) -> Result<&'v TensorType> {
    value.ty().as_tensor().context(UnexpectedTypeSnafu {
        operand,
        expected: "a register tensor",
        found: value.ty().to_string(),
    })
}

/// A register tensor exchanged with tensor memory must be 2D and, if it has
/// a layout, use one of the layouts a single TMEM message can move.
pub(crate) fn verify_tmem_operand(
    ctx: &VerifyContext<'_>,
    ty: &TensorType,
    memdesc: &MemDescType,
    operand: &'static str,
) -> Result<()> {
    ensure!(ty.rank() == 2, TmemOperandRankSnafu { operand, rank: ty.rank() });
    let Some(encoding) = &ty.encoding else {
        return Ok(());
    };
    ensure!(encoding.is_distributed(), TmemOperandNotDistributedSnafu { operand });

    let candidates = ctx.tmem_compatible_layouts(ty, memdesc);
    ensure!(!candidates.is_empty(), NoTmemCompatibleLayoutsSnafu { operand });
    let compatible = candidates.iter().any(|layout| ctx.layouts_equivalent(&ty.shape, layout, encoding));
    ensure!(compatible, TmemLayoutIncompatibleSnafu { operand, candidates });
    Ok(())
}

/// Register value and buffer of a load or store agree on element type and shape.
pub(crate) fn verify_memory_op_types(
    src_dtype: DType,
    src_shape: &[i64],
    dst_dtype: DType,
    dst_shape: &[i64],
) -> Result<()> {
    ensure!(src_dtype == dst_dtype, ElementTypeMismatchSnafu { src: src_dtype, dst: dst_dtype });
    ensure!(
        src_shape == dst_shape,
        ShapeMismatchSnafu { src: Shape::from_slice(src_shape), dst: Shape::from_slice(dst_shape) }
    );
    Ok(())
}

/// Result of an allocation covers its whole buffer; an allocation without an
/// initial value is only useful if it can be written.
pub(crate) fn verify_alloc(src: Option<&TensorType>, result: &MemDescType) -> Result<()> {
    ensure!(
        result.shape() == result.alloc_shape(),
        AllocShapeMismatchSnafu {
            shape: Shape::from_slice(result.shape()),
            alloc_shape: Shape::from_slice(result.alloc_shape()),
        }
    );
    match src {
        Some(src) => verify_memory_op_types(src.dtype, &src.shape, result.dtype(), result.shape()),
        None => {
            ensure!(result.is_mutable(), UninitializedImmutableAllocSnafu);
            Ok(())
        }
    }
}
