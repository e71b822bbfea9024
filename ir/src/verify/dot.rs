use nvgpu_dtype::DType;
use snafu::ensure;

use super::expect_memdesc;
use crate::Result;
use crate::context::VerifyContext;
use crate::encoding::Encoding;
use crate::error::*;
use crate::ops::{CompletionBarrier, DotOp, TcGen5Mma, TcGen5MmaScaled, WarpGroupDot};
use crate::types::MemorySpace;
use crate::value::Value;

/// Float element types a warp-group MMA can consume; 8-bit integers of
/// either signedness are accepted as well.
const WGMMA_FLOAT_INPUT_TYPES: [DType; 5] =
    [DType::FP8E5M2, DType::FP8E4M3, DType::Float16, DType::BFloat16, DType::Float32];

fn is_wgmma_input_type(dtype: DType) -> bool {
    dtype.is_integer(8) || WGMMA_FLOAT_INPUT_TYPES.contains(&dtype)
}

/// Rank and dimension agreement between A, B and the output.
fn verify_dot_interface(op: &impl DotOp) -> Result<()> {
    let a_rank = op.a().ty().shape().len();
    let b_rank = op.b().ty().shape().len();
    let d_rank = op.output_shape().len();
    ensure!(a_rank == b_rank && a_rank == d_rank, DotRankMismatchSnafu { a_rank, b_rank, d_rank });
    ensure!(matches!(a_rank, 2 | 3), DotOperandRankSnafu { operand: "A", rank: a_rank });

    let (a_k, b_k) = op.contraction_dims();
    ensure!(op.verify_dims(), ContractionDimMismatchSnafu { a_k, b_k });

    let (expected_m, expected_n) = op.expected_output_dims();
    let out = op.output_shape();
    ensure!(
        op.verify_output_dims(),
        OutputDimMismatchSnafu { m: out[d_rank - 2], n: out[d_rank - 1], expected_m, expected_n }
    );
    Ok(())
}

impl WarpGroupDot {
    pub fn verify(&self, ctx: &VerifyContext<'_>) -> Result<()> {
        let is_hopper =
            self.result.encoding.as_ref().and_then(Encoding::as_nvidia_mma).is_some_and(|mma| mma.is_hopper());
        if !is_hopper {
            let found = self.result.encoding.as_ref().map_or_else(|| "no encoding".to_string(), ToString::to_string);
            return WgmmaResultLayoutSnafu { found }.fail();
        }

        let a_layout_ok = matches!(self.a.ty().encoding(), Some(Encoding::NvmmaShared(_) | Encoding::DotOperand(_)));
        ensure!(a_layout_ok, WgmmaOperandALayoutSnafu);
        ensure!(matches!(self.b.ty().encoding(), Some(Encoding::NvmmaShared(_))), WgmmaOperandBLayoutSnafu);

        let num_warps = ctx.num_warps();
        ensure!(num_warps % 4 == 0, WgmmaNumWarpsSnafu { num_warps });

        let shape = &self.result.shape;
        ensure!(shape.len() == 2, WgmmaResultRankSnafu { rank: shape.len() });
        ensure!(shape[0] % 64 == 0, WgmmaResultMSnafu { m: shape[0] });
        ensure!(shape[1] % 8 == 0, WgmmaResultNSnafu { n: shape[1] });

        // Only shaped values carry a layout, so A has an element type here.
        let a_dtype = self.a.ty().dtype().unwrap_or(DType::Bool);
        ensure!(is_wgmma_input_type(a_dtype), WgmmaElementTypeSnafu { dtype: a_dtype });

        let max_num_imprecise_acc = self.max_num_imprecise_acc;
        ensure!(
            !(max_num_imprecise_acc < 32 && a_dtype.is_fp8() && self.result.dtype == DType::Float32),
            ImpreciseAccumulationSnafu { max_num_imprecise_acc }
        );

        verify_dot_interface(self)
    }
}

/// Completion barriers imply asynchronous execution.
fn verify_completion_barriers(is_async: bool, barriers: &[CompletionBarrier]) -> Result<()> {
    ensure!(is_async || barriers.is_empty(), SyncWithBarriersSnafu { count: barriers.len() });
    Ok(())
}

/// Operand placement common to both tcgen5 variants: D in tensor memory, A in
/// shared or tensor memory, B in shared memory.
fn verify_mma_v5_operands(op: &impl DotOp, d: &Value) -> Result<()> {
    let d_ty = expect_memdesc(d, "D")?;
    ensure!(d_ty.space() == MemorySpace::TensorMemory, NotTensorMemorySnafu { operand: "D" });

    let a_ty = expect_memdesc(op.a(), "A")?;
    ensure!(
        matches!(a_ty.space(), MemorySpace::Shared | MemorySpace::TensorMemory),
        UnexpectedTypeSnafu {
            operand: "A",
            expected: "a shared or tensor memory descriptor",
            found: op.a().ty().to_string(),
        }
    );

    let b_ty = expect_memdesc(op.b(), "B")?;
    ensure!(b_ty.space() == MemorySpace::Shared, NotSharedMemorySnafu { operand: "B" });
    Ok(())
}

impl TcGen5Mma {
    pub fn verify(&self) -> Result<()> {
        verify_completion_barriers(self.is_async, &self.barriers)?;
        verify_mma_v5_operands(self, &self.d)?;
        verify_dot_interface(self)
    }
}

impl TcGen5MmaScaled {
    pub fn verify(&self) -> Result<()> {
        verify_completion_barriers(self.is_async, &self.barriers)?;
        verify_mma_v5_operands(self, &self.d)?;
        for (scale, operand) in [(&self.a_scale, "A scale"), (&self.b_scale, "B scale")] {
            let ty = expect_memdesc(scale, operand)?;
            ensure!(ty.space() == MemorySpace::TensorMemory, NotTensorMemorySnafu { operand });
        }
        verify_dot_interface(self)
    }
}
