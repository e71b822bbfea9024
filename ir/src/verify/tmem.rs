use snafu::{OptionExt, ensure};

use super::{expect_memdesc, expect_tensor, verify_alloc, verify_memory_op_types, verify_tmem_operand};
use crate::Result;
use crate::context::VerifyContext;
use crate::encoding::Encoding;
use crate::error::*;
use crate::ops::{TmemAlloc, TmemCopy, TmemLoad, TmemStore, TmemSubSlice};
use crate::types::{MemDescType, MemorySpace};

/// Minimum run of row-major elements a TMEM copy reads in one message.
const TMEM_COPY_MIN_CONTIGUOUS: i64 = 512;

fn has_tmem_encoding(ty: &MemDescType) -> bool {
    matches!(ty.encoding(), Some(Encoding::TensorMemory(_) | Encoding::TensorMemoryScales))
}

impl TmemStore {
    pub fn verify(&self, ctx: &VerifyContext<'_>) -> Result<()> {
        let dst = expect_memdesc(&self.dst, "destination")?;
        ensure!(dst.space() == MemorySpace::TensorMemory, NotTensorMemorySnafu { operand: "destination" });
        ensure!(has_tmem_encoding(dst), NotTmemEncodingSnafu { operand: "destination" });
        ensure!(dst.is_mutable(), ImmutableDestinationSnafu { action: "store" });

        let src = expect_tensor(&self.src, "source")?;
        verify_tmem_operand(ctx, src, dst, "source")?;
        verify_memory_op_types(src.dtype, &src.shape, dst.dtype(), dst.shape())
    }
}

impl TmemLoad {
    pub fn verify(&self, ctx: &VerifyContext<'_>) -> Result<()> {
        let src = expect_memdesc(&self.src, "source")?;
        ensure!(src.space() == MemorySpace::TensorMemory, NotTensorMemorySnafu { operand: "source" });
        // Scale factors are only ever written to tensor memory.
        ensure!(matches!(src.encoding(), Some(Encoding::TensorMemory(_))), NotTmemEncodingSnafu { operand: "source" });

        verify_tmem_operand(ctx, &self.result, src, "result")?;
        verify_memory_op_types(src.dtype(), src.shape(), self.result.dtype, &self.result.shape)
    }
}

impl TmemAlloc {
    pub fn verify(&self, ctx: &VerifyContext<'_>) -> Result<()> {
        ensure!(self.result.space() == MemorySpace::TensorMemory, NotTensorMemorySnafu { operand: "result" });
        ensure!(has_tmem_encoding(&self.result), NotTmemEncodingSnafu { operand: "result" });

        let src = self.src.as_deref().map(|src| expect_tensor(src, "source")).transpose()?;
        if let Some(src) = src {
            verify_tmem_operand(ctx, src, &self.result, "source")?;
        }
        verify_alloc(src, &self.result)
    }
}

impl TmemCopy {
    pub fn verify(&self) -> Result<()> {
        let src = expect_memdesc(&self.src, "source")?;
        ensure!(src.space() == MemorySpace::Shared, NotSharedMemorySnafu { operand: "source" });

        let dst = expect_memdesc(&self.dst, "destination")?;
        ensure!(has_tmem_encoding(dst), NotTensorMemorySnafu { operand: "destination" });

        if let Some(barrier) = &self.barrier {
            let barrier = expect_memdesc(barrier, "optional barrier")?;
            ensure!(barrier.space() == MemorySpace::Shared, NotSharedMemorySnafu { operand: "optional barrier" });
        }
        ensure!(dst.is_mutable(), ImmutableDestinationSnafu { action: "copy" });

        let plain = src
            .encoding()
            .and_then(Encoding::as_nvmma_shared)
            .is_some_and(|enc| !enc.transposed && !enc.fp4_padded && !enc.is_swizzled());
        ensure!(plain, TmemCopySwizzledSnafu);

        let contiguous = src.innermost_contiguous_elements();
        ensure!(contiguous >= TMEM_COPY_MIN_CONTIGUOUS, TmemCopyNotRowMajorSnafu { contiguous });

        // The destination shape is left unchecked so that differently shaped
        // shared-memory sources can feed the same TMEM layout.
        Ok(())
    }
}

impl TmemSubSlice {
    pub fn verify(&self) -> Result<()> {
        let src_ty = expect_memdesc(&self.src, "source")?;
        let src = src_ty
            .encoding()
            .and_then(Encoding::as_tensor_memory)
            .context(NotTensorMemorySnafu { operand: "source" })?;
        ensure!(matches!(src.block_m, 64 | 128), SubSliceBlockMSnafu { block_m: src.block_m });

        let dst = self
            .result
            .encoding()
            .and_then(Encoding::as_tensor_memory)
            .context(NotTensorMemorySnafu { operand: "destination" })?;
        ensure!(dst.is_compatible_with(src), SubSliceLayoutMismatchSnafu);
        Ok(())
    }
}
