use nvgpu_dtype::DType;
use snafu::ensure;

use super::{expect_memdesc, expect_tensor, verify_barrier_type};
use crate::Result;
use crate::error::*;
use crate::ops::{AsyncTmaCopyGlobalToLocal, AsyncTmaGather, AsyncTmaScatter, TensormapCreate};
use crate::value::Value;

/// Block shape a TMA gather writes or a scatter reads, checked against the
/// row offsets.
///
/// One TMA message moves at least 8 rows of 32 bytes each.
fn verify_gather_block(shape: &[i64], dtype: DType, x_offsets: &Value) -> Result<()> {
    let offsets = expect_tensor(x_offsets, "x offsets")?;
    ensure!(offsets.dtype.is_integer(32), GatherOffsetsTypeSnafu { dtype: offsets.dtype });
    ensure!(offsets.rank() == 1, GatherOffsetsRankSnafu { rank: offsets.rank() });

    ensure!(shape.len() == 2, GatherResultRankSnafu { rank: shape.len() });
    let (rows, cols) = (shape[0], shape[1]);
    ensure!(rows >= 8, GatherRowsSnafu { rows });

    let bit_width = i64::from(dtype.bit_width());
    ensure!(bit_width <= 32, GatherElementWidthSnafu { dtype });
    let min_cols = 32 / bit_width * 8;
    ensure!(cols >= min_cols, GatherColumnsSnafu { dtype, min_cols, cols });

    ensure!(rows == offsets.shape[0], GatherRowCountMismatchSnafu { rows, offsets: offsets.shape[0] });
    Ok(())
}

impl AsyncTmaCopyGlobalToLocal {
    pub fn verify(&self) -> Result<()> {
        verify_barrier_type(&self.barrier)?;
        let count = self.coords.len();
        ensure!((1..=5).contains(&count), TmaCoordCountSnafu { count });
        let result = expect_memdesc(&self.result, "result")?;
        ensure!(result.is_mutable(), ImmutableDestinationSnafu { action: "store" });
        Ok(())
    }
}

impl AsyncTmaGather {
    pub fn verify(&self) -> Result<()> {
        verify_barrier_type(&self.barrier)?;
        let result = expect_memdesc(&self.result, "result")?;
        ensure!(result.is_mutable(), ImmutableDestinationSnafu { action: "store" });
        verify_gather_block(result.shape(), result.dtype(), &self.x_offsets)
    }
}

impl AsyncTmaScatter {
    pub fn verify(&self) -> Result<()> {
        let src = expect_memdesc(&self.src, "source")?;
        verify_gather_block(src.shape(), src.dtype(), &self.x_offsets)
    }
}

impl TensormapCreate {
    pub fn verify(&self) -> Result<()> {
        let rank = self.box_dim.len();
        let global_dim = self.global_dim.len();
        ensure!(global_dim == rank, TensormapRankSnafu { list: "global dim", got: global_dim, expected: rank });
        let global_stride = self.global_stride.len();
        ensure!(
            global_stride + 1 == rank,
            TensormapRankSnafu { list: "global stride", got: global_stride, expected: rank.saturating_sub(1) }
        );
        let element_stride = self.element_stride.len();
        ensure!(
            element_stride == rank,
            TensormapRankSnafu { list: "element stride", got: element_stride, expected: rank }
        );
        Ok(())
    }
}
