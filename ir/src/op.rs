//! Instruction enum.
//!
//! The [`Op`] enum is the closed set of tensor-core, tensor-memory and TMA
//! instructions this crate understands. Each variant wraps a struct from
//! [`crate::ops`] holding the typed operands and attributes; verification
//! lives in [`crate::verify`] and effect inference in [`crate::effects`].

use std::rc::Rc;

use smallvec::SmallVec;

use crate::ops::*;
use crate::types::Type;
use crate::value::Value;

/// One NVIDIA GPU instruction.
///
/// Operands are shared `Rc<Value>` handles. Results are described by type only;
/// the hosting IR owns the result values.
#[derive(Debug, Clone, PartialEq, strum::IntoStaticStr, derive_more::From)]
pub enum Op {
    // Dot products
    #[strum(serialize = "ttng.warp_group_dot")]
    WarpGroupDot(WarpGroupDot),
    #[strum(serialize = "ttng.warp_group_dot_wait")]
    WarpGroupDotWait(WarpGroupDotWait),
    #[strum(serialize = "ttng.tc_gen5_mma")]
    TcGen5Mma(TcGen5Mma),
    #[strum(serialize = "ttng.tc_gen5_mma_scaled")]
    TcGen5MmaScaled(TcGen5MmaScaled),

    // Barriers
    #[strum(serialize = "ttng.init_barrier")]
    InitBarrier(InitBarrier),
    #[strum(serialize = "ttng.inval_barrier")]
    InvalBarrier(InvalBarrier),
    #[strum(serialize = "ttng.barrier_expect")]
    BarrierExpect(BarrierExpect),
    #[strum(serialize = "ttng.wait_barrier")]
    WaitBarrier(WaitBarrier),
    #[strum(serialize = "ttng.arrive_barrier")]
    ArriveBarrier(ArriveBarrier),

    // TMA
    #[strum(serialize = "ttng.async_tma_copy_global_to_local")]
    AsyncTmaCopyGlobalToLocal(AsyncTmaCopyGlobalToLocal),
    #[strum(serialize = "ttng.async_tma_gather")]
    AsyncTmaGather(AsyncTmaGather),
    #[strum(serialize = "ttng.async_tma_scatter")]
    AsyncTmaScatter(AsyncTmaScatter),
    #[strum(serialize = "ttng.tensormap_create")]
    TensormapCreate(TensormapCreate),

    // Tensor memory
    #[strum(serialize = "ttng.tmem_alloc")]
    TmemAlloc(TmemAlloc),
    #[strum(serialize = "ttng.tmem_load")]
    TmemLoad(TmemLoad),
    #[strum(serialize = "ttng.tmem_store")]
    TmemStore(TmemStore),
    #[strum(serialize = "ttng.tmem_copy")]
    TmemCopy(TmemCopy),
    #[strum(serialize = "ttng.tmem_subslice")]
    TmemSubSlice(TmemSubSlice),
}

impl Op {
    /// Dialect-qualified instruction name, as used in diagnostics.
    pub fn mnemonic(&self) -> &'static str {
        self.into()
    }

    /// Operands in their canonical order.
    ///
    /// Effect records refer to operands by their position in this list.
    pub fn operands(&self) -> SmallVec<[&Rc<Value>; 8]> {
        let mut out = SmallVec::new();
        match self {
            Self::WarpGroupDot(op) => {
                out.extend([&op.a, &op.b, &op.c]);
                out.extend(op.use_c.as_ref());
            }
            Self::WarpGroupDotWait(op) => out.extend(op.inputs.iter()),
            Self::TcGen5Mma(op) => {
                out.extend([&op.a, &op.b, &op.d]);
                out.extend(op.token.dep());
                out.extend([&op.use_d, &op.pred]);
                push_barriers(&mut out, &op.barriers);
            }
            Self::TcGen5MmaScaled(op) => {
                out.extend([&op.a, &op.b, &op.d]);
                out.extend(op.token.dep());
                out.extend([&op.a_scale, &op.b_scale, &op.use_d, &op.pred]);
                push_barriers(&mut out, &op.barriers);
            }
            Self::InitBarrier(op) => out.push(&op.alloc),
            Self::InvalBarrier(op) => out.push(&op.alloc),
            Self::BarrierExpect(op) => out.extend([&op.alloc, &op.pred]),
            Self::WaitBarrier(op) => {
                out.extend([&op.alloc, &op.phase]);
                out.extend(op.pred.as_ref());
                out.extend(op.deps.iter());
            }
            Self::ArriveBarrier(op) => {
                out.push(&op.alloc);
                out.extend(op.pred.as_ref());
            }
            Self::AsyncTmaCopyGlobalToLocal(op) => {
                out.push(&op.desc);
                out.extend(op.coords.iter());
                out.extend([&op.barrier, &op.result, &op.pred]);
            }
            Self::AsyncTmaGather(op) => {
                out.extend([&op.desc, &op.x_offsets, &op.y_offset, &op.barrier, &op.result, &op.pred]);
            }
            Self::AsyncTmaScatter(op) => out.extend([&op.desc, &op.x_offsets, &op.y_offset, &op.src]),
            Self::TensormapCreate(op) => {
                out.extend([&op.desc_ptr, &op.global_address]);
                for list in [&op.box_dim, &op.global_dim, &op.global_stride, &op.element_stride] {
                    out.extend(list.iter());
                }
            }
            Self::TmemAlloc(op) => out.extend(op.src.as_ref()),
            Self::TmemLoad(op) => out.push(&op.src),
            Self::TmemStore(op) => out.extend([&op.dst, &op.src, &op.pred]),
            Self::TmemCopy(op) => {
                out.extend([&op.src, &op.dst]);
                out.extend(op.barrier.as_ref());
            }
            Self::TmemSubSlice(op) => out.push(&op.src),
        }
        out
    }

    /// Types of the values this instruction defines.
    pub fn result_types(&self) -> SmallVec<[Type; 1]> {
        match self {
            Self::WarpGroupDot(op) => smallvec::smallvec![Type::Tensor(op.result.clone())],
            Self::WarpGroupDotWait(op) => op.result_types(),
            Self::TcGen5Mma(op) if op.token.is_present() => smallvec::smallvec![Type::AsyncToken],
            Self::TcGen5MmaScaled(op) if op.token.is_present() => smallvec::smallvec![Type::AsyncToken],
            Self::TmemAlloc(op) => smallvec::smallvec![Type::MemDesc(op.result.clone())],
            Self::TmemLoad(op) => smallvec::smallvec![Type::Tensor(op.result.clone())],
            Self::TmemSubSlice(op) => smallvec::smallvec![Type::MemDesc(op.result.clone())],
            _ => SmallVec::new(),
        }
    }
}

fn push_barriers<'a>(out: &mut SmallVec<[&'a Rc<Value>; 8]>, barriers: &'a [CompletionBarrier]) {
    out.extend(barriers.iter().map(|b| &b.barrier));
    out.extend(barriers.iter().map(|b| &b.pred));
}
