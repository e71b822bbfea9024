//! Memory effect inference.
//!
//! [`Op::effects`] lists what an instruction reads, writes and allocates, per
//! memory space, for alias analysis and scheduling. It never fails: when a
//! condition cannot be decided statically, the effect is reported.

use std::rc::Rc;

use smallvec::{SmallVec, smallvec};
use tracing::{debug, trace};

use crate::op::Op;
use crate::ops::{TcGen5Mma, TcGen5MmaScaled, WarpGroupDot};
use crate::types::MemorySpace;
use crate::value::Value;

use EffectKind::{Allocate, Read, Write};
use MemorySpace::{Global, Shared, TensorMemory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum EffectKind {
    Read,
    Write,
    Allocate,
}

/// What an effect applies to.
#[derive(Debug, Clone, PartialEq)]
pub enum EffectTarget {
    /// Operand at `index` in [`Op::operands`] order.
    Operand { index: usize, value: Rc<Value> },
    /// Result at `index`.
    Result { index: usize },
}

/// One access of one memory space.
#[derive(Debug, Clone, PartialEq)]
pub struct Effect {
    pub kind: EffectKind,
    pub space: MemorySpace,
    pub target: EffectTarget,
}

impl Effect {
    pub fn on_operand(kind: EffectKind, space: MemorySpace, index: usize, value: &Rc<Value>) -> Self {
        Self { kind, space, target: EffectTarget::Operand { index, value: value.clone() } }
    }

    pub fn on_result(kind: EffectKind, space: MemorySpace, index: usize) -> Self {
        Self { kind, space, target: EffectTarget::Result { index } }
    }

    /// The operand value, if the effect is on an operand.
    pub fn value(&self) -> Option<&Rc<Value>> {
        match &self.target {
            EffectTarget::Operand { value, .. } => Some(value),
            EffectTarget::Result { .. } => None,
        }
    }
}

pub type Effects = SmallVec<[Effect; 4]>;

impl Op {
    /// Memory effects of the instruction, in a stable order.
    #[tracing::instrument(skip_all, fields(op = self.mnemonic()))]
    pub fn effects(&self) -> Effects {
        trace!("computing effects");
        match self {
            Self::WarpGroupDot(op) => warp_group_dot_effects(op),
            Self::WarpGroupDotWait(_) | Self::TmemSubSlice(_) => Effects::new(),
            Self::TcGen5Mma(op) => tcgen5_effects(op),
            Self::TcGen5MmaScaled(op) => tcgen5_scaled_effects(op),

            Self::InitBarrier(op) => smallvec![Effect::on_operand(Write, Shared, 0, &op.alloc)],
            Self::InvalBarrier(op) => smallvec![Effect::on_operand(Write, Shared, 0, &op.alloc)],
            Self::BarrierExpect(op) => smallvec![Effect::on_operand(Write, Shared, 0, &op.alloc)],
            Self::ArriveBarrier(op) => smallvec![Effect::on_operand(Write, Shared, 0, &op.alloc)],
            Self::WaitBarrier(op) => smallvec![
                Effect::on_operand(Read, Shared, 0, &op.alloc),
                Effect::on_operand(Write, Shared, 0, &op.alloc),
            ],

            Self::AsyncTmaCopyGlobalToLocal(op) => {
                let barrier = 1 + op.coords.len();
                smallvec![
                    Effect::on_operand(Read, Global, 0, &op.desc),
                    Effect::on_operand(Write, Shared, barrier, &op.barrier),
                    Effect::on_operand(Write, Shared, barrier + 1, &op.result),
                ]
            }
            Self::AsyncTmaGather(op) => smallvec![
                Effect::on_operand(Read, Global, 0, &op.desc),
                Effect::on_operand(Write, Shared, 3, &op.barrier),
                Effect::on_operand(Write, Shared, 4, &op.result),
            ],
            Self::AsyncTmaScatter(op) => smallvec![
                Effect::on_operand(Read, Shared, 3, &op.src),
                Effect::on_operand(Write, Global, 0, &op.desc),
            ],
            Self::TensormapCreate(op) => smallvec![Effect::on_operand(Write, Global, 0, &op.desc_ptr)],

            Self::TmemAlloc(op) => {
                // Immutable allocations stay effect-free until the allocator
                // assigns them a column, so CSE and DCE can still fold them.
                if !op.result.is_mutable() && op.col_offset.is_none() {
                    return Effects::new();
                }
                let mut effects = smallvec![Effect::on_result(Allocate, TensorMemory, 0)];
                if op.src.is_some() {
                    effects.push(Effect::on_result(Write, TensorMemory, 0));
                }
                effects
            }
            Self::TmemLoad(op) => smallvec![Effect::on_operand(Read, TensorMemory, 0, &op.src)],
            Self::TmemStore(op) => smallvec![Effect::on_operand(Write, TensorMemory, 0, &op.dst)],
            Self::TmemCopy(op) => {
                let mut effects: Effects = smallvec![
                    Effect::on_operand(Read, Shared, 0, &op.src),
                    Effect::on_operand(Write, TensorMemory, 1, &op.dst),
                ];
                if let Some(barrier) = &op.barrier {
                    effects.push(Effect::on_operand(Write, Shared, 2, barrier));
                }
                effects
            }
        }
    }
}

/// Register operands are not memory; only descriptor operands are read.
fn warp_group_dot_effects(op: &WarpGroupDot) -> Effects {
    [(0, &op.a), (1, &op.b)]
        .into_iter()
        .filter(|(_, value)| value.ty().is_memdesc())
        .map(|(index, value)| Effect::on_operand(Read, Shared, index, value))
        .collect()
}

/// The accumulator is read unless `use_d` is a constant false.
fn reads_accumulator(use_d: &Value) -> bool {
    match use_d.try_constant_int() {
        Some(flag) => flag != 0,
        None => {
            debug!(use_d = %use_d, "use_d is not a constant, assuming the accumulator is read");
            true
        }
    }
}

/// Effects shared by both tcgen5 variants, on A, B and D (operands 0, 1, 2).
fn mma_v5_effects(a: &Rc<Value>, b: &Rc<Value>, d: &Rc<Value>, use_d: &Value) -> Effects {
    let mut effects = Effects::new();
    if reads_accumulator(use_d) {
        effects.push(Effect::on_operand(Read, TensorMemory, 2, d));
    }
    effects.push(Effect::on_operand(Write, TensorMemory, 2, d));

    let a_space = if a.ty().memory_space() == Shared { Shared } else { TensorMemory };
    effects.push(Effect::on_operand(Read, a_space, 0, a));
    effects.push(Effect::on_operand(Read, Shared, 1, b));
    effects
}

fn tcgen5_effects(op: &TcGen5Mma) -> Effects {
    mma_v5_effects(&op.a, &op.b, &op.d, &op.use_d)
}

fn tcgen5_scaled_effects(op: &TcGen5MmaScaled) -> Effects {
    let mut effects = mma_v5_effects(&op.a, &op.b, &op.d, &op.use_d);
    // Scales follow A, B, D and the optional accumulator dependency.
    let a_scale = 3 + usize::from(op.token.dep().is_some());
    effects.push(Effect::on_operand(Read, TensorMemory, a_scale, &op.a_scale));
    effects.push(Effect::on_operand(Read, TensorMemory, a_scale + 1, &op.b_scale));
    effects
}
