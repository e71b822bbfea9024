//! Fifth-generation tensor-core MMA (`tcgen05.mma`), plain and block-scaled.

use std::rc::Rc;

use bon::bon;
use nvgpu_dtype::ScaleDotElemType;

use super::{CompletionBarrier, DotOp, OptionalToken};
use crate::value::Value;

/// Accessors and pure mutators shared by both tcgen5 MMA variants.
///
/// The `with_*` methods return a modified copy; attaching a completion barrier
/// also makes the instruction asynchronous.
pub trait MmaV5Op: DotOp + Sized {
    fn accumulator(&self) -> &Rc<Value>;
    fn use_accumulator(&self) -> &Rc<Value>;
    fn predicate(&self) -> &Rc<Value>;
    fn completion_barriers(&self) -> &[CompletionBarrier];
    fn is_async(&self) -> bool;

    fn with_accumulator(self, accumulator: Rc<Value>) -> Self;
    fn with_use_accumulator(self, flag: Rc<Value>) -> Self;
    fn with_predicate(self, pred: Rc<Value>) -> Self;
    fn with_completion_barrier(self, barrier: Rc<Value>, pred: Rc<Value>) -> Self;
}

macro_rules! impl_mma_v5 {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl MmaV5Op for $ty {
                fn accumulator(&self) -> &Rc<Value> {
                    &self.d
                }

                fn use_accumulator(&self) -> &Rc<Value> {
                    &self.use_d
                }

                fn predicate(&self) -> &Rc<Value> {
                    &self.pred
                }

                fn completion_barriers(&self) -> &[CompletionBarrier] {
                    &self.barriers
                }

                fn is_async(&self) -> bool {
                    self.is_async
                }

                fn with_accumulator(self, accumulator: Rc<Value>) -> Self {
                    Self { d: accumulator, ..self }
                }

                fn with_use_accumulator(self, flag: Rc<Value>) -> Self {
                    Self { use_d: flag, ..self }
                }

                fn with_predicate(self, pred: Rc<Value>) -> Self {
                    Self { pred, ..self }
                }

                fn with_completion_barrier(mut self, barrier: Rc<Value>, pred: Rc<Value>) -> Self {
                    self.barriers.push(CompletionBarrier::new(barrier, pred));
                    self.is_async = true;
                    self
                }
            }
        )+
    };
}

impl_mma_v5!(TcGen5Mma, TcGen5MmaScaled);

/// `D += A * B` with D in tensor memory, A in shared or tensor memory and B in
/// shared memory.
#[derive(Debug, Clone, PartialEq)]
pub struct TcGen5Mma {
    pub a: Rc<Value>,
    pub b: Rc<Value>,
    pub d: Rc<Value>,
    /// Token result and the accumulator dependency it waits on.
    pub token: OptionalToken,
    /// i1: whether D is accumulated into or overwritten.
    pub use_d: Rc<Value>,
    pub pred: Rc<Value>,
    pub barriers: Vec<CompletionBarrier>,
    pub is_async: bool,
    pub two_ctas: bool,
}

#[bon]
impl TcGen5Mma {
    /// Build an MMA; any completion barrier forces `is_async`.
    #[builder]
    pub fn new(
        a: Rc<Value>,
        b: Rc<Value>,
        d: Rc<Value>,
        use_d: Rc<Value>,
        pred: Rc<Value>,
        #[builder(default)] token: OptionalToken,
        #[builder(default)] barriers: Vec<CompletionBarrier>,
        #[builder(default)] is_async: bool,
        #[builder(default)] two_ctas: bool,
    ) -> Self {
        let is_async = is_async || !barriers.is_empty();
        Self { a, b, d, token, use_d, pred, barriers, is_async, two_ctas }
    }
}

/// Block-scaled MMA: A and B come with per-block scale factors in tensor
/// memory and may use sub-byte formats.
#[derive(Debug, Clone, PartialEq)]
pub struct TcGen5MmaScaled {
    pub a: Rc<Value>,
    pub b: Rc<Value>,
    pub d: Rc<Value>,
    pub token: OptionalToken,
    pub a_scale: Rc<Value>,
    pub b_scale: Rc<Value>,
    pub a_type: ScaleDotElemType,
    pub b_type: ScaleDotElemType,
    pub use_d: Rc<Value>,
    pub pred: Rc<Value>,
    pub barriers: Vec<CompletionBarrier>,
    pub is_async: bool,
}

#[bon]
impl TcGen5MmaScaled {
    /// Build a scaled MMA; any completion barrier forces `is_async`.
    #[builder]
    pub fn new(
        a: Rc<Value>,
        b: Rc<Value>,
        d: Rc<Value>,
        a_scale: Rc<Value>,
        b_scale: Rc<Value>,
        a_type: ScaleDotElemType,
        b_type: ScaleDotElemType,
        use_d: Rc<Value>,
        pred: Rc<Value>,
        #[builder(default)] token: OptionalToken,
        #[builder(default)] barriers: Vec<CompletionBarrier>,
        #[builder(default)] is_async: bool,
    ) -> Self {
        let is_async = is_async || !barriers.is_empty();
        Self { a, b, d, token, a_scale, b_scale, a_type, b_type, use_d, pred, barriers, is_async }
    }

    /// A is stored K-major (transposed shared layout).
    fn a_transposed(&self) -> bool {
        shared_transposed(&self.a)
    }

    /// B is stored N-major, i.e. its shared layout is *not* transposed.
    fn b_transposed(&self) -> bool {
        self.b.ty().encoding().and_then(|enc| enc.as_nvmma_shared()).is_some_and(|enc| !enc.transposed)
    }

    /// Logical M of the product.
    ///
    /// A packed E2M1 operand stores two elements per byte along its contiguous
    /// dimension, which for a transposed A is M.
    pub fn block_m(&self) -> i64 {
        let shape = self.a.ty().shape();
        let block_m = shape[shape.len() - 2];
        if self.a_type.is_packed() && self.a_transposed() { block_m * 2 } else { block_m }
    }

    /// Logical N of the product.
    pub fn block_n(&self) -> i64 {
        let shape = self.b.ty().shape();
        let block_n = shape[shape.len() - 1];
        if self.b_type.is_packed() && self.b_transposed() { block_n * 2 } else { block_n }
    }

    /// Logical K of the product.
    pub fn block_k(&self) -> i64 {
        let shape = self.a.ty().shape();
        let block_k = shape[shape.len() - 1];
        if self.a_type.is_packed() && !self.a_transposed() { block_k * 2 } else { block_k }
    }
}

fn shared_transposed(value: &Value) -> bool {
    value.ty().encoding().and_then(|enc| enc.as_nvmma_shared()).is_some_and(|enc| enc.transposed)
}

impl DotOp for TcGen5Mma {
    fn a(&self) -> &Rc<Value> {
        &self.a
    }

    fn b(&self) -> &Rc<Value> {
        &self.b
    }

    fn output_shape(&self) -> &[i64] {
        self.d.ty().shape()
    }
}

impl DotOp for TcGen5MmaScaled {
    fn a(&self) -> &Rc<Value> {
        &self.a
    }

    fn b(&self) -> &Rc<Value> {
        &self.b
    }

    fn output_shape(&self) -> &[i64] {
        self.d.ty().shape()
    }

    /// Packed operands count two logical elements per stored one along K
    /// unless K is their strided dimension.
    fn contraction_dims(&self) -> (i64, i64) {
        let a = self.a.ty().shape();
        let b = self.b.ty().shape();
        let mut a_k = a[a.len() - 1];
        let mut b_k = b[a.len() - 2];
        if self.a_type.is_packed() && !self.a_transposed() {
            a_k *= 2;
        }
        if self.b_type.is_packed() && !self.b_transposed() {
            b_k *= 2;
        }
        (a_k, b_k)
    }

    fn expected_output_dims(&self) -> (i64, i64) {
        (self.block_m(), self.block_n())
    }
}
