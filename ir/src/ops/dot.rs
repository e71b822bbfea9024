//! Hopper warp-group dot and the shared dot-product interface.

use std::rc::Rc;

use nvgpu_dtype::DType;
use smallvec::SmallVec;
use snafu::OptionExt;

use crate::Result;
use crate::encoding::Encoding;
use crate::error::{DotEncodingInferenceSnafu, UnexpectedTypeSnafu};
use crate::types::{TensorType, Type};
use crate::value::Value;

/// Layout inference hook: given an operand encoding, the operand index (0 for
/// A, 1 for B) and the result encoding, returns the operand's dot encoding.
///
/// Supplied by the dialect that owns the encodings.
pub trait InferDotOpEncoding {
    fn infer_dot_op_encoding(&self, operand: &Encoding, operand_index: usize, result: &Encoding) -> Result<Encoding>;
}

impl<F> InferDotOpEncoding for F
where
    F: Fn(&Encoding, usize, &Encoding) -> Result<Encoding>,
{
    fn infer_dot_op_encoding(&self, operand: &Encoding, operand_index: usize, result: &Encoding) -> Result<Encoding> {
        self(operand, operand_index, result)
    }
}

/// Operand accessors and dimension checks common to every dot product.
///
/// A and B are either rank-2 `[M, K] x [K, N]` or batched rank-3. Callers
/// must have checked that all three ranks are equal and 2 or 3 before using
/// the dimension helpers.
pub trait DotOp {
    fn a(&self) -> &Rc<Value>;
    fn b(&self) -> &Rc<Value>;
    fn output_shape(&self) -> &[i64];

    /// Contraction dimension of A and of B, as the hardware counts them.
    fn contraction_dims(&self) -> (i64, i64) {
        let a = self.a().ty().shape();
        let b = self.b().ty().shape();
        (a[a.len() - 1], b[a.len() - 2])
    }

    /// `(M, N)` the operands imply for the output.
    fn expected_output_dims(&self) -> (i64, i64) {
        let a = self.a().ty().shape();
        let b = self.b().ty().shape();
        (a[a.len() - 2], b[b.len() - 1])
    }

    fn verify_dims(&self) -> bool {
        let (a_k, b_k) = self.contraction_dims();
        a_k == b_k
    }

    fn verify_output_dims(&self) -> bool {
        let out = self.output_shape();
        let (m, n) = self.expected_output_dims();
        out[out.len() - 2] == m && out[out.len() - 1] == n
    }
}

/// `D = A * B + C` on a Hopper warp group.
///
/// A is a shared-memory descriptor or a register tensor in dot-operand layout,
/// B is a shared-memory descriptor, C and the result are register tensors.
#[derive(Debug, Clone, PartialEq)]
pub struct WarpGroupDot {
    pub a: Rc<Value>,
    pub b: Rc<Value>,
    pub c: Rc<Value>,
    pub use_c: Option<Rc<Value>>,
    /// How many products may be accumulated at reduced precision before
    /// promotion to full f32.
    pub max_num_imprecise_acc: u32,
    pub is_async: bool,
    pub result: TensorType,
}

impl WarpGroupDot {
    /// Build the instruction, inferring its result type.
    ///
    /// The result takes the accumulator's type. When A carries an encoding, the
    /// dot encodings of A and B are checked against the result encoding with
    /// `infer`; a failure there fails construction.
    pub fn new(
        a: Rc<Value>,
        b: Rc<Value>,
        c: Rc<Value>,
        use_c: Option<Rc<Value>>,
        max_num_imprecise_acc: u32,
        is_async: bool,
        infer: &impl InferDotOpEncoding,
    ) -> Result<Self> {
        let result = c
            .ty()
            .as_tensor()
            .context(UnexpectedTypeSnafu {
                operand: "accumulator",
                expected: "a register tensor",
                found: c.ty().to_string(),
            })?
            .clone();

        if let Some(a_enc) = a.ty().encoding() {
            let result_enc = result
                .encoding
                .as_ref()
                .context(DotEncodingInferenceSnafu { operand_index: 0usize, reason: "accumulator has no encoding" })?;
            let b_enc = b
                .ty()
                .encoding()
                .context(DotEncodingInferenceSnafu { operand_index: 1usize, reason: "operand has no encoding" })?;
            infer.infer_dot_op_encoding(a_enc, 0, result_enc)?;
            infer.infer_dot_op_encoding(b_enc, 1, result_enc)?;
        }

        Ok(Self { a, b, c, use_c, max_num_imprecise_acc, is_async, result })
    }

    /// Whether lowering must split the K loop and accumulate partial sums in
    /// full precision: fp8 inputs, f32 accumulator, and fewer imprecise
    /// accumulations allowed than the K extent of A.
    pub fn needs_partial_accumulator(&self) -> bool {
        let is_fp8 = self.a.ty().dtype().is_some_and(|dtype| dtype.is_any_fp8());
        let acc_fp32 = self.result.dtype == DType::Float32;
        let k = self.a.ty().shape().get(1).copied().unwrap_or(0);
        is_fp8 && acc_fp32 && i64::from(self.max_num_imprecise_acc) <= k
    }
}

impl DotOp for WarpGroupDot {
    fn a(&self) -> &Rc<Value> {
        &self.a
    }

    fn b(&self) -> &Rc<Value> {
        &self.b
    }

    fn output_shape(&self) -> &[i64] {
        &self.result.shape
    }
}

/// Waits until at most `pendings` warp-group dots are in flight.
///
/// Its results are the inputs passed through, so consumers of an async dot
/// depend on the wait.
#[derive(Debug, Clone, PartialEq)]
pub struct WarpGroupDotWait {
    pub inputs: SmallVec<[Rc<Value>; 4]>,
    pub pendings: u32,
}

impl WarpGroupDotWait {
    pub fn new(inputs: impl IntoIterator<Item = Rc<Value>>, pendings: u32) -> Self {
        Self { inputs: inputs.into_iter().collect(), pendings }
    }

    pub fn result_types(&self) -> SmallVec<[Type; 1]> {
        self.inputs.iter().map(|input| input.ty().clone()).collect()
    }
}
