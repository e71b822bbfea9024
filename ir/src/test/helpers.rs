//! Value fixtures shared by unit and property tests.

use std::rc::Rc;

use nvgpu_dtype::DType;

use crate::context::TmemLayoutProvider;
use crate::encoding::{DistributedEncoding, Encoding, NvidiaMmaEncoding, NvmmaSharedEncoding, TensorMemoryEncoding};
use crate::types::{MemDescType, MemorySpace, TensorType, Type};
use crate::value::{ConstValue, Value};

/// Shared-memory buffer with an NVMMA layout.
pub fn smem(name: &str, shape: &[i64], dtype: DType, encoding: NvmmaSharedEncoding, mutable: bool) -> Rc<Value> {
    let ty = MemDescType::builder()
        .shape(shape)
        .dtype(dtype)
        .encoding(encoding.into())
        .space(MemorySpace::Shared)
        .mutable(mutable)
        .build()
        .expect("valid shared descriptor");
    Value::argument(name, ty)
}

/// Unswizzled, row-major shared buffer.
pub fn smem_plain(name: &str, shape: &[i64], dtype: DType) -> Rc<Value> {
    smem(name, shape, dtype, NvmmaSharedEncoding::unswizzled(dtype.bit_width()), true)
}

pub fn tmem(name: &str, shape: &[i64], dtype: DType, encoding: TensorMemoryEncoding, mutable: bool) -> Rc<Value> {
    Value::argument(name, tmem_type(shape, dtype, encoding, mutable))
}

pub fn tmem_type(shape: &[i64], dtype: DType, encoding: TensorMemoryEncoding, mutable: bool) -> MemDescType {
    MemDescType::builder()
        .shape(shape)
        .dtype(dtype)
        .encoding(encoding.into())
        .space(MemorySpace::TensorMemory)
        .mutable(mutable)
        .build()
        .expect("valid tensor memory descriptor")
}

/// 128-lane accumulator tile in tensor memory.
pub fn tmem_acc(name: &str, shape: &[i64]) -> Rc<Value> {
    let block_n = u32::try_from(shape[shape.len() - 1]).expect("small shape");
    tmem(name, shape, DType::Float32, TensorMemoryEncoding::new(128, block_n, true), true)
}

/// Block scale factors in tensor memory.
pub fn tmem_scales(name: &str, shape: &[i64]) -> Rc<Value> {
    let ty = MemDescType::builder()
        .shape(shape)
        .dtype(DType::UInt8)
        .encoding(Encoding::TensorMemoryScales)
        .space(MemorySpace::TensorMemory)
        .mutable(true)
        .build()
        .expect("valid scales descriptor");
    Value::argument(name, ty)
}

/// A `[1] x i64` mbarrier in shared memory.
pub fn barrier(name: &str) -> Rc<Value> {
    let ty = MemDescType::builder()
        .shape([1i64].as_slice())
        .dtype(DType::Int64)
        .space(MemorySpace::Shared)
        .mutable(true)
        .build()
        .expect("valid barrier descriptor");
    Value::argument(name, ty)
}

pub fn register(name: &str, shape: &[i64], dtype: DType, encoding: Option<Encoding>) -> Rc<Value> {
    Value::argument(name, TensorType::new(shape, dtype, encoding))
}

/// Runtime `i1`.
pub fn pred(name: &str) -> Rc<Value> {
    Value::argument(name, DType::Bool)
}

pub fn const_bool(name: &str, value: bool) -> Rc<Value> {
    Value::constant(name, DType::Bool, ConstValue::Bool(value))
}

pub fn const_i32(name: &str, value: i64) -> Rc<Value> {
    Value::constant(name, DType::Int32, ConstValue::Int(value))
}

/// TMA descriptor for blocks of `block` elements.
pub fn tensor_desc(name: &str, block: &[i64], dtype: DType) -> Rc<Value> {
    Value::argument(name, Type::TensorDesc(TensorType::new(block, dtype, None)))
}

pub fn blocked_2d() -> Encoding {
    DistributedEncoding::blocked(&[1, 4], &[8, 4], &[4, 1], &[1, 0]).into()
}

pub fn row_per_thread() -> Encoding {
    DistributedEncoding::blocked(&[1, 128], &[32, 1], &[4, 1], &[0, 1]).into()
}

pub fn hopper_mma() -> Encoding {
    NvidiaMmaEncoding::hopper(&[4, 1], &[16, 64, 16]).into()
}

/// Fixed set of TMEM compatible layouts, compared by equality.
#[derive(Debug, Clone, Default)]
pub struct FixedTmemLayouts(pub Vec<Encoding>);

impl TmemLayoutProvider for FixedTmemLayouts {
    fn compatible_layouts(&self, _ty: &TensorType, _memdesc: &MemDescType) -> Vec<Encoding> {
        self.0.clone()
    }
}
