//! Tensor memory: allocation, register load/store, copy from shared memory
//! and column sub-slicing.

use std::rc::Rc;

use crate::types::{MemDescType, TensorType};
use crate::value::Value;

/// Allocate a tensor-memory buffer, optionally initialized from registers.
#[derive(Debug, Clone, PartialEq)]
pub struct TmemAlloc {
    pub src: Option<Rc<Value>>,
    pub result: MemDescType,
    /// Column assigned by the TMEM allocator, once it has run.
    pub col_offset: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TmemLoad {
    pub src: Rc<Value>,
    pub result: TensorType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TmemStore {
    pub dst: Rc<Value>,
    pub src: Rc<Value>,
    pub pred: Rc<Value>,
}

/// Copy a shared-memory buffer into tensor memory, optionally arriving on
/// `barrier` when done.
#[derive(Debug, Clone, PartialEq)]
pub struct TmemCopy {
    pub src: Rc<Value>,
    pub dst: Rc<Value>,
    pub barrier: Option<Rc<Value>>,
}

/// View of columns `[offset, offset + N)` of a tensor-memory buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct TmemSubSlice {
    pub src: Rc<Value>,
    pub offset: u32,
    pub result: MemDescType,
}

impl TmemSubSlice {
    /// Slice `size` columns starting at `offset`.
    ///
    /// The result keeps every leading dimension of `src`, replaces the last one
    /// with `size`, and narrows the tile width of the encoding to at most
    /// `size`.
    ///
    /// # Panics
    ///
    /// Panics if `src` is not a descriptor with a tensor-memory encoding.
    pub fn new(src: Rc<Value>, offset: u32, size: u32) -> Self {
        let Some(src_ty) = src.ty().as_memdesc() else {
            panic!("tmem sub-slice of non-descriptor value {src}: {}", src.ty());
        };
        let Some(encoding) = src_ty.encoding().and_then(|enc| enc.as_tensor_memory()) else {
            panic!("tmem sub-slice of {src} without tensor memory encoding");
        };

        let mut shape = crate::types::Shape::from_slice(src_ty.shape());
        if let Some(last) = shape.last_mut() {
            *last = i64::from(size);
        }
        let result = src_ty.derive_view(shape, encoding.narrowed(size).into());
        Self { src, offset, result }
    }
}
