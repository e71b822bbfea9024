//! Bulk copies through TMA tensor descriptors, and tensormap creation.

use std::rc::Rc;

use smallvec::SmallVec;

use crate::value::Value;

/// Copy a box of global memory addressed by `coords` into `result`, signalling
/// `barrier` on completion.
#[derive(Debug, Clone, PartialEq)]
pub struct AsyncTmaCopyGlobalToLocal {
    pub desc: Rc<Value>,
    pub coords: SmallVec<[Rc<Value>; 5]>,
    pub barrier: Rc<Value>,
    /// Destination shared-memory buffer.
    pub result: Rc<Value>,
    pub pred: Rc<Value>,
}

/// Gather rows `x_offsets` starting at column `y_offset` into `result`.
#[derive(Debug, Clone, PartialEq)]
pub struct AsyncTmaGather {
    pub desc: Rc<Value>,
    pub x_offsets: Rc<Value>,
    pub y_offset: Rc<Value>,
    pub barrier: Rc<Value>,
    pub result: Rc<Value>,
    pub pred: Rc<Value>,
}

/// Scatter the rows of `src` to rows `x_offsets` of the global tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct AsyncTmaScatter {
    pub desc: Rc<Value>,
    pub x_offsets: Rc<Value>,
    pub y_offset: Rc<Value>,
    pub src: Rc<Value>,
}

/// Write a TMA descriptor for the tensor at `global_address` to `desc_ptr`.
///
/// `box_dim` fixes the rank; strides are given for every dimension but the
/// outermost.
#[derive(Debug, Clone, PartialEq)]
pub struct TensormapCreate {
    pub desc_ptr: Rc<Value>,
    pub global_address: Rc<Value>,
    pub box_dim: SmallVec<[Rc<Value>; 5]>,
    pub global_dim: SmallVec<[Rc<Value>; 5]>,
    pub global_stride: SmallVec<[Rc<Value>; 5]>,
    pub element_stride: SmallVec<[Rc<Value>; 5]>,
    pub elem_type: u32,
    pub interleave_layout: u32,
    pub swizzle_mode: u32,
    pub fill_mode: u32,
}
