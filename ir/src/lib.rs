//! Legality verification and memory-effect inference for NVIDIA tensor-core,
//! tensor-memory (TMEM) and TMA instructions.
//!
//! The hosting IR builds an [`Op`], calls [`Op::verify`] to check it is
//! schedulable on the hardware, and later asks [`Op::effects`] which memory
//! spaces it reads and writes.
//!
//! # Module Organization
//!
//! - [`types`] - Memory descriptors, register tensors and memory spaces
//! - [`encoding`] - Shared, tensor-memory and register layouts
//! - [`value`] - SSA values and constant evaluation
//! - [`op`] - The instruction enum
//! - [`ops`] - Per-instruction payloads, builders and the dot/MMA interfaces
//! - [`verify`] - Legality rules
//! - [`effects`] - Memory effect inference
//! - [`asm`] - Custom syntax for barrier lists and async tokens
//! - [`context`] - Module-level inputs to verification
//! - [`error`] - Error and diagnostic types

pub mod asm;
pub mod context;
pub mod effects;
pub mod encoding;
pub mod error;
pub mod op;
pub mod ops;
pub mod types;
pub mod value;
pub mod verify;


pub use context::{TmemLayoutProvider, VerifyContext};
pub use effects::{Effect, EffectKind, EffectTarget, Effects};
pub use encoding::{
    DistributedEncoding, DotOperandEncoding, Encoding, NvidiaMmaEncoding, NvmmaSharedEncoding, TensorMemoryEncoding,
};
pub use error::{Diagnostic, Error, ParseError, Result};
pub use op::Op;
pub use ops::{CompletionBarrier, DotOp, InferDotOpEncoding, MmaV5Op, OptionalToken};
pub use types::{MemDescType, MemorySpace, Shape, TensorType, Type};
pub use value::{ConstValue, Value, ValueDef};

pub use nvgpu_dtype::{DType, ScaleDotElemType};
