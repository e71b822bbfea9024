use std::fmt;

use nvgpu_dtype::DType;
use snafu::Snafu;

use crate::encoding::Encoding;
use crate::types::{MemorySpace, Shape};

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A violated legality rule.
#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    // =========================================================================
    // Descriptor model
    // =========================================================================
    #[snafu(display("memory descriptors cannot live in global memory"))]
    DescriptorInGlobalSpace,

    #[snafu(display("memory space {space} does not accept encoding {encoding}"))]
    EncodingNotAcceptedBySpace { space: MemorySpace, encoding: String },

    /// Operand has the wrong type category (e.g. a tensor where a descriptor is required).
    #[snafu(display("{operand} must be {expected}, got {found}"))]
    UnexpectedType { operand: &'static str, expected: &'static str, found: String },

    // =========================================================================
    // Dot / MMA family
    // =========================================================================
    #[snafu(display("WGMMA result layout must be Hopper NVMMA, got {found}"))]
    WgmmaResultLayout { found: String },

    #[snafu(display("WGMMA A operand must have NVMMA shared or dot layout"))]
    WgmmaOperandALayout,

    #[snafu(display("WGMMA B operand must have NVMMA shared layout"))]
    WgmmaOperandBLayout,

    #[snafu(display("WGMMA requires num_warps to be divisible by 4, got {num_warps}"))]
    WgmmaNumWarps { num_warps: u32 },

    #[snafu(display("WGMMA result shape must be 2D, got rank {rank}"))]
    WgmmaResultRank { rank: usize },

    #[snafu(display("WGMMA result M dimension must be divisible by 64, got {m}"))]
    WgmmaResultM { m: i64 },

    #[snafu(display("WGMMA result N dimension must be divisible by 8, got {n}"))]
    WgmmaResultN { n: i64 },

    #[snafu(display("WGMMA operand A element type must be F16, BF16, F32, F8E5M2, F8E4M3FN or I8, got {dtype}"))]
    WgmmaElementType { dtype: DType },

    /// fp8 inputs accumulated in f32 lose precision below the hardware promotion threshold.
    #[snafu(display(
        "cannot use F32 as the accumulator element type when max_num_imprecise_acc ({max_num_imprecise_acc}) is less than 32"
    ))]
    ImpreciseAccumulation { max_num_imprecise_acc: u32 },

    #[snafu(display("{operand} must have rank 2 or 3, got {rank}"))]
    DotOperandRank { operand: &'static str, rank: usize },

    #[snafu(display("operands must have the same rank, got A: {a_rank}, B: {b_rank}, D: {d_rank}"))]
    DotRankMismatch { a_rank: usize, b_rank: usize, d_rank: usize },

    #[snafu(display("contraction dimension mismatch: A has K = {a_k} but B has K = {b_k}"))]
    ContractionDimMismatch { a_k: i64, b_k: i64 },

    #[snafu(display("output dimensions [{m}, {n}] do not match the operands, expected [{expected_m}, {expected_n}]"))]
    OutputDimMismatch { m: i64, n: i64, expected_m: i64, expected_n: i64 },

    #[snafu(display("the op is synchronous but {count} completion barrier(s) are present"))]
    SyncWithBarriers { count: usize },

    #[snafu(display("cannot infer the encoding of dot operand {operand_index}: {reason}"))]
    DotEncodingInference { operand_index: usize, reason: String },

    // =========================================================================
    // Barriers
    // =========================================================================
    #[snafu(display("barrier allocation must be a descriptor of 1xi64 type in shared memory, got {found}"))]
    InvalidBarrierType { found: String },

    #[snafu(display("count must be greater than or equal to 1, got {count}"))]
    ArriveCount { count: i32 },

    // =========================================================================
    // TMA
    // =========================================================================
    #[snafu(display("TMA copies must have between 1 and 5 coordinates, got {count}"))]
    TmaCoordCount { count: usize },

    #[snafu(display("cannot {action} into immutable memory"))]
    ImmutableDestination { action: &'static str },

    #[snafu(display("x offsets must be 32-bit integers, got {dtype}"))]
    GatherOffsetsType { dtype: DType },

    #[snafu(display("x offsets must be a 1D tensor, got rank {rank}"))]
    GatherOffsetsRank { rank: usize },

    #[snafu(display("gather block must be a 2D tensor, got rank {rank}"))]
    GatherResultRank { rank: usize },

    #[snafu(display("gather must have at least 8 rows, got {rows}"))]
    GatherRows { rows: i64 },

    #[snafu(display("TMA element type cannot be wider than 32 bits, got {dtype}"))]
    GatherElementWidth { dtype: DType },

    #[snafu(display("gather of {dtype} must have at least {min_cols} columns, got {cols}"))]
    GatherColumns { dtype: DType, min_cols: i64, cols: i64 },

    #[snafu(display("gather block must have as many rows as x offsets ({offsets}), got {rows}"))]
    GatherRowCountMismatch { rows: i64, offsets: i64 },

    // =========================================================================
    // Tensor memory
    // =========================================================================
    #[snafu(display("{operand} must be a tensor memory buffer"))]
    NotTensorMemory { operand: &'static str },

    #[snafu(display("{operand} must be a shared memory buffer"))]
    NotSharedMemory { operand: &'static str },

    #[snafu(display("{operand} should use tensor memory encoding"))]
    NotTmemEncoding { operand: &'static str },

    #[snafu(display("{operand} must be a 2D tensor, got rank {rank}"))]
    TmemOperandRank { operand: &'static str, rank: usize },

    #[snafu(display("{operand} does not have a distributed encoding"))]
    TmemOperandNotDistributed { operand: &'static str },

    #[snafu(display("{operand} does not have any TMEM compatible layouts"))]
    NoTmemCompatibleLayouts { operand: &'static str },

    /// Carries every rejected candidate; they become diagnostic notes.
    #[snafu(display("{operand} layout is not TMEM compatible"))]
    TmemLayoutIncompatible { operand: &'static str, candidates: Vec<Encoding> },

    #[snafu(display("source element type {src} must match destination element type {dst}"))]
    ElementTypeMismatch { src: DType, dst: DType },

    #[snafu(display("source shape {src:?} must match destination shape {dst:?}"))]
    ShapeMismatch { src: Shape, dst: Shape },

    #[snafu(display("result shape {shape:?} and its alloc shape {alloc_shape:?} must match"))]
    AllocShapeMismatch { shape: Shape, alloc_shape: Shape },

    #[snafu(display("uninitialized alloc must have a mutable memdesc type"))]
    UninitializedImmutableAlloc,

    #[snafu(display("the source should not have swizzling, transposition or fp4 padding applied"))]
    TmemCopySwizzled,

    #[snafu(display("the source must be in row-major order: {contiguous} contiguous elements, need at least 512"))]
    TmemCopyNotRowMajor { contiguous: i64 },

    #[snafu(display("the source tensor memory descriptor must have a 128xN or 64xN layout, got block_m={block_m}"))]
    SubSliceBlockM { block_m: u32 },

    #[snafu(display("the destination must have the same block size and CTASplit size as the source"))]
    SubSliceLayoutMismatch,

    // =========================================================================
    // Tensor maps
    // =========================================================================
    #[snafu(display("rank mismatch for {list}: got {got} but expected {expected}"))]
    TensormapRank { list: &'static str, got: usize, expected: usize },
}

impl Error {
    /// Supplementary lines that accompany the primary message.
    pub fn notes(&self) -> Vec<String> {
        match self {
            Self::TmemLayoutIncompatible { candidates, .. } => {
                candidates.iter().map(|layout| format!("potential TMEM layout: {layout}")).collect()
            }
            _ => Vec::new(),
        }
    }
}

/// Verification failure attributed to one instruction.
///
/// Rendered as `'<mnemonic>' op <message>` followed by one `note:` line per note.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub op: &'static str,
    pub error: Error,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn new(op: &'static str, error: Error) -> Self {
        let notes = error.notes();
        Self { op, error, notes }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' op {}", self.op, self.error)?;
        for note in &self.notes {
            write!(f, "\nnote: {note}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostic {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Failure while reading a custom operand list.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub))]
pub enum ParseError {
    #[snafu(display("expected {expected} at offset {offset}"))]
    Expected { expected: &'static str, offset: usize },
}
