//! Layout encodings.
//!
//! An [`Encoding`] says how the logical elements of a tensor or memory
//! descriptor map onto lanes, addresses or tensor-memory columns. Every memory
//! space accepts a fixed family of encodings (see
//! [`MemorySpace::accepts`](crate::types::MemorySpace::accepts)).

use std::fmt;

use smallvec::SmallVec;

/// Layout descriptor attached to a tensor or a memory descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// Shared-memory layout consumable by TMA and tensor cores.
    NvmmaShared(NvmmaSharedEncoding),
    /// Tensor-memory layout of an accumulator or operand tile.
    TensorMemory(TensorMemoryEncoding),
    /// Tensor-memory layout of block scale factors.
    TensorMemoryScales,
    /// Register layout owned by the generic GPU dialect.
    Distributed(DistributedEncoding),
    /// Register layout of an MMA accumulator.
    NvidiaMma(NvidiaMmaEncoding),
    /// Register layout of an MMA input operand, derived from its parent MMA layout.
    DotOperand(DotOperandEncoding),
}

impl Encoding {
    /// Whether this is a register (distributed) layout.
    pub fn is_distributed(&self) -> bool {
        match self {
            Self::Distributed(_) | Self::NvidiaMma(_) | Self::DotOperand(_) => true,
            Self::NvmmaShared(_) | Self::TensorMemory(_) | Self::TensorMemoryScales => false,
        }
    }

    /// Whether this is one of the two tensor-memory layouts.
    pub fn is_tensor_memory(&self) -> bool {
        matches!(self, Self::TensorMemory(_) | Self::TensorMemoryScales)
    }

    pub fn as_nvmma_shared(&self) -> Option<&NvmmaSharedEncoding> {
        match self {
            Self::NvmmaShared(enc) => Some(enc),
            _ => None,
        }
    }

    pub fn as_tensor_memory(&self) -> Option<&TensorMemoryEncoding> {
        match self {
            Self::TensorMemory(enc) => Some(enc),
            _ => None,
        }
    }

    pub fn as_nvidia_mma(&self) -> Option<&NvidiaMmaEncoding> {
        match self {
            Self::NvidiaMma(enc) => Some(enc),
            _ => None,
        }
    }
}

impl From<NvmmaSharedEncoding> for Encoding {
    fn from(enc: NvmmaSharedEncoding) -> Self {
        Self::NvmmaShared(enc)
    }
}

impl From<TensorMemoryEncoding> for Encoding {
    fn from(enc: TensorMemoryEncoding) -> Self {
        Self::TensorMemory(enc)
    }
}

impl From<DistributedEncoding> for Encoding {
    fn from(enc: DistributedEncoding) -> Self {
        Self::Distributed(enc)
    }
}

impl From<NvidiaMmaEncoding> for Encoding {
    fn from(enc: NvidiaMmaEncoding) -> Self {
        Self::NvidiaMma(enc)
    }
}

impl From<DotOperandEncoding> for Encoding {
    fn from(enc: DotOperandEncoding) -> Self {
        Self::DotOperand(enc)
    }
}

/// Swizzled shared-memory layout in the format TMA and WGMMA read directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NvmmaSharedEncoding {
    /// Swizzle width in bytes: 0 (none), 32, 64 or 128.
    pub swizzling_byte_width: u32,
    /// Column-major storage of the logical tile.
    pub transposed: bool,
    pub element_bit_width: u32,
    /// Each 4-bit element padded to a full byte.
    pub fp4_padded: bool,
}

impl NvmmaSharedEncoding {
    /// Row-major, unswizzled, unpadded.
    pub const fn unswizzled(element_bit_width: u32) -> Self {
        Self { swizzling_byte_width: 0, transposed: false, element_bit_width, fp4_padded: false }
    }

    pub const fn swizzled(swizzling_byte_width: u32, element_bit_width: u32) -> Self {
        Self { swizzling_byte_width, transposed: false, element_bit_width, fp4_padded: false }
    }

    pub const fn transposed(self, transposed: bool) -> Self {
        Self { transposed, ..self }
    }

    pub const fn is_swizzled(&self) -> bool {
        self.swizzling_byte_width != 0
    }
}

/// Tensor-memory tile layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TensorMemoryEncoding {
    /// Tile height in TMEM lanes; 64 or 128 on current hardware.
    pub block_m: u32,
    /// Tile width in TMEM columns.
    pub block_n: u32,
    /// One 16-bit element per 32-bit column instead of two.
    pub unpacked: bool,
    pub cta_split_m: u32,
    pub cta_split_n: u32,
}

impl TensorMemoryEncoding {
    pub const fn new(block_m: u32, block_n: u32, unpacked: bool) -> Self {
        Self { block_m, block_n, unpacked, cta_split_m: 1, cta_split_n: 1 }
    }

    pub const fn with_cta_split(self, cta_split_m: u32, cta_split_n: u32) -> Self {
        Self { cta_split_m, cta_split_n, ..self }
    }

    /// Two layouts address the same TMEM lanes the same way; only `block_n` may differ.
    pub const fn is_compatible_with(&self, other: &Self) -> bool {
        self.block_m == other.block_m
            && self.cta_split_m == other.cta_split_m
            && self.cta_split_n == other.cta_split_n
            && self.unpacked == other.unpacked
    }

    /// Same layout with the tile narrowed to at most `size` columns.
    pub fn narrowed(&self, size: u32) -> Self {
        Self { block_n: self.block_n.min(size), ..*self }
    }
}

/// Register layouts owned by the generic GPU dialect.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DistributedEncoding {
    Blocked {
        size_per_thread: SmallVec<[u32; 4]>,
        threads_per_warp: SmallVec<[u32; 4]>,
        warps_per_cta: SmallVec<[u32; 4]>,
        order: SmallVec<[u32; 4]>,
    },
    /// Explicit linear layout given by its basis vectors.
    Linear {
        register: Vec<SmallVec<[i32; 2]>>,
        lane: Vec<SmallVec<[i32; 2]>>,
        warp: Vec<SmallVec<[i32; 2]>>,
        block: Vec<SmallVec<[i32; 2]>>,
    },
}

impl DistributedEncoding {
    pub fn blocked(size_per_thread: &[u32], threads_per_warp: &[u32], warps_per_cta: &[u32], order: &[u32]) -> Self {
        Self::Blocked {
            size_per_thread: SmallVec::from_slice(size_per_thread),
            threads_per_warp: SmallVec::from_slice(threads_per_warp),
            warps_per_cta: SmallVec::from_slice(warps_per_cta),
            order: SmallVec::from_slice(order),
        }
    }
}

/// Accumulator layout of an NVIDIA MMA generation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NvidiaMmaEncoding {
    /// MMA generation: 2 for Ampere `mma.sync`, 3 for Hopper `wgmma`.
    pub version_major: u32,
    pub version_minor: u32,
    pub warps_per_cta: SmallVec<[u32; 4]>,
    pub instr_shape: SmallVec<[u32; 4]>,
}

impl NvidiaMmaEncoding {
    pub fn hopper(warps_per_cta: &[u32], instr_shape: &[u32]) -> Self {
        Self {
            version_major: 3,
            version_minor: 0,
            warps_per_cta: SmallVec::from_slice(warps_per_cta),
            instr_shape: SmallVec::from_slice(instr_shape),
        }
    }

    pub fn ampere(warps_per_cta: &[u32]) -> Self {
        Self {
            version_major: 2,
            version_minor: 0,
            warps_per_cta: SmallVec::from_slice(warps_per_cta),
            instr_shape: SmallVec::from_slice(&[16, 8]),
        }
    }

    pub const fn is_hopper(&self) -> bool {
        self.version_major == 3
    }

    pub const fn is_ampere(&self) -> bool {
        self.version_major == 2
    }
}

/// Register layout of operand `op_idx` (0 = A, 1 = B) of an MMA with layout `parent`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DotOperandEncoding {
    pub op_idx: u32,
    pub parent: Box<Encoding>,
    pub k_width: u32,
}

impl DotOperandEncoding {
    pub fn new(op_idx: u32, parent: Encoding, k_width: u32) -> Self {
        Self { op_idx, parent: Box::new(parent), k_width }
    }
}

struct List<'a, T>(&'a [T]);

impl<T: fmt::Display> fmt::Display for List<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, item) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{item}")?;
        }
        f.write_str("]")
    }
}

struct Bases<'a>(&'a [SmallVec<[i32; 2]>]);

impl fmt::Display for Bases<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, basis) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", List(basis))?;
        }
        f.write_str("]")
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NvmmaShared(enc) => write!(
                f,
                "#ttg.nvmma_shared<{{swizzlingByteWidth = {}, transposed = {}, elementBitWidth = {}, fp4Padded = {}}}>",
                enc.swizzling_byte_width, enc.transposed, enc.element_bit_width, enc.fp4_padded
            ),
            Self::TensorMemory(enc) => write!(
                f,
                "#ttng.tensor_memory_encoding<blockM = {}, blockN = {}, unpacked = {}, CTASplitM = {}, CTASplitN = {}>",
                enc.block_m, enc.block_n, enc.unpacked, enc.cta_split_m, enc.cta_split_n
            ),
            Self::TensorMemoryScales => f.write_str("#ttng.tensor_memory_scales_encoding<>"),
            Self::Distributed(DistributedEncoding::Blocked {
                size_per_thread,
                threads_per_warp,
                warps_per_cta,
                order,
            }) => {
                write!(
                    f,
                    "#ttg.blocked<{{sizePerThread = {}, threadsPerWarp = {}, warpsPerCTA = {}, order = {}}}>",
                    List(size_per_thread),
                    List(threads_per_warp),
                    List(warps_per_cta),
                    List(order)
                )
            }
            Self::Distributed(DistributedEncoding::Linear { register, lane, warp, block }) => write!(
                f,
                "#ttg.linear<{{register = {}, lane = {}, warp = {}, block = {}}}>",
                Bases(register),
                Bases(lane),
                Bases(warp),
                Bases(block)
            ),
            Self::NvidiaMma(enc) => write!(
                f,
                "#ttg.nvidia_mma<{{versionMajor = {}, versionMinor = {}, warpsPerCTA = {}, instrShape = {}}}>",
                enc.version_major,
                enc.version_minor,
                List(&enc.warps_per_cta),
                List(&enc.instr_shape)
            ),
            Self::DotOperand(enc) => {
                write!(f, "#ttg.dot_op<{{opIdx = {}, parent = {}, kWidth = {}}}>", enc.op_idx, enc.parent, enc.k_width)
            }
        }
    }
}
