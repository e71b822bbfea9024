//! Value types: register tensors, memory descriptors and scalar handles.
//!
//! A [`MemDescType`] is the typed handle every instruction in this crate reads:
//! shape, element type, layout, memory space and mutability. It is immutable
//! once built; derived views (sub-slices) get a fresh descriptor.

use std::fmt;

use bon::bon;
use nvgpu_dtype::DType;
use smallvec::SmallVec;
use snafu::ensure;

use crate::Result;
use crate::encoding::Encoding;
use crate::error::{DescriptorInGlobalSpaceSnafu, EncodingNotAcceptedBySpaceSnafu};

/// Static tensor shape.
///
/// Inline capacity of 4 covers every rank these instructions accept.
pub type Shape = SmallVec<[i64; 4]>;

/// Memory space a value lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum MemorySpace {
    /// Device global memory; reached only through TMA descriptors and pointers.
    #[display("global")]
    Global,
    /// Per-CTA shared memory.
    #[display("#smem")]
    Shared,
    /// Dedicated tensor-core accumulator memory.
    #[display("#ttng.tensor_memory")]
    TensorMemory,
    /// Registers distributed across the lanes of a CTA.
    #[display("#reg")]
    Register,
}

impl MemorySpace {
    /// Whether a descriptor in this space may carry `encoding`.
    pub fn accepts(&self, encoding: &Encoding) -> bool {
        match encoding {
            Encoding::NvmmaShared(_) => *self == Self::Shared,
            Encoding::TensorMemory(_) | Encoding::TensorMemoryScales => *self == Self::TensorMemory,
            Encoding::Distributed(_) | Encoding::NvidiaMma(_) | Encoding::DotOperand(_) => *self == Self::Register,
        }
    }
}

/// Register tensor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TensorType {
    pub shape: Shape,
    pub dtype: DType,
    pub encoding: Option<Encoding>,
}

impl TensorType {
    pub fn new(shape: impl Into<Shape>, dtype: DType, encoding: Option<Encoding>) -> Self {
        Self { shape: shape.into(), dtype, encoding }
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }
}

/// Typed handle to a buffer in shared or tensor memory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemDescType {
    shape: Shape,
    alloc_shape: Shape,
    dtype: DType,
    encoding: Option<Encoding>,
    space: MemorySpace,
    mutable: bool,
}

#[bon]
impl MemDescType {
    /// Build a descriptor, checking that `space` accepts `encoding`.
    ///
    /// `alloc_shape` is the shape of the underlying allocation and defaults to
    /// `shape`; it differs only for views into a larger buffer.
    #[builder]
    pub fn new(
        #[builder(into)] shape: Shape,
        dtype: DType,
        encoding: Option<Encoding>,
        space: MemorySpace,
        #[builder(default)] mutable: bool,
        #[builder(into)] alloc_shape: Option<Shape>,
    ) -> Result<Self> {
        ensure!(space != MemorySpace::Global, DescriptorInGlobalSpaceSnafu);
        if let Some(encoding) = &encoding {
            ensure!(
                space.accepts(encoding),
                EncodingNotAcceptedBySpaceSnafu { space, encoding: encoding.to_string() }
            );
        }
        let alloc_shape = alloc_shape.unwrap_or_else(|| shape.clone());
        Ok(Self { shape, alloc_shape, dtype, encoding, space, mutable })
    }
}

impl MemDescType {
    pub fn shape(&self) -> &[i64] {
        &self.shape
    }

    pub fn alloc_shape(&self) -> &[i64] {
        &self.alloc_shape
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn encoding(&self) -> Option<&Encoding> {
        self.encoding.as_ref()
    }

    pub fn space(&self) -> MemorySpace {
        self.space
    }

    pub fn is_mutable(&self) -> bool {
        self.mutable
    }

    /// Copy with a different logical shape and encoding.
    ///
    /// The allocation shape, element type, space and mutability carry over, so
    /// the result still describes a view into the same allocation.
    pub(crate) fn derive_view(&self, shape: Shape, encoding: Encoding) -> Self {
        Self { shape, encoding: Some(encoding), ..self.clone() }
    }

    /// Number of elements that are consecutive in memory starting from the
    /// innermost dimension, assuming row-major storage of the allocation.
    ///
    /// The run covers trailing dimensions as long as the view spans the whole
    /// allocation along them; the first narrower dimension ends it.
    pub fn innermost_contiguous_elements(&self) -> i64 {
        let mut run = 1;
        let dims = self.shape.iter().rev().zip(self.alloc_shape.iter().rev());
        for (&dim, &alloc_dim) in dims {
            run *= dim;
            if dim != alloc_dim {
                break;
            }
        }
        run
    }
}

/// Type of an SSA value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// Integer, predicate or float scalar.
    Scalar(DType),
    /// Distributed register tensor.
    Tensor(TensorType),
    /// Shared- or tensor-memory buffer handle.
    MemDesc(MemDescType),
    /// TMA descriptor for global memory, parameterized by its block type.
    TensorDesc(TensorType),
    /// Pointer into global memory.
    Ptr(DType),
    /// Completion handle of an asynchronous operation.
    AsyncToken,
}

impl Type {
    pub fn as_tensor(&self) -> Option<&TensorType> {
        match self {
            Self::Tensor(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn as_memdesc(&self) -> Option<&MemDescType> {
        match self {
            Self::MemDesc(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn is_memdesc(&self) -> bool {
        matches!(self, Self::MemDesc(_))
    }

    /// Shape of a tensor or descriptor; empty for everything else.
    pub fn shape(&self) -> &[i64] {
        match self {
            Self::Tensor(ty) | Self::TensorDesc(ty) => ty.shape.as_slice(),
            Self::MemDesc(ty) => ty.shape(),
            Self::Scalar(_) | Self::Ptr(_) | Self::AsyncToken => &[],
        }
    }

    /// Element type, if the type has one.
    pub fn dtype(&self) -> Option<DType> {
        match self {
            Self::Scalar(dtype) | Self::Ptr(dtype) => Some(*dtype),
            Self::Tensor(ty) | Self::TensorDesc(ty) => Some(ty.dtype),
            Self::MemDesc(ty) => Some(ty.dtype()),
            Self::AsyncToken => None,
        }
    }

    pub fn encoding(&self) -> Option<&Encoding> {
        match self {
            Self::Tensor(ty) | Self::TensorDesc(ty) => ty.encoding.as_ref(),
            Self::MemDesc(ty) => ty.encoding(),
            Self::Scalar(_) | Self::Ptr(_) | Self::AsyncToken => None,
        }
    }

    /// Where the value's data lives. Scalars and tokens are register values.
    pub fn memory_space(&self) -> MemorySpace {
        match self {
            Self::MemDesc(ty) => ty.space(),
            Self::TensorDesc(_) | Self::Ptr(_) => MemorySpace::Global,
            Self::Tensor(_) | Self::Scalar(_) | Self::AsyncToken => MemorySpace::Register,
        }
    }
}

impl From<TensorType> for Type {
    fn from(ty: TensorType) -> Self {
        Self::Tensor(ty)
    }
}

impl From<MemDescType> for Type {
    fn from(ty: MemDescType) -> Self {
        Self::MemDesc(ty)
    }
}

impl From<DType> for Type {
    fn from(dtype: DType) -> Self {
        Self::Scalar(dtype)
    }
}

fn write_dims(f: &mut fmt::Formatter<'_>, shape: &[i64]) -> fmt::Result {
    for dim in shape {
        write!(f, "{dim}x")?;
    }
    Ok(())
}

fn write_tensor_body(f: &mut fmt::Formatter<'_>, ty: &TensorType) -> fmt::Result {
    write_dims(f, &ty.shape)?;
    write!(f, "{}", ty.dtype)?;
    if let Some(encoding) = &ty.encoding {
        write!(f, ", {encoding}")?;
    }
    Ok(())
}

impl fmt::Display for TensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("tensor<")?;
        write_tensor_body(f, self)?;
        f.write_str(">")
    }
}

impl fmt::Display for MemDescType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("!ttg.memdesc<")?;
        write_dims(f, &self.shape)?;
        write!(f, "{}", self.dtype)?;
        if let Some(encoding) = &self.encoding {
            write!(f, ", {encoding}")?;
        }
        write!(f, ", {}", self.space)?;
        if self.mutable {
            f.write_str(", mutable")?;
        }
        if self.alloc_shape != self.shape {
            f.write_str(", ")?;
            for (i, dim) in self.alloc_shape.iter().enumerate() {
                if i > 0 {
                    f.write_str("x")?;
                }
                write!(f, "{dim}")?;
            }
        }
        f.write_str(">")
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(dtype) => write!(f, "{dtype}"),
            Self::Tensor(ty) => write!(f, "{ty}"),
            Self::MemDesc(ty) => write!(f, "{ty}"),
            Self::TensorDesc(ty) => {
                f.write_str("!tt.tensordesc<")?;
                write!(f, "{ty}")?;
                f.write_str(">")
            }
            Self::Ptr(dtype) => write!(f, "!tt.ptr<{dtype}>"),
            Self::AsyncToken => f.write_str("!ttg.async.token"),
        }
    }
}
