//! Element types for the NVIDIA GPU tensor-core IR.
//!
//! [`DType`] is the scalar element type carried by register tensors and memory
//! descriptors. [`ScaleDotElemType`] is the logical operand format of a
//! block-scaled MMA, which may differ from the stored element type (two E2M1
//! values share one stored byte).

pub mod scale;


pub use scale::ScaleDotElemType;

/// Scalar element types.
#[derive(Debug, Hash, PartialOrd, Ord)]
#[derive(strum::EnumCount, strum::EnumIter, strum::VariantArray, strum::FromRepr)]
#[derive(enumset::EnumSetType)]
#[cfg_attr(feature = "proptest", derive(proptest_derive::Arbitrary))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[enumset(repr = "u32")]
pub enum DType {
    /// One-bit predicate (`i1`).
    Bool = 0,

    Int8 = 1,
    UInt8 = 2,
    Int16 = 3,
    UInt16 = 4,
    Int32 = 5,
    UInt32 = 6,
    Int64 = 7,
    UInt64 = 8,

    /// `f8E4M3FN`: 4-bit exponent, 3-bit mantissa, finite only.
    FP8E4M3 = 9,
    /// `f8E5M2`: 5-bit exponent, 2-bit mantissa.
    FP8E5M2 = 10,
    /// `f8E4M3FNUZ`: like [`DType::FP8E4M3`] with unsigned zero (AMD flavour).
    FP8E4M3FNUZ = 11,
    /// `f8E5M2FNUZ`: like [`DType::FP8E5M2`] with unsigned zero (AMD flavour).
    FP8E5M2FNUZ = 12,
    Float16 = 13,
    BFloat16 = 14,
    Float32 = 15,
    Float64 = 16,
}

impl DType {
    pub const fn bit_width(&self) -> u32 {
        match self {
            Self::Bool => 1,
            Self::Int8 | Self::UInt8 => 8,
            Self::Int16 | Self::UInt16 => 16,
            Self::Int32 | Self::UInt32 => 32,
            Self::Int64 | Self::UInt64 => 64,
            Self::FP8E4M3 | Self::FP8E5M2 | Self::FP8E4M3FNUZ | Self::FP8E5M2FNUZ => 8,
            Self::Float16 | Self::BFloat16 => 16,
            Self::Float32 => 32,
            Self::Float64 => 64,
        }
    }

    /// Storage size in bytes. Predicates occupy a full byte.
    pub const fn bytes(&self) -> usize {
        self.bit_width().div_ceil(8) as usize
    }

    pub const fn is_bool(&self) -> bool {
        matches!(self, Self::Bool)
    }

    pub const fn is_signed(&self) -> bool {
        matches!(self, Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64)
    }

    pub const fn is_unsigned(&self) -> bool {
        matches!(self, Self::UInt8 | Self::UInt16 | Self::UInt32 | Self::UInt64)
    }

    pub const fn is_int(&self) -> bool {
        self.is_signed() || self.is_unsigned()
    }

    /// Integer of exactly `width` bits, regardless of signedness.
    pub const fn is_integer(&self, width: u32) -> bool {
        self.is_int() && self.bit_width() == width
    }

    pub const fn is_float(&self) -> bool {
        matches!(
            self,
            Self::FP8E4M3
                | Self::FP8E5M2
                | Self::FP8E4M3FNUZ
                | Self::FP8E5M2FNUZ
                | Self::Float16
                | Self::BFloat16
                | Self::Float32
                | Self::Float64
        )
    }

    /// The two fp8 formats natively consumed by NVIDIA tensor cores.
    pub const fn is_fp8(&self) -> bool {
        matches!(self, Self::FP8E4M3 | Self::FP8E5M2)
    }

    /// Any 8-bit float, including the FNUZ variants.
    pub const fn is_any_fp8(&self) -> bool {
        self.is_fp8() || matches!(self, Self::FP8E4M3FNUZ | Self::FP8E5M2FNUZ)
    }

    /// Name used in textual IR.
    pub const fn mlir_name(&self) -> &'static str {
        match self {
            Self::Bool => "i1",
            Self::Int8 => "i8",
            Self::Int16 => "i16",
            Self::Int32 => "i32",
            Self::Int64 => "i64",
            Self::UInt8 => "ui8",
            Self::UInt16 => "ui16",
            Self::UInt32 => "ui32",
            Self::UInt64 => "ui64",
            Self::FP8E4M3 => "f8E4M3FN",
            Self::FP8E5M2 => "f8E5M2",
            Self::FP8E4M3FNUZ => "f8E4M3FNUZ",
            Self::FP8E5M2FNUZ => "f8E5M2FNUZ",
            Self::Float16 => "f16",
            Self::BFloat16 => "bf16",
            Self::Float32 => "f32",
            Self::Float64 => "f64",
        }
    }
}

impl std::fmt::Display for DType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mlir_name())
    }
}
