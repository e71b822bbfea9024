//! Operand formats of block-scaled matrix multiplies.

use crate::DType;

/// Logical element format of a scaled MMA operand.
///
/// The stored element type of an operand does not identify its format: all of
/// the sub-byte formats are stored as bytes, and [`ScaleDotElemType::E2M1`]
/// packs two logical values into each stored byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(strum::EnumIter, strum::EnumString, strum::IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
#[cfg_attr(feature = "proptest", derive(proptest_derive::Arbitrary))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScaleDotElemType {
    E4M3,
    E5M2,
    E2M3,
    E3M2,
    E2M1,
    BF16,
    FP16,
}

impl ScaleDotElemType {
    /// Whether more than one logical element shares a stored element.
    pub const fn is_packed(&self) -> bool {
        matches!(self, Self::E2M1)
    }

    /// Logical elements per stored element.
    pub const fn packing_factor(&self) -> i64 {
        if self.is_packed() { 2 } else { 1 }
    }

    /// Stored element type of an operand in this format.
    pub const fn storage_dtype(&self) -> DType {
        match self {
            Self::E4M3 => DType::FP8E4M3,
            Self::E5M2 => DType::FP8E5M2,
            Self::E2M3 | Self::E3M2 | Self::E2M1 => DType::UInt8,
            Self::BF16 => DType::BFloat16,
            Self::FP16 => DType::Float16,
        }
    }

    /// Logical extent of a stored dimension along which elements are packed.
    pub const fn logical_dim(&self, stored: i64) -> i64 {
        stored * self.packing_factor()
    }
}

impl std::fmt::Display for ScaleDotElemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.into())
    }
}
