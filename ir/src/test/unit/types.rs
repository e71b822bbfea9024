//! Memory descriptors, spaces and type printing.

use nvgpu_dtype::DType;
use test_case::test_case;

use crate::encoding::{Encoding, NvmmaSharedEncoding, TensorMemoryEncoding};
use crate::error::Error;
use crate::test::helpers::*;
use crate::types::{MemDescType, MemorySpace, TensorType, Type};
use crate::value::{ConstValue, Value};

fn shared() -> Encoding {
    NvmmaSharedEncoding::unswizzled(16).into()
}

fn tmem_enc() -> Encoding {
    TensorMemoryEncoding::new(128, 64, true).into()
}

#[test_case(MemorySpace::Shared, shared() => true; "shared accepts nvmma")]
#[test_case(MemorySpace::TensorMemory, shared() => false; "tmem rejects nvmma")]
#[test_case(MemorySpace::TensorMemory, tmem_enc() => true; "tmem accepts tmem")]
#[test_case(MemorySpace::TensorMemory, Encoding::TensorMemoryScales => true; "tmem accepts scales")]
#[test_case(MemorySpace::Shared, Encoding::TensorMemoryScales => false; "shared rejects scales")]
#[test_case(MemorySpace::Register, blocked_2d() => true; "registers accept blocked")]
#[test_case(MemorySpace::Shared, hopper_mma() => false; "shared rejects mma")]
#[test_case(MemorySpace::Global, shared() => false; "global rejects nvmma")]
fn test_space_accepts(space: MemorySpace, encoding: Encoding) -> bool {
    space.accepts(&encoding)
}

#[test]
fn test_descriptor_builder_checks_space() {
    let in_global = MemDescType::builder()
        .shape([64i64, 64].as_slice())
        .dtype(DType::Float16)
        .space(MemorySpace::Global)
        .build();
    assert_eq!(in_global, Err(Error::DescriptorInGlobalSpace));

    let mismatched = MemDescType::builder()
        .shape([64i64, 64].as_slice())
        .dtype(DType::Float16)
        .encoding(tmem_enc())
        .space(MemorySpace::Shared)
        .build();
    assert!(matches!(mismatched, Err(Error::EncodingNotAcceptedBySpace { space: MemorySpace::Shared, .. })));
}

#[test]
fn test_descriptor_builder_defaults() {
    let ty = MemDescType::builder()
        .shape([32i64, 16].as_slice())
        .dtype(DType::UInt8)
        .space(MemorySpace::Shared)
        .build()
        .unwrap();
    assert!(!ty.is_mutable());
    assert_eq!(ty.alloc_shape(), ty.shape());
    assert_eq!(ty.encoding(), None);
    assert_eq!(ty.rank(), 2);
}

#[test_case(&[128, 64], &[128, 64] => 8192; "whole buffer")]
#[test_case(&[128, 32], &[128, 64] => 32; "column slice")]
#[test_case(&[64, 64], &[128, 64] => 4096; "row slice")]
#[test_case(&[2, 4, 8], &[4, 4, 8] => 64; "leading slice")]
#[test_case(&[1], &[1] => 1; "scalar barrier")]
fn test_innermost_contiguous_elements(shape: &[i64], alloc_shape: &[i64]) -> i64 {
    MemDescType::builder()
        .shape(shape)
        .alloc_shape(alloc_shape)
        .dtype(DType::Float16)
        .space(MemorySpace::Shared)
        .build()
        .unwrap()
        .innermost_contiguous_elements()
}

#[test]
fn test_type_queries() {
    let desc = tensor_desc("desc", &[64, 64], DType::Float16);
    assert_eq!(desc.ty().memory_space(), MemorySpace::Global);
    assert_eq!(desc.ty().shape(), &[64, 64]);

    let acc = tmem_acc("acc", &[128, 64]);
    assert_eq!(acc.ty().memory_space(), MemorySpace::TensorMemory);
    assert_eq!(acc.ty().dtype(), Some(DType::Float32));
    assert!(acc.ty().encoding().is_some_and(Encoding::is_tensor_memory));

    assert_eq!(Type::AsyncToken.dtype(), None);
    assert!(Type::Scalar(DType::Bool).shape().is_empty());
    assert_eq!(Type::Ptr(DType::Float16).memory_space(), MemorySpace::Global);
}

#[test]
fn test_constant_folding() {
    assert_eq!(const_bool("t", true).try_constant_int(), Some(1));
    assert_eq!(const_i32("z", 0).try_constant_int(), Some(0));
    assert_eq!(Value::constant("f", DType::Float32, ConstValue::Float(0.0)).try_constant_int(), None);
    assert_eq!(pred("p").try_constant_int(), None);
}

#[test]
fn test_display() {
    assert_eq!(barrier("bar").ty().to_string(), "!ttg.memdesc<1xi64, #smem, mutable>");
    assert_eq!(
        TensorType::new([64i64, 16].as_slice(), DType::Int32, None).to_string(),
        "tensor<64x16xi32>"
    );
    assert_eq!(Type::Ptr(DType::Float16).to_string(), "!tt.ptr<f16>");
    assert_eq!(pred("p").to_string(), "%p");

    let view = MemDescType::builder()
        .shape([128i64, 32].as_slice())
        .alloc_shape([128i64, 64].as_slice())
        .dtype(DType::Float32)
        .encoding(TensorMemoryEncoding::new(128, 32, true).into())
        .space(MemorySpace::TensorMemory)
        .build()
        .unwrap();
    assert_eq!(
        view.to_string(),
        "!ttg.memdesc<128x32xf32, #ttng.tensor_memory_encoding<blockM = 128, blockN = 32, unpacked = true, \
         CTASplitM = 1, CTASplitN = 1>, #ttng.tensor_memory, 128x64>"
    );
}
