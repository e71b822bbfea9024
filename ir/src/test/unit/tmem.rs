//! Tensor-memory load/store/alloc/copy/sub-slice verification.

use nvgpu_dtype::DType;
use test_case::test_case;

use crate::encoding::{Encoding, NvmmaSharedEncoding, TensorMemoryEncoding};
use crate::error::Error;
use crate::ops::{TmemAlloc, TmemCopy, TmemLoad, TmemStore, TmemSubSlice};
use crate::test::helpers::*;
use crate::types::{MemDescType, MemorySpace, TensorType};
use crate::value::Value;
use crate::{Op, VerifyContext};

fn acc_encoding() -> TensorMemoryEncoding {
    TensorMemoryEncoding::new(128, 128, true)
}

fn store(src_encoding: Option<Encoding>) -> TmemStore {
    TmemStore {
        dst: tmem("dst", &[128, 128], DType::Float32, acc_encoding(), true),
        src: register("src", &[128, 128], DType::Float32, src_encoding),
        pred: const_bool("true", true),
    }
}

fn load(result_encoding: Option<Encoding>) -> TmemLoad {
    TmemLoad {
        src: tmem("src", &[128, 128], DType::Float32, acc_encoding(), false),
        result: TensorType::new([128i64, 128].as_slice(), DType::Float32, result_encoding),
    }
}

// =========================================================================
// Register operand layouts
// =========================================================================

#[test]
fn test_store_with_compatible_layout() {
    let layouts = FixedTmemLayouts(vec![row_per_thread()]);
    let ctx = VerifyContext::builder().tmem_layouts(&layouts).build();
    assert_eq!(store(Some(row_per_thread())).verify(&ctx), Ok(()));
    assert_eq!(load(Some(row_per_thread())).verify(&ctx), Ok(()));
}

#[test]
fn test_unencoded_register_skips_layout_check() {
    let ctx = VerifyContext::default();
    assert_eq!(store(None).verify(&ctx), Ok(()));
    assert_eq!(load(None).verify(&ctx), Ok(()));
}

#[test]
fn test_no_candidate_layouts() {
    let err = store(Some(row_per_thread())).verify(&VerifyContext::default()).unwrap_err();
    assert_eq!(err, Error::NoTmemCompatibleLayouts { operand: "source" });
}

#[test]
fn test_incompatible_layout_lists_candidates() {
    let candidates = vec![row_per_thread(), blocked_2d()];
    let layouts = FixedTmemLayouts(candidates.clone());
    let ctx = VerifyContext::builder().tmem_layouts(&layouts).build();
    let other = crate::encoding::DistributedEncoding::blocked(&[2, 2], &[4, 8], &[2, 2], &[0, 1]).into();

    let diag = Op::from(load(Some(other))).verify(&ctx).unwrap_err();
    assert_eq!(diag.error, Error::TmemLayoutIncompatible { operand: "result", candidates: candidates.clone() });
    assert_eq!(diag.notes.len(), 2);
    for (note, layout) in diag.notes.iter().zip(&candidates) {
        assert_eq!(*note, format!("potential TMEM layout: {layout}"));
    }

    let rendered = diag.to_string();
    let expected_head = "'ttng.tmem_load' op result layout is not TMEM compatible\nnote: potential TMEM layout: ";
    assert!(rendered.starts_with(expected_head));
    assert_eq!(rendered.matches("\nnote: ").count(), 2);
}

#[test]
fn test_register_operand_must_be_2d() {
    let op = TmemStore { src: register("src", &[2, 64, 128], DType::Float32, None), ..store(None) };
    assert_eq!(op.verify(&VerifyContext::default()), Err(Error::TmemOperandRank { operand: "source", rank: 3 }));
}

#[test]
fn test_register_operand_must_be_distributed() {
    let shared_layout = NvmmaSharedEncoding::unswizzled(32).into();
    let err = store(Some(shared_layout)).verify(&VerifyContext::default()).unwrap_err();
    assert_eq!(err, Error::TmemOperandNotDistributed { operand: "source" });
}

#[test]
fn test_custom_equivalence() {
    struct AnyBlocked;
    impl crate::TmemLayoutProvider for AnyBlocked {
        fn compatible_layouts(&self, _ty: &TensorType, _memdesc: &MemDescType) -> Vec<Encoding> {
            vec![row_per_thread()]
        }

        fn layouts_equivalent(&self, _shape: &[i64], lhs: &Encoding, rhs: &Encoding) -> bool {
            lhs.is_distributed() && rhs.is_distributed()
        }
    }

    let ctx = VerifyContext::builder().tmem_layouts(&AnyBlocked).build();
    assert_eq!(store(Some(blocked_2d())).verify(&ctx), Ok(()));
}

// =========================================================================
// Store and load
// =========================================================================

#[test]
fn test_store_destination_rules() {
    let ctx = VerifyContext::default();

    let immutable = TmemStore { dst: tmem("dst", &[128, 128], DType::Float32, acc_encoding(), false), ..store(None) };
    assert_eq!(immutable.verify(&ctx), Err(Error::ImmutableDestination { action: "store" }));

    let shared = TmemStore { dst: smem_plain("dst", &[128, 128], DType::Float32), ..store(None) };
    assert_eq!(shared.verify(&ctx), Err(Error::NotTensorMemory { operand: "destination" }));
}

#[test]
fn test_store_scales() {
    let op = TmemStore {
        dst: tmem_scales("dst", &[128, 4]),
        src: register("src", &[128, 4], DType::UInt8, None),
        pred: const_bool("true", true),
    };
    assert_eq!(op.verify(&VerifyContext::default()), Ok(()));
}

#[test]
fn test_load_rejects_scales() {
    let result = TensorType::new([128i64, 4].as_slice(), DType::UInt8, None);
    let op = TmemLoad { src: tmem_scales("src", &[128, 4]), result };
    assert_eq!(op.verify(&VerifyContext::default()), Err(Error::NotTmemEncoding { operand: "source" }));
}

#[test]
fn test_memory_op_types() {
    let ctx = VerifyContext::default();

    let wrong_dtype = TmemStore { src: register("src", &[128, 128], DType::Float16, None), ..store(None) };
    assert_eq!(wrong_dtype.verify(&ctx), Err(Error::ElementTypeMismatch { src: DType::Float16, dst: DType::Float32 }));

    let wrong_shape = TmemLoad { result: TensorType::new([128i64, 64].as_slice(), DType::Float32, None), ..load(None) };
    assert!(matches!(wrong_shape.verify(&ctx), Err(Error::ShapeMismatch { .. })));
}

// =========================================================================
// Alloc
// =========================================================================

#[test_case(None, true => Ok(()); "uninitialized mutable")]
#[test_case(None, false => Err(Error::UninitializedImmutableAlloc); "uninitialized immutable")]
#[test_case(Some(register("src", &[128, 128], DType::Float32, None)), false => Ok(()); "initialized immutable")]
#[test_case(
    Some(register("src", &[128, 64], DType::Float32, None)), false
    => matches Err(Error::ShapeMismatch { .. });
    "initializer shape"
)]
fn test_alloc(src: Option<std::rc::Rc<Value>>, mutable: bool) -> crate::Result<()> {
    let result = tmem_type(&[128, 128], DType::Float32, acc_encoding(), mutable);
    let op = TmemAlloc { src, result, col_offset: None };
    op.verify(&VerifyContext::default())
}

#[test]
fn test_alloc_must_cover_buffer() {
    let result = MemDescType::builder()
        .shape([128i64, 64].as_slice())
        .alloc_shape([128i64, 128].as_slice())
        .dtype(DType::Float32)
        .encoding(acc_encoding().into())
        .space(MemorySpace::TensorMemory)
        .mutable(true)
        .build()
        .unwrap();
    let op = TmemAlloc { src: None, result, col_offset: None };
    assert!(matches!(op.verify(&VerifyContext::default()), Err(Error::AllocShapeMismatch { .. })));
}

#[test]
fn test_alloc_in_shared_rejected() {
    let result = MemDescType::builder()
        .shape([128i64, 128].as_slice())
        .dtype(DType::Float32)
        .space(MemorySpace::Shared)
        .mutable(true)
        .build()
        .unwrap();
    let op = TmemAlloc { src: None, result, col_offset: None };
    assert_eq!(op.verify(&VerifyContext::default()), Err(Error::NotTensorMemory { operand: "result" }));
}

// =========================================================================
// Copy
// =========================================================================

fn copy() -> TmemCopy {
    TmemCopy {
        src: smem("src", &[128, 16], DType::UInt8, NvmmaSharedEncoding::unswizzled(8), false),
        dst: tmem_scales("dst", &[128, 16]),
        barrier: Some(barrier("bar")),
    }
}

#[test]
fn test_copy_valid() {
    assert_eq!(copy().verify(), Ok(()));
    assert_eq!(TmemCopy { barrier: None, ..copy() }.verify(), Ok(()));
}

#[test]
fn test_copy_destination_shape_unchecked() {
    let op = TmemCopy { dst: tmem_scales("dst", &[32, 4]), ..copy() };
    assert_eq!(op.verify(), Ok(()));
}

#[test_case(NvmmaSharedEncoding::swizzled(128, 8); "swizzled")]
#[test_case(NvmmaSharedEncoding::unswizzled(8).transposed(true); "transposed")]
#[test_case(NvmmaSharedEncoding { fp4_padded: true, ..NvmmaSharedEncoding::unswizzled(8) }; "fp4 padded")]
fn test_copy_source_layout(encoding: NvmmaSharedEncoding) {
    let op = TmemCopy { src: smem("src", &[128, 16], DType::UInt8, encoding, false), ..copy() };
    assert_eq!(op.verify(), Err(Error::TmemCopySwizzled));
}

#[test]
fn test_copy_source_must_be_row_major() {
    let view = MemDescType::builder()
        .shape([128i64, 2].as_slice())
        .alloc_shape([128i64, 16].as_slice())
        .dtype(DType::UInt8)
        .encoding(NvmmaSharedEncoding::unswizzled(8).into())
        .space(MemorySpace::Shared)
        .build()
        .unwrap();
    let op = TmemCopy { src: Value::argument("src", view), ..copy() };
    assert_eq!(op.verify(), Err(Error::TmemCopyNotRowMajor { contiguous: 2 }));

    let small_src = smem("src", &[16, 16], DType::UInt8, NvmmaSharedEncoding::unswizzled(8), false);
    let small = TmemCopy { src: small_src, ..copy() };
    assert_eq!(small.verify(), Err(Error::TmemCopyNotRowMajor { contiguous: 256 }));
}

#[test]
fn test_copy_operand_spaces() {
    let src = tmem("src", &[128, 16], DType::UInt8, TensorMemoryEncoding::new(128, 16, false), false);
    let tmem_src = TmemCopy { src, ..copy() };
    assert_eq!(tmem_src.verify(), Err(Error::NotSharedMemory { operand: "source" }));

    let tmem_barrier = TmemCopy { barrier: Some(tmem_scales("bar", &[1, 1])), ..copy() };
    assert_eq!(tmem_barrier.verify(), Err(Error::NotSharedMemory { operand: "optional barrier" }));

    let dst = tmem("dst", &[128, 16], DType::UInt8, TensorMemoryEncoding::new(128, 16, false), false);
    let immutable = TmemCopy { dst, ..copy() };
    assert_eq!(immutable.verify(), Err(Error::ImmutableDestination { action: "copy" }));
}

// =========================================================================
// Sub-slice
// =========================================================================

#[test]
fn test_subslice_narrows_encoding() {
    let encoding = TensorMemoryEncoding::new(128, 256, true).with_cta_split(1, 2);
    let src = tmem("acc", &[128, 256], DType::Float32, encoding, true);
    let op = TmemSubSlice::new(src.clone(), 64, 64);

    assert_eq!(op.offset, 64);
    assert_eq!(op.result.shape(), &[128, 64]);
    assert_eq!(op.result.alloc_shape(), &[128, 256]);
    assert!(op.result.is_mutable());
    let enc = op.result.encoding().and_then(Encoding::as_tensor_memory).unwrap();
    assert_eq!(*enc, TensorMemoryEncoding::new(128, 64, true).with_cta_split(1, 2));
    assert_eq!(op.verify(), Ok(()));
}

#[test]
fn test_subslice_keeps_narrower_block() {
    let src = tmem("acc", &[64, 256], DType::Float32, TensorMemoryEncoding::new(64, 32, false), true);
    let op = TmemSubSlice::new(src, 0, 128);
    let enc = op.result.encoding().and_then(Encoding::as_tensor_memory).unwrap();
    assert_eq!(enc.block_n, 32);
    assert_eq!(op.verify(), Ok(()));
}

#[test]
fn test_subslice_block_m() {
    let src = tmem("acc", &[96, 128], DType::Float32, TensorMemoryEncoding::new(96, 128, false), true);
    let diag = Op::from(TmemSubSlice::new(src, 0, 64)).verify(&VerifyContext::default()).unwrap_err();
    assert_eq!(diag.error, Error::SubSliceBlockM { block_m: 96 });
    assert!(diag.to_string().ends_with("must have a 128xN or 64xN layout, got block_m=96"));
}

#[test]
fn test_subslice_layout_mismatch() {
    let src = tmem("acc", &[128, 128], DType::Float32, acc_encoding(), true);
    let mut op = TmemSubSlice::new(src, 0, 64);
    op.result = tmem_type(&[128, 64], DType::Float32, TensorMemoryEncoding::new(128, 64, false), true);
    assert_eq!(op.verify(), Err(Error::SubSliceLayoutMismatch));
}

#[test]
#[should_panic(expected = "without tensor memory encoding")]
fn test_subslice_of_shared_panics() {
    TmemSubSlice::new(smem_plain("smem", &[128, 128], DType::Float32), 0, 64);
}
