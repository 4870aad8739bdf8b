use alloc::sync::Arc;

use pretty_assertions::assert_eq;

use crate::error::IrError;
use crate::operation::Operation;
use crate::opref::OpRef;
use crate::registry::rop;
use crate::test_utils::{TestDescr, init_test_logging};
use crate::trace::{CloneMemo, Trace};
use crate::value::{GcRef, ResultType, Value};

fn ints(trace: &mut Trace, n: usize) -> Vec<OpRef> {
    (0..n).map(|i| trace.input_int(i as i64)).collect()
}

#[test]
fn test_create_checks_operand_count() {
    let mut trace = Trace::new();
    let args = ints(&mut trace, 3);

    let op = Operation::create(rop::INT_ADD, &args[..2], None).unwrap();
    assert_eq!(op.num_args(), 2);
    assert_eq!(op.args(), &args[..2]);

    let err = Operation::create(rop::INT_ADD, &args, None).unwrap_err();
    assert!(matches!(err, IrError::OperandCount { got: 3, .. }));
    let err = Operation::create(rop::INT_ADD, &args[..1], None).unwrap_err();
    assert!(matches!(err, IrError::OperandCount { got: 1, .. }));

    // Variable arity accepts any count.
    assert!(Operation::create(rop::JUMP, &[], None).is_ok());
    assert!(Operation::create(rop::JUMP, &args, None).is_ok());
    assert!(Operation::create(rop::COPYSTRCONTENT, &args, None).is_err());
}

#[test]
fn test_finish_takes_at_most_one_operand() {
    let mut trace = Trace::new();
    let args = ints(&mut trace, 2);
    let done = TestDescr::new().final_descr().into_ref();

    assert!(Operation::create(rop::FINISH, &[], Some(done.clone())).is_ok());
    assert!(Operation::create(rop::FINISH, &args[..1], Some(done.clone())).is_ok());
    let err = Operation::create(rop::FINISH, &args, Some(done)).unwrap_err();
    assert!(matches!(err, IrError::OperandCount { got: 2, .. }));
}

#[test]
fn test_create_checks_descr() {
    let mut trace = Trace::new();
    let x = trace.input_int(1);
    let plain = TestDescr::new().into_ref();
    let done = TestDescr::new().final_descr().into_ref();

    assert_eq!(
        Operation::create(rop::INT_NEG, &[x], Some(plain.clone())).unwrap_err(),
        IrError::UnexpectedDescr { opcode: rop::INT_NEG }
    );
    assert_eq!(
        Operation::create(rop::FINISH, &[], Some(plain.clone())).unwrap_err(),
        IrError::FinishWithoutFinalDescr
    );
    assert_eq!(
        Operation::create(rop::GUARD_TRUE, &[x], Some(done)).unwrap_err(),
        IrError::GuardWithFinalDescr { opcode: rop::GUARD_TRUE }
    );
    let guard = Operation::create(rop::GUARD_TRUE, &[x], Some(plain.clone())).unwrap();
    assert!(Arc::ptr_eq(guard.descr().unwrap(), &plain));

    // Taking a descr does not mean requiring one.
    assert!(Operation::create(rop::GUARD_TRUE, &[x], None).is_ok());
}

#[test]
fn test_descr_validity_check() {
    let mut trace = Trace::new();
    let p = trace.input_ref(GcRef(0x10));
    let bad = TestDescr::new().rejecting("not a field descr").into_ref();

    let err = Operation::create(rop::GETFIELD_GC_I, &[p], Some(bad.clone())).unwrap_err();
    assert_eq!(
        err,
        IrError::InvalidDescr {
            opcode: rop::GETFIELD_GC_I,
            reason: "not a field descr".to_string(),
        }
    );

    let mut op = Operation::create(rop::GETFIELD_GC_I, &[p], None).unwrap();
    assert!(op.set_descr(bad).is_err());
    assert!(op.descr().is_none());
}

#[test]
fn test_set_descr_and_clear() {
    let mut trace = Trace::new();
    let x = trace.input_int(0);
    let mut op = Operation::create(rop::INT_IS_TRUE, &[x], None).unwrap();
    assert_eq!(
        op.set_descr(TestDescr::new().into_ref()),
        Err(IrError::UnexpectedDescr { opcode: rop::INT_IS_TRUE })
    );

    let mut guard = Operation::create(rop::GUARD_FALSE, &[x], None).unwrap();
    guard.set_descr(TestDescr::new().into_ref()).unwrap();
    assert!(guard.descr().is_some());
    guard.clear_descr();
    assert!(guard.descr().is_none());
}

#[test]
fn test_operand_access() {
    let mut trace = Trace::new();
    let args = ints(&mut trace, 3);
    let mut op = Operation::create(rop::SETARRAYITEM_GC, &args, None).unwrap();

    assert_eq!(op.operand(2), Ok(args[2]));
    assert_eq!(
        op.operand(3),
        Err(IrError::OperandIndex {
            opcode: rop::SETARRAYITEM_GC,
            index: 3,
            arity: 3,
        })
    );

    op.set_operand(1, OpRef::int(99)).unwrap();
    assert_eq!(op.args(), &[args[0], OpRef::int(99), args[2]]);
    assert!(op.set_operand(3, OpRef::int(0)).is_err());

    let mut nullary = Operation::create(rop::FORCE_TOKEN, &[], None).unwrap();
    assert!(nullary.operand(0).is_err());
    assert!(nullary.set_operand(0, args[0]).is_err());
}

#[test]
fn test_result_value_type_is_fixed() {
    let mut trace = Trace::new();
    let args = ints(&mut trace, 2);
    let mut op = Operation::create(rop::INT_ADD, &args, None).unwrap();

    assert_eq!(op.result_type(), ResultType::Int);
    assert_eq!(op.value(), Value::Int(0));
    assert!(!op.nonnull());

    op.set_value(Value::Int(5)).unwrap();
    assert_eq!(op.int_value(), Some(5));
    assert!(op.nonnull());
    assert_eq!(op.float_value(), None);

    assert_eq!(
        op.set_value(Value::Float(1.0)),
        Err(IrError::ResultType {
            opcode: rop::INT_ADD,
            expected: ResultType::Int,
            got: ResultType::Float,
        })
    );
    assert_eq!(op.int_value(), Some(5));

    let new = Operation::create(rop::NEW, &[], Some(TestDescr::new().into_ref())).unwrap();
    assert_eq!(new.ref_value(), Some(GcRef::NULL));
    assert!(!new.nonnull());

    let setfield = Operation::create(rop::SETFIELD_GC, &args, None).unwrap();
    assert_eq!(setfield.value(), Value::Void);
}

#[test]
fn test_float_nonnull_uses_bits() {
    let mut trace = Trace::new();
    let f = trace.input_float(0.0);
    let mut op = Operation::create(rop::FLOAT_NEG, &[f], None).unwrap();
    op.set_value(Value::Float(-0.0)).unwrap();
    assert!(op.nonnull());
    op.set_value(Value::Float(0.0)).unwrap();
    assert!(!op.nonnull());
}

#[test]
fn test_fail_args_only_on_guards() {
    let mut trace = Trace::new();
    let args = ints(&mut trace, 2);

    let mut guard = Operation::create(rop::GUARD_TRUE, &args[..1], None).unwrap();
    assert_eq!(guard.fail_args(), Some(&[][..]));
    guard.set_fail_args(args.clone());
    assert_eq!(guard.fail_args(), Some(&args[..]));

    let mut add = Operation::create(rop::INT_ADD, &args, None).unwrap();
    assert_eq!(add.fail_args(), None);
    add.set_fail_args(args.clone());
    assert_eq!(add.fail_args(), None);
}

#[test]
fn test_copy_with_overrides() {
    init_test_logging();
    let mut trace = Trace::new();
    let args = ints(&mut trace, 2);
    let mut add = Operation::create(rop::INT_ADD, &args, None).unwrap();
    add.set_value(Value::Int(7)).unwrap();

    let sub = add.copy_with(Some(rop::INT_SUB), None, None).unwrap();
    assert_eq!(sub.opcode(), rop::INT_SUB);
    assert_eq!(sub.args(), add.args());
    assert_eq!(sub.value(), Value::Int(7));

    let same = add.copy_with(Some(rop::SAME_AS_I), Some(&args[..1]), None).unwrap();
    assert_eq!(same.args(), &args[..1]);
    assert_eq!(same.int_value(), Some(7));

    // Overrides are still checked.
    assert!(add.copy_with(Some(rop::INT_NEG), None, None).is_err());
}

#[test]
fn test_copy_with_keeps_guard_state() {
    let mut trace = Trace::new();
    let args = ints(&mut trace, 3);
    let descr = TestDescr::new().into_ref();
    let mut guard = Operation::create(rop::GUARD_TRUE, &args[..1], Some(descr.clone())).unwrap();
    guard.set_fail_args(args[1..].to_vec());

    let flipped = guard.copy_with(Some(rop::GUARD_FALSE), None, None).unwrap();
    assert_eq!(flipped.opcode(), rop::GUARD_FALSE);
    assert!(Arc::ptr_eq(flipped.descr().unwrap(), &descr));
    assert_eq!(flipped.fail_args(), Some(&args[1..]));

    // The descr is dropped when the new opcode cannot take one.
    let p = trace.input_ref(GcRef(0x20));
    let field = TestDescr::new().into_ref();
    let mut read = Operation::create(rop::GETFIELD_GC_I, &[p], Some(field)).unwrap();
    read.set_value(Value::Int(3)).unwrap();
    let same = read.copy_with(Some(rop::SAME_AS_I), None, None).unwrap();
    assert!(same.descr().is_none());
    assert_eq!(same.int_value(), Some(3));
    assert_eq!(same.fail_args(), None);
}

#[test]
fn test_copy_with_from_void_keeps_default_value() {
    let mut trace = Trace::new();
    let args = ints(&mut trace, 2);
    let descr = TestDescr::new().into_ref();

    let call = Operation::create(rop::CALL_N, &args, Some(descr.clone())).unwrap();
    let typed = call.copy_with(Some(rop::CALL_I), None, None).unwrap();
    assert_eq!(typed.opcode(), rop::CALL_I);
    assert_eq!(typed.value(), Value::Int(0));
    assert!(Arc::ptr_eq(typed.descr().unwrap(), &descr));

    let guard = Operation::create(rop::GUARD_TRUE, &args[..1], None).unwrap();
    let test = guard.copy_with(Some(rop::INT_IS_TRUE), None, None).unwrap();
    assert_eq!(test.int_value(), Some(0));
}

#[test]
fn test_set_descr_checks_final_flag() {
    let mut trace = Trace::new();
    let x = trace.input_int(1);
    let plain = TestDescr::new().into_ref();
    let done = TestDescr::new().final_descr().into_ref();

    let mut guard = Operation::create(rop::GUARD_TRUE, &[x], None).unwrap();
    assert_eq!(
        guard.set_descr(done.clone()),
        Err(IrError::GuardWithFinalDescr { opcode: rop::GUARD_TRUE })
    );
    assert!(guard.descr().is_none());

    let mut finish = Operation::create(rop::FINISH, &[x], Some(done.clone())).unwrap();
    assert_eq!(finish.set_descr(plain), Err(IrError::FinishWithoutFinalDescr));
    assert!(Arc::ptr_eq(finish.descr().unwrap(), &done));
}

#[test]
fn test_clone_with_maps_through_memo() {
    let mut trace = Trace::new();
    let args = ints(&mut trace, 3);
    let replacement = OpRef::int(42);
    let mutable = TestDescr::new().mutable().into_ref();
    let shared = TestDescr::new().into_ref();

    let mut memo = CloneMemo::new();
    memo.set(args[0], replacement);

    let mut guard = Operation::create(rop::GUARD_VALUE, &args[..2], Some(mutable.clone())).unwrap();
    guard.set_fail_args(vec![args[0], args[2]]);
    let copy = guard.clone_with(&memo).unwrap();
    assert_eq!(copy.args(), &[replacement, args[1]]);
    assert_eq!(copy.fail_args(), Some(&[replacement, args[2]][..]));
    assert!(!Arc::ptr_eq(copy.descr().unwrap(), &mutable));

    let call = Operation::create(rop::CALL_N, &args, Some(shared.clone())).unwrap();
    let copy = call.clone_with(&memo).unwrap();
    assert!(Arc::ptr_eq(copy.descr().unwrap(), &shared));
    assert_eq!(copy.args(), &[replacement, args[1], args[2]]);
}

#[test]
fn test_classification() {
    let mut trace = Trace::new();
    let args = ints(&mut trace, 2);
    let make = |opcode| Operation::create(opcode, &args[..opcode_arity(opcode)], None).unwrap();

    assert!(make(rop::INT_LT).is_comparison());
    assert!(make(rop::PTR_EQ).is_comparison());
    assert!(!make(rop::INT_ADD).is_comparison());
    // Boolean, but not always pure.
    assert!(!make(rop::MARK_OPAQUE_PTR).is_comparison());

    assert!(make(rop::GUARD_NO_EXCEPTION).is_guard_exception());
    assert!(make(rop::GUARD_OVERFLOW).is_guard_overflow());
    assert!(make(rop::CALL_R).is_real_call());
    assert!(!make(rop::CALL_PURE_R).is_real_call());
    assert!(make(rop::CALL_PURE_R).is_call_pure());
    assert!(make(rop::CALL_ASSEMBLER_F).is_call_assembler());
    assert!(make(rop::CALL_MAY_FORCE_N).is_call_may_force());
    assert!(make(rop::CALL_LOOPINVARIANT_I).is_call_loopinvariant());
    assert!(make(rop::CALL_RELEASE_GIL_I).is_call_release_gil());
    assert!(make(rop::COND_CALL).is_cond_call());
    assert!(make(rop::INT_SUB_OVF).is_overflow_checked());
    assert!(make(rop::LABEL).is_label());
    assert!(make(rop::JUMP).is_jump() && make(rop::JUMP).is_final());
    assert!(make(rop::FINISH).is_finish());

    assert!(make(rop::NEW_ARRAY).can_malloc());
    assert!(make(rop::CALL_N).can_malloc());
    assert!(!make(rop::INT_ADD).can_malloc());

    assert_eq!(make(rop::INT_LT).boolinverse(), Some(rop::INT_GE));
    assert_eq!(make(rop::INT_LT).boolreflex(), Some(rop::INT_GT));
    assert_eq!(make(rop::INT_ADD).boolinverse(), None);
}

fn opcode_arity(opcode: crate::registry::Opcode) -> usize {
    match opcode.arity() {
        crate::registry::Arity::Fixed(n) => n as usize,
        crate::registry::Arity::Var => 0,
    }
}

#[test]
fn test_names() {
    let op = Operation::create(rop::GUARD_NOT_FORCED_2, &[], None).unwrap();
    assert_eq!(op.name(), "GUARD_NOT_FORCED_2");
    assert_eq!(op.opname(), "guard_not_forced_2");
}

#[test]
fn test_markers_cannot_be_created() {
    assert!(matches!(
        Operation::create(rop::GUARD_FIRST, &[], None),
        Err(IrError::UnknownOpcode(_))
    ));
}

#[test]
fn test_fixed_arity_is_exact_for_every_opcode() {
    let mut trace = Trace::new();
    let pool = ints(&mut trace, 5);
    for opcode in crate::registry::registry().opcodes() {
        let crate::registry::Arity::Fixed(k) = opcode.arity() else {
            continue;
        };
        for n in 0..=4usize {
            let result = Operation::create(opcode, &pool[..n], None);
            assert_eq!(result.is_ok(), n == k as usize, "{:?} with {} operands", opcode, n);
        }
    }
}

#[test]
fn test_descr_rejected_wherever_undeclared() {
    let mut trace = Trace::new();
    let pool = ints(&mut trace, 5);
    let descr = TestDescr::new().into_ref();
    for opcode in crate::registry::registry().opcodes() {
        if opcode.has_descr() {
            continue;
        }
        let args = &pool[..opcode_arity(opcode)];
        assert_eq!(
            Operation::create(opcode, args, Some(descr.clone())).unwrap_err(),
            IrError::UnexpectedDescr { opcode },
        );
    }
}

#[test]
fn test_int_add_and_call_may_force_properties() {
    let mut trace = Trace::new();
    let args = ints(&mut trace, 2);
    let add = Operation::create(rop::INT_ADD, &args, None).unwrap();
    assert!(add.is_always_pure());
    assert!(!add.is_guard());
    assert!(!add.can_raise());
    assert!(!add.is_malloc());

    for opcode in [
        rop::CALL_MAY_FORCE_I,
        rop::CALL_MAY_FORCE_R,
        rop::CALL_MAY_FORCE_F,
        rop::CALL_MAY_FORCE_N,
    ] {
        let call = Operation::create(opcode, &args, None).unwrap();
        assert!(call.is_call());
        assert!(call.is_call_may_force());
        assert!(call.can_raise());
        assert!(call.can_malloc());
    }

    let guard = Operation::create(rop::GUARD_TRUE, &args[..1], None).unwrap();
    assert!(guard.is_guard());
    assert!(guard.is_foldable_guard());
    assert_eq!(guard.fail_args(), Some(&[][..]));
}
