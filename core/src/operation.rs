//! A single IR operation.
//!
//! One concrete struct serves every opcode. What differs per opcode (arity,
//! descr, guard fail-arguments, result type) is looked up in the registry's
//! fact arrays and enforced here:
//!
//! - the operand count matches the declared arity,
//! - a descr is only attached to opcodes that take one,
//! - FINISH carries a final descr and guards never do,
//! - fail-arguments exist only on guards,
//! - the result slot always holds the opcode's result type.
//!
//! Operations are compared by identity, never by content. See [`OpRef`].

use core::fmt::Write;

use crate::descr::DescrRef;
use crate::error::IrError;
use crate::operands::Operands;
use crate::opref::OpRef;
use crate::registry::{Arity, Opcode, registry, rop};
use crate::relations;
use crate::trace::{CloneMemo, NamingMemo, Trace};
use crate::value::{GcRef, ResultType, Value};
use crate::{String, ToString, Vec, format};

#[derive(Debug, Clone)]
pub struct Operation {
    opcode: Opcode,
    frozen: bool,
    args: Operands,
    descr: Option<DescrRef>,
    // Only read for guards.
    fail_args: Vec<OpRef>,
    value: Value,
}

impl Operation {
    /// Creates an operation, checking operands and descr against the opcode.
    pub fn create(opcode: Opcode, args: &[OpRef], descr: Option<DescrRef>) -> Result<Self, IrError> {
        let registry = registry();
        if registry.is_marker(opcode) || registry.name(opcode).is_none() {
            return Err(IrError::UnknownOpcode(format!("{:?}", opcode)));
        }
        let arity = registry.arity(opcode);
        if !arity.accepts(args.len()) {
            return Err(IrError::OperandCount {
                opcode,
                expected: arity.to_string(),
                got: args.len(),
            });
        }
        // FINISH passes at most one result back out of the trace.
        if opcode == rop::FINISH && args.len() > 1 {
            return Err(IrError::OperandCount {
                opcode,
                expected: "0 or 1".to_string(),
                got: args.len(),
            });
        }

        let mut op = Operation {
            opcode,
            frozen: false,
            args: Operands::pack(arity, args),
            descr: None,
            fail_args: Vec::new(),
            value: Value::default_for(registry.result_type(opcode)),
        };
        if let Some(descr) = descr {
            op.set_descr(descr)?;
        }
        Ok(op)
    }

    #[inline]
    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    /// Upper-case opcode name, e.g. `INT_ADD`.
    pub fn name(&self) -> &'static str {
        self.opcode.name()
    }

    /// Lower-case opcode name, as printed in traces.
    pub fn opname(&self) -> String {
        self.opcode.to_string()
    }

    pub fn arity(&self) -> Arity {
        self.opcode.arity()
    }

    // ------------------------------------------------------------------------
    // Operands
    // ------------------------------------------------------------------------

    #[inline]
    pub fn num_args(&self) -> usize {
        self.args.len()
    }

    #[inline]
    pub fn args(&self) -> &[OpRef] {
        self.args.as_slice()
    }

    pub fn operand(&self, index: usize) -> Result<OpRef, IrError> {
        self.args.get(index).ok_or(IrError::OperandIndex {
            opcode: self.opcode,
            index,
            arity: self.args.len(),
        })
    }

    pub fn set_operand(&mut self, index: usize, value: OpRef) -> Result<(), IrError> {
        self.check_not_frozen()?;
        if self.args.set(index, value) {
            Ok(())
        } else {
            Err(IrError::OperandIndex {
                opcode: self.opcode,
                index,
                arity: self.args.len(),
            })
        }
    }

    // ------------------------------------------------------------------------
    // Result value
    // ------------------------------------------------------------------------

    pub fn result_type(&self) -> ResultType {
        self.opcode.result_type()
    }

    #[inline]
    pub fn value(&self) -> Value {
        self.value
    }

    pub fn set_value(&mut self, value: Value) -> Result<(), IrError> {
        let expected = self.result_type();
        if value.result_type() != expected {
            return Err(IrError::ResultType {
                opcode: self.opcode,
                expected,
                got: value.result_type(),
            });
        }
        self.value = value;
        Ok(())
    }

    pub fn copy_value_from(&mut self, other: &Operation) -> Result<(), IrError> {
        self.set_value(other.value)
    }

    pub fn int_value(&self) -> Option<i64> {
        self.value.as_int()
    }

    pub fn float_value(&self) -> Option<f64> {
        self.value.as_float()
    }

    pub fn ref_value(&self) -> Option<GcRef> {
        self.value.as_gcref()
    }

    pub fn nonnull(&self) -> bool {
        self.value.nonnull()
    }

    // ------------------------------------------------------------------------
    // Descr
    // ------------------------------------------------------------------------

    pub fn descr(&self) -> Option<&DescrRef> {
        self.descr.as_ref()
    }

    /// Attaches `descr`, checking it against the opcode: FINISH only takes a
    /// final descr and guards never do.
    pub fn set_descr(&mut self, descr: DescrRef) -> Result<(), IrError> {
        self.check_not_frozen()?;
        if !self.opcode.has_descr() {
            return Err(IrError::UnexpectedDescr {
                opcode: self.opcode,
            });
        }
        if self.opcode == rop::FINISH && !descr.is_final() {
            return Err(IrError::FinishWithoutFinalDescr);
        }
        if self.is_guard() && descr.is_final() {
            return Err(IrError::GuardWithFinalDescr {
                opcode: self.opcode,
            });
        }
        if !descr.is_test_stand_in() {
            descr.check(self.opcode).map_err(|reason| IrError::InvalidDescr {
                opcode: self.opcode,
                reason,
            })?;
        }
        self.descr = Some(descr);
        Ok(())
    }

    pub fn clear_descr(&mut self) {
        self.descr = None;
    }

    // ------------------------------------------------------------------------
    // Guard fail-arguments
    // ------------------------------------------------------------------------

    /// Values needed to rebuild interpreter state if the guard fails.
    /// `None` for anything that is not a guard.
    pub fn fail_args(&self) -> Option<&[OpRef]> {
        self.is_guard().then_some(self.fail_args.as_slice())
    }

    /// Ignored for anything that is not a guard.
    pub fn set_fail_args(&mut self, fail_args: Vec<OpRef>) {
        if !self.is_guard() {
            tracing::debug!(opcode = ?self.opcode, "ignoring fail args on a non-guard");
            return;
        }
        self.fail_args = fail_args;
    }

    // ------------------------------------------------------------------------
    // Rewriting
    // ------------------------------------------------------------------------

    /// Shallow copy meant to replace `self`, optionally with a different
    /// opcode, operands or descr.
    ///
    /// The descr carries over only when the new opcode takes one. The result
    /// value is copied when both `self` and the new opcode produce one;
    /// otherwise the copy keeps its default. Guard fail-arguments are copied
    /// unchanged.
    pub fn copy_with(
        &self,
        opcode: Option<Opcode>,
        args: Option<&[OpRef]>,
        descr: Option<DescrRef>,
    ) -> Result<Operation, IrError> {
        let opcode = opcode.unwrap_or(self.opcode);
        let args = args.unwrap_or(self.args());
        let descr = match descr {
            Some(descr) => Some(descr),
            None if opcode.has_descr() => self.descr.clone(),
            None => None,
        };
        let mut op = Operation::create(opcode, args, descr)?;
        if !self.result_type().is_void() && !op.result_type().is_void() {
            op.copy_value_from(self)?;
        }
        if self.is_guard() {
            op.set_fail_args(self.fail_args.clone());
        }
        Ok(op)
    }

    /// Structural copy for whole-trace duplication.
    ///
    /// Operands and fail-arguments go through `memo`, keeping their original
    /// handle when unmapped, and the descr through
    /// [`crate::Descr::clone_if_mutable`]. Recording the clone in `memo` is up to
    /// the caller, which owns the new handle; see [`Trace::clone_op`].
    pub fn clone_with(&self, memo: &CloneMemo) -> Result<Operation, IrError> {
        let args = self.args.map(|arg| memo.get_or(arg));
        let descr = self
            .descr
            .as_ref()
            .map(|descr| descr.clone().clone_if_mutable(memo));
        let mut op = Operation::create(self.opcode, args.as_slice(), descr)?;
        if self.is_guard() {
            op.fail_args = self.fail_args.iter().map(|&arg| memo.get_or(arg)).collect();
        }
        Ok(op)
    }

    // ------------------------------------------------------------------------
    // Freezing
    // ------------------------------------------------------------------------

    pub(crate) fn freeze(&mut self) {
        self.frozen = true;
    }

    pub(crate) fn thaw(&mut self) {
        self.frozen = false;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    fn check_not_frozen(&self) -> Result<(), IrError> {
        if self.frozen {
            return Err(IrError::Frozen {
                opcode: self.opcode,
            });
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Classification
    // ------------------------------------------------------------------------

    #[inline]
    pub fn is_guard(&self) -> bool {
        self.opcode.is_guard()
    }

    #[inline]
    pub fn is_foldable_guard(&self) -> bool {
        self.opcode.is_foldable_guard()
    }

    pub fn is_guard_exception(&self) -> bool {
        self.opcode == rop::GUARD_EXCEPTION || self.opcode == rop::GUARD_NO_EXCEPTION
    }

    pub fn is_guard_overflow(&self) -> bool {
        self.opcode == rop::GUARD_OVERFLOW || self.opcode == rop::GUARD_NO_OVERFLOW
    }

    #[inline]
    pub fn is_always_pure(&self) -> bool {
        self.opcode.is_always_pure()
    }

    #[inline]
    pub fn has_no_side_effect(&self) -> bool {
        self.opcode.has_no_side_effect()
    }

    #[inline]
    pub fn can_raise(&self) -> bool {
        self.opcode.can_raise()
    }

    /// Allocation operations proper. Calls may allocate too; see
    /// [`Operation::can_malloc`].
    #[inline]
    pub fn is_malloc(&self) -> bool {
        self.opcode.is_malloc()
    }

    pub fn can_malloc(&self) -> bool {
        self.is_call() || self.is_malloc()
    }

    #[inline]
    pub fn is_call(&self) -> bool {
        self.opcode.is_call()
    }

    pub fn is_real_call(&self) -> bool {
        matches!(
            self.opcode,
            rop::CALL_I | rop::CALL_R | rop::CALL_F | rop::CALL_N
        )
    }

    pub fn is_call_assembler(&self) -> bool {
        matches!(
            self.opcode,
            rop::CALL_ASSEMBLER_I | rop::CALL_ASSEMBLER_R | rop::CALL_ASSEMBLER_F | rop::CALL_ASSEMBLER_N
        )
    }

    pub fn is_call_may_force(&self) -> bool {
        matches!(
            self.opcode,
            rop::CALL_MAY_FORCE_I | rop::CALL_MAY_FORCE_R | rop::CALL_MAY_FORCE_F | rop::CALL_MAY_FORCE_N
        )
    }

    pub fn is_call_pure(&self) -> bool {
        matches!(
            self.opcode,
            rop::CALL_PURE_I | rop::CALL_PURE_R | rop::CALL_PURE_F | rop::CALL_PURE_N
        )
    }

    pub fn is_call_loopinvariant(&self) -> bool {
        matches!(
            self.opcode,
            rop::CALL_LOOPINVARIANT_I
                | rop::CALL_LOOPINVARIANT_R
                | rop::CALL_LOOPINVARIANT_F
                | rop::CALL_LOOPINVARIANT_N
        )
    }

    pub fn is_call_release_gil(&self) -> bool {
        matches!(
            self.opcode,
            rop::CALL_RELEASE_GIL_I
                | rop::CALL_RELEASE_GIL_R
                | rop::CALL_RELEASE_GIL_F
                | rop::CALL_RELEASE_GIL_N
        )
    }

    pub fn is_cond_call(&self) -> bool {
        self.opcode == rop::COND_CALL
    }

    #[inline]
    pub fn is_ovf(&self) -> bool {
        self.opcode.is_ovf()
    }

    pub fn is_overflow_checked(&self) -> bool {
        self.is_ovf()
    }

    #[inline]
    pub fn is_final(&self) -> bool {
        self.opcode.is_final()
    }

    pub fn is_jump(&self) -> bool {
        self.opcode == rop::JUMP
    }

    pub fn is_finish(&self) -> bool {
        self.opcode == rop::FINISH
    }

    pub fn is_label(&self) -> bool {
        self.opcode == rop::LABEL
    }

    pub fn returns_bool_result(&self) -> bool {
        self.opcode.returns_bool()
    }

    pub fn is_comparison(&self) -> bool {
        self.is_always_pure() && self.returns_bool_result()
    }

    pub fn boolinverse(&self) -> Option<Opcode> {
        relations::boolinverse(self.opcode)
    }

    pub fn boolreflex(&self) -> Option<Opcode> {
        relations::boolreflex(self.opcode)
    }

    // ------------------------------------------------------------------------
    // Printing
    // ------------------------------------------------------------------------

    /// Formats this operation as one trace line.
    ///
    /// `me` is this operation's handle in `trace`. A result gets the next
    /// sequential name for its type (`i0`, `f1`, `r2`, ...) the first time it
    /// is seen by `memo`; later references reuse it. With `dim`, the debug
    /// prefix is wrapped in form feeds so trace viewers can gray it out.
    pub fn format(&self, me: OpRef, trace: &Trace, memo: &mut NamingMemo, dim: bool) -> String {
        let mut out = String::new();
        if let Some(loc) = trace.debug_loc(me) {
            if dim {
                let _ = write!(out, "\x0c{}:{}   \x0c", loc.name, loc.pc);
            } else {
                let _ = write!(out, "{}:{}   ", loc.name, loc.pc);
            }
        }
        let tp = self.result_type();
        if !tp.is_void() {
            let _ = write!(out, "{} = ", memo.name(me, tp));
        }
        let _ = write!(out, "{}(", self.opcode);
        let mut first = true;
        for &arg in self.args() {
            if !first {
                out.push_str(", ");
            }
            first = false;
            out.push_str(&memo.repr_short(arg, trace));
        }
        if trace.options().print_descrs {
            if let Some(descr) = &self.descr {
                if !first {
                    out.push_str(", ");
                }
                let _ = write!(out, "descr={:?}", descr);
            }
        }
        out.push(')');
        if let Some(fail_args) = self.fail_args() {
            if !fail_args.is_empty() {
                let names: Vec<String> = fail_args
                    .iter()
                    .map(|&arg| memo.repr_short(arg, trace))
                    .collect();
                let _ = write!(out, " [{}]", names.join(", "));
            }
        }
        out
    }
}
