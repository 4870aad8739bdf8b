//! Opcode selection from descriptors.
//!
//! Polymorphic operations come in one opcode per result type. A pass that knows
//! the descr it is about to attach picks the matching variant here instead of
//! switching on the result type itself.

use crate::descr::Descr;
use crate::error::IrError;
use crate::registry::{Opcode, rop};
use crate::value::ResultType;

pub struct OpHelpers;

impl OpHelpers {
    pub fn call_for_descr(descr: &dyn Descr) -> Opcode {
        match descr.result_type() {
            ResultType::Int => rop::CALL_I,
            ResultType::Ref => rop::CALL_R,
            ResultType::Float => rop::CALL_F,
            ResultType::Void => rop::CALL_N,
        }
    }

    pub fn call_pure_for_descr(descr: &dyn Descr) -> Opcode {
        match descr.result_type() {
            ResultType::Int => rop::CALL_PURE_I,
            ResultType::Ref => rop::CALL_PURE_R,
            ResultType::Float => rop::CALL_PURE_F,
            ResultType::Void => rop::CALL_PURE_N,
        }
    }

    pub fn getfield_for_descr(descr: &dyn Descr) -> Opcode {
        if descr.is_pointer_field() {
            rop::GETFIELD_GC_R
        } else if descr.is_float_field() {
            rop::GETFIELD_GC_F
        } else {
            rop::GETFIELD_GC_I
        }
    }

    pub fn getfield_pure_for_descr(descr: &dyn Descr) -> Opcode {
        if descr.is_pointer_field() {
            rop::GETFIELD_GC_PURE_R
        } else if descr.is_float_field() {
            rop::GETFIELD_GC_PURE_F
        } else {
            rop::GETFIELD_GC_PURE_I
        }
    }

    pub fn getarrayitem_for_descr(descr: &dyn Descr) -> Opcode {
        if descr.is_array_of_pointers() {
            rop::GETARRAYITEM_GC_R
        } else if descr.is_array_of_floats() {
            rop::GETARRAYITEM_GC_F
        } else {
            rop::GETARRAYITEM_GC_I
        }
    }

    pub fn getarrayitem_pure_for_descr(descr: &dyn Descr) -> Opcode {
        if descr.is_array_of_pointers() {
            rop::GETARRAYITEM_GC_PURE_R
        } else if descr.is_array_of_floats() {
            rop::GETARRAYITEM_GC_PURE_F
        } else {
            rop::GETARRAYITEM_GC_PURE_I
        }
    }

    /// SAME_AS variant for a result type. There is no void SAME_AS.
    pub fn same_as_for_type(tp: ResultType) -> Result<Opcode, IrError> {
        match tp {
            ResultType::Int => Ok(rop::SAME_AS_I),
            ResultType::Ref => Ok(rop::SAME_AS_R),
            ResultType::Float => Ok(rop::SAME_AS_F),
            ResultType::Void => Err(IrError::VoidSameAs),
        }
    }

    /// Like [`OpHelpers::same_as_for_type`], from the printout character.
    pub fn same_as_for_char(tp: char) -> Result<Opcode, IrError> {
        Self::same_as_for_type(ResultType::from_char(tp)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestDescr;

    #[test]
    fn test_call_follows_descr_result_type() {
        assert_eq!(
            OpHelpers::call_for_descr(&TestDescr::new().returning(ResultType::Int)),
            rop::CALL_I
        );
        assert_eq!(
            OpHelpers::call_for_descr(&TestDescr::new().returning(ResultType::Ref)),
            rop::CALL_R
        );
        assert_eq!(
            OpHelpers::call_for_descr(&TestDescr::new().returning(ResultType::Float)),
            rop::CALL_F
        );
        assert_eq!(OpHelpers::call_for_descr(&TestDescr::new()), rop::CALL_N);
        assert_eq!(
            OpHelpers::call_pure_for_descr(&TestDescr::new().returning(ResultType::Float)),
            rop::CALL_PURE_F
        );
        assert_eq!(OpHelpers::call_pure_for_descr(&TestDescr::new()), rop::CALL_PURE_N);
    }

    #[test]
    fn test_field_reads() {
        let ptr = TestDescr::new().pointer_field();
        let float = TestDescr::new().float_field();
        let int = TestDescr::new();
        assert_eq!(OpHelpers::getfield_for_descr(&ptr), rop::GETFIELD_GC_R);
        assert_eq!(OpHelpers::getfield_for_descr(&float), rop::GETFIELD_GC_F);
        assert_eq!(OpHelpers::getfield_for_descr(&int), rop::GETFIELD_GC_I);
        assert_eq!(OpHelpers::getfield_pure_for_descr(&ptr), rop::GETFIELD_GC_PURE_R);
        assert_eq!(OpHelpers::getfield_pure_for_descr(&float), rop::GETFIELD_GC_PURE_F);
        assert_eq!(OpHelpers::getfield_pure_for_descr(&int), rop::GETFIELD_GC_PURE_I);
    }

    #[test]
    fn test_array_reads() {
        let ptrs = TestDescr::new().array_of_pointers();
        let floats = TestDescr::new().array_of_floats();
        let ints = TestDescr::new();
        assert_eq!(OpHelpers::getarrayitem_for_descr(&ptrs), rop::GETARRAYITEM_GC_R);
        assert_eq!(OpHelpers::getarrayitem_for_descr(&floats), rop::GETARRAYITEM_GC_F);
        assert_eq!(OpHelpers::getarrayitem_for_descr(&ints), rop::GETARRAYITEM_GC_I);
        assert_eq!(
            OpHelpers::getarrayitem_pure_for_descr(&ptrs),
            rop::GETARRAYITEM_GC_PURE_R
        );
        assert_eq!(
            OpHelpers::getarrayitem_pure_for_descr(&floats),
            rop::GETARRAYITEM_GC_PURE_F
        );
        assert_eq!(
            OpHelpers::getarrayitem_pure_for_descr(&ints),
            rop::GETARRAYITEM_GC_PURE_I
        );
    }

    #[test]
    fn test_same_as() {
        assert_eq!(OpHelpers::same_as_for_type(ResultType::Int), Ok(rop::SAME_AS_I));
        assert_eq!(OpHelpers::same_as_for_type(ResultType::Ref), Ok(rop::SAME_AS_R));
        assert_eq!(OpHelpers::same_as_for_type(ResultType::Float), Ok(rop::SAME_AS_F));
        assert_eq!(
            OpHelpers::same_as_for_type(ResultType::Void),
            Err(IrError::VoidSameAs)
        );
        assert_eq!(OpHelpers::same_as_for_char('r'), Ok(rop::SAME_AS_R));
        assert_eq!(
            OpHelpers::same_as_for_char('x'),
            Err(IrError::UnknownResultType('x'))
        );
        // 'n' is void, and void has no SAME_AS.
        assert_eq!(OpHelpers::same_as_for_char('n'), Err(IrError::VoidSameAs));
    }
}
