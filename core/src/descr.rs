//! Descriptors: backend-owned metadata attached to operations.
//!
//! A descr tells the backend what a field read, array access or call actually
//! touches. The IR never looks inside one; it only asks the classification
//! questions below, which is all the result-type selector in
//! [`crate::helpers`] and the construction checks in [`crate::operation`] need.

use alloc::sync::Arc;
use core::fmt;

use crate::String;
use crate::registry::Opcode;
use crate::trace::CloneMemo;
use crate::value::ResultType;

/// Shared handle to a descriptor. Descriptors are either immutable or cloned
/// through [`Descr::clone_if_mutable`] before a trace is duplicated, so they can
/// be shared across compilation tasks.
pub type DescrRef = Arc<dyn Descr>;

pub trait Descr: fmt::Debug + Send + Sync {
    /// Result type of a call descr, or of the value a field/array descr reads.
    fn result_type(&self) -> ResultType {
        ResultType::Void
    }

    fn is_pointer_field(&self) -> bool {
        false
    }

    fn is_float_field(&self) -> bool {
        false
    }

    fn is_array_of_pointers(&self) -> bool {
        false
    }

    fn is_array_of_floats(&self) -> bool {
        false
    }

    /// Set on the descrs that terminate a trace (attached to FINISH).
    fn is_final(&self) -> bool {
        false
    }

    /// Returns a descr to attach to a duplicated operation.
    ///
    /// Immutable descrs return themselves. Mutable ones (guard descrs that
    /// accumulate failure counts, for instance) return a fresh copy and may
    /// consult `memo` for operations that were already duplicated.
    fn clone_if_mutable(self: Arc<Self>, memo: &CloneMemo) -> DescrRef;

    /// Backend check that this descr may be attached to `opcode`.
    fn check(&self, opcode: Opcode) -> Result<(), String> {
        let _ = opcode;
        Ok(())
    }

    /// Test stand-ins skip [`Descr::check`].
    fn is_test_stand_in(&self) -> bool {
        false
    }
}
