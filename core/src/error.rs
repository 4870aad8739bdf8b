//! IR construction and mutation errors.
//!
//! None of these are recoverable conditions. They report defects in the tracer
//! or in an optimization pass, and exist so the defect is caught at the point
//! where the IR invariant is first broken rather than later in the backend.
//!
//! # Error Categories
//!
//! - **Construction**: operand count, descriptor/opcode compatibility, final
//!   descriptors on FINISH and guards.
//! - **Bounds**: operand index outside the opcode's arity.
//! - **Type mismatch**: a result value whose type disagrees with the opcode.
//! - **Mutation after freeze**: a pass touched a trace handed to the backend.

use crate::String;

use thiserror::Error;

use crate::registry::Opcode;
use crate::value::ResultType;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum IrError {
    #[error("{opcode}: expected {expected} operand(s), got {got}")]
    OperandCount {
        opcode: Opcode,
        expected: String,
        got: usize,
    },

    #[error("{opcode} does not take a descr")]
    UnexpectedDescr { opcode: Opcode },

    #[error("finish requires a final descr")]
    FinishWithoutFinalDescr,

    #[error("{opcode}: guards cannot carry a final descr")]
    GuardWithFinalDescr { opcode: Opcode },

    #[error("{opcode}: invalid descr: {reason}")]
    InvalidDescr { opcode: Opcode, reason: String },

    #[error("{opcode}: operand index {index} out of range (arity {arity})")]
    OperandIndex {
        opcode: Opcode,
        index: usize,
        arity: usize,
    },

    #[error("{opcode}: result type is '{expected}', got a '{got}' value")]
    ResultType {
        opcode: Opcode,
        expected: ResultType,
        got: ResultType,
    },

    #[error("{opcode}: operations cannot change at this point")]
    Frozen { opcode: Opcode },

    #[error("unknown result type character '{0}'")]
    UnknownResultType(char),

    #[error("input arguments cannot be void")]
    VoidInput,

    #[error("same_as does not apply to void results")]
    VoidSameAs,

    #[error("unknown opcode '{0}'")]
    UnknownOpcode(String),
}

/// Defects in the declarative opcode table. Any of these is fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("duplicate opcode name '{0}'")]
    DuplicateName(String),

    #[error("opcode '{0}' declares no result type")]
    EmptyResultTypes(&'static str),

    #[error("opcode '{name}' declares unknown result type '{ch}'")]
    UnknownResultType { name: &'static str, ch: char },

    #[error("opcode table does not define '{0}'")]
    MissingName(&'static str),

    #[error("opcode table exceeds {} entries", u16::MAX)]
    TooManyOpcodes,
}
