//! Traceir - the intermediate representation of a tracing JIT
//!
//! # Overview
//!
//! A tracing JIT records what an interpreter does on a hot loop as a linear
//! trace of operations, optimizes that trace and compiles it. This crate is
//! the trace data model shared by the recorder, the optimizer and the backend:
//!
//! - the opcode set and its per-opcode facts ([`Registry`], [`rop`])
//! - operations with checked construction and mutation ([`Operation`])
//! - the trace arena with duplication, printing and freezing ([`Trace`])
//! - descriptor-driven opcode selection ([`OpHelpers`])
//!
//! # Quick Start
//!
//! ```
//! use traceir::{IrOptions, OpRef, Trace, rop};
//!
//! let mut trace = Trace::with_options(IrOptions::production());
//! let x = trace.input_int(41);
//! let y = trace.record(rop::INT_ADD, &[x, OpRef::int(1)], None).unwrap();
//! trace.record(rop::JUMP, &[y], None).unwrap();
//!
//! assert_eq!(trace.to_string(), "[i0]\ni1 = int_add(i0, 1)\njump(i1)\n");
//! ```
//!
//! # Checks
//!
//! Construction always validates operand counts and descriptors. The checks
//! that only guard against optimizer defects, such as rejecting changes to a
//! trace after it has been handed to the backend, are controlled by
//! [`IrOptions`] and are off in release builds by default.

pub use traceir_core::{
    Arity, CloneMemo, Const, DebugLoc, Descr, DescrRef, GcRef, InputArg, InputId, IrError,
    IrOptions, NamingMemo, OPLIST, OpDecl, OpHelpers, OpId, OpRef, Opcode, Operands, Operation,
    Registry, RegistryError, ResultType, Trace, Value, boolinverse, boolreflex, registry, rop,
};

// Modules for less common items.
pub use traceir_core::{descr, error, operation, options, trace, value};
