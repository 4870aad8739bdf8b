//! Core IR for a trace-based JIT.
//!
//! A trace is a straight-line recording of what an interpreter did on one hot
//! path: a list of input arguments followed by [`Operation`]s. Optimization
//! passes rewrite it and a backend turns it into machine code.
//!
//! The opcode set is declared once in [`OPLIST`]. From it come the dense
//! [`Opcode`] ids (the [`rop`] constants), the per-opcode facts in the
//! [`Registry`], and the boolean relation tables ([`boolinverse`],
//! [`boolreflex`]).

extern crate alloc;

// Re-export for convenience so other modules don't need alloc:: prefix
#[allow(unused_imports)]
pub(crate) use alloc::{boxed::Box, format, string::String, string::ToString, vec, vec::Vec};

pub mod descr;
pub mod error;
pub mod helpers;
pub mod operands;
pub mod operation;
pub mod opref;
pub mod options;
pub mod registry;
pub mod relations;
pub mod trace;
pub mod value;

#[cfg(test)]
mod operation_test;

pub use descr::{Descr, DescrRef};
pub use error::{IrError, RegistryError};
pub use helpers::OpHelpers;
pub use operands::Operands;
pub use operation::Operation;
pub use opref::{InputArg, InputId, OpId, OpRef};
pub use options::IrOptions;
pub use registry::{Arity, OPLIST, OpDecl, Opcode, Registry, registry, rop};
pub use relations::{boolinverse, boolreflex};
pub use trace::{CloneMemo, DebugLoc, NamingMemo, Trace};
pub use value::{Const, GcRef, ResultType, Value};
