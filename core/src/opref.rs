//! Handles used as operands.
//!
//! Operations never hold pointers to each other. An operand is an [`OpRef`]:
//! an index into the trace that owns the operation or input argument, or an
//! inline constant. Identity is handle equality, which is what the clone and
//! naming memos key on.

use core::fmt;

use crate::value::{Const, ResultType, Value};

/// Index of an operation in its [`crate::Trace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OpId(u32);

impl OpId {
    pub(crate) fn new(raw: usize) -> Self {
        OpId(u32::try_from(raw).expect("trace exceeds u32::MAX operations"))
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of an input argument in its [`crate::Trace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InputId(u32);

impl InputId {
    pub(crate) fn new(raw: usize) -> Self {
        InputId(u32::try_from(raw).expect("trace exceeds u32::MAX input arguments"))
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// An operand: something an operation can take as input.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpRef {
    Input(InputId),
    Op(OpId),
    Const(Const),
}

impl OpRef {
    pub fn int(i: i64) -> Self {
        OpRef::Const(Const::Int(i))
    }

    pub fn float(f: f64) -> Self {
        OpRef::Const(Const::float(f))
    }

    /// True iff both handles denote the same entity. Constants compare by value.
    #[inline]
    pub fn same_identity(self, other: OpRef) -> bool {
        self == other
    }

    pub fn as_op(self) -> Option<OpId> {
        match self {
            OpRef::Op(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Debug for OpRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpRef::Input(id) => write!(f, "in{}", id.0),
            OpRef::Op(id) => write!(f, "op{}", id.0),
            OpRef::Const(c) => write!(f, "{}", c),
        }
    }
}

impl From<OpId> for OpRef {
    fn from(id: OpId) -> Self {
        OpRef::Op(id)
    }
}

impl From<InputId> for OpRef {
    fn from(id: InputId) -> Self {
        OpRef::Input(id)
    }
}

impl From<Const> for OpRef {
    fn from(c: Const) -> Self {
        OpRef::Const(c)
    }
}

/// A trace parameter: a value the trace receives rather than computes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputArg {
    value: Value,
}

impl InputArg {
    /// Input arguments always carry a value; void is rejected by the trace.
    pub(crate) fn new(value: Value) -> Self {
        debug_assert!(value.result_type() != ResultType::Void);
        InputArg { value }
    }

    pub fn value(&self) -> Value {
        self.value
    }

    pub fn set_value(&mut self, value: Value) {
        debug_assert_eq!(value.result_type(), self.result_type());
        self.value = value;
    }

    pub fn result_type(&self) -> ResultType {
        self.value.result_type()
    }

    pub fn nonnull(&self) -> bool {
        self.value.nonnull()
    }
}
