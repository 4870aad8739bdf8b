//! Result values carried by operations and input arguments.
//!
//! Every operation has exactly one result slot whose variant is fixed by the
//! opcode's result type. Input arguments carry the same slot. Constants used as
//! operands are stored inline in [`Const`] so they can be hashed and compared.

use core::fmt;

use crate::error::IrError;

/// Result type of an operation.
///
/// The character form matches trace printouts: `i`, `f`, `r` and `v`. The
/// opcode table spells void as `n`, which [`ResultType::from_char`] also
/// accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultType {
    Int,
    Float,
    Ref,
    Void,
}

impl ResultType {
    pub fn from_char(c: char) -> Result<Self, IrError> {
        match c {
            'i' => Ok(ResultType::Int),
            'f' => Ok(ResultType::Float),
            'r' => Ok(ResultType::Ref),
            'v' | 'n' => Ok(ResultType::Void),
            other => Err(IrError::UnknownResultType(other)),
        }
    }

    /// Character used when naming results in trace printouts (`i0`, `f1`, ...).
    pub const fn as_char(self) -> char {
        match self {
            ResultType::Int => 'i',
            ResultType::Float => 'f',
            ResultType::Ref => 'r',
            ResultType::Void => 'v',
        }
    }

    /// Suffix used for polymorphic opcode names (`CALL_I`, ..., `CALL_N`).
    pub const fn suffix(self) -> char {
        match self {
            ResultType::Int => 'I',
            ResultType::Float => 'F',
            ResultType::Ref => 'R',
            ResultType::Void => 'N',
        }
    }

    pub const fn is_void(self) -> bool {
        matches!(self, ResultType::Void)
    }
}

impl fmt::Display for ResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// An opaque GC reference. The IR never dereferences it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GcRef(pub usize);

impl GcRef {
    pub const NULL: GcRef = GcRef(0);

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// The result slot of an operation or input argument.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Void,
    Int(i64),
    Float(f64),
    Ref(GcRef),
}

static_assertions::assert_eq_size!(Value, [u64; 2]);

impl Value {
    /// The zero value for a result type; this is what a fresh operation holds.
    pub const fn default_for(tp: ResultType) -> Self {
        match tp {
            ResultType::Int => Value::Int(0),
            ResultType::Float => Value::Float(0.0),
            ResultType::Ref => Value::Ref(GcRef::NULL),
            ResultType::Void => Value::Void,
        }
    }

    pub const fn result_type(&self) -> ResultType {
        match self {
            Value::Void => ResultType::Void,
            Value::Int(_) => ResultType::Int,
            Value::Float(_) => ResultType::Float,
            Value::Ref(_) => ResultType::Ref,
        }
    }

    /// Type-specific truthiness.
    ///
    /// Floats test the raw bit pattern, so `-0.0` is non-null.
    pub fn nonnull(&self) -> bool {
        match *self {
            Value::Void => false,
            Value::Int(i) => i != 0,
            Value::Float(f) => f.to_bits() != 0,
            Value::Ref(r) => !r.is_null(),
        }
    }

    pub const fn as_int(&self) -> Option<i64> {
        match *self {
            Value::Int(i) => Some(i),
            _ => None,
        }
    }

    pub const fn as_float(&self) -> Option<f64> {
        match *self {
            Value::Float(f) => Some(f),
            _ => None,
        }
    }

    pub const fn as_gcref(&self) -> Option<GcRef> {
        match *self {
            Value::Ref(r) => Some(r),
            _ => None,
        }
    }
}

/// A constant operand.
///
/// Floats are kept as their bit pattern so constants are `Eq + Hash` and can
/// key identity memos alongside operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Const {
    Int(i64),
    Float(u64),
    Ref(GcRef),
}

impl Const {
    pub fn float(f: f64) -> Self {
        Const::Float(f.to_bits())
    }

    pub const fn result_type(&self) -> ResultType {
        match self {
            Const::Int(_) => ResultType::Int,
            Const::Float(_) => ResultType::Float,
            Const::Ref(_) => ResultType::Ref,
        }
    }

    pub fn value(&self) -> Value {
        match *self {
            Const::Int(i) => Value::Int(i),
            Const::Float(bits) => Value::Float(f64::from_bits(bits)),
            Const::Ref(r) => Value::Ref(r),
        }
    }
}

impl fmt::Display for Const {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Const::Int(i) => write!(f, "{}", i),
            Const::Float(bits) => write!(f, "{:?}", f64::from_bits(bits)),
            Const::Ref(r) if r.is_null() => write!(f, "ConstPtr(null)"),
            Const::Ref(r) => write!(f, "ConstPtr(0x{:x})", r.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_char() {
        assert_eq!(ResultType::from_char('i').unwrap(), ResultType::Int);
        assert_eq!(ResultType::from_char('n').unwrap(), ResultType::Void);
        assert_eq!(ResultType::from_char('v').unwrap(), ResultType::Void);
        assert!(matches!(
            ResultType::from_char('x'),
            Err(IrError::UnknownResultType('x'))
        ));
    }

    #[test]
    fn test_nonnull() {
        assert!(!Value::Int(0).nonnull());
        assert!(Value::Int(-3).nonnull());
        assert!(!Value::Float(0.0).nonnull());
        assert!(Value::Float(-0.0).nonnull());
        assert!(!Value::Ref(GcRef::NULL).nonnull());
        assert!(Value::Ref(GcRef(0x1000)).nonnull());
        assert!(!Value::Void.nonnull());
    }

    #[test]
    fn test_default_matches_type() {
        for tp in [
            ResultType::Int,
            ResultType::Float,
            ResultType::Ref,
            ResultType::Void,
        ] {
            assert_eq!(Value::default_for(tp).result_type(), tp);
        }
    }

    #[test]
    fn test_const_display() {
        assert_eq!(Const::Int(42).to_string(), "42");
        assert_eq!(Const::float(1.5).to_string(), "1.5");
        assert_eq!(Const::Ref(GcRef::NULL).to_string(), "ConstPtr(null)");
        assert_eq!(Const::Ref(GcRef(0xff)).to_string(), "ConstPtr(0xff)");
    }
}
