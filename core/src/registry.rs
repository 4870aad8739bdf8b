//! The opcode registry.
//!
//! Every operation kind is declared once in [`OPLIST`], in a fixed order. Each
//! entry names the operation, its arity, whether it takes a descr, whether it
//! produces a boolean, and the result types it comes in. An entry with several
//! result types mints one opcode per type: `CALL` with `"rfin"` becomes
//! `CALL_R`, `CALL_F`, `CALL_I` and `CALL_N`.
//!
//! Entries whose name starts with `_` are range markers. They are not
//! operations, but they consume an id so that each behavioral category is a
//! contiguous run of ids and membership is a pair of integer comparisons:
//!
//! ```text
//! _FINAL_FIRST  JUMP FINISH  _FINAL_LAST  LABEL  _GUARD_FIRST ...
//! ```
//!
//! Ids are assigned in declaration order. The same assignment is computed
//! twice: at compile time for the [`rop`] constants (so passes can `match` on
//! them), and at startup by [`Registry::build`], which produces the dense
//! per-opcode fact arrays. Both walk the same table, and the tests check that
//! they agree.

use core::fmt;

use hashbrown::HashMap;
use lazy_static::lazy_static;

use crate::error::RegistryError;
use crate::relations;
use crate::value::ResultType;
use crate::{String, ToString, Vec, format};

// ============================================================================
// Opcode
// ============================================================================

/// Dense operation id, stable for the lifetime of the process.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Opcode(u16);

static_assertions::assert_eq_size!(Opcode, u16);

impl Opcode {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    const fn within(self, first: Opcode, last: Opcode) -> bool {
        first.0 <= self.0 && self.0 <= last.0
    }

    /// Upper-case symbolic name, e.g. `INT_ADD`.
    pub fn name(self) -> &'static str {
        registry().name(self).unwrap_or("<unknown>")
    }

    pub fn arity(self) -> Arity {
        registry().arity(self)
    }

    pub fn has_descr(self) -> bool {
        registry().has_descr(self)
    }

    pub fn returns_bool(self) -> bool {
        registry().returns_bool(self)
    }

    pub fn result_type(self) -> ResultType {
        registry().result_type(self)
    }

    pub const fn is_final(self) -> bool {
        self.within(rop::FINAL_FIRST, rop::FINAL_LAST)
    }

    pub const fn is_guard(self) -> bool {
        self.within(rop::GUARD_FIRST, rop::GUARD_LAST)
    }

    pub const fn is_foldable_guard(self) -> bool {
        self.within(rop::GUARD_FOLDABLE_FIRST, rop::GUARD_FOLDABLE_LAST)
    }

    pub const fn is_always_pure(self) -> bool {
        self.within(rop::ALWAYS_PURE_FIRST, rop::ALWAYS_PURE_LAST)
    }

    pub const fn has_no_side_effect(self) -> bool {
        self.within(rop::NOSIDEEFFECT_FIRST, rop::NOSIDEEFFECT_LAST)
    }

    pub const fn can_raise(self) -> bool {
        self.within(rop::CANRAISE_FIRST, rop::CANRAISE_LAST)
    }

    pub const fn is_malloc(self) -> bool {
        self.within(rop::MALLOC_FIRST, rop::MALLOC_LAST)
    }

    pub const fn is_call(self) -> bool {
        self.within(rop::CALL_FIRST, rop::CALL_LAST)
    }

    pub const fn is_ovf(self) -> bool {
        self.within(rop::OVF_FIRST, rop::OVF_LAST)
    }
}

impl fmt::Debug for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match registry().name(*self) {
            Some(name) => f.write_str(name),
            None => write!(f, "<{}>", self.0),
        }
    }
}

/// Lower-case name, as used in trace printouts.
impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match registry().opname(*self) {
            Some(name) => f.write_str(name),
            None => write!(f, "<{}>", self.0),
        }
    }
}

// ============================================================================
// Declarative table
// ============================================================================

/// Number of operands an opcode takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    Fixed(u8),
    Var,
}

impl Arity {
    const fn from_i8(n: i8) -> Self {
        if n < 0 { Arity::Var } else { Arity::Fixed(n as u8) }
    }

    /// `-1` for variable arity.
    pub const fn as_i8(self) -> i8 {
        match self {
            Arity::Fixed(n) => n as i8,
            Arity::Var => -1,
        }
    }

    pub const fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Fixed(n) => n as usize == count,
            Arity::Var => true,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Fixed(n) => write!(f, "{}", n),
            Arity::Var => write!(f, "*"),
        }
    }
}

/// One line of the opcode table.
#[derive(Debug, Clone, Copy)]
pub struct OpDecl {
    pub name: &'static str,
    pub arity: Arity,
    pub descr: bool,
    pub boolean: bool,
    /// Result type characters: `i`, `f`, `r`, or `n` for void.
    pub results: &'static str,
}

impl OpDecl {
    /// Marks the operation as taking a descr.
    pub const fn d(mut self) -> Self {
        self.descr = true;
        self
    }

    /// Marks the operation as producing a boolean.
    pub const fn b(mut self) -> Self {
        self.boolean = true;
        self
    }

    pub const fn is_marker(&self) -> bool {
        let bytes = self.name.as_bytes();
        !bytes.is_empty() && bytes[0] == b'_'
    }
}

/// Declares an operation. `arity` is `-1` for variable arity.
pub const fn op(name: &'static str, arity: i8, results: &'static str) -> OpDecl {
    OpDecl {
        name,
        arity: Arity::from_i8(arity),
        descr: false,
        boolean: false,
        results,
    }
}

/// Declares a range marker.
pub const fn marker(name: &'static str) -> OpDecl {
    OpDecl {
        name,
        arity: Arity::Var,
        descr: false,
        boolean: false,
        results: "",
    }
}

const VAR: i8 = -1;

#[rustfmt::skip]
pub const OPLIST: &[OpDecl] = &[
    marker("_FINAL_FIRST"),
    op("JUMP", VAR, "n").d(),
    op("FINISH", VAR, "n").d(),
    marker("_FINAL_LAST"),

    op("LABEL", VAR, "n").d(),

    marker("_GUARD_FIRST"),
    marker("_GUARD_FOLDABLE_FIRST"),
    op("GUARD_TRUE", 1, "n").d(),
    op("GUARD_FALSE", 1, "n").d(),
    op("GUARD_VALUE", 2, "n").d(),
    op("GUARD_CLASS", 2, "n").d(),
    op("GUARD_NONNULL", 1, "n").d(),
    op("GUARD_ISNULL", 1, "n").d(),
    op("GUARD_NONNULL_CLASS", 2, "n").d(),
    marker("_GUARD_FOLDABLE_LAST"),
    op("GUARD_NO_EXCEPTION", 0, "n").d(),
    op("GUARD_EXCEPTION", 1, "r").d(),
    op("GUARD_NO_OVERFLOW", 0, "n").d(),
    op("GUARD_OVERFLOW", 0, "n").d(),
    op("GUARD_NOT_FORCED", 0, "n").d(),
    op("GUARD_NOT_FORCED_2", 0, "n").d(),
    op("GUARD_NOT_INVALIDATED", 0, "n").d(),
    op("GUARD_FUTURE_CONDITION", 0, "n").d(),
    marker("_GUARD_LAST"),

    marker("_NOSIDEEFFECT_FIRST"),
    marker("_ALWAYS_PURE_FIRST"),
    op("INT_ADD", 2, "i"),
    op("INT_SUB", 2, "i"),
    op("INT_MUL", 2, "i"),
    op("INT_FLOORDIV", 2, "i"),
    op("UINT_FLOORDIV", 2, "i"),
    op("INT_MOD", 2, "i"),
    op("INT_AND", 2, "i"),
    op("INT_OR", 2, "i"),
    op("INT_XOR", 2, "i"),
    op("INT_RSHIFT", 2, "i"),
    op("INT_LSHIFT", 2, "i"),
    op("UINT_RSHIFT", 2, "i"),
    op("FLOAT_ADD", 2, "f"),
    op("FLOAT_SUB", 2, "f"),
    op("FLOAT_MUL", 2, "f"),
    op("FLOAT_TRUEDIV", 2, "f"),
    op("FLOAT_NEG", 1, "f"),
    op("FLOAT_ABS", 1, "f"),
    op("CAST_FLOAT_TO_INT", 1, "i"),
    op("CAST_INT_TO_FLOAT", 1, "f"),
    op("CAST_FLOAT_TO_SINGLEFLOAT", 1, "i"),
    op("CAST_SINGLEFLOAT_TO_FLOAT", 1, "f"),
    op("CONVERT_FLOAT_BYTES_TO_LONGLONG", 1, "i"),
    op("CONVERT_LONGLONG_BYTES_TO_FLOAT", 1, "f"),

    op("INT_LT", 2, "i").b(),
    op("INT_LE", 2, "i").b(),
    op("INT_EQ", 2, "i").b(),
    op("INT_NE", 2, "i").b(),
    op("INT_GT", 2, "i").b(),
    op("INT_GE", 2, "i").b(),
    op("UINT_LT", 2, "i").b(),
    op("UINT_LE", 2, "i").b(),
    op("UINT_GT", 2, "i").b(),
    op("UINT_GE", 2, "i").b(),
    op("FLOAT_LT", 2, "i").b(),
    op("FLOAT_LE", 2, "i").b(),
    op("FLOAT_EQ", 2, "i").b(),
    op("FLOAT_NE", 2, "i").b(),
    op("FLOAT_GT", 2, "i").b(),
    op("FLOAT_GE", 2, "i").b(),

    op("INT_IS_ZERO", 1, "i").b(),
    op("INT_IS_TRUE", 1, "i").b(),
    op("INT_NEG", 1, "i"),
    op("INT_INVERT", 1, "i"),
    op("INT_FORCE_GE_ZERO", 1, "i"),

    op("SAME_AS", 1, "rfi"),
    op("CAST_PTR_TO_INT", 1, "i"),
    op("CAST_INT_TO_PTR", 1, "r"),

    op("PTR_EQ", 2, "i").b(),
    op("PTR_NE", 2, "i").b(),
    op("INSTANCE_PTR_EQ", 2, "i").b(),
    op("INSTANCE_PTR_NE", 2, "i").b(),

    op("ARRAYLEN_GC", 1, "i").d(),
    op("STRLEN", 1, "i"),
    op("STRGETITEM", 2, "i"),
    op("GETFIELD_GC_PURE", 1, "rfi").d(),
    op("GETFIELD_RAW_PURE", 1, "fi").d(),
    op("GETARRAYITEM_GC_PURE", 2, "rfi").d(),
    op("GETARRAYITEM_RAW_PURE", 2, "fi").d(),
    op("UNICODELEN", 1, "i"),
    op("UNICODEGETITEM", 2, "i"),
    marker("_ALWAYS_PURE_LAST"),

    op("GETARRAYITEM_GC", 2, "rfi").d(),
    op("GETARRAYITEM_RAW", 2, "fi").d(),
    op("GETINTERIORFIELD_GC", 2, "rfi").d(),
    op("RAW_LOAD", 2, "fi").d(),
    op("GETFIELD_GC", 1, "rfi").d(),
    op("GETFIELD_RAW", 1, "fi").d(),
    marker("_MALLOC_FIRST"),
    op("NEW", 0, "r").d(),
    op("NEW_WITH_VTABLE", 1, "r"),
    op("NEW_ARRAY", 1, "r").d(),
    op("NEW_ARRAY_CLEAR", 1, "r").d(),
    op("NEWSTR", 1, "r"),
    op("NEWUNICODE", 1, "r"),
    marker("_MALLOC_LAST"),
    op("FORCE_TOKEN", 0, "i"),
    op("VIRTUAL_REF", 2, "r"),
    op("MARK_OPAQUE_PTR", 1, "n").b(),
    marker("_NOSIDEEFFECT_LAST"),

    op("INCREMENT_DEBUG_COUNTER", 1, "n"),
    op("SETARRAYITEM_GC", 3, "n").d(),
    op("SETARRAYITEM_RAW", 3, "n").d(),
    op("SETINTERIORFIELD_GC", 3, "n").d(),
    op("SETINTERIORFIELD_RAW", 3, "n").d(),
    op("RAW_STORE", 3, "n").d(),
    op("SETFIELD_GC", 2, "n").d(),
    op("ZERO_PTR_FIELD", 2, "n"),
    op("ZERO_ARRAY", 3, "n").d(),
    op("SETFIELD_RAW", 2, "n").d(),
    op("STRSETITEM", 3, "n"),
    op("UNICODESETITEM", 3, "n"),
    op("COND_CALL_GC_WB", 1, "n").d(),
    op("COND_CALL_GC_WB_ARRAY", 2, "n").d(),
    op("DEBUG_MERGE_POINT", VAR, "n"),
    op("JIT_DEBUG", VAR, "n"),
    op("VIRTUAL_REF_FINISH", 2, "n"),
    op("COPYSTRCONTENT", 5, "n"),
    op("COPYUNICODECONTENT", 5, "n"),
    op("QUASIIMMUT_FIELD", 1, "n").d(),
    op("RECORD_KNOWN_CLASS", 2, "n"),
    op("KEEPALIVE", 1, "n"),

    marker("_CANRAISE_FIRST"),
    marker("_CALL_FIRST"),
    op("CALL", VAR, "rfin").d(),
    op("COND_CALL", VAR, "n").d(),
    op("CALL_ASSEMBLER", VAR, "rfin").d(),
    op("CALL_MAY_FORCE", VAR, "rfin").d(),
    op("CALL_LOOPINVARIANT", VAR, "rfin").d(),
    op("CALL_RELEASE_GIL", VAR, "rfin").d(),
    op("CALL_PURE", VAR, "rfin").d(),
    op("CALL_MALLOC_GC", VAR, "r").d(),
    op("CALL_MALLOC_NURSERY", 1, "r"),
    op("CALL_MALLOC_NURSERY_VARSIZE", 3, "r").d(),
    op("CALL_MALLOC_NURSERY_VARSIZE_FRAME", 1, "r"),
    marker("_CALL_LAST"),
    marker("_CANRAISE_LAST"),

    marker("_OVF_FIRST"),
    op("INT_ADD_OVF", 2, "i"),
    op("INT_SUB_OVF", 2, "i"),
    op("INT_MUL_OVF", 2, "i"),
    marker("_OVF_LAST"),
    marker("_LAST"),
];

const fn str_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    let mut i = 0;
    while i < a.len() {
        if a[i] != b[i] {
            return false;
        }
        i += 1;
    }
    true
}

/// Compile-time id lookup. `tp` is the result type character for polymorphic
/// entries and `0` for everything else.
pub const fn lookup(table: &[OpDecl], name: &str, tp: u8) -> Opcode {
    let mut id: usize = 0;
    let mut i = 0;
    while i < table.len() {
        let decl = &table[i];
        let results = decl.results.as_bytes();
        if decl.is_marker() {
            if tp == 0 && str_eq(decl.name, name) {
                return Opcode(id as u16);
            }
            id += 1;
        } else {
            if str_eq(decl.name, name) {
                if tp == 0 && results.len() == 1 {
                    return Opcode(id as u16);
                }
                let mut j = 0;
                while j < results.len() {
                    if results[j] == tp {
                        return Opcode((id + j) as u16);
                    }
                    j += 1;
                }
                panic!("opcode does not come in the requested result type");
            }
            id += results.len();
        }
        i += 1;
    }
    panic!("opcode is not declared in the table");
}

// ============================================================================
// Opcode ids
// ============================================================================

/// Opcode ids, one constant per concrete operation plus the range markers.
pub mod rop {
    use super::{OPLIST, Opcode, lookup};

    macro_rules! rop {
        ($($id:ident = $name:literal),* $(,)?) => {
            $(pub const $id: Opcode = lookup(OPLIST, $name, 0);)*
        };
    }

    macro_rules! rop_typed {
        ($($id:ident = $name:literal / $tp:literal),* $(,)?) => {
            $(pub const $id: Opcode = lookup(OPLIST, $name, $tp);)*
        };
    }

    // Range markers.
    rop! {
        FINAL_FIRST = "_FINAL_FIRST",
        FINAL_LAST = "_FINAL_LAST",
        GUARD_FIRST = "_GUARD_FIRST",
        GUARD_FOLDABLE_FIRST = "_GUARD_FOLDABLE_FIRST",
        GUARD_FOLDABLE_LAST = "_GUARD_FOLDABLE_LAST",
        GUARD_LAST = "_GUARD_LAST",
        NOSIDEEFFECT_FIRST = "_NOSIDEEFFECT_FIRST",
        ALWAYS_PURE_FIRST = "_ALWAYS_PURE_FIRST",
        ALWAYS_PURE_LAST = "_ALWAYS_PURE_LAST",
        MALLOC_FIRST = "_MALLOC_FIRST",
        MALLOC_LAST = "_MALLOC_LAST",
        NOSIDEEFFECT_LAST = "_NOSIDEEFFECT_LAST",
        CANRAISE_FIRST = "_CANRAISE_FIRST",
        CALL_FIRST = "_CALL_FIRST",
        CALL_LAST = "_CALL_LAST",
        CANRAISE_LAST = "_CANRAISE_LAST",
        OVF_FIRST = "_OVF_FIRST",
        OVF_LAST = "_OVF_LAST",
        LAST = "_LAST",
    }

    rop! {
        JUMP = "JUMP",
        FINISH = "FINISH",
        LABEL = "LABEL",

        GUARD_TRUE = "GUARD_TRUE",
        GUARD_FALSE = "GUARD_FALSE",
        GUARD_VALUE = "GUARD_VALUE",
        GUARD_CLASS = "GUARD_CLASS",
        GUARD_NONNULL = "GUARD_NONNULL",
        GUARD_ISNULL = "GUARD_ISNULL",
        GUARD_NONNULL_CLASS = "GUARD_NONNULL_CLASS",
        GUARD_NO_EXCEPTION = "GUARD_NO_EXCEPTION",
        GUARD_EXCEPTION = "GUARD_EXCEPTION",
        GUARD_NO_OVERFLOW = "GUARD_NO_OVERFLOW",
        GUARD_OVERFLOW = "GUARD_OVERFLOW",
        GUARD_NOT_FORCED = "GUARD_NOT_FORCED",
        GUARD_NOT_FORCED_2 = "GUARD_NOT_FORCED_2",
        GUARD_NOT_INVALIDATED = "GUARD_NOT_INVALIDATED",
        GUARD_FUTURE_CONDITION = "GUARD_FUTURE_CONDITION",

        INT_ADD = "INT_ADD",
        INT_SUB = "INT_SUB",
        INT_MUL = "INT_MUL",
        INT_FLOORDIV = "INT_FLOORDIV",
        UINT_FLOORDIV = "UINT_FLOORDIV",
        INT_MOD = "INT_MOD",
        INT_AND = "INT_AND",
        INT_OR = "INT_OR",
        INT_XOR = "INT_XOR",
        INT_RSHIFT = "INT_RSHIFT",
        INT_LSHIFT = "INT_LSHIFT",
        UINT_RSHIFT = "UINT_RSHIFT",
        FLOAT_ADD = "FLOAT_ADD",
        FLOAT_SUB = "FLOAT_SUB",
        FLOAT_MUL = "FLOAT_MUL",
        FLOAT_TRUEDIV = "FLOAT_TRUEDIV",
        FLOAT_NEG = "FLOAT_NEG",
        FLOAT_ABS = "FLOAT_ABS",
        CAST_FLOAT_TO_INT = "CAST_FLOAT_TO_INT",
        CAST_INT_TO_FLOAT = "CAST_INT_TO_FLOAT",
        CAST_FLOAT_TO_SINGLEFLOAT = "CAST_FLOAT_TO_SINGLEFLOAT",
        CAST_SINGLEFLOAT_TO_FLOAT = "CAST_SINGLEFLOAT_TO_FLOAT",
        CONVERT_FLOAT_BYTES_TO_LONGLONG = "CONVERT_FLOAT_BYTES_TO_LONGLONG",
        CONVERT_LONGLONG_BYTES_TO_FLOAT = "CONVERT_LONGLONG_BYTES_TO_FLOAT",

        INT_LT = "INT_LT",
        INT_LE = "INT_LE",
        INT_EQ = "INT_EQ",
        INT_NE = "INT_NE",
        INT_GT = "INT_GT",
        INT_GE = "INT_GE",
        UINT_LT = "UINT_LT",
        UINT_LE = "UINT_LE",
        UINT_GT = "UINT_GT",
        UINT_GE = "UINT_GE",
        FLOAT_LT = "FLOAT_LT",
        FLOAT_LE = "FLOAT_LE",
        FLOAT_EQ = "FLOAT_EQ",
        FLOAT_NE = "FLOAT_NE",
        FLOAT_GT = "FLOAT_GT",
        FLOAT_GE = "FLOAT_GE",

        INT_IS_ZERO = "INT_IS_ZERO",
        INT_IS_TRUE = "INT_IS_TRUE",
        INT_NEG = "INT_NEG",
        INT_INVERT = "INT_INVERT",
        INT_FORCE_GE_ZERO = "INT_FORCE_GE_ZERO",

        CAST_PTR_TO_INT = "CAST_PTR_TO_INT",
        CAST_INT_TO_PTR = "CAST_INT_TO_PTR",

        PTR_EQ = "PTR_EQ",
        PTR_NE = "PTR_NE",
        INSTANCE_PTR_EQ = "INSTANCE_PTR_EQ",
        INSTANCE_PTR_NE = "INSTANCE_PTR_NE",

        ARRAYLEN_GC = "ARRAYLEN_GC",
        STRLEN = "STRLEN",
        STRGETITEM = "STRGETITEM",
        UNICODELEN = "UNICODELEN",
        UNICODEGETITEM = "UNICODEGETITEM",

        NEW = "NEW",
        NEW_WITH_VTABLE = "NEW_WITH_VTABLE",
        NEW_ARRAY = "NEW_ARRAY",
        NEW_ARRAY_CLEAR = "NEW_ARRAY_CLEAR",
        NEWSTR = "NEWSTR",
        NEWUNICODE = "NEWUNICODE",
        FORCE_TOKEN = "FORCE_TOKEN",
        VIRTUAL_REF = "VIRTUAL_REF",
        MARK_OPAQUE_PTR = "MARK_OPAQUE_PTR",

        INCREMENT_DEBUG_COUNTER = "INCREMENT_DEBUG_COUNTER",
        SETARRAYITEM_GC = "SETARRAYITEM_GC",
        SETARRAYITEM_RAW = "SETARRAYITEM_RAW",
        SETINTERIORFIELD_GC = "SETINTERIORFIELD_GC",
        SETINTERIORFIELD_RAW = "SETINTERIORFIELD_RAW",
        RAW_STORE = "RAW_STORE",
        SETFIELD_GC = "SETFIELD_GC",
        ZERO_PTR_FIELD = "ZERO_PTR_FIELD",
        ZERO_ARRAY = "ZERO_ARRAY",
        SETFIELD_RAW = "SETFIELD_RAW",
        STRSETITEM = "STRSETITEM",
        UNICODESETITEM = "UNICODESETITEM",
        COND_CALL_GC_WB = "COND_CALL_GC_WB",
        COND_CALL_GC_WB_ARRAY = "COND_CALL_GC_WB_ARRAY",
        DEBUG_MERGE_POINT = "DEBUG_MERGE_POINT",
        JIT_DEBUG = "JIT_DEBUG",
        VIRTUAL_REF_FINISH = "VIRTUAL_REF_FINISH",
        COPYSTRCONTENT = "COPYSTRCONTENT",
        COPYUNICODECONTENT = "COPYUNICODECONTENT",
        QUASIIMMUT_FIELD = "QUASIIMMUT_FIELD",
        RECORD_KNOWN_CLASS = "RECORD_KNOWN_CLASS",
        KEEPALIVE = "KEEPALIVE",

        COND_CALL = "COND_CALL",
        CALL_MALLOC_GC = "CALL_MALLOC_GC",
        CALL_MALLOC_NURSERY = "CALL_MALLOC_NURSERY",
        CALL_MALLOC_NURSERY_VARSIZE = "CALL_MALLOC_NURSERY_VARSIZE",
        CALL_MALLOC_NURSERY_VARSIZE_FRAME = "CALL_MALLOC_NURSERY_VARSIZE_FRAME",

        INT_ADD_OVF = "INT_ADD_OVF",
        INT_SUB_OVF = "INT_SUB_OVF",
        INT_MUL_OVF = "INT_MUL_OVF",
    }

    rop_typed! {
        SAME_AS_I = "SAME_AS" / b'i',
        SAME_AS_R = "SAME_AS" / b'r',
        SAME_AS_F = "SAME_AS" / b'f',

        GETFIELD_GC_PURE_I = "GETFIELD_GC_PURE" / b'i',
        GETFIELD_GC_PURE_R = "GETFIELD_GC_PURE" / b'r',
        GETFIELD_GC_PURE_F = "GETFIELD_GC_PURE" / b'f',
        GETFIELD_RAW_PURE_I = "GETFIELD_RAW_PURE" / b'i',
        GETFIELD_RAW_PURE_F = "GETFIELD_RAW_PURE" / b'f',
        GETARRAYITEM_GC_PURE_I = "GETARRAYITEM_GC_PURE" / b'i',
        GETARRAYITEM_GC_PURE_R = "GETARRAYITEM_GC_PURE" / b'r',
        GETARRAYITEM_GC_PURE_F = "GETARRAYITEM_GC_PURE" / b'f',
        GETARRAYITEM_RAW_PURE_I = "GETARRAYITEM_RAW_PURE" / b'i',
        GETARRAYITEM_RAW_PURE_F = "GETARRAYITEM_RAW_PURE" / b'f',

        GETARRAYITEM_GC_I = "GETARRAYITEM_GC" / b'i',
        GETARRAYITEM_GC_R = "GETARRAYITEM_GC" / b'r',
        GETARRAYITEM_GC_F = "GETARRAYITEM_GC" / b'f',
        GETARRAYITEM_RAW_I = "GETARRAYITEM_RAW" / b'i',
        GETARRAYITEM_RAW_F = "GETARRAYITEM_RAW" / b'f',
        GETINTERIORFIELD_GC_I = "GETINTERIORFIELD_GC" / b'i',
        GETINTERIORFIELD_GC_R = "GETINTERIORFIELD_GC" / b'r',
        GETINTERIORFIELD_GC_F = "GETINTERIORFIELD_GC" / b'f',
        RAW_LOAD_I = "RAW_LOAD" / b'i',
        RAW_LOAD_F = "RAW_LOAD" / b'f',
        GETFIELD_GC_I = "GETFIELD_GC" / b'i',
        GETFIELD_GC_R = "GETFIELD_GC" / b'r',
        GETFIELD_GC_F = "GETFIELD_GC" / b'f',
        GETFIELD_RAW_I = "GETFIELD_RAW" / b'i',
        GETFIELD_RAW_F = "GETFIELD_RAW" / b'f',

        CALL_I = "CALL" / b'i',
        CALL_R = "CALL" / b'r',
        CALL_F = "CALL" / b'f',
        CALL_N = "CALL" / b'n',
        CALL_ASSEMBLER_I = "CALL_ASSEMBLER" / b'i',
        CALL_ASSEMBLER_R = "CALL_ASSEMBLER" / b'r',
        CALL_ASSEMBLER_F = "CALL_ASSEMBLER" / b'f',
        CALL_ASSEMBLER_N = "CALL_ASSEMBLER" / b'n',
        CALL_MAY_FORCE_I = "CALL_MAY_FORCE" / b'i',
        CALL_MAY_FORCE_R = "CALL_MAY_FORCE" / b'r',
        CALL_MAY_FORCE_F = "CALL_MAY_FORCE" / b'f',
        CALL_MAY_FORCE_N = "CALL_MAY_FORCE" / b'n',
        CALL_LOOPINVARIANT_I = "CALL_LOOPINVARIANT" / b'i',
        CALL_LOOPINVARIANT_R = "CALL_LOOPINVARIANT" / b'r',
        CALL_LOOPINVARIANT_F = "CALL_LOOPINVARIANT" / b'f',
        CALL_LOOPINVARIANT_N = "CALL_LOOPINVARIANT" / b'n',
        CALL_RELEASE_GIL_I = "CALL_RELEASE_GIL" / b'i',
        CALL_RELEASE_GIL_R = "CALL_RELEASE_GIL" / b'r',
        CALL_RELEASE_GIL_F = "CALL_RELEASE_GIL" / b'f',
        CALL_RELEASE_GIL_N = "CALL_RELEASE_GIL" / b'n',
        CALL_PURE_I = "CALL_PURE" / b'i',
        CALL_PURE_R = "CALL_PURE" / b'r',
        CALL_PURE_F = "CALL_PURE" / b'f',
        CALL_PURE_N = "CALL_PURE" / b'n',
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Boundary ids of the classification ranges, resolved by name at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundaries {
    pub final_first: Opcode,
    pub final_last: Opcode,
    pub guard_first: Opcode,
    pub guard_foldable_first: Opcode,
    pub guard_foldable_last: Opcode,
    pub guard_last: Opcode,
    pub nosideeffect_first: Opcode,
    pub always_pure_first: Opcode,
    pub always_pure_last: Opcode,
    pub malloc_first: Opcode,
    pub malloc_last: Opcode,
    pub nosideeffect_last: Opcode,
    pub canraise_first: Opcode,
    pub call_first: Opcode,
    pub call_last: Opcode,
    pub canraise_last: Opcode,
    pub ovf_first: Opcode,
    pub ovf_last: Opcode,
    pub last: Opcode,
}

impl Boundaries {
    fn resolve(by_name: &HashMap<String, Opcode>) -> Result<Self, RegistryError> {
        let get = |name: &'static str| {
            by_name
                .get(name)
                .copied()
                .ok_or(RegistryError::MissingName(name))
        };
        Ok(Boundaries {
            final_first: get("_FINAL_FIRST")?,
            final_last: get("_FINAL_LAST")?,
            guard_first: get("_GUARD_FIRST")?,
            guard_foldable_first: get("_GUARD_FOLDABLE_FIRST")?,
            guard_foldable_last: get("_GUARD_FOLDABLE_LAST")?,
            guard_last: get("_GUARD_LAST")?,
            nosideeffect_first: get("_NOSIDEEFFECT_FIRST")?,
            always_pure_first: get("_ALWAYS_PURE_FIRST")?,
            always_pure_last: get("_ALWAYS_PURE_LAST")?,
            malloc_first: get("_MALLOC_FIRST")?,
            malloc_last: get("_MALLOC_LAST")?,
            nosideeffect_last: get("_NOSIDEEFFECT_LAST")?,
            canraise_first: get("_CANRAISE_FIRST")?,
            call_first: get("_CALL_FIRST")?,
            call_last: get("_CALL_LAST")?,
            canraise_last: get("_CANRAISE_LAST")?,
            ovf_first: get("_OVF_FIRST")?,
            ovf_last: get("_OVF_LAST")?,
            last: get("_LAST")?,
        })
    }
}

/// Per-opcode facts, stored as parallel arrays indexed by [`Opcode::index`].
#[derive(Debug, Clone, PartialEq)]
pub struct Registry {
    names: Vec<String>,
    opnames: Vec<String>,
    arity: Vec<Arity>,
    has_descr: Vec<bool>,
    bool_result: Vec<bool>,
    // `None` for range markers.
    result_type: Vec<Option<ResultType>>,
    by_name: HashMap<String, Opcode>,
    bool_inverse: Vec<Option<Opcode>>,
    bool_reflex: Vec<Option<Opcode>>,
    bounds: Boundaries,
}

impl Registry {
    /// Builds the fact arrays from a declarative table.
    pub fn build(table: &[OpDecl]) -> Result<Self, RegistryError> {
        let mut builder = Builder::default();
        for decl in table {
            if decl.is_marker() {
                builder.push(decl.name.to_string(), decl, None)?;
                continue;
            }
            if decl.results.is_empty() {
                return Err(RegistryError::EmptyResultTypes(decl.name));
            }
            let polymorphic = decl.results.len() > 1;
            for ch in decl.results.chars() {
                let tp = ResultType::from_char(ch).map_err(|_| {
                    RegistryError::UnknownResultType {
                        name: decl.name,
                        ch,
                    }
                })?;
                let name = if polymorphic {
                    format!("{}_{}", decl.name, tp.suffix())
                } else {
                    decl.name.to_string()
                };
                builder.push(name, decl, Some(tp))?;
            }
        }

        let bounds = Boundaries::resolve(&builder.by_name)?;
        let (bool_inverse, bool_reflex) = relations::resolve(&builder.by_name, builder.names.len())?;
        let registry = Registry {
            names: builder.names,
            opnames: builder.opnames,
            arity: builder.arity,
            has_descr: builder.has_descr,
            bool_result: builder.bool_result,
            result_type: builder.result_type,
            by_name: builder.by_name,
            bool_inverse,
            bool_reflex,
            bounds,
        };
        tracing::debug!(opcodes = registry.len(), "built opcode registry");
        Ok(registry)
    }

    /// Number of ids, markers included.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn lookup(&self, name: &str) -> Option<Opcode> {
        self.by_name.get(name).copied()
    }

    pub fn name(&self, op: Opcode) -> Option<&str> {
        self.names.get(op.index()).map(String::as_str)
    }

    pub fn opname(&self, op: Opcode) -> Option<&str> {
        self.opnames.get(op.index()).map(String::as_str)
    }

    pub fn is_marker(&self, op: Opcode) -> bool {
        matches!(self.result_type.get(op.index()), Some(None))
    }

    pub fn arity(&self, op: Opcode) -> Arity {
        self.arity.get(op.index()).copied().unwrap_or(Arity::Var)
    }

    pub fn has_descr(&self, op: Opcode) -> bool {
        self.has_descr.get(op.index()).copied().unwrap_or(false)
    }

    pub fn returns_bool(&self, op: Opcode) -> bool {
        self.bool_result.get(op.index()).copied().unwrap_or(false)
    }

    /// Markers and unknown ids report void.
    pub fn result_type(&self, op: Opcode) -> ResultType {
        self.result_type
            .get(op.index())
            .copied()
            .flatten()
            .unwrap_or(ResultType::Void)
    }

    pub fn bool_inverse(&self, op: Opcode) -> Option<Opcode> {
        self.bool_inverse.get(op.index()).copied().flatten()
    }

    pub fn bool_reflex(&self, op: Opcode) -> Option<Opcode> {
        self.bool_reflex.get(op.index()).copied().flatten()
    }

    pub fn boundaries(&self) -> &Boundaries {
        &self.bounds
    }

    /// Every id in order, markers included.
    pub fn ids(&self) -> impl Iterator<Item = Opcode> + '_ {
        (0..self.len()).map(|i| Opcode(i as u16))
    }

    /// Every concrete operation in order.
    pub fn opcodes(&self) -> impl Iterator<Item = Opcode> + '_ {
        self.ids().filter(|&op| !self.is_marker(op))
    }
}

#[derive(Default)]
struct Builder {
    names: Vec<String>,
    opnames: Vec<String>,
    arity: Vec<Arity>,
    has_descr: Vec<bool>,
    bool_result: Vec<bool>,
    result_type: Vec<Option<ResultType>>,
    by_name: HashMap<String, Opcode>,
}

impl Builder {
    fn push(
        &mut self,
        name: String,
        decl: &OpDecl,
        tp: Option<ResultType>,
    ) -> Result<(), RegistryError> {
        let id: u16 = self
            .names
            .len()
            .try_into()
            .map_err(|_| RegistryError::TooManyOpcodes)?;
        if self.by_name.contains_key(&name) {
            return Err(RegistryError::DuplicateName(name));
        }
        let marker = tp.is_none();
        self.by_name.insert(name.clone(), Opcode(id));
        self.opnames.push(name.to_ascii_lowercase());
        self.names.push(name);
        self.arity.push(if marker { Arity::Var } else { decl.arity });
        self.has_descr.push(!marker && decl.descr);
        self.bool_result.push(!marker && decl.boolean);
        self.result_type.push(tp);
        Ok(())
    }
}

lazy_static! {
    static ref REGISTRY: Registry =
        Registry::build(OPLIST).expect("the built-in opcode table is malformed");
}

/// The process-wide registry, built from [`OPLIST`] on first use.
pub fn registry() -> &'static Registry {
    &REGISTRY
}
