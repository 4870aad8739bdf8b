//! Arity-specialized operand storage.
//!
//! Almost every operation takes between zero and three operands, so those are
//! stored inline. Only variable-arity opcodes (calls, jumps, labels, debug
//! markers) pay for a separate heap sequence. The shape is chosen from the
//! opcode's declared arity, never by the caller.

use crate::Vec;
use crate::opref::OpRef;
use crate::registry::Arity;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operands {
    Nullary,
    Unary([OpRef; 1]),
    Binary([OpRef; 2]),
    Ternary([OpRef; 3]),
    Nary(Vec<OpRef>),
}

impl Operands {
    /// Packs `args` for an opcode of the given arity.
    ///
    /// The caller has already checked `arity.accepts(args.len())`; fixed arities
    /// above three also use the sequence form.
    pub(crate) fn pack(arity: Arity, args: &[OpRef]) -> Self {
        match (arity, args) {
            (Arity::Fixed(0), []) => Operands::Nullary,
            (Arity::Fixed(1), &[a]) => Operands::Unary([a]),
            (Arity::Fixed(2), &[a, b]) => Operands::Binary([a, b]),
            (Arity::Fixed(3), &[a, b, c]) => Operands::Ternary([a, b, c]),
            _ => Operands::Nary(args.to_vec()),
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[OpRef] {
        match self {
            Operands::Nullary => &[],
            Operands::Unary(args) => args,
            Operands::Binary(args) => args,
            Operands::Ternary(args) => args,
            Operands::Nary(args) => args,
        }
    }

    #[inline]
    fn as_mut_slice(&mut self) -> &mut [OpRef] {
        match self {
            Operands::Nullary => &mut [],
            Operands::Unary(args) => args,
            Operands::Binary(args) => args,
            Operands::Ternary(args) => args,
            Operands::Nary(args) => args,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<OpRef> {
        self.as_slice().get(index).copied()
    }

    /// Returns false if `index` is out of range.
    #[inline]
    pub(crate) fn set(&mut self, index: usize, value: OpRef) -> bool {
        match self.as_mut_slice().get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub(crate) fn map(&self, mut f: impl FnMut(OpRef) -> OpRef) -> Self {
        let mut out = self.clone();
        for slot in out.as_mut_slice() {
            *slot = f(*slot);
        }
        out
    }
}
