//! Boolean relations between comparison opcodes.
//!
//! - **inverse**: logical negation, `a < b` is `not (a >= b)`.
//! - **reflex**: operand swap, `a < b` is `b > a`.
//!
//! Only the integer, unsigned, float and pointer comparisons have entries.
//! The tables are resolved into dense per-opcode arrays when the registry is
//! built, so a lookup is one index.

use hashbrown::HashMap;

use crate::error::RegistryError;
use crate::registry::{Opcode, registry};
use crate::{Vec, vec};

const INVERSE: &[(&str, &str)] = &[
    ("INT_EQ", "INT_NE"),
    ("INT_NE", "INT_EQ"),
    ("INT_LT", "INT_GE"),
    ("INT_GE", "INT_LT"),
    ("INT_GT", "INT_LE"),
    ("INT_LE", "INT_GT"),
    ("UINT_LT", "UINT_GE"),
    ("UINT_GE", "UINT_LT"),
    ("UINT_GT", "UINT_LE"),
    ("UINT_LE", "UINT_GT"),
    ("FLOAT_EQ", "FLOAT_NE"),
    ("FLOAT_NE", "FLOAT_EQ"),
    ("FLOAT_LT", "FLOAT_GE"),
    ("FLOAT_GE", "FLOAT_LT"),
    ("FLOAT_GT", "FLOAT_LE"),
    ("FLOAT_LE", "FLOAT_GT"),
    ("PTR_EQ", "PTR_NE"),
    ("PTR_NE", "PTR_EQ"),
];

const REFLEX: &[(&str, &str)] = &[
    ("INT_EQ", "INT_EQ"),
    ("INT_NE", "INT_NE"),
    ("INT_LT", "INT_GT"),
    ("INT_GE", "INT_LE"),
    ("INT_GT", "INT_LT"),
    ("INT_LE", "INT_GE"),
    ("UINT_LT", "UINT_GT"),
    ("UINT_GE", "UINT_LE"),
    ("UINT_GT", "UINT_LT"),
    ("UINT_LE", "UINT_GE"),
    ("FLOAT_EQ", "FLOAT_EQ"),
    ("FLOAT_NE", "FLOAT_NE"),
    ("FLOAT_LT", "FLOAT_GT"),
    ("FLOAT_GE", "FLOAT_LE"),
    ("FLOAT_GT", "FLOAT_LT"),
    ("FLOAT_LE", "FLOAT_GE"),
    ("PTR_EQ", "PTR_EQ"),
    ("PTR_NE", "PTR_NE"),
];

type Table = Vec<Option<Opcode>>;

fn dense(
    pairs: &[(&'static str, &'static str)],
    by_name: &HashMap<crate::String, Opcode>,
    len: usize,
) -> Result<Table, RegistryError> {
    let mut table = vec![None; len];
    for &(from, to) in pairs {
        let from = by_name
            .get(from)
            .copied()
            .ok_or(RegistryError::MissingName(from))?;
        let to = by_name
            .get(to)
            .copied()
            .ok_or(RegistryError::MissingName(to))?;
        table[from.index()] = Some(to);
    }
    Ok(table)
}

/// Builds the `(inverse, reflex)` arrays for a registry of `len` ids.
pub(crate) fn resolve(
    by_name: &HashMap<crate::String, Opcode>,
    len: usize,
) -> Result<(Table, Table), RegistryError> {
    Ok((dense(INVERSE, by_name, len)?, dense(REFLEX, by_name, len)?))
}

/// The opcode computing the logical negation of `op`, if `op` is a comparison.
pub fn boolinverse(op: Opcode) -> Option<Opcode> {
    registry().bool_inverse(op)
}

/// The opcode computing `op` with its two operands swapped.
pub fn boolreflex(op: Opcode) -> Option<Opcode> {
    registry().bool_reflex(op)
}
