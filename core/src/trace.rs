//! The trace arena.
//!
//! A [`Trace`] owns its input arguments and operations; everything else refers
//! to them through [`OpRef`] handles. Duplicating a trace, naming results for
//! printouts and freezing all work at this level, keyed on handles.

use core::fmt;

use hashbrown::HashMap;

use crate::descr::DescrRef;
use crate::error::IrError;
use crate::operation::Operation;
use crate::opref::{InputArg, InputId, OpId, OpRef};
use crate::options::IrOptions;
use crate::registry::Opcode;
use crate::value::{GcRef, ResultType, Value};
use crate::{String, ToString, Vec, format};

/// Mapping from original handles to their copies, filled while duplicating.
#[derive(Debug, Clone, Default)]
pub struct CloneMemo {
    map: HashMap<OpRef, OpRef>,
}

impl CloneMemo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, original: OpRef) -> Option<OpRef> {
        self.map.get(&original).copied()
    }

    /// The copy of `original`, or `original` itself if it was never copied.
    pub fn get_or(&self, original: OpRef) -> OpRef {
        self.get(original).unwrap_or(original)
    }

    pub fn set(&mut self, original: OpRef, copy: OpRef) {
        self.map.insert(original, copy);
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Result names handed out while printing a trace.
///
/// The first time a handle is printed it gets its type character followed by
/// the number of names handed out so far, so names are unique per memo.
#[derive(Debug, Clone, Default)]
pub struct NamingMemo {
    names: HashMap<OpRef, String>,
}

impl NamingMemo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(&mut self, r: OpRef, tp: ResultType) -> String {
        let next = self.names.len();
        self.names
            .entry(r)
            .or_insert_with(|| format!("{}{}", tp.as_char(), next))
            .clone()
    }

    /// How `r` appears as an operand: constants by value, everything else by
    /// name. A handle that does not belong to `trace` prints as `?` followed
    /// by its raw index, e.g. `?op7`.
    pub fn repr_short(&mut self, r: OpRef, trace: &Trace) -> String {
        match r {
            OpRef::Const(c) => c.to_string(),
            _ => match trace.try_type_of(r) {
                Some(tp) => self.name(r, tp),
                None => format!("?{:?}", r),
            },
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Source position of an operation: the jitcode name and bytecode offset it
/// was traced from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugLoc {
    pub name: String,
    pub pc: u32,
}

#[derive(Debug, Clone, Default)]
pub struct Trace {
    options: IrOptions,
    inputs: Vec<InputArg>,
    ops: Vec<Operation>,
    frozen: bool,
    #[cfg(feature = "debug-info")]
    debug_locs: HashMap<OpRef, DebugLoc>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: IrOptions) -> Self {
        Trace {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &IrOptions {
        &self.options
    }

    // ------------------------------------------------------------------------
    // Input arguments
    // ------------------------------------------------------------------------

    /// Adds an input argument carrying `value`. Inputs cannot be void.
    pub fn input(&mut self, value: Value) -> Result<OpRef, IrError> {
        if value.result_type().is_void() {
            return Err(IrError::VoidInput);
        }
        Ok(self.push_input(value))
    }

    pub fn input_int(&mut self, value: i64) -> OpRef {
        self.push_input(Value::Int(value))
    }

    pub fn input_float(&mut self, value: f64) -> OpRef {
        self.push_input(Value::Float(value))
    }

    pub fn input_ref(&mut self, value: GcRef) -> OpRef {
        self.push_input(Value::Ref(value))
    }

    fn push_input(&mut self, value: Value) -> OpRef {
        let id = InputId::new(self.inputs.len());
        self.inputs.push(InputArg::new(value));
        OpRef::Input(id)
    }

    pub fn inputs(&self) -> &[InputArg] {
        &self.inputs
    }

    pub fn input_refs(&self) -> impl Iterator<Item = OpRef> + '_ {
        (0..self.inputs.len()).map(|i| OpRef::Input(InputId::new(i)))
    }

    pub fn input_arg(&self, id: InputId) -> &InputArg {
        &self.inputs[id.index()]
    }

    pub fn input_arg_mut(&mut self, id: InputId) -> &mut InputArg {
        &mut self.inputs[id.index()]
    }

    // ------------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------------

    /// Creates an operation and appends it.
    pub fn record(
        &mut self,
        opcode: Opcode,
        args: &[OpRef],
        descr: Option<DescrRef>,
    ) -> Result<OpRef, IrError> {
        let op = Operation::create(opcode, args, descr)?;
        self.push(op)
    }

    /// Appends an already built operation.
    pub fn push(&mut self, mut op: Operation) -> Result<OpRef, IrError> {
        if self.frozen {
            return Err(IrError::Frozen {
                opcode: op.opcode(),
            });
        }
        let id = OpId::new(self.ops.len());
        tracing::trace!(op = ?id, opcode = ?op.opcode(), "record");
        op.thaw();
        self.ops.push(op);
        Ok(OpRef::Op(id))
    }

    /// # Panics
    ///
    /// If `id` was not handed out by this trace. See [`Trace::get`].
    pub fn op(&self, id: OpId) -> &Operation {
        &self.ops[id.index()]
    }

    pub fn op_mut(&mut self, id: OpId) -> &mut Operation {
        &mut self.ops[id.index()]
    }

    /// The operation behind `r`, if it is one.
    pub fn get(&self, r: OpRef) -> Option<&Operation> {
        r.as_op().and_then(|id| self.ops.get(id.index()))
    }

    pub fn ops(&self) -> impl Iterator<Item = (OpId, &Operation)> + '_ {
        self.ops
            .iter()
            .enumerate()
            .map(|(i, op)| (OpId::new(i), op))
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// # Panics
    ///
    /// If `r` refers to an input or operation of another trace.
    pub fn value_of(&self, r: OpRef) -> Value {
        match r {
            OpRef::Input(id) => self.input_arg(id).value(),
            OpRef::Op(id) => self.op(id).value(),
            OpRef::Const(c) => c.value(),
        }
    }

    /// # Panics
    ///
    /// If `r` refers to an input or operation of another trace. See
    /// [`Trace::try_type_of`].
    pub fn type_of(&self, r: OpRef) -> ResultType {
        match r {
            OpRef::Input(id) => self.input_arg(id).result_type(),
            OpRef::Op(id) => self.op(id).result_type(),
            OpRef::Const(c) => c.result_type(),
        }
    }

    /// Like [`Trace::type_of`], but `None` for handles this trace never
    /// handed out.
    pub fn try_type_of(&self, r: OpRef) -> Option<ResultType> {
        match r {
            OpRef::Input(id) => self.inputs.get(id.index()).map(InputArg::result_type),
            OpRef::Op(id) => self.ops.get(id.index()).map(Operation::result_type),
            OpRef::Const(c) => Some(c.result_type()),
        }
    }

    // ------------------------------------------------------------------------
    // Debug info
    // ------------------------------------------------------------------------

    /// Records where `r` was traced from. Dropped unless debug info is
    /// enabled in the options.
    #[cfg(feature = "debug-info")]
    pub fn set_debug_loc(&mut self, r: OpRef, name: &str, pc: u32) {
        if !self.options.debug_info {
            return;
        }
        let loc = DebugLoc {
            name: name.to_string(),
            pc,
        };
        self.debug_locs.insert(r, loc);
    }

    #[cfg(not(feature = "debug-info"))]
    pub fn set_debug_loc(&mut self, _r: OpRef, _name: &str, _pc: u32) {}

    #[cfg(feature = "debug-info")]
    pub fn debug_loc(&self, r: OpRef) -> Option<&DebugLoc> {
        self.debug_locs.get(&r)
    }

    #[cfg(not(feature = "debug-info"))]
    pub fn debug_loc(&self, _r: OpRef) -> Option<&DebugLoc> {
        None
    }

    // ------------------------------------------------------------------------
    // Duplication
    // ------------------------------------------------------------------------

    /// Appends a copy of operation `id` to this trace and records the copy in
    /// `memo`.
    pub fn clone_op(&mut self, id: OpId, memo: &mut CloneMemo) -> Result<OpRef, IrError> {
        let copy = self.op(id).clone_with(memo)?;
        let new_ref = self.push(copy)?;
        let original = OpRef::Op(id);
        if let Some(loc) = self.debug_loc(original).cloned() {
            self.set_debug_loc(new_ref, &loc.name, loc.pc);
        }
        memo.set(original, new_ref);
        Ok(new_ref)
    }

    /// Copies the whole trace. The copy is never frozen.
    ///
    /// Returns the memo mapping every original handle to its copy, so callers
    /// holding handles into `self` can find their counterparts.
    pub fn duplicate(&self) -> Result<(Trace, CloneMemo), IrError> {
        let mut memo = CloneMemo::new();
        let mut copy = Trace::with_options(self.options);
        for (original, input) in self.input_refs().zip(&self.inputs) {
            let new_ref = copy.push_input(input.value());
            memo.set(original, new_ref);
            copy.copy_debug_loc(self, original, new_ref);
        }
        for (id, op) in self.ops() {
            let original = OpRef::Op(id);
            let new_ref = copy.push(op.clone_with(&memo)?)?;
            memo.set(original, new_ref);
            copy.copy_debug_loc(self, original, new_ref);
        }
        tracing::trace!(inputs = self.inputs.len(), ops = self.ops.len(), "duplicated trace");
        Ok((copy, memo))
    }

    fn copy_debug_loc(&mut self, from: &Trace, original: OpRef, copy: OpRef) {
        if let Some(loc) = from.debug_loc(original) {
            self.set_debug_loc(copy, &loc.name, loc.pc);
        }
    }

    // ------------------------------------------------------------------------
    // Freezing
    // ------------------------------------------------------------------------

    /// Marks the trace as handed to the backend.
    ///
    /// With `check_frozen` set, every operation rejects further operand and
    /// descr changes and nothing more can be appended. Otherwise this does
    /// nothing.
    pub fn freeze(&mut self) {
        if !self.options.check_frozen {
            return;
        }
        tracing::debug!(ops = self.ops.len(), "freezing trace");
        for op in &mut self.ops {
            op.freeze();
        }
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    // ------------------------------------------------------------------------
    // Printing
    // ------------------------------------------------------------------------

    pub fn format_op(&self, id: OpId, memo: &mut NamingMemo, dim: bool) -> String {
        self.op(id).format(OpRef::Op(id), self, memo, dim)
    }

    /// The input argument list, e.g. `[i0, r1]`.
    pub fn format_inputs(&self, memo: &mut NamingMemo) -> String {
        let names: Vec<String> = self
            .input_refs()
            .map(|r| memo.repr_short(r, self))
            .collect();
        format!("[{}]", names.join(", "))
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut memo = NamingMemo::new();
        writeln!(f, "{}", self.format_inputs(&mut memo))?;
        for (id, _) in self.ops() {
            writeln!(f, "{}", self.format_op(id, &mut memo, false))?;
        }
        Ok(())
    }
}
