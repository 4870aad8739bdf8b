//! Configuration options for building and checking traces.

/// Options controlling development-time checks and printouts.
///
/// The defaults follow the build profile: debug builds arm every check,
/// release builds skip them.
///
/// # Example
///
/// ```
/// use traceir_core::IrOptions;
///
/// let options = IrOptions {
///     print_descrs: false,
///     ..IrOptions::debug()
/// };
/// assert!(options.check_frozen);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IrOptions {
    /// Make frozen operations reject `set_operand` and `set_descr`.
    ///
    /// When off, freezing a trace is a pass-through.
    pub check_frozen: bool,

    /// Include `descr=...` in trace printouts.
    pub print_descrs: bool,

    /// Record source names and positions in the debug side table.
    ///
    /// Has no effect when the `debug-info` feature is disabled.
    pub debug_info: bool,
}

impl IrOptions {
    /// Every check and printout enabled.
    pub const fn debug() -> Self {
        Self {
            check_frozen: true,
            print_descrs: true,
            debug_info: true,
        }
    }

    /// Fully optimized configuration: freezing is a pass-through, descrs are
    /// not printed and no debug names are kept.
    pub const fn production() -> Self {
        Self {
            check_frozen: false,
            print_descrs: false,
            debug_info: false,
        }
    }
}

impl Default for IrOptions {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::debug()
        } else {
            Self::production()
        }
    }
}
