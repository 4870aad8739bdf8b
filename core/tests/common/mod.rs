//! Descriptors shared by the integration tests.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use traceir_core::{CloneMemo, Descr, DescrRef, ResultType};

/// A descr whose behavior is fixed at construction.
#[derive(Clone)]
pub struct MockDescr {
    pub name: &'static str,
    pub result: ResultType,
    pub is_final: bool,
}

impl fmt::Debug for MockDescr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.name)
    }
}

impl Descr for MockDescr {
    fn result_type(&self) -> ResultType {
        self.result
    }

    fn is_final(&self) -> bool {
        self.is_final
    }

    fn clone_if_mutable(self: Arc<Self>, _memo: &CloneMemo) -> DescrRef {
        self
    }
}

/// Attached to the trace-ending FINISH.
pub static DONE: Lazy<DescrRef> = Lazy::new(|| {
    Arc::new(MockDescr {
        name: "done",
        result: ResultType::Void,
        is_final: true,
    })
});

/// Attached to guards.
pub static RESUME: Lazy<DescrRef> = Lazy::new(|| {
    Arc::new(MockDescr {
        name: "resume",
        result: ResultType::Void,
        is_final: false,
    })
});

/// An integer-returning helper call.
pub static HELPER: Lazy<DescrRef> = Lazy::new(|| {
    Arc::new(MockDescr {
        name: "helper",
        result: ResultType::Int,
        is_final: false,
    })
});
