//! Diagnostic reporting.
//!
//! Recoverable errors are handed to a [`DiagnosticSink`] so one run can
//! surface every problem in a function; fatal ones abort the pass and come
//! back as `Err`.

use core::fmt;

use crate::error::{AsmError, Severity};

/// One reported problem, tied to the instruction that caused it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostic {
    pub error: AsmError,
    /// Program counter of the offending instruction at the time of report.
    pub pc: u32,
    /// Textual form of the offending instruction.
    pub inst: String,
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        self.error.severity()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}", self.error, self.inst)
    }
}

/// Receives diagnostics as layout and encoding discover them.
pub trait DiagnosticSink {
    fn report(&mut self, diag: Diagnostic);
}

/// Keeps every diagnostic in report order.
#[derive(Debug, Default, Clone)]
pub struct CollectingSink {
    diags: Vec<Diagnostic>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diags
    }

    pub fn is_empty(&self) -> bool {
        self.diags.is_empty()
    }

    /// Fold the collected diagnostics into one error, if there were any.
    pub fn into_error(mut self) -> Option<AsmError> {
        match self.diags.len() {
            0 => None,
            1 => Some(self.diags.remove(0).error),
            _ => Some(AsmError::Multiple {
                errors: self.diags.into_iter().map(|d| d.error).collect(),
            }),
        }
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&mut self, diag: Diagnostic) {
        self.diags.push(diag);
    }
}

/// Forwards diagnostics to `tracing`, at `warn` for recoverable errors and
/// `error` for fatal ones. Keeps a count so callers can still tell whether
/// the output is usable.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink {
    count: usize,
}

impl TracingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of diagnostics forwarded so far.
    pub fn count(&self) -> usize {
        self.count
    }
}

impl DiagnosticSink for TracingSink {
    fn report(&mut self, diag: Diagnostic) {
        self.count += 1;
        match diag.severity() {
            Severity::Recoverable => {
                tracing::warn!(pc = diag.pc, inst = %diag.inst, "{}", diag.error);
            }
            Severity::Fatal => {
                tracing::error!(pc = diag.pc, inst = %diag.inst, "{}", diag.error);
            }
        }
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn report(&mut self, diag: Diagnostic) {
        (**self).report(diag);
    }
}
