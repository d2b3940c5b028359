//! Base-template binding and the staleness capability.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// How a message template relates to ambient process state.
///
/// A process-bound template mirrors process-wide state (superglobal-style
/// server variables, the output buffer) and therefore tracks whether it
/// has already serviced a simulated call. The flag is shared across
/// clones: consuming a clone through a `with_*` setter flips the flag the
/// retained template also reads, which is what makes the template
/// self-reporting.
#[derive(Clone, Debug)]
pub(crate) enum Binding {
    Plain,
    ProcessBound { stale: Arc<AtomicBool> },
}

impl Binding {
    /// Fresh process-bound binding.
    pub(crate) fn process_bound() -> Self {
        Binding::ProcessBound {
            stale: Arc::new(AtomicBool::new(false)),
        }
    }

    pub(crate) fn is_process_bound(&self) -> bool {
        matches!(self, Binding::ProcessBound { .. })
    }

    /// Plain templates have no staleness concept and always report fresh.
    pub(crate) fn is_stale(&self) -> bool {
        match self {
            Binding::Plain => false,
            Binding::ProcessBound { stale } => stale.load(Ordering::SeqCst),
        }
    }

    /// Record that the value carrying this binding was consumed by a
    /// `with_*` setter, and detach: every clone sharing the old flag now
    /// reports stale, while the derived value starts over fresh.
    pub(crate) fn consume(&mut self) {
        if let Binding::ProcessBound { stale } = self {
            stale.store(true, Ordering::SeqCst);
            *self = Binding::process_bound();
        }
    }

    /// Binding for a revived template: a fresh flag for process-bound,
    /// unchanged for plain.
    pub(crate) fn revived(&self) -> Self {
        match self {
            Binding::Plain => Binding::Plain,
            Binding::ProcessBound { .. } => Binding::process_bound(),
        }
    }
}

/// Staleness capability of base templates.
///
/// Plain templates carry no ambient coupling: they report not
/// process-bound, never stale, and `revive` is the identity.
pub trait Template: Sized {
    /// Whether this template mirrors process-wide state.
    fn is_process_bound(&self) -> bool;

    /// Whether this template has already serviced a simulated call.
    fn is_stale(&self) -> bool;

    /// Produce a fresh, non-stale template. Reviving an already-fresh
    /// template is an observable no-op.
    fn revive(&self) -> Self;
}
