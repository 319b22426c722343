//! Transition hooks
//!
//! Hooks fire while the breaker's lock is held, so they should stay
//! cheap and must not call back into the breaker. A panicking hook is
//! caught and logged rather than unwinding through a record or acquire
//! call.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// Type alias for transition hook functions
pub type Hook = Arc<dyn Fn(&str) + Send + Sync>;

/// Optional hooks invoked on state transitions
#[derive(Clone, Default)]
pub struct Callbacks {
    pub(crate) on_open: Option<Hook>,
    pub(crate) on_close: Option<Hook>,
    pub(crate) on_half_open: Option<Hook>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn opened(&self, circuit: &str) {
        Self::fire(&self.on_open, circuit);
    }

    pub(crate) fn closed(&self, circuit: &str) {
        Self::fire(&self.on_close, circuit);
    }

    pub(crate) fn half_opened(&self, circuit: &str) {
        Self::fire(&self.on_half_open, circuit);
    }

    fn fire(hook: &Option<Hook>, circuit: &str) {
        if let Some(hook) = hook {
            let hook = AssertUnwindSafe(hook);
            if catch_unwind(|| hook(circuit)).is_err() {
                tracing::error!(circuit, "transition hook panicked");
            }
        }
    }
}

impl std::fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_open", &self.on_open.is_some())
            .field("on_close", &self.on_close.is_some())
            .field("on_half_open", &self.on_half_open.is_some())
            .finish()
    }
}
