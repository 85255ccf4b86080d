//! Compensating actions for partially-completed container creation.
//!
//! Each completed step of `create` pushes a named undo action. If a later
//! step fails, the stack unwinds in reverse order, best-effort: a failing
//! undo is logged and the remaining undos still run. A fully successful
//! creation disarms the stack.

use crate::error::RuntimeError;

type UndoFn = Box<dyn FnOnce() -> Result<(), RuntimeError>>;

/// A stack of compensating actions, unwound in reverse on drop unless
/// disarmed.
pub struct Rollback {
    actions: Vec<(&'static str, UndoFn)>,
    armed: bool,
}

impl Default for Rollback {
    fn default() -> Self {
        Self::new()
    }
}

impl Rollback {
    /// Creates an empty, armed stack.
    #[must_use]
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
            armed: true,
        }
    }

    /// Registers the undo action for a step that just completed.
    pub fn push<F>(&mut self, step: &'static str, undo: F)
    where
        F: FnOnce() -> Result<(), RuntimeError> + 'static,
    {
        self.actions.push((step, Box::new(undo)));
    }

    /// Marks the operation as fully successful; no undos will run.
    pub fn disarm(&mut self) {
        self.armed = false;
    }

    /// Runs all registered undos in reverse order, logging failures.
    fn unwind(&mut self) {
        while let Some((step, undo)) = self.actions.pop() {
            tracing::warn!(step, "rolling back");
            if let Err(e) = undo() {
                tracing::warn!(step, error = %e, "rollback step failed");
            }
        }
    }
}

impl Drop for Rollback {
    fn drop(&mut self) {
        if self.armed {
            self.unwind();
        }
    }
}
