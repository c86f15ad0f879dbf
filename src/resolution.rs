//! Cycle detection for in-flight resolutions.
//!
//! Each thread keeps the identifiers it is currently resolving, tagged with
//! the container they belong to. Concurrent resolutions on other threads are
//! never seen, and delegated lookups run on the delegate's own frames.

use crate::{DiError, Result};
use std::cell::RefCell;

thread_local! {
    static RESOLVING: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
}

struct Frame {
    container: u64,
    id: String,
}

/// Marks `id` as resolving until dropped.
///
/// Dropping pops the frame, on success and on failure alike.
#[must_use = "the identifier stops being tracked when the guard is dropped"]
pub(crate) struct ResolutionGuard {
    container: u64,
}

impl ResolutionGuard {
    /// Enter `id`, or fail with the cycle path if it is already on the path
    /// of this container.
    ///
    /// The path runs from the first occurrence of `id` to the re-entry.
    pub(crate) fn enter(container: u64, id: &str) -> Result<Self> {
        RESOLVING.with(|stack| {
            let mut stack = stack.borrow_mut();

            if let Some(start) = stack
                .iter()
                .position(|frame| frame.container == container && frame.id == id)
            {
                let mut path: Vec<String> = stack[start..]
                    .iter()
                    .filter(|frame| frame.container == container)
                    .map(|frame| frame.id.clone())
                    .collect();
                path.push(id.to_owned());
                return Err(DiError::circular(path));
            }

            stack.push(Frame {
                container,
                id: id.to_owned(),
            });
            Ok(Self { container })
        })
    }
}

impl Drop for ResolutionGuard {
    fn drop(&mut self) {
        RESOLVING.with(|stack| {
            let popped = stack.borrow_mut().pop();
            debug_assert!(popped.is_some_and(|frame| frame.container == self.container));
        });
    }
}

/// Identifiers this thread is resolving for `container`, outermost first
#[cfg(test)]
pub(crate) fn active(container: u64) -> Vec<String> {
    RESOLVING.with(|stack| {
        stack
            .borrow()
            .iter()
            .filter(|frame| frame.container == container)
            .map(|frame| frame.id.clone())
            .collect()
    })
}
