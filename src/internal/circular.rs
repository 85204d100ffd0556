//! Build-stack and depth guards.
//!
//! Every push onto one of the container's stacks is paired with a guard
//! whose `Drop` pops it, so an error propagating out of a constructor or
//! factory never leaves stale contextual scope behind.

use std::cell::{Cell, RefCell};

use crate::error::{DiError, DiResult};
use crate::key::Key;

/// Pops the pushed entry when dropped.
pub(crate) struct StackGuard<'a, T> {
    stack: &'a RefCell<Vec<T>>,
}

impl<'a, T> StackGuard<'a, T> {
    pub(crate) fn push(stack: &'a RefCell<Vec<T>>, entry: T) -> Self {
        stack.borrow_mut().push(entry);
        Self { stack }
    }
}

impl<T> Drop for StackGuard<'_, T> {
    fn drop(&mut self) {
        let popped = self.stack.borrow_mut().pop();
        debug_assert!(popped.is_some(), "stack guard popped an empty stack");
    }
}

/// Enters `key` onto the build stack, failing if it is already being built.
pub(crate) fn enter_build<'a>(
    stack: &'a RefCell<Vec<Key>>,
    key: &Key,
    detect_cycles: bool,
) -> DiResult<StackGuard<'a, Key>> {
    if detect_cycles {
        let current = stack.borrow();
        if let Some(start) = current.iter().position(|k| k == key) {
            let mut path: Vec<String> = current[start..].iter().map(Key::to_string).collect();
            path.push(key.to_string());
            return Err(DiError::circular(path));
        }
    }
    Ok(StackGuard::push(stack, key.clone()))
}

/// Counts nested resolutions against a hard limit.
pub(crate) struct DepthGuard<'a> {
    depth: &'a Cell<usize>,
}

impl<'a> DepthGuard<'a> {
    pub(crate) fn enter(depth: &'a Cell<usize>, max_depth: usize) -> DiResult<Self> {
        let current = depth.get();
        if current >= max_depth {
            return Err(DiError::DepthExceeded(current).logged());
        }
        depth.set(current + 1);
        Ok(Self { depth })
    }
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }
}
