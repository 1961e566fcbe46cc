//! Evaluation stack
//!
//! A growable stack of booleans that an [`Evaluator`](crate::Evaluator) keeps
//! for its whole lifetime and reuses across evaluations. Storage is allocated
//! lazily, a fixed increment at a time, and is kept when the stack is reset so
//! later evaluations do not reallocate.

use alloc::vec::Vec;

use crate::error::DepexError;

/// Number of entries the stack grows by, as in the reference dispatcher
pub const DEPEX_STACK_SIZE_INCREMENT: usize = 0x100;

/// Boolean evaluation stack
#[derive(Debug)]
pub struct DepexStack {
    values: Vec<bool>,
    increment: usize,
}

impl DepexStack {
    /// Create an empty stack; nothing is allocated until the first push
    pub fn new() -> Self {
        Self::with_increment(DEPEX_STACK_SIZE_INCREMENT)
    }

    /// Create an empty stack that grows by `increment` entries at a time
    pub fn with_increment(increment: usize) -> Self {
        Self {
            values: Vec::new(),
            increment: increment.max(1),
        }
    }

    /// Push a value, growing the storage if it is full
    pub fn push(&mut self, value: bool) -> Result<(), DepexError> {
        if self.values.len() == self.values.capacity() {
            self.grow()?;
        }
        self.values.push(value);
        Ok(())
    }

    /// Pop the top value; `None` on an empty stack
    pub fn pop(&mut self) -> Option<bool> {
        self.values.pop()
    }

    /// Drop every entry, keeping the storage
    pub fn reset(&mut self) {
        self.values.clear();
    }

    /// Number of values on the stack
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the stack is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Allocated capacity in entries
    pub fn capacity(&self) -> usize {
        self.values.capacity()
    }

    fn grow(&mut self) -> Result<(), DepexError> {
        self.values
            .try_reserve_exact(self.increment)
            .map_err(|_| DepexError::OutOfResources)
    }
}

impl Default for DepexStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lazy_allocation() {
        let stack = DepexStack::new();
        assert_eq!(stack.capacity(), 0);
        assert!(stack.is_empty());
    }

    #[test]
    fn test_push_pop_order() {
        let mut stack = DepexStack::new();
        stack.push(true).unwrap();
        stack.push(false).unwrap();
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.pop(), Some(false));
        assert_eq!(stack.pop(), Some(true));
        assert_eq!(stack.pop(), None);
    }

    #[test]
    fn test_grows_by_increment() {
        let mut stack = DepexStack::with_increment(4);
        for i in 0..4 {
            stack.push(i % 2 == 0).unwrap();
        }
        let first = stack.capacity();
        assert!(first >= 4);

        for _ in 0..first {
            stack.push(true).unwrap();
        }
        assert!(stack.capacity() > first);

        // Contents survive growth.
        let len = stack.len();
        for _ in 0..len - 4 {
            stack.pop();
        }
        assert_eq!(stack.pop(), Some(false));
        assert_eq!(stack.pop(), Some(true));
    }

    #[test]
    fn test_reset_keeps_storage() {
        let mut stack = DepexStack::with_increment(8);
        stack.push(true).unwrap();
        let capacity = stack.capacity();
        stack.reset();
        assert!(stack.is_empty());
        assert_eq!(stack.capacity(), capacity);
    }

    #[test]
    fn test_failed_growth_is_an_error() {
        let mut stack = DepexStack::with_increment(usize::MAX);
        assert_eq!(stack.push(true), Err(DepexError::OutOfResources));
        assert!(stack.is_empty());
        assert_eq!(stack.capacity(), 0);
    }

    #[test]
    fn test_zero_increment_still_grows() {
        let mut stack = DepexStack::with_increment(0);
        stack.push(true).unwrap();
        assert_eq!(stack.pop(), Some(true));
    }
}
