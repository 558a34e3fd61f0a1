//! Fixed-capacity operand stack.
//!
//! Capacity is a compile-time constant, so a stack never grows and a runaway
//! script hits the limit deterministically. Overflow and underflow are bugs in
//! the bytecode (or the VM), not recoverable conditions: both panic.

use std::sync::Arc;

use arrayvec::ArrayVec;

use super::value::SheepValue;

pub const DEFAULT_STACK_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
pub struct SheepStack<const N: usize = DEFAULT_STACK_CAPACITY> {
    values: ArrayVec<SheepValue, N>,
}

impl<const N: usize> Default for SheepStack<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> SheepStack<N> {
    pub fn new() -> Self {
        Self {
            values: ArrayVec::new(),
        }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Drop every value, ready for an unrelated execution.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// # Panics
    ///
    /// Panics if the stack is already at capacity.
    pub fn push(&mut self, value: SheepValue) {
        if self.values.try_push(value).is_err() {
            panic!("Sheep stack overflow: capacity {} exceeded", N);
        }
    }

    pub fn push_int(&mut self, value: i32) {
        self.push(SheepValue::Int(value));
    }

    pub fn push_float(&mut self, value: f32) {
        self.push(SheepValue::Float(value));
    }

    pub fn push_string_offset(&mut self, offset: u32) {
        self.push(SheepValue::StringOffset(offset));
    }

    pub fn push_string(&mut self, value: impl Into<Arc<str>>) {
        self.push(SheepValue::String(value.into()));
    }

    /// Remove and return the top value.
    ///
    /// # Panics
    ///
    /// Panics if the stack is empty.
    pub fn pop(&mut self) -> SheepValue {
        match self.values.pop() {
            Some(value) => value,
            None => panic!("Sheep stack underflow: pop on empty stack"),
        }
    }

    /// Discard the top `count` values without reading them.
    ///
    /// # Panics
    ///
    /// Panics if fewer than `count` values are on the stack.
    pub fn pop_n(&mut self, count: usize) {
        let len = self.values.len();
        if count > len {
            panic!(
                "Sheep stack underflow: discarding {} values with {} on the stack",
                count, len
            );
        }
        self.values.truncate(len - count);
    }
}
