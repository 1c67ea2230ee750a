// Copyright (c) 2025 - Cowboy AI, Inc.
//! Batch Phase Results
//!
//! Provisioning phases operate over many items (services, folders) and
//! tolerate per-item failure: one bad service must not block the rest of a
//! large batch. Partial failure is a first-class, inspectable outcome
//! carried in [`BatchResult`] rather than an implicit log side effect.

use crate::platform::PlatformError;

/// Outcome of a batch phase over items of type `T`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResult<T> {
    succeeded: Vec<T>,
    failed: Vec<(T, PlatformError)>,
}

impl<T> BatchResult<T> {
    /// Create an empty result
    pub fn new() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }

    /// Record a successfully processed item
    pub fn record_success(&mut self, item: T) {
        self.succeeded.push(item);
    }

    /// Record an item that was skipped after a failure
    pub fn record_failure(&mut self, item: T, error: PlatformError) {
        self.failed.push((item, error));
    }

    /// Items that completed the phase
    pub fn succeeded(&self) -> &[T] {
        &self.succeeded
    }

    /// Items that were skipped, with the failure that caused the skip
    pub fn failed(&self) -> &[(T, PlatformError)] {
        &self.failed
    }

    /// True when every item completed
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Total number of items processed
    pub fn len(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// True when no items were processed
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
