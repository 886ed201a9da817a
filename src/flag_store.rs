//! A thread-safe in-memory storage for the flag values of one environment. [`FlagStore`] provides
//! concurrent access for readers (evaluations) and writers (whatever component acquires flag data).
use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use crate::{EvaluationReason, FlagValue};

/// Flag values keyed by flag key.
pub type FlagSnapshot = HashMap<String, FeatureFlag>;

/// An already-evaluated feature flag as received from the flag delivery service.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureFlag {
    /// Value served for this flag.
    pub value: FlagValue,
    /// Index of the served variation.
    pub variation: Option<i64>,
    /// Version of the flag data, logged with every evaluation served from this flag.
    pub version: Option<u64>,
    /// Reason the value was served, when the service provides one.
    pub reason: Option<EvaluationReason>,
}

impl FeatureFlag {
    /// Create a flag serving `value` with no variation, version or reason information.
    pub fn new(value: impl Into<FlagValue>) -> FeatureFlag {
        FeatureFlag {
            value: value.into(),
            variation: None,
            version: None,
            reason: None,
        }
    }

    /// Set the variation index.
    pub fn with_variation(mut self, variation: i64) -> Self {
        self.variation = Some(variation);
        self
    }

    /// Set the flag version.
    pub fn with_version(mut self, version: u64) -> Self {
        self.version = Some(version);
        self
    }

    /// Set the evaluation reason.
    pub fn with_reason(mut self, reason: EvaluationReason) -> Self {
        self.reason = Some(reason);
        self
    }
}

/// `FlagStore` provides a thread-safe (`Sync`) storage for flag values that allows concurrent
/// access for readers and writers.
///
/// A snapshot is never modified, only replaced completely, so an evaluation that got a snapshot is
/// not affected by further writes.
#[derive(Debug, Default)]
pub struct FlagStore {
    flags: RwLock<Option<Arc<FlagSnapshot>>>,
}

impl FlagStore {
    /// Create a new empty flag store.
    pub fn new() -> Self {
        FlagStore::default()
    }

    /// Get the current snapshot. Returns `None` if flags haven't been stored yet.
    pub fn get_flags(&self) -> Option<Arc<FlagSnapshot>> {
        // self.flags.read() should always return Ok(). Err() is possible only if the lock is
        // poisoned (writer panicked while holding the lock), which should never happen.
        let flags = self
            .flags
            .read()
            .expect("thread holding flag store lock should not panic");

        flags.clone()
    }

    /// Replace all flags.
    pub fn set_flags(&self, flags: FlagSnapshot) {
        // Constructing new value before requesting the lock to minimize lock span.
        let new_value = Some(Arc::new(flags));

        let mut slot = self
            .flags
            .write()
            .expect("thread holding flag store lock should not panic");

        *slot = new_value;
    }
}
