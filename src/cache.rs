//! Build-once cache of compiled operations.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use crate::error::CompileError;
use crate::operation::CompiledOperation;

/// Cache key: path template and lowercase method.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationKey {
    pub template: String,
    pub method: String,
}

impl OperationKey {
    pub fn new(template: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            method: method.into().to_lowercase(),
        }
    }
}

type Slot = Arc<OnceLock<Result<Arc<CompiledOperation>, CompileError>>>;

/// Concurrency-safe compute-if-absent map of compiled operations.
///
/// The map lock is held only long enough to fetch a key's slot. The build
/// runs inside the slot's `OnceLock`, so distinct keys compile in parallel
/// while concurrent callers for the same key wait for, and share, a single
/// result. Failed builds are cached too: compilation is deterministic.
///
/// A cache belongs to one specification and configuration; share it only
/// between validators built from the same pair.
#[derive(Debug, Default)]
pub struct OperationCache {
    slots: Mutex<HashMap<OperationKey, Slot>>,
}

impl OperationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the compiled operation for `key`, building it on first use.
    ///
    /// # Errors
    ///
    /// Returns the `CompileError` produced by the (single) build.
    pub fn get_or_build<F>(&self, key: OperationKey, build: F) -> Result<Arc<CompiledOperation>, CompileError>
    where
        F: FnOnce() -> Result<CompiledOperation, CompileError>,
    {
        let slot = {
            let mut slots = self.slots.lock();
            Arc::clone(slots.entry(key).or_default())
        };
        slot.get_or_init(|| build().map(Arc::new)).clone()
    }

    /// A previously built operation, if any.
    pub fn get(&self, key: &OperationKey) -> Option<Arc<CompiledOperation>> {
        let slot = self.slots.lock().get(key).cloned()?;
        slot.get().and_then(|built| built.as_ref().ok().cloned())
    }

    /// Number of keys with a finished build (successful or not).
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .values()
            .filter(|slot| slot.get().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
