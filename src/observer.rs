//! Key-prefix change observers.
//!
//! Callbacks are registered against a key-path prefix and fired
//! synchronously after a successful `set`, in registration order.

use crate::value::Value;
use std::collections::BTreeMap;

/// Callback invoked with `(action, path, value)` after a matching write.
pub type ObserverCallback = Box<dyn FnMut(&str, &str, &Value)>;

/// Identifies one subscription so it can be removed later.
///
/// Closures have no identity of their own, so `subscribe` hands out a
/// handle instead of removing by callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserverHandle(u64);

#[derive(Default)]
pub struct ObserverBus {
    next_id: u64,
    observers: BTreeMap<String, Vec<(ObserverHandle, ObserverCallback)>>,
}

impl ObserverBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` under `prefix` and return its handle.
    pub fn subscribe<F>(&mut self, prefix: impl Into<String>, callback: F) -> ObserverHandle
    where
        F: FnMut(&str, &str, &Value) + 'static,
    {
        let handle = ObserverHandle(self.next_id);
        self.next_id += 1;
        self.observers
            .entry(prefix.into())
            .or_default()
            .push((handle, Box::new(callback)));
        handle
    }

    /// Remove the subscription identified by `handle` under `prefix`.
    ///
    /// Returns whether anything was removed. Removing the last callback
    /// for a prefix drops the prefix entry entirely.
    pub fn unsubscribe(&mut self, prefix: &str, handle: ObserverHandle) -> bool {
        let Some(callbacks) = self.observers.get_mut(prefix) else {
            return false;
        };
        let before = callbacks.len();
        callbacks.retain(|(h, _)| *h != handle);
        let removed = callbacks.len() < before;
        if callbacks.is_empty() {
            self.observers.remove(prefix);
        }
        removed
    }

    /// Number of prefixes with at least one registered callback.
    pub fn prefix_count(&self) -> usize {
        self.observers.len()
    }

    /// Invoke every callback whose prefix is a literal string prefix of
    /// `path`, in registration order.
    ///
    /// Matching is not segment-aware: a subscription on `use` fires for
    /// `user/1`.
    pub fn notify(&mut self, action: &str, path: &str, value: &Value) {
        for (prefix, callbacks) in self.observers.iter_mut() {
            if path.starts_with(prefix.as_str()) {
                for (_, callback) in callbacks.iter_mut() {
                    callback(action, path, value);
                }
            }
        }
    }
}
