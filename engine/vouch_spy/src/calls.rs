//! Invocation history of a spy.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use vouch_value::Value;

/// One recorded invocation.
#[derive(Clone, Debug)]
pub struct CallRecord {
    /// Receiver the spy was invoked on.
    pub receiver: Value,
    pub args: Vec<Value>,
    /// Filled once the strategy returns; stays `undefined` when it throws.
    pub return_value: Value,
    /// Position among all spy invocations of the run.
    pub invocation_order: u64,
}

/// Insertion-ordered call records.
#[derive(Debug, Default)]
pub struct CallTracker {
    records: Mutex<Vec<CallRecord>>,
    by_value: AtomicBool,
}

impl CallTracker {
    /// Append a record and return its index.
    pub(crate) fn track(&self, receiver: &Value, args: &[Value], invocation_order: u64) -> usize {
        let (receiver, args) = if self.by_value.load(Ordering::Relaxed) {
            (
                receiver.deep_copy(),
                args.iter().map(Value::deep_copy).collect(),
            )
        } else {
            (receiver.clone(), args.to_vec())
        };
        let mut records = self.records.lock();
        records.push(CallRecord {
            receiver,
            args,
            return_value: Value::Undefined,
            invocation_order,
        });
        records.len() - 1
    }

    pub(crate) fn set_return_value(&self, index: usize, value: Value) {
        if let Some(record) = self.records.lock().get_mut(index) {
            record.return_value = value;
        }
    }

    pub fn count(&self) -> usize {
        self.records.lock().len()
    }

    pub fn any(&self) -> bool {
        self.count() > 0
    }

    /// Arguments of the `index`-th call; empty when out of range.
    pub fn args_for(&self, index: usize) -> Vec<Value> {
        self.records
            .lock()
            .get(index)
            .map(|r| r.args.clone())
            .unwrap_or_default()
    }

    /// Receiver of the `index`-th call; `undefined` when out of range.
    pub fn this_for(&self, index: usize) -> Value {
        self.records
            .lock()
            .get(index)
            .map_or(Value::Undefined, |r| r.receiver.clone())
    }

    pub fn all_args(&self) -> Vec<Vec<Value>> {
        self.records.lock().iter().map(|r| r.args.clone()).collect()
    }

    pub fn all(&self) -> Vec<CallRecord> {
        self.records.lock().clone()
    }

    pub fn first(&self) -> Option<CallRecord> {
        self.records.lock().first().cloned()
    }

    pub fn most_recent(&self) -> Option<CallRecord> {
        self.records.lock().last().cloned()
    }

    /// Forget every call; configuration is untouched.
    pub fn reset(&self) {
        self.records.lock().clear();
    }

    /// Deep-copy arguments (and receiver) of subsequent calls.
    pub fn save_arguments_by_value(&self) {
        self.by_value.store(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
