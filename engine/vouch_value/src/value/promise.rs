//! Promise-like settlement cells.
//!
//! A `Promise` starts `Pending` and settles at most once, either resolved with
//! a value or rejected with a reason. Futures waiting on it register a
//! `Waker`; every registered waker is woken when the promise settles.

use std::fmt;
use std::task::{Context, Poll, Waker};

use super::heap::Shared;
use super::Value;

/// Settlement state of a promise.
#[derive(Clone, Debug)]
pub enum Settlement {
    /// Not settled yet.
    Pending,
    /// Resolved with a value.
    Resolved(Value),
    /// Rejected with a reason.
    Rejected(Value),
}

impl Settlement {
    pub fn is_pending(&self) -> bool {
        matches!(self, Settlement::Pending)
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Settlement::Resolved(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Settlement::Rejected(_))
    }
}

struct PromiseState {
    settlement: Settlement,
    wakers: Vec<Waker>,
}

/// Shared handle to a settlement cell.
#[derive(Clone)]
pub struct Promise(Shared<PromiseState>);

impl Promise {
    /// Create a pending promise.
    pub fn new() -> Self {
        Promise(Shared::new(PromiseState {
            settlement: Settlement::Pending,
            wakers: Vec::new(),
        }))
    }

    /// Create an already-resolved promise.
    pub fn resolved(value: Value) -> Self {
        let promise = Promise::new();
        promise.resolve(value);
        promise
    }

    /// Create an already-rejected promise.
    pub fn rejected(reason: Value) -> Self {
        let promise = Promise::new();
        promise.reject(reason);
        promise
    }

    /// Resolve the promise. Returns `false` if it had already settled.
    pub fn resolve(&self, value: Value) -> bool {
        self.settle(Settlement::Resolved(value))
    }

    /// Reject the promise. Returns `false` if it had already settled.
    pub fn reject(&self, reason: Value) -> bool {
        self.settle(Settlement::Rejected(reason))
    }

    fn settle(&self, settlement: Settlement) -> bool {
        let wakers = {
            let mut state = self.0.write();
            if !state.settlement.is_pending() {
                return false;
            }
            state.settlement = settlement;
            std::mem::take(&mut state.wakers)
        };
        tracing::trace!(wakers = wakers.len(), "promise settled");
        for waker in wakers {
            waker.wake();
        }
        true
    }

    /// Snapshot of the current settlement.
    pub fn settlement(&self) -> Settlement {
        self.0.read().settlement.clone()
    }

    pub fn is_pending(&self) -> bool {
        self.0.read().settlement.is_pending()
    }

    /// Poll for settlement, registering the task's waker while pending.
    pub fn poll_settled(&self, cx: &mut Context<'_>) -> Poll<Settlement> {
        let mut state = self.0.write();
        match &state.settlement {
            Settlement::Pending => {
                if !state.wakers.iter().any(|w| w.will_wake(cx.waker())) {
                    state.wakers.push(cx.waker().clone());
                }
                Poll::Pending
            }
            settled => Poll::Ready(settled.clone()),
        }
    }

    /// Identity comparison.
    #[inline]
    pub fn same(&self, other: &Promise) -> bool {
        Shared::ptr_eq(&self.0, &other.0)
    }
}

impl Default for Promise {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Promise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.0.read().settlement {
            Settlement::Pending => "pending",
            Settlement::Resolved(_) => "resolved",
            Settlement::Rejected(_) => "rejected",
        };
        write!(f, "Promise({state})")
    }
}
