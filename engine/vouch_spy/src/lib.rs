//! Vouch Spy - call-recording test doubles.
//!
//! A spy records every invocation (receiver, arguments, return value and a
//! run-wide ordinal) and answers according to a pipeline of strategies.
//! Spies are created through a [`SpyRegistry`], which also installs them on
//! object methods and property accessors and restores the originals
//! afterwards.

mod calls;
mod registry;
mod spy;
mod strategy;

pub use calls::{CallRecord, CallTracker};
pub use registry::{AccessType, DefaultStrategy, SpyObjMembers, SpyRegistry};
pub use spy::{Spy, SpyStrategy};
pub use strategy::{Pipeline, Strategy};
