//! Vouch Matchers - the matcher engine.
//!
//! This crate provides:
//! - The `Matcher` trait and the closed set of built-in matchers
//! - `MatcherRegistry`: name lookup, with custom matchers layered on top
//! - `Evaluator` / `Expectation`: polarity handling, message templates and
//!   the reporter-facing result log
//!
//! # Usage
//!
//! ```text
//! let evaluator = Evaluator::default();
//! let result = evaluator.expect(vec![1.into(), 2.into()]).to_contain(2);
//! assert!(result.pass);
//! ```

pub mod builtins;
mod evaluate;
mod expectation;
mod matcher;
mod registry;
mod result;

pub use evaluate::{apply_matcher, arity_message, panic_message, Evaluator};
pub use expectation::Expectation;
pub use matcher::{CustomMatcher, Matcher, MatcherFactory};
pub use registry::{MatcherRef, MatcherRegistry};
pub use result::{ExpectationResult, MatcherResult, PASSED};
