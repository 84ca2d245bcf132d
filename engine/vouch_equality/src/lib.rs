//! Vouch Equality - the equality and diff engine.
//!
//! This crate provides:
//! - `MatchersUtil`: deep equality with custom testers, membership, and
//!   failure-message building shared by every matcher
//! - `DiffBuilder` / `ObjectPath`: path-tracking mismatch messages (`$.x[0]`)
//! - Built-in asymmetric matchers (`any`, `object_containing`, ...)
//!
//! # Comparison Order
//!
//! For each pair of values, custom testers are consulted first (first
//! definite answer wins), then asymmetric matchers on either side, then
//! structural comparison.

pub mod asymmetric;
mod diff;
mod eq;
mod util;

pub use asymmetric::TypeTag;
pub use diff::{DiffBuilder, MismatchFormatter, ObjectPath, PathComponent};
pub use util::{CustomEqualityTester, MatchersUtil};
