//! Matcher registry for looking up matchers by name.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use vouch_equality::MatchersUtil;

use crate::builtins::{
    Nothing, ToBe, ToBeCloseTo, ToBeDefined, ToBeFalse, ToBeFalsy, ToBeGreaterThan,
    ToBeGreaterThanOrEqual, ToBeInstanceOf, ToBeLessThan, ToBeLessThanOrEqual, ToBeNaN,
    ToBeNegativeInfinity, ToBeNull, ToBePositiveInfinity, ToBeTrue, ToBeTruthy, ToBeUndefined,
    ToContain, ToEqual, ToHaveBeenCalled, ToHaveBeenCalledBefore, ToHaveBeenCalledOnceWith,
    ToHaveBeenCalledTimes, ToHaveBeenCalledWith, ToHaveSize, ToHaveSpyInteractions, ToMatch,
    ToThrow, ToThrowError, ToThrowMatching,
};
use crate::matcher::{Matcher, MatcherFactory};

// Static matcher instances for 'static lifetime references
static TO_BE: ToBe = ToBe;
static TO_EQUAL: ToEqual = ToEqual;
static TO_BE_INSTANCE_OF: ToBeInstanceOf = ToBeInstanceOf;
static TO_BE_DEFINED: ToBeDefined = ToBeDefined;
static TO_BE_UNDEFINED: ToBeUndefined = ToBeUndefined;
static TO_BE_NULL: ToBeNull = ToBeNull;
static TO_BE_NAN: ToBeNaN = ToBeNaN;
static TO_BE_TRUE: ToBeTrue = ToBeTrue;
static TO_BE_FALSE: ToBeFalse = ToBeFalse;
static TO_BE_TRUTHY: ToBeTruthy = ToBeTruthy;
static TO_BE_FALSY: ToBeFalsy = ToBeFalsy;
static TO_BE_POSITIVE_INFINITY: ToBePositiveInfinity = ToBePositiveInfinity;
static TO_BE_NEGATIVE_INFINITY: ToBeNegativeInfinity = ToBeNegativeInfinity;
static TO_BE_GREATER_THAN: ToBeGreaterThan = ToBeGreaterThan;
static TO_BE_GREATER_THAN_OR_EQUAL: ToBeGreaterThanOrEqual = ToBeGreaterThanOrEqual;
static TO_BE_LESS_THAN: ToBeLessThan = ToBeLessThan;
static TO_BE_LESS_THAN_OR_EQUAL: ToBeLessThanOrEqual = ToBeLessThanOrEqual;
static TO_BE_CLOSE_TO: ToBeCloseTo = ToBeCloseTo;
static TO_CONTAIN: ToContain = ToContain;
static TO_HAVE_SIZE: ToHaveSize = ToHaveSize;
static TO_MATCH: ToMatch = ToMatch;
static TO_THROW: ToThrow = ToThrow;
static TO_THROW_ERROR: ToThrowError = ToThrowError;
static TO_THROW_MATCHING: ToThrowMatching = ToThrowMatching;
static TO_HAVE_BEEN_CALLED: ToHaveBeenCalled = ToHaveBeenCalled;
static TO_HAVE_BEEN_CALLED_TIMES: ToHaveBeenCalledTimes = ToHaveBeenCalledTimes;
static TO_HAVE_BEEN_CALLED_WITH: ToHaveBeenCalledWith = ToHaveBeenCalledWith;
static TO_HAVE_BEEN_CALLED_ONCE_WITH: ToHaveBeenCalledOnceWith = ToHaveBeenCalledOnceWith;
static TO_HAVE_BEEN_CALLED_BEFORE: ToHaveBeenCalledBefore = ToHaveBeenCalledBefore;
static TO_HAVE_SPY_INTERACTIONS: ToHaveSpyInteractions = ToHaveSpyInteractions;
static NOTHING: Nothing = Nothing;

static BUILTINS: [&(dyn Matcher + 'static); 31] = [
    &TO_BE,
    &TO_EQUAL,
    &TO_BE_INSTANCE_OF,
    &TO_BE_DEFINED,
    &TO_BE_UNDEFINED,
    &TO_BE_NULL,
    &TO_BE_NAN,
    &TO_BE_TRUE,
    &TO_BE_FALSE,
    &TO_BE_TRUTHY,
    &TO_BE_FALSY,
    &TO_BE_POSITIVE_INFINITY,
    &TO_BE_NEGATIVE_INFINITY,
    &TO_BE_GREATER_THAN,
    &TO_BE_GREATER_THAN_OR_EQUAL,
    &TO_BE_LESS_THAN,
    &TO_BE_LESS_THAN_OR_EQUAL,
    &TO_BE_CLOSE_TO,
    &TO_CONTAIN,
    &TO_HAVE_SIZE,
    &TO_MATCH,
    &TO_THROW,
    &TO_THROW_ERROR,
    &TO_THROW_MATCHING,
    &TO_HAVE_BEEN_CALLED,
    &TO_HAVE_BEEN_CALLED_TIMES,
    &TO_HAVE_BEEN_CALLED_WITH,
    &TO_HAVE_BEEN_CALLED_ONCE_WITH,
    &TO_HAVE_BEEN_CALLED_BEFORE,
    &TO_HAVE_SPY_INTERACTIONS,
    &NOTHING,
];

/// A matcher found by name.
#[derive(Clone)]
pub enum MatcherRef {
    Builtin(&'static dyn Matcher),
    Custom(Arc<dyn Matcher>),
}

impl std::ops::Deref for MatcherRef {
    type Target = dyn Matcher;

    fn deref(&self) -> &Self::Target {
        match self {
            MatcherRef::Builtin(m) => *m,
            MatcherRef::Custom(m) => &**m,
        }
    }
}

/// Built-in matchers plus the run's custom ones.
///
/// Built-ins are zero-sized statics. Custom matchers are built from their
/// factory at registration and shadow a built-in of the same name. Clones
/// share the custom table.
#[derive(Clone, Default)]
pub struct MatcherRegistry {
    custom: Arc<RwLock<FxHashMap<String, Arc<dyn Matcher>>>>,
}

impl MatcherRegistry {
    pub fn new() -> Self {
        MatcherRegistry::default()
    }

    /// Register a custom matcher under `name`.
    pub fn add(&self, name: impl Into<String>, factory: &MatcherFactory, util: &MatchersUtil) {
        let name = name.into();
        tracing::debug!(matcher = %name, "custom matcher registered");
        self.custom.write().insert(name, factory(util));
    }

    pub fn get(&self, name: &str) -> Option<MatcherRef> {
        if let Some(custom) = self.custom.read().get(name) {
            return Some(MatcherRef::Custom(Arc::clone(custom)));
        }
        Self::builtin(name).map(MatcherRef::Builtin)
    }

    pub fn builtin(name: &str) -> Option<&'static dyn Matcher> {
        BUILTINS.iter().copied().find(|m| m.name() == name)
    }

    /// Names of the built-in matchers.
    pub fn builtin_names() -> impl Iterator<Item = &'static str> {
        BUILTINS.iter().map(|m| m.name())
    }

    pub fn custom_count(&self) -> usize {
        self.custom.read().len()
    }

    /// Drop every custom matcher.
    pub fn reset(&self) {
        self.custom.write().clear();
    }
}
