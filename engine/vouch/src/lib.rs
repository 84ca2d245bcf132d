//! Vouch - expectations, deep equality, spies and async expectations.
//!
//! Everything a run needs hangs off an [`Env`]:
//!
//! ```text
//! let env = Env::from_env();
//! env.expect(vec![1.into(), 2.into()]).to_contain(2);
//! let spy = env.create_spy("save");
//! spy.and().return_value(true);
//! env.clock().install()?;
//! for result in env.take_results() { report(result) }
//! ```
//!
//! Suite registration and reporting live outside this crate; reporters read
//! the structured [`ExpectationResult`] log.

mod config;
mod env;

use std::sync::Once;

pub use config::{
    EngineConfig, DEFAULT_TIMEOUT_VAR, MAX_ARRAY_LENGTH_VAR, MAX_CHARS_VAR, MAX_DEPTH_VAR,
};
pub use env::Env;

pub use vouch_async::{
    AsyncEvaluator, AsyncExpectation, AsyncMatcher, AsyncMatcherFactory, CustomAsyncMatcher,
    Settle, TimerId, VirtualClock,
};
pub use vouch_equality::asymmetric;
pub use vouch_equality::{CustomEqualityTester, DiffBuilder, MatchersUtil, ObjectPath, TypeTag};
pub use vouch_matchers::{
    CustomMatcher, Evaluator, Expectation, ExpectationResult, Matcher, MatcherFactory,
    MatcherResult, PASSED,
};
pub use vouch_spy::{
    AccessType, CallRecord, CallTracker, DefaultStrategy, Spy, SpyObjMembers, SpyStrategy,
};
pub use vouch_value::{
    Accessor, AsymmetricMatcher, CallResult, Class, EngineError, EngineErrorKind, EngineResult,
    FunctionValue, NativeFunction, ObjectFormatter, Promise, Settlement, Thrown, Value,
};

/// Environment variable holding the log filter; `RUST_LOG` is the fallback.
pub const LOG_VAR: &str = "VOUCH_LOG";
/// When set, logs are rendered as an indented span tree.
pub const LOG_TREE_VAR: &str = "VOUCH_LOG_TREE";

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call multiple times. Does nothing unless `VOUCH_LOG` or
/// `RUST_LOG` is set, e.g. `VOUCH_LOG=vouch_matchers=debug`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let Some(directives) = std::env::var(LOG_VAR)
            .or_else(|_| std::env::var("RUST_LOG"))
            .ok()
        else {
            return;
        };
        let filter = EnvFilter::try_new(&directives).unwrap_or_else(|e| {
            eprintln!("vouch: invalid log filter `{directives}`: {e}");
            EnvFilter::new("warn")
        });

        let registry = tracing_subscriber::registry().with(filter);
        let installed = if std::env::var_os(LOG_TREE_VAR).is_some() {
            registry
                .with(
                    tracing_tree::HierarchicalLayer::new(2)
                        .with_targets(true)
                        .with_indent_lines(true),
                )
                .try_init()
        } else {
            registry
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_level(true)
                        .with_writer(std::io::stderr),
                )
                .try_init()
        };
        if installed.is_err() {
            tracing::debug!("a global subscriber was already installed");
        }
    });
}
