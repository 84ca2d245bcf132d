//! The run context.
//!
//! `Env` owns everything a run may customize: custom matchers and async
//! matchers, equality testers, object formatters, the spy registry with its
//! default strategy, the virtual clock and the result log. Independent runs
//! use separate `Env`s, or call [`Env::reset`] in between.

use std::time::Duration;

use vouch_async::{
    await_expectation, AsyncEvaluator, AsyncExpectation, AsyncMatcherFactory,
    AsyncMatcherRegistry, VirtualClock,
};
use vouch_equality::{CustomEqualityTester, DiffBuilder, MatchersUtil};
use vouch_matchers::{
    Evaluator, Expectation, ExpectationResult, MatcherFactory, MatcherRegistry,
};
use vouch_spy::{AccessType, DefaultStrategy, Spy, SpyObjMembers, SpyRegistry};
use vouch_value::{EngineResult, FunctionValue, ObjectFormatter, PrettyPrinter, Value};

use crate::config::EngineConfig;

/// Run-scoped engine state. Clones share it.
#[derive(Clone)]
pub struct Env {
    config: EngineConfig,
    util: MatchersUtil,
    spies: SpyRegistry,
    engine: AsyncEvaluator,
}

impl Default for Env {
    fn default() -> Self {
        Env::new(EngineConfig::default())
    }
}

impl Env {
    pub fn new(config: EngineConfig) -> Self {
        let util = MatchersUtil::new(PrettyPrinter::new(config.print_limits()));
        let evaluator = Evaluator::new(MatcherRegistry::new(), util.clone());
        let engine = AsyncEvaluator::new(
            evaluator,
            AsyncMatcherRegistry::new(),
            VirtualClock::new(),
            config.default_timeout,
        );
        tracing::debug!(?config, "run context created");
        Env {
            config,
            spies: SpyRegistry::new(util.clone()),
            util,
            engine,
        }
    }

    /// Context configured from the `VOUCH_*` environment variables.
    pub fn from_env() -> Self {
        Env::new(EngineConfig::from_env())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn util(&self) -> &MatchersUtil {
        &self.util
    }

    pub fn evaluator(&self) -> &Evaluator {
        self.engine.evaluator()
    }

    pub fn spies(&self) -> &SpyRegistry {
        &self.spies
    }

    pub fn clock(&self) -> &VirtualClock {
        self.engine.clock()
    }

    // Expectations

    pub fn expect(&self, actual: impl Into<Value>) -> Expectation<'_> {
        self.engine.evaluator().expect(actual)
    }

    pub fn expect_async(&self, actual: impl Into<Value>) -> AsyncExpectation<'_> {
        self.engine.expect_async(actual)
    }

    /// Evaluate a matcher by name and log the result.
    pub fn evaluate(
        &self,
        matcher_name: &str,
        actual: &Value,
        expected: &[Value],
        negated: bool,
    ) -> ExpectationResult {
        let evaluator = self.engine.evaluator();
        evaluator.record(evaluator.evaluate(matcher_name, actual, expected, negated))
    }

    /// Wait for `actual` to settle (or `timeout`, else the configured
    /// default), evaluate an async matcher and log the result.
    pub async fn await_expectation(
        &self,
        actual: &Value,
        matcher_name: &str,
        expected: &[Value],
        negated: bool,
        timeout: Option<Duration>,
    ) -> ExpectationResult {
        await_expectation(&self.engine, actual, matcher_name, expected, negated, timeout).await
    }

    // Customization

    pub fn add_matcher(&self, name: impl Into<String>, factory: &MatcherFactory) {
        self.engine
            .evaluator()
            .registry()
            .add(name, factory, &self.util);
    }

    pub fn add_matchers<N: Into<String>>(
        &self,
        matchers: impl IntoIterator<Item = (N, MatcherFactory)>,
    ) {
        for (name, factory) in matchers {
            self.add_matcher(name, &factory);
        }
    }

    pub fn add_async_matcher(&self, name: impl Into<String>, factory: &AsyncMatcherFactory) {
        self.engine.registry().add(name, factory, &self.util);
    }

    pub fn add_custom_equality_tester(&self, tester: CustomEqualityTester) {
        self.util.add_tester(tester);
    }

    pub fn add_custom_object_formatter(&self, formatter: ObjectFormatter) {
        self.util.printer().add_formatter(formatter);
    }

    // Equality

    pub fn equals(&self, a: &Value, b: &Value) -> bool {
        self.util.equals(a, b)
    }

    /// Diff message for `actual` against `expected`; `None` when equal.
    pub fn diff(&self, actual: &Value, expected: &Value) -> Option<String> {
        let mut diff = DiffBuilder::new(self.util.printer().clone());
        if self.util.equals_with_diff(actual, expected, &mut diff) {
            None
        } else {
            Some(diff.get_message())
        }
    }

    pub fn pp(&self, value: &Value) -> String {
        self.util.pp(value)
    }

    // Spies

    pub fn create_spy(&self, name: impl Into<String>) -> Spy {
        self.spies.create_spy(name, None)
    }

    /// Spy standing in for `original`, which `call_through` invokes.
    pub fn create_spy_for(&self, name: impl Into<String>, original: FunctionValue) -> Spy {
        self.spies.create_spy(name, Some(original))
    }

    /// Spy object with method spies `members` and accessor spies
    /// `properties`.
    pub fn create_spy_obj(
        &self,
        base: &str,
        members: SpyObjMembers,
        properties: SpyObjMembers,
    ) -> EngineResult<Value> {
        self.spies.create_spy_obj(base, members, properties)
    }

    pub fn spy_on(&self, target: &Value, method: &str) -> EngineResult<Spy> {
        self.spies.spy_on(target, method)
    }

    pub fn spy_on_property(
        &self,
        target: &Value,
        property: &str,
        access: AccessType,
    ) -> EngineResult<Spy> {
        self.spies.spy_on_property(target, property, access)
    }

    pub fn spy_on_all_functions(&self, target: &Value) -> EngineResult<Vec<Spy>> {
        self.spies.spy_on_all_functions(target)
    }

    pub fn restore_all_spies(&self) {
        self.spies.restore_all_spies();
    }

    pub fn set_default_spy_strategy(&self, strategy: DefaultStrategy) {
        self.spies.set_default_strategy(strategy);
    }

    pub fn reset_default_spy_strategy(&self) {
        self.spies.reset_default_strategy();
    }

    // Results

    pub fn results(&self) -> Vec<ExpectationResult> {
        self.engine.evaluator().results()
    }

    /// Drain the result log for a reporter.
    pub fn take_results(&self) -> Vec<ExpectationResult> {
        self.engine.evaluator().take_results()
    }

    /// Forget every customization of this run, restore installed spies and
    /// clear the result log. The clock is left as it is.
    pub fn reset(&self) {
        self.engine.evaluator().registry().reset();
        self.engine.registry().reset();
        self.util.clear_testers();
        self.util.printer().clear_formatters();
        self.spies.reset();
        self.engine.evaluator().clear_results();
        tracing::debug!("run context reset");
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests;
