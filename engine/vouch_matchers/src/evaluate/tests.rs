use std::sync::Arc;

use pretty_assertions::assert_eq;
use vouch_equality::MatchersUtil;
use vouch_spy::SpyRegistry;
use vouch_value::{Class, EngineErrorKind, Value};

use super::*;
use crate::matcher::{CustomMatcher, MatcherFactory};
use crate::result::{MatcherResult, PASSED};

fn factory(matcher: impl Fn() -> CustomMatcher + Send + Sync + 'static) -> MatcherFactory {
    Arc::new(move |_: &MatchersUtil| -> Arc<dyn Matcher> { Arc::new(matcher()) })
}

#[test]
fn passing_results_say_passed() {
    let evaluator = Evaluator::default();
    let result = evaluator.evaluate("to_equal", &1.into(), &[1.into()], false);
    assert!(result.pass);
    assert_eq!(result.message, PASSED);
    assert_eq!(result.matcher_name, "to_equal");
}

#[test]
fn unknown_matcher_is_an_error_in_both_polarities() {
    let evaluator = Evaluator::default();
    for negated in [false, true] {
        let result = evaluator.evaluate("to_be_awesome", &1.into(), &[], negated);
        assert!(!result.pass);
        assert_eq!(result.message, "unknown matcher `to_be_awesome`");
        assert!(matches!(
            result.error.map(|e| e.kind),
            Some(EngineErrorKind::UnknownMatcher { .. })
        ));
    }
}

#[test]
fn arity_is_checked() {
    let evaluator = Evaluator::default();
    let result = evaluator.evaluate("to_be", &1.into(), &[], false);
    assert_eq!(result.message, "to_be: expected 1 argument, got 0");

    let result = evaluator.evaluate("to_be_null", &1.into(), &[1.into()], true);
    assert!(!result.pass);
    assert_eq!(result.message, "to_be_null: expected 0 arguments, got 1");

    let result = evaluator.evaluate("to_be_close_to", &1.into(), &[], false);
    assert_eq!(result.message, "to_be_close_to: expected 1 to 2 arguments, got 0");
}

#[test]
fn matcher_message_is_kept_for_either_polarity() {
    let evaluator = Evaluator::default();
    evaluator.registry().add(
        "to_be_answer",
        &factory(|| {
            CustomMatcher::new("to_be_answer", |_, actual, _| {
                let pass = actual.as_number() == Some(42.0);
                Ok(MatcherResult::with_message(
                    pass,
                    if pass { "is the answer" } else { "is not the answer" },
                ))
            })
        }),
        evaluator.util(),
    );

    let miss = evaluator.evaluate("to_be_answer", &1.into(), &[], false);
    assert_eq!(miss.message, "is not the answer");

    let negated_hit = evaluator.evaluate("to_be_answer", &42.into(), &[], true);
    assert!(!negated_hit.pass);
    assert_eq!(negated_hit.message, "is the answer");

    assert!(evaluator.evaluate("to_be_answer", &1.into(), &[], true).pass);
}

#[test]
fn custom_matcher_without_message_uses_template() {
    let evaluator = Evaluator::default();
    evaluator.registry().add(
        "toBeEven",
        &factory(|| {
            CustomMatcher::new("toBeEven", |_, actual, _| {
                Ok(MatcherResult::new(
                    actual.as_number().is_some_and(|n| n % 2.0 == 0.0),
                ))
            })
        }),
        evaluator.util(),
    );

    assert_eq!(
        evaluator.evaluate("toBeEven", &3.into(), &[], false).message,
        "Expected 3 to be even."
    );
    assert_eq!(
        evaluator.evaluate("toBeEven", &4.into(), &[], true).message,
        "Expected 4 not to be even."
    );
}

#[test]
fn dedicated_negative_path_is_not_inverted() {
    let evaluator = Evaluator::default();
    evaluator.registry().add(
        "to_be_stubborn",
        &factory(|| {
            CustomMatcher::new("to_be_stubborn", |_, _, _| Ok(MatcherResult::new(false)))
                .with_negative_compare(|_, _, _| Ok(MatcherResult::new(false)))
        }),
        evaluator.util(),
    );
    assert!(!evaluator.evaluate("to_be_stubborn", &1.into(), &[], false).pass);
    let negated = evaluator.evaluate("to_be_stubborn", &1.into(), &[], true);
    assert!(!negated.pass);
    assert_eq!(negated.message, "Expected 1 not to be stubborn.");
}

#[test]
fn panicking_matcher_becomes_failure() {
    let evaluator = Evaluator::default();
    evaluator.registry().add(
        "to_explode",
        &factory(|| CustomMatcher::new("to_explode", |_, _, _| panic!("matcher blew up"))),
        evaluator.util(),
    );
    for negated in [false, true] {
        let result = evaluator.evaluate("to_explode", &1.into(), &[], negated);
        assert!(!result.pass);
        assert_eq!(result.message, "matcher `to_explode` panicked: matcher blew up");
    }
}

#[test]
fn factories_receive_the_shared_util() {
    let evaluator = Evaluator::default();
    evaluator
        .util()
        .add_tester(Arc::new(|a: &Value, b: &Value| {
            (a.as_str() == Some("anything") || b.as_str() == Some("anything")).then_some(true)
        }));
    let equals_factory: MatcherFactory = Arc::new(|util: &MatchersUtil| -> Arc<dyn Matcher> {
        let util = util.clone();
        Arc::new(CustomMatcher::new("to_loosely_equal", move |_, actual, expected| {
            Ok(MatcherResult::new(util.equals(actual, &expected[0])))
        }))
    });
    evaluator
        .registry()
        .add("to_loosely_equal", &equals_factory, evaluator.util());

    let result = evaluator.evaluate("to_loosely_equal", &"anything".into(), &[5.into()], false);
    assert!(result.pass);
}

#[test]
fn expectations_are_logged_with_context() {
    let evaluator = Evaluator::default();
    evaluator.expect(1).to_be(1);
    evaluator.expect(1).with_context("counting").to_be(2);
    evaluator.expect(1).not().to_be(1);

    let results = evaluator.take_results();
    assert_eq!(results.len(), 3);
    assert!(results[0].pass);
    assert_eq!(results[1].message, "counting: Expected 1 to be 2.");
    assert_eq!(results[2].message, "Expected 1 not to be 1.");
    assert!(evaluator.results().is_empty());
}

#[test]
fn context_is_not_added_to_passing_results() {
    let evaluator = Evaluator::default();
    let result = evaluator.expect(true).with_context("flag").to_be_true();
    assert_eq!(result.message, PASSED);
}

#[test]
fn derived_expectations_leave_the_original_alone() {
    let evaluator = Evaluator::default();
    let base = evaluator.expect(1);
    let negated = base.not();
    assert!(!base.is_negated());
    assert!(negated.is_negated());
    assert!(!negated.not().is_negated());
    assert!(base.to_be(1).pass);
    assert!(!negated.to_be(1).pass);
}

#[test]
fn typed_methods_reach_their_matchers() {
    let evaluator = Evaluator::default();
    let spies = SpyRegistry::new(evaluator.util().clone());
    let spy = spies.create_spy("tick", None);
    spy.invoke(&[1.into()]).unwrap();

    assert!(evaluator.expect(&spy).to_have_been_called().pass);
    assert!(evaluator.expect(&spy).to_have_been_called_times(1).pass);
    assert!(evaluator.expect(&spy).to_have_been_called_with(vec![1.into()]).pass);
    assert!(evaluator.expect(&spy).to_have_been_called_once_with(vec![1.into()]).pass);
    assert!(evaluator.expect(0.1 + 0.2).to_be_close_to(0.3, None).pass);
    assert!(evaluator.expect(5).to_be_greater_than(4.0).pass);
    assert!(evaluator.expect("abc").to_have_size(3).pass);
    assert!(evaluator.expect("abc").to_match("b").pass);
    assert!(evaluator.expect(Value::Undefined).not().to_be_defined().pass);

    let thrower = Value::function("thrower", |_, _| {
        Err(vouch_value::Thrown(Value::error_of(&Class::range_error(), "out of range")))
    });
    assert!(evaluator.expect(thrower.clone()).to_throw().pass);
    assert!(evaluator.expect(thrower.clone()).to_throw_error_of(&Class::range_error()).pass);
    assert!(evaluator
        .expect(thrower.clone())
        .to_throw_error_with(None, "out of range")
        .pass);
    assert!(evaluator
        .expect(thrower)
        .to_throw_matching(|thrown| thrown.as_error().is_some())
        .pass);
    assert!(evaluator.expect(Value::Null).nothing().pass);

    assert_eq!(evaluator.results().len(), 14);
}

#[test]
fn generic_entry_point_reaches_custom_matchers() {
    let evaluator = Evaluator::default();
    evaluator.registry().add(
        "to_be_positive",
        &factory(|| {
            CustomMatcher::new("to_be_positive", |_, actual, _| {
                Ok(MatcherResult::new(actual.as_number().is_some_and(|n| n > 0.0)))
            })
        }),
        evaluator.util(),
    );
    assert!(evaluator.expect(3).to("to_be_positive", &[]).pass);
    assert!(!evaluator.expect(-3).to("to_be_positive", &[]).pass);
}
