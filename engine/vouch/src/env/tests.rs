use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use vouch_async::{AsyncMatcher, CustomAsyncMatcher};
use vouch_matchers::{CustomMatcher, Matcher, MatcherResult};
use vouch_spy::SpyStrategy;
use vouch_value::{Promise, Settlement};

use super::*;

fn always_fails() -> MatcherFactory {
    Arc::new(|_: &MatchersUtil| -> Arc<dyn Matcher> {
        Arc::new(CustomMatcher::new("to_be_shiny", |_, _, _| {
            Ok(MatcherResult::new(false))
        }))
    })
}

#[test]
fn config_flows_into_printer_and_timeout() {
    let config = EngineConfig {
        max_pretty_print_array_length: 2,
        ..EngineConfig::default()
    }
    .with_default_timeout(Duration::from_millis(40));
    let env = Env::new(config);

    assert_eq!(env.config().default_timeout, Duration::from_millis(40));
    let long = Value::array(vec![1.into(), 2.into(), 3.into()]);
    assert_eq!(env.pp(&long), "[ 1, 2, ... ]");
}

#[test]
fn expectations_are_logged_in_order() {
    let env = Env::default();
    env.expect(1).to_be(1);
    env.expect("a").not().to_equal("a");
    env.evaluate("to_be_truthy", &Value::from(0), &[], false);

    let results = env.take_results();
    let outcome: Vec<_> = results
        .iter()
        .map(|r| (r.matcher_name.as_str(), r.pass))
        .collect();
    assert_eq!(
        outcome,
        vec![("to_be", true), ("to_equal", false), ("to_be_truthy", false)]
    );
    assert!(env.results().is_empty());
}

#[test]
fn custom_matchers_last_until_reset() {
    let env = Env::default();
    env.add_matchers([("to_be_shiny", always_fails())]);
    assert!(!env.expect(1).to("to_be_shiny", &[]).pass);
    assert!(env.expect(1).not().to("to_be_shiny", &[]).pass);

    env.reset();
    let result = env.expect(1).to("to_be_shiny", &[]);
    assert_eq!(
        result.error.unwrap().kind,
        vouch_value::EngineErrorKind::UnknownMatcher {
            name: "to_be_shiny".to_string()
        }
    );
}

#[test]
fn equality_testers_and_formatters_are_run_scoped() {
    let env = Env::default();
    env.add_custom_equality_tester(Arc::new(|a: &Value, b: &Value| {
        (a.as_str().is_some() && b.as_str().is_some()).then_some(true)
    }));
    env.add_custom_object_formatter(Arc::new(|v: &Value| {
        v.as_number().map(|n| format!("#{n}"))
    }));

    assert!(env.equals(&"x".into(), &"y".into()));
    assert_eq!(env.pp(&Value::from(7)), "#7");

    env.reset();
    assert!(!env.equals(&"x".into(), &"y".into()));
    assert_eq!(env.pp(&Value::from(7)), "7");
}

#[test]
fn diff_reports_nested_paths() {
    let env = Env::default();
    let actual = Value::object([("x", 1.into())]);
    let expected = Value::object([("x", 2.into())]);
    assert_eq!(
        env.diff(&actual, &expected).as_deref(),
        Some("Expected $.x = 1 to equal 2.")
    );
    assert_eq!(env.diff(&actual, &actual.deep_copy()), None);
}

#[test]
fn reset_restores_spies_and_default_strategy() {
    let env = Env::default();
    let original = Value::function("greet", |_, _| Ok("hello".into()));
    let target = Value::object([("greet", original.clone())]);

    env.set_default_spy_strategy(Arc::new(|and: &SpyStrategy| {
        and.return_value(42);
    }));
    let spy = env.spy_on(&target, "greet").unwrap();
    spy.and().return_value("stubbed");
    assert_eq!(env.create_spy("fresh").invoke(&[]).unwrap().as_number(), Some(42.0));

    env.reset();
    assert!(target.get("greet").unwrap().same_value(&original));
    assert!(env.create_spy("fresh").invoke(&[]).unwrap().is_undefined());
}

#[test]
fn reset_restores_property_spies() {
    let env = Env::default();
    let target = Value::object::<&str>([]);
    let getter = FunctionValue::new(vouch_value::NativeFunction::new("get", |_, _| {
        Ok("real".into())
    }));
    target.define_accessor(
        "mode",
        vouch_value::Accessor {
            get: Some(getter),
            set: None,
        },
    );

    let spy = env
        .spy_on_property(&target, "mode", AccessType::Get)
        .unwrap();
    spy.and().return_value("fake");
    assert_eq!(target.get("mode").unwrap().as_str(), Some("fake"));

    env.reset();
    assert_eq!(target.get("mode").unwrap().as_str(), Some("real"));
}

#[test]
fn reset_leaves_the_clock_alone() {
    let env = Env::default();
    env.clock().install().unwrap();
    env.reset();
    assert!(env.clock().is_installed());
    env.clock().uninstall();
}

#[test]
fn async_matchers_register_and_reset() {
    let env = Env::default();
    let factory: AsyncMatcherFactory = Arc::new(|_: &MatchersUtil| -> Arc<dyn AsyncMatcher> {
        Arc::new(CustomAsyncMatcher::new("to_settle", |_, settlement, _| {
            Ok(MatcherResult::new(!matches!(settlement, Settlement::Pending)))
        }))
    });
    env.add_async_matcher("to_settle", &factory);

    let promise = Value::from(Promise::resolved(Value::Null));
    let result =
        futures::executor::block_on(env.await_expectation(&promise, "to_settle", &[], false, None));
    assert!(result.pass);

    env.reset();
    let result =
        futures::executor::block_on(env.await_expectation(&promise, "to_settle", &[], false, None));
    assert!(!result.pass);
}
