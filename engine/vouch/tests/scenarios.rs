//! End-to-end scenarios through the run context.

#![allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::executor::block_on;
use futures::poll;
use pretty_assertions::assert_eq;
use vouch::asymmetric::{any, object_containing, string_matching};
use vouch::{Class, EngineErrorKind, Env, Promise, SpyObjMembers, TypeTag, Value};

#[test]
fn spy_calls_are_recorded_in_order() {
    let env = Env::default();
    let spy = env.create_spy("save");
    for i in 0..5 {
        spy.invoke(&[Value::from(i), Value::from("x")]).unwrap();
    }

    assert_eq!(spy.calls().count(), 5);
    let args = spy.calls().args_for(3);
    assert_eq!(args[0].as_number(), Some(3.0));
    assert_eq!(args[1].as_str(), Some("x"));

    assert!(env.expect(&spy).to_have_been_called_times(5).pass);
    assert!(
        env.expect(&spy)
            .to_have_been_called_with(vec![Value::from(4), any(TypeTag::String)])
            .pass
    );
}

#[test]
fn call_through_then_fake_keeps_side_effects() {
    let env = Env::default();
    let shared = Arc::new(AtomicUsize::new(0));
    let effect = Arc::clone(&shared);
    let original = vouch::FunctionValue::new(vouch::NativeFunction::new("bump", move |_, _| {
        effect.store(7, Ordering::SeqCst);
        Ok(Value::from("through"))
    }));

    let spy = env.create_spy_for("bump", original);
    spy.and()
        .call_through()
        .call_fake_fn(|_, _| Ok(Value::from("fake")));

    assert_eq!(spy.invoke(&[]).unwrap().as_str(), Some("fake"));
    assert_eq!(shared.load(Ordering::SeqCst), 7);
}

#[test]
fn argument_scoped_strategy() {
    let env = Env::default();
    let spy = env.create_spy("lookup");
    spy.with_args(vec![Value::from(1), Value::from("2")])
        .call_fake_fn(|_, _| Ok(Value::from(1002)));

    let hit = spy.invoke(&[Value::from(1), Value::from("2")]).unwrap();
    let miss = spy.invoke(&[Value::from(9), Value::from("x")]).unwrap();
    assert_eq!(hit.as_number(), Some(1002.0));
    assert!(miss.is_undefined());
}

#[test]
fn resetting_calls_keeps_the_strategy() {
    let env = Env::default();
    let spy = env.create_spy("answer");
    spy.and().return_value(42);
    spy.invoke(&[]).unwrap();
    spy.invoke(&[]).unwrap();

    spy.calls().reset();
    assert_eq!(spy.calls().count(), 0);
    assert_eq!(spy.invoke(&[]).unwrap().as_number(), Some(42.0));
}

#[test]
fn capture_by_value_snapshots_arguments() {
    let env = Env::default();
    let spy = env.create_spy("store");
    spy.calls().save_arguments_by_value();

    let item = Value::object([("qty", 1.into())]);
    spy.invoke(&[item.clone()]).unwrap();
    item.set_field("qty", 2.into());

    assert!(
        env.expect(&spy)
            .to_have_been_called_with(vec![Value::object([("qty", 1.into())])])
            .pass
    );
}

#[test]
fn spy_objects_need_members() {
    let env = Env::default();
    let err = env
        .create_spy_obj(
            "service",
            SpyObjMembers::Names(Vec::new()),
            SpyObjMembers::default(),
        )
        .unwrap_err();
    assert_eq!(
        err.kind,
        EngineErrorKind::EmptySpySet {
            base: "service".to_string()
        }
    );

    let service = env
        .create_spy_obj(
            "service",
            ["get", "put"].into_iter().collect(),
            SpyObjMembers::default(),
        )
        .unwrap();
    assert!(env.expect(service.clone()).not().to_have_spy_interactions().pass);
}

#[test]
fn spy_object_properties_ignore_assignment() {
    let env = Env::default();
    let obj = env
        .create_spy_obj(
            "base",
            ["method1"].into_iter().collect(),
            SpyObjMembers::Returns(vec![("prop2".to_string(), Value::from(37))]),
        )
        .unwrap();

    assert!(
        env.expect(obj.clone())
            .to_equal(Value::object([("method1", any(TypeTag::Function))]))
            .pass
    );
    obj.set_field("prop2", Value::from(4));
    assert_eq!(obj.get("prop2").unwrap().as_number(), Some(37.0));
}

#[test]
fn rejected_with_against_rejected_and_resolved_promises() {
    let env = Env::default();
    let reason = Value::error("E");

    let rejected = Value::from(Promise::rejected(reason.clone()));
    let result = block_on(env.await_expectation(
        &rejected,
        "to_be_rejected_with",
        &[reason.clone()],
        false,
        None,
    ));
    assert!(result.pass);

    let resolved = Value::from(Promise::resolved(Value::Undefined));
    let result = block_on(env.await_expectation(
        &resolved,
        "to_be_rejected_with",
        &[reason],
        false,
        None,
    ));
    assert!(!result.pass);
    assert_eq!(
        result.message,
        "Expected a promise to be rejected with Error: E but it was resolved."
    );
}

#[test]
fn rejection_by_class_and_message_pattern() {
    let env = Env::default();
    let promise = Promise::rejected(Value::error_of(&Class::type_error(), "bad id 42"));
    let pattern = Value::regex(r"id \d+").unwrap();

    let result = block_on(
        env.expect_async(promise)
            .to_be_rejected_with_error_with(Some(&Class::type_error()), pattern),
    );
    assert!(result.pass, "{}", result.message);
}

#[test]
fn virtual_clock_timeout_and_interval() {
    let env = Env::default();
    let clock = env.clock();
    clock.install().unwrap();

    let once = Arc::new(AtomicUsize::new(0));
    let hits = Arc::clone(&once);
    clock.set_timeout(Duration::from_millis(100), move || {
        hits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    clock.tick(Duration::from_millis(101)).unwrap();
    assert_eq!(once.load(Ordering::SeqCst), 1);

    let repeated = Arc::new(AtomicUsize::new(0));
    let hits = Arc::clone(&repeated);
    clock.set_interval(Duration::from_millis(100), move || {
        hits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    clock.tick(Duration::from_millis(50)).unwrap();
    clock.tick(Duration::from_millis(50)).unwrap();
    assert_eq!(repeated.load(Ordering::SeqCst), 1);

    assert_eq!(
        clock.install().unwrap_err().kind,
        EngineErrorKind::InstallConflict
    );
    clock.uninstall();
}

#[test]
fn async_timeout_follows_the_virtual_clock() {
    let env = Env::default();
    env.clock().install().unwrap();
    let promise = Promise::new();
    let expectation = env
        .expect_async(promise.clone())
        .with_timeout(Duration::from_millis(30));

    block_on(async {
        let mut waiting = expectation.to_be_resolved_to(object_containing(Value::object([(
            "status",
            string_matching("^ok").unwrap(),
        )])));
        assert!(poll!(&mut waiting).is_pending());
        env.clock().tick(Duration::from_millis(30)).unwrap();
        let std::task::Poll::Ready(result) = poll!(&mut waiting) else {
            panic!("expected the wait to time out");
        };
        assert_eq!(
            result.error.unwrap().kind,
            EngineErrorKind::Timeout { after_ms: 30 }
        );
    });

    // Settling afterwards is not reported again.
    promise.resolve(Value::object([("status", "ok".into())]));
    assert_eq!(env.take_results().len(), 1);
    env.clock().uninstall();
}

#[test]
fn reporter_sees_context_and_messages() {
    let env = Env::default();
    env.expect(Value::array(vec![1.into(), 2.into()]))
        .with_context("totals")
        .to_equal(Value::array(vec![1.into(), 3.into()]));
    env.expect(0.1 + 0.2).to_be_close_to(0.3, None);

    let results = env.take_results();
    assert_eq!(results[0].message, "totals: Expected $[1] = 2 to equal 3.");
    assert!(results[1].pass);
}
