use super::*;
use pretty_assertions::assert_eq;
use vouch_value::EngineErrorKind;

fn method(name: &'static str, result: i32) -> Value {
    Value::function(name, move |_, _| Ok(Value::from(result)))
}

#[test]
fn spy_obj_from_names() {
    let registry = SpyRegistry::default();
    let obj = registry
        .create_spy_obj(
            "service",
            ["get", "put"].into_iter().collect(),
            SpyObjMembers::default(),
        )
        .unwrap();
    let get = Spy::from_value(&obj.get("get").unwrap()).unwrap();
    assert_eq!(get.name(), "service.get");
    assert!(get.invoke(&[]).unwrap().is_undefined());
    assert!(obj.get("put").is_some());
}

#[test]
fn spy_obj_from_return_values() {
    let registry = SpyRegistry::default();
    let obj = registry
        .create_spy_obj(
            "repo",
            SpyObjMembers::Returns(vec![("count".to_string(), Value::from(3))]),
            SpyObjMembers::default(),
        )
        .unwrap();
    let count = Spy::from_value(&obj.get("count").unwrap()).unwrap();
    assert_eq!(count.invoke(&[]).unwrap().as_number(), Some(3.0));
}

#[test]
fn empty_spy_obj_is_an_error() {
    let registry = SpyRegistry::default();
    let err = registry
        .create_spy_obj("base", SpyObjMembers::Names(vec![]), SpyObjMembers::default())
        .unwrap_err();
    assert!(matches!(err.kind, EngineErrorKind::EmptySpySet { .. }));
}

#[test]
fn default_strategy_applies_to_new_spies_only() {
    let registry = SpyRegistry::default();
    let before = registry.create_spy("before", None);
    registry.set_default_strategy(Arc::new(|and: &SpyStrategy| {
        and.return_value(42);
    }));
    let after = registry.create_spy("after", None);
    assert!(before.invoke(&[]).unwrap().is_undefined());
    assert_eq!(after.invoke(&[]).unwrap().as_number(), Some(42.0));

    registry.reset_default_strategy();
    let reset = registry.create_spy("reset", None);
    assert!(reset.invoke(&[]).unwrap().is_undefined());
}

#[test]
fn spy_on_replaces_and_restores() {
    let registry = SpyRegistry::default();
    let original = method("getBar", 1);
    let target = Value::object([("getBar", original.clone())]);

    let spy = registry.spy_on(&target, "getBar").unwrap();
    let installed = target.get("getBar").unwrap();
    assert!(Spy::from_value(&installed).is_some_and(|s| s.same(&spy)));
    assert!(installed.as_function().unwrap().call0().unwrap().is_undefined());

    spy.and().call_through();
    assert_eq!(installed.as_function().unwrap().call0().unwrap().as_number(), Some(1.0));
    assert_eq!(registry.installed_count(), 1);

    registry.restore_all_spies();
    assert!(target.get("getBar").unwrap().same_value(&original));
    assert_eq!(registry.installed_count(), 0);
}

#[test]
fn spy_on_rejects_invalid_targets() {
    let registry = SpyRegistry::default();
    let target = Value::object([("n", Value::from(1)), ("f", method("f", 0))]);

    for (target, name) in [
        (Value::from(1), "f"),
        (target.clone(), "missing"),
        (target.clone(), "n"),
    ] {
        let err = registry.spy_on(&target, name).unwrap_err();
        assert!(matches!(err.kind, EngineErrorKind::InvalidSpyTarget { .. }));
    }

    registry.spy_on(&target, "f").unwrap();
    let err = registry.spy_on(&target, "f").unwrap_err();
    assert_eq!(
        err.to_string(),
        "f has already been spied upon"
    );
}

#[test]
fn spy_on_all_functions_skips_data() {
    let registry = SpyRegistry::default();
    let target = Value::object([
        ("a", method("a", 1)),
        ("b", method("b", 2)),
        ("data", Value::from(3)),
    ]);
    let spies = registry.spy_on_all_functions(&target).unwrap();
    let names: Vec<&str> = spies.iter().map(Spy::name).collect();
    assert_eq!(names, vec!["a", "b"]);
    assert_eq!(target.get("data").and_then(|v| v.as_number()), Some(3.0));

    registry.reset();
    assert!(Spy::from_value(&target.get("a").unwrap()).is_none());
    assert!(registry.spy_on_all_functions(&Value::Null).is_err());
}

fn with_accessor(store: Value) -> Value {
    let target = Value::object([("hits", Value::from(0))]);
    let read = store.clone();
    let get = FunctionValue::new(vouch_value::NativeFunction::new("get", move |_, _| {
        Ok(read.get("v").unwrap_or(Value::Undefined))
    }));
    let set = FunctionValue::new(vouch_value::NativeFunction::new("set", move |_, args| {
        store.set_field("v", args[0].clone());
        Ok(Value::Undefined)
    }));
    target.define_accessor(
        "prop",
        Accessor {
            get: Some(get),
            set: Some(set),
        },
    );
    target
}

#[test]
fn spy_on_property_getter_and_setter() {
    let registry = SpyRegistry::default();
    let store = Value::object([("v", Value::from("test"))]);
    let target = with_accessor(store.clone());

    let getter = registry
        .spy_on_property(&target, "prop", AccessType::Get)
        .unwrap();
    getter.and().return_value("spy");
    assert_eq!(target.get("prop").unwrap().as_str(), Some("spy"));
    assert_eq!(getter.calls().count(), 1);
    assert!(getter.calls().this_for(0).same_value(&target));

    getter.and().call_through();
    assert_eq!(target.get("prop").unwrap().as_str(), Some("test"));

    let setter = registry
        .spy_on_property(&target, "prop", AccessType::Set)
        .unwrap();
    assert!(target.set_field("prop", Value::from("new")));
    assert_eq!(setter.calls().args_for(0)[0].as_str(), Some("new"));
    assert_eq!(store.get("v").unwrap().as_str(), Some("test"));

    registry.restore_all_spies();
    let restored = target.accessor("prop").unwrap();
    assert!(restored.get.unwrap().downcast::<Spy>().is_none());
    assert!(restored.set.unwrap().downcast::<Spy>().is_none());
    target.set_field("prop", Value::from("after"));
    assert_eq!(target.get("prop").unwrap().as_str(), Some("after"));
}

#[test]
fn spy_on_property_rejects_invalid_targets() {
    let registry = SpyRegistry::default();
    let target = with_accessor(Value::object::<&str>([]));
    let read_only = Value::object::<&str>([]);
    read_only.define_accessor("fixed", Accessor::default());

    let cases = [
        (Value::from(1), "prop", AccessType::Get),
        (target.clone(), "hits", AccessType::Get),
        (target.clone(), "missing", AccessType::Get),
        (read_only.clone(), "fixed", AccessType::Set),
    ];
    for (target, name, access) in cases {
        let err = registry.spy_on_property(&target, name, access).unwrap_err();
        assert!(matches!(err.kind, EngineErrorKind::InvalidSpyTarget { .. }));
    }
    assert_eq!(
        registry
            .spy_on_property(&read_only, "fixed", AccessType::Get)
            .unwrap_err()
            .to_string(),
        "Property fixed does not have access type get"
    );

    registry.spy_on_property(&target, "prop", AccessType::Get).unwrap();
    let err = registry
        .spy_on_property(&target, "prop", AccessType::Get)
        .unwrap_err();
    assert_eq!(err.to_string(), "prop has already been spied upon");
    assert!(registry.spy_on(&target, "prop").is_err());
}

#[test]
fn spy_obj_properties_are_spied_accessors() {
    let registry = SpyRegistry::default();
    let obj = registry
        .create_spy_obj(
            "base",
            ["method1"].into_iter().collect(),
            SpyObjMembers::Returns(vec![
                ("prop1".to_string(), Value::from("foo")),
                ("prop2".to_string(), Value::from(37)),
            ]),
        )
        .unwrap();

    assert_eq!(obj.size(), Some(1));
    assert_eq!(obj.get("prop1").unwrap().as_str(), Some("foo"));
    assert!(obj.set_field("prop2", Value::from(4)));
    assert_eq!(obj.get("prop2").unwrap().as_number(), Some(37.0));

    let accessor = obj.accessor("prop2").unwrap();
    let setter = Spy::from_value(&Value::Function(accessor.set.unwrap())).unwrap();
    assert_eq!(setter.name(), "base.prop2.set");
    assert_eq!(setter.calls().args_for(0)[0].as_number(), Some(4.0));
}

#[test]
fn spy_obj_may_have_only_properties() {
    let registry = SpyRegistry::default();
    let obj = registry
        .create_spy_obj("", SpyObjMembers::default(), ["p"].into_iter().collect())
        .unwrap();
    let get = obj.accessor("p").unwrap().get.unwrap();
    let getter = Spy::from_value(&Value::Function(get)).unwrap();
    assert_eq!(getter.name(), "p.get");
    assert!(obj.get("p").unwrap().is_undefined());
}
