use crate::asymmetric::{self, TypeTag};
use crate::MatchersUtil;
use proptest::prelude::*;
use vouch_value::{Class, Value};

fn eq(a: &Value, b: &Value) -> bool {
    MatchersUtil::default().equals(a, b)
}

#[test]
fn structural_equality() {
    let a = Value::object([
        ("name", Value::from("x")),
        ("list", Value::array(vec![Value::from(1), Value::Null])),
    ]);
    let b = Value::object([
        ("list", Value::array(vec![Value::from(1), Value::Null])),
        ("name", Value::from("x")),
    ]);
    assert!(eq(&a, &b));
}

#[test]
fn arrays_differ_in_length() {
    let a = Value::array(vec![Value::from(1)]);
    let b = Value::array(vec![Value::from(1), Value::Undefined]);
    assert!(!eq(&a, &b));
}

#[test]
fn classes_must_match() {
    let point = Class::new("Point");
    let a = Value::instance(&point, [("x", Value::from(1))]);
    let b = Value::instance(&point, [("x", Value::from(1))]);
    let plain = Value::object([("x", Value::from(1))]);
    assert!(eq(&a, &b));
    assert!(!eq(&a, &plain));
}

#[test]
fn maps_ignore_order() {
    let a = Value::map([
        (Value::from("a"), Value::from(1)),
        (Value::from("b"), Value::array(vec![])),
    ]);
    let b = Value::map([
        (Value::from("b"), Value::array(vec![])),
        (Value::from("a"), Value::from(1)),
    ]);
    let c = Value::map([(Value::from("a"), Value::from(1))]);
    assert!(eq(&a, &b));
    assert!(!eq(&a, &c));
}

#[test]
fn sets_compare_members_deeply() {
    let a = Value::set([Value::object([("k", Value::from(1))]), Value::from(2)]);
    let b = Value::set([Value::from(2), Value::object([("k", Value::from(1))])]);
    assert!(eq(&a, &b));
    assert!(!eq(&a, &Value::set([Value::from(2), Value::from(3)])));
}

#[test]
fn errors_compare_class_and_message() {
    assert!(eq(&Value::error("x"), &Value::error("x")));
    assert!(!eq(&Value::error("x"), &Value::error("y")));
    assert!(!eq(
        &Value::error("x"),
        &Value::error_of(&Class::type_error(), "x")
    ));
}

#[test]
fn regexes_compare_source() {
    let a = Value::regex("a+").unwrap();
    let b = Value::regex("a+").unwrap();
    assert!(eq(&a, &b));
    assert!(!eq(&a, &Value::regex("b+").unwrap()));
}

#[test]
fn functions_compare_by_identity() {
    let f = Value::function("f", |_, _| Ok(Value::Undefined));
    let g = Value::function("f", |_, _| Ok(Value::Undefined));
    assert!(eq(&f, &f.clone()));
    assert!(!eq(&f, &g));
}

#[test]
fn asymmetric_on_either_side() {
    let matcher = asymmetric::any(TypeTag::Number);
    assert!(eq(&Value::from(3), &matcher));
    assert!(eq(&matcher, &Value::from(3)));
    assert!(!eq(&Value::from("3"), &matcher));

    let nested = Value::object([("id", asymmetric::any(TypeTag::Number))]);
    assert!(eq(&Value::object([("id", Value::from(7))]), &nested));
}

#[test]
fn cycles_terminate() {
    let a = Value::object([("v", Value::from(1))]);
    a.set_field("me", a.clone());
    let b = Value::object([("v", Value::from(1))]);
    b.set_field("me", b.clone());
    assert!(eq(&a, &b));

    let c = Value::object([("v", Value::from(2))]);
    c.set_field("me", c.clone());
    assert!(!eq(&a, &c));
}

#[test]
fn deeply_nested_arrays() {
    let mut value = Value::from(0);
    for _ in 0..2_000 {
        value = Value::array(vec![value]);
    }
    let copy = value.deep_copy();
    assert!(eq(&value, &copy));
}

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Undefined),
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-1000i32..1000).prop_map(Value::from),
        "[a-z]{0,4}".prop_map(Value::from),
    ]
}

fn value() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::array),
            prop::collection::btree_map("[a-c]", inner, 0..3)
                .prop_map(|fields| Value::object(fields)),
        ]
    })
}

proptest! {
    #[test]
    fn equality_is_reflexive_on_copies(v in value()) {
        prop_assert!(eq(&v, &v.deep_copy()));
    }

    #[test]
    fn equality_is_symmetric(a in value(), b in value()) {
        prop_assert_eq!(eq(&a, &b), eq(&b, &a));
    }
}
