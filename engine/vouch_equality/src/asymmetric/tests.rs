use super::*;
use crate::MatchersUtil;
use pretty_assertions::assert_eq;
use vouch_value::Promise;

fn eq(actual: &Value, expected: &Value) -> bool {
    MatchersUtil::default().equals(actual, expected)
}

fn describe(value: &Value) -> String {
    PrettyPrinter::default().pp(value)
}

#[test]
fn any_checks_types() {
    assert!(eq(&Value::from(1), &any(TypeTag::Number)));
    assert!(eq(&Value::from("s"), &any(TypeTag::String)));
    assert!(eq(&Value::Bool(false), &any(TypeTag::Boolean)));
    assert!(eq(&Value::function("f", |_, _| Ok(Value::Undefined)), &any(TypeTag::Function)));
    assert!(eq(&Value::array(vec![]), &any(TypeTag::Object)));
    assert!(!eq(&Value::Null, &any(TypeTag::Object)));
    assert!(eq(&Value::map([]), &any(TypeTag::Map)));
    assert!(eq(&Value::set([]), &any(TypeTag::Set)));
    assert!(eq(&Value::error("e"), &any(TypeTag::Error)));
    assert!(eq(&Value::Promise(Promise::new()), &any(TypeTag::Promise)));
    assert!(eq(&Value::regex("x").unwrap(), &any(TypeTag::RegExp)));

    let animal = Class::new("Animal");
    let dog = Class::extending("Dog", &animal);
    let rex = Value::instance(&dog, [("name", Value::from("rex"))]);
    assert!(eq(&rex, &any(TypeTag::Class(animal))));
    assert_eq!(describe(&any(TypeTag::Class(dog))), "<any(Dog)>");
    assert_eq!(describe(&any(TypeTag::Number)), "<any(Number)>");
}

#[test]
fn anything_rejects_nullish() {
    assert!(eq(&Value::from(0), &anything()));
    assert!(!eq(&Value::Undefined, &anything()));
    assert!(!eq(&Value::Null, &anything()));
    assert_eq!(describe(&anything()), "<anything>");
}

#[test]
fn truthiness_and_emptiness() {
    assert!(eq(&Value::from(1), &truthy()));
    assert!(eq(&Value::from(""), &falsy()));
    assert!(eq(&Value::array(vec![]), &empty()));
    assert!(eq(&Value::object::<&str>([]), &empty()));
    assert!(!eq(&Value::from(0), &empty()));
    assert!(eq(&Value::from("a"), &not_empty()));
    assert!(!eq(&Value::set([]), &not_empty()));
}

#[test]
fn is_uses_identity() {
    let obj = Value::object([("a", Value::from(1))]);
    let matcher = is(obj.clone());
    assert!(eq(&obj, &matcher));
    assert!(!eq(&Value::object([("a", Value::from(1))]), &matcher));
    assert!(!eq(&Value::Number(-0.0), &is(Value::from(0))));
}

#[test]
fn strings() {
    let matcher = string_matching("^ab+c$").unwrap();
    assert!(eq(&Value::from("abbbc"), &matcher));
    assert!(!eq(&Value::from("ac"), &matcher));
    assert!(!eq(&Value::from(1), &matcher));
    assert_eq!(describe(&matcher), "<string_matching(/^ab+c$/)>");

    assert!(eq(&Value::from("hello world"), &string_containing("lo w")));
    assert!(!eq(&Value::from("hello"), &string_containing("x")));
}

#[test]
fn object_containing_checks_subset_deeply() {
    let actual = Value::object([
        ("a", Value::from(1)),
        ("b", Value::array(vec![Value::from(2)])),
        ("c", Value::from("ignored")),
    ]);
    let sample = Value::object([
        ("a", any(TypeTag::Number)),
        ("b", Value::array(vec![Value::from(2)])),
    ]);
    assert!(eq(&actual, &object_containing(sample.clone())));
    assert!(!eq(&Value::object([("a", Value::from(1))]), &object_containing(sample)));
    assert!(!eq(&Value::from(1), &object_containing(Value::object::<&str>([]))));
    assert_eq!(
        describe(&object_containing(Value::object([("a", Value::from(1))]))),
        "<object_containing(Object({ a: 1 }))>"
    );
}

#[test]
fn array_containing_ignores_order() {
    let actual = Value::array(vec![Value::from(1), Value::from(2), Value::from(3)]);
    assert!(eq(&actual, &array_containing(vec![Value::from(3), Value::from(1)])));
    assert!(!eq(&actual, &array_containing(vec![Value::from(4)])));
    assert!(eq(&actual, &array_containing(vec![])));
    assert!(!eq(&Value::from("123"), &array_containing(vec![])));
}

#[test]
fn array_with_exact_contents_counts_duplicates() {
    let actual = Value::array(vec![Value::from(1), Value::from(1), Value::from(2)]);
    assert!(eq(
        &actual,
        &array_with_exact_contents(vec![Value::from(2), Value::from(1), Value::from(1)])
    ));
    assert!(!eq(
        &actual,
        &array_with_exact_contents(vec![Value::from(1), Value::from(2), Value::from(2)])
    ));
    assert!(!eq(&actual, &array_with_exact_contents(vec![Value::from(1), Value::from(2)])));
}

#[test]
fn array_with_exact_contents_pairs_matchers_in_any_order() {
    let actual = Value::array(vec![Value::from(1), Value::from(2)]);
    assert!(eq(
        &actual,
        &array_with_exact_contents(vec![any(TypeTag::Number), Value::from(1)])
    ));
    assert!(eq(
        &actual,
        &array_with_exact_contents(vec![Value::from(1), any(TypeTag::Number)])
    ));
    assert!(!eq(
        &actual,
        &array_with_exact_contents(vec![any(TypeTag::String), Value::from(1)])
    ));

    let three = Value::array(vec![Value::from("a"), Value::from(1), Value::from(2)]);
    assert!(eq(
        &three,
        &array_with_exact_contents(vec![
            anything(),
            any(TypeTag::Number),
            Value::from(1),
        ])
    ));
}

#[test]
fn map_and_set_containing() {
    let map = Value::map([
        (Value::from("a"), Value::from(1)),
        (Value::from("b"), Value::from(2)),
    ]);
    assert!(eq(&map, &map_containing(vec![(Value::from("b"), any(TypeTag::Number))])));
    assert!(!eq(&map, &map_containing(vec![(Value::from("c"), Value::from(1))])));

    let set = Value::set([Value::from(1), Value::object([("k", Value::from(2))])]);
    assert!(eq(&set, &set_containing(vec![Value::object([("k", Value::from(2))])])));
    assert!(!eq(&set, &set_containing(vec![Value::from(5)])));
    assert!(!eq(&Value::array(vec![]), &set_containing(vec![])));
}

#[test]
fn custom_testers_reach_nested_asymmetric_comparisons() {
    let util = MatchersUtil::default();
    util.add_tester(std::sync::Arc::new(|a: &Value, b: &Value| {
        match (a.as_number(), b.as_number()) {
            (Some(x), Some(y)) => Some((x - y).abs() < 1.0),
            _ => None,
        }
    }));
    let actual = Value::array(vec![Value::Number(1.2)]);
    assert!(util.equals(&actual, &array_containing(vec![Value::from(1)])));
}
