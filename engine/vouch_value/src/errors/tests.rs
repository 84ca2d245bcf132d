use super::*;
use pretty_assertions::assert_eq;

#[test]
fn unknown_matcher_message() {
    let err = unknown_matcher("to_be_goofy");
    assert_eq!(err.to_string(), "unknown matcher `to_be_goofy`");
    assert_eq!(err.code(), "V0001");
}

#[test]
fn invalid_usage_names_the_matcher() {
    let err = invalid_matcher_usage("to_be_close_to", "expected a number, got string");
    assert_eq!(
        err.to_string(),
        "to_be_close_to: expected a number, got string"
    );
    assert!(matches!(
        err.kind,
        EngineErrorKind::InvalidMatcherUsage { .. }
    ));
}

#[test]
fn timeout_reports_milliseconds() {
    let err = timeout(Duration::from_millis(250));
    assert_eq!(
        err.to_string(),
        "timed out after 250ms waiting for the promise to settle"
    );
}

#[test]
fn codes_are_distinct() {
    let errors = [
        unknown_matcher("x"),
        invalid_matcher_usage("x", "y"),
        empty_spy_set("x"),
        timeout(Duration::ZERO),
        install_conflict(),
        mismatched_async_type("number"),
        invalid_spy_target("x"),
    ];
    let mut codes: Vec<_> = errors.iter().map(EngineError::code).collect();
    codes.sort_unstable();
    codes.dedup();
    assert_eq!(codes.len(), errors.len());
}
