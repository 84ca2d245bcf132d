use std::collections::HashMap;
use std::time::Duration;

use pretty_assertions::assert_eq;

use super::*;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |name| vars.get(name).cloned()
}

#[test]
fn defaults() {
    let config = EngineConfig::default();
    assert_eq!(config.default_timeout, Duration::from_millis(5000));
    assert_eq!(config.max_pretty_print_depth, 8);
    assert_eq!(config.max_pretty_print_array_length, 50);
    assert_eq!(config.max_pretty_print_chars, 1000);
    assert_eq!(EngineConfig::from_lookup(lookup(&[])), config);
}

#[test]
fn variables_override_defaults() {
    let config = EngineConfig::from_lookup(lookup(&[
        (DEFAULT_TIMEOUT_VAR, "250"),
        (MAX_DEPTH_VAR, " 3 "),
        (MAX_ARRAY_LENGTH_VAR, "10"),
        (MAX_CHARS_VAR, "80"),
    ]));
    assert_eq!(config.default_timeout, Duration::from_millis(250));
    assert_eq!(
        config.print_limits(),
        PrintLimits {
            max_depth: 3,
            max_array_length: 10,
            max_chars: 80,
        }
    );
}

#[test]
fn invalid_values_keep_defaults() {
    let config = EngineConfig::from_lookup(lookup(&[
        (DEFAULT_TIMEOUT_VAR, "soon"),
        (MAX_DEPTH_VAR, "-1"),
    ]));
    assert_eq!(config, EngineConfig::default());
}
