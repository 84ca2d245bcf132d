use pretty_assertions::assert_eq;

use super::*;

fn depth(n: usize) -> usize {
    ensure_sufficient_stack(|| if n == 0 { 0 } else { 1 + depth(n - 1) })
}

#[test]
fn deep_recursion_completes() {
    assert_eq!(depth(100_000), 100_000);
}
