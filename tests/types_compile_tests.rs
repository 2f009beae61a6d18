// ABOUTME: Trybuild runner for compile-time type safety tests.
// ABOUTME: Verifies that invalid type usage fails to compile.

#[test]
fn name_types_not_interchangeable() {
    let t = trybuild::TestCases::new();
    t.compile_fail("tests/compile_fail/name_not_interchangeable.rs");
}

#[test]
fn pending_swap_cannot_be_forged() {
    let t = trybuild::TestCases::new();
    t.compile_fail("tests/compile_fail/pending_swap_forged.rs");
}

#[test]
fn pending_swap_finalized_only_once() {
    let t = trybuild::TestCases::new();
    t.compile_fail("tests/compile_fail/pending_swap_finalized_twice.rs");
}

#[test]
fn finalize_not_available_on_planned() {
    let t = trybuild::TestCases::new();
    t.compile_fail("tests/compile_fail/invalid_transition_finalize_on_planned.rs");
}
