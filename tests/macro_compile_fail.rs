//! Derive errors reported at compile time.

#[test]
fn derive_compile_fail_tests() {
    let t = trybuild::TestCases::new();
    t.compile_fail("tests/compile_fail/*.rs");
}
