// Property-based test suite
//
// Run all property tests:
//   cargo test --test property
//
// Run with more cases:
//   PROPTEST_CASES=1000 cargo test --test property

mod roundtrip;
mod analysis;
