// lib.rs: library crate behind the `dasls` binary.
//
// The binary (main.rs) only parses arguments and starts the server; benches
// and integration tests use the modules below directly.

pub mod backend;
pub mod config;
pub mod content_provider;
pub mod handlers;
pub mod identifier;
pub mod state;
pub mod symbols;
pub mod utf16;
// test_utils is available in test builds and when the `test-support` feature is enabled.
#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
