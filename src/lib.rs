// Library target for integration tests and criterion benchmarks.
// The binary entry point is main.rs; this file re-declares the module tree so
// that tests can drive `trivia::game::*` and `trivia::source::*` directly.
// Some code is only exercised through the binary, so suppress dead_code warnings.
#![allow(dead_code)]

pub mod game;
pub mod source;

// Private: required transitively by the UI-facing parts of the tree
mod app;
mod config;
mod event;
mod ui;
