//! Common test utilities for specmill integration tests.
//!
//! Provides `TestEnv`: an isolated project directory with a source document,
//! bibliography files, a config, and a fake shell-script renderer standing in
//! for ecmarkup.

// Not every test binary uses every helper
#![allow(dead_code)]

pub mod env;

pub use env::*;
