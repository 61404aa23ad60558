//! Unit tests that exercise public types through the crate boundary.

pub mod error_handling_test;
