// Shared test utilities for engine integration tests
#![allow(dead_code)]

pub mod fixtures;
