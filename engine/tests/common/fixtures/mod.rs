// File: engine/tests/common/fixtures/mod.rs
pub mod fake_tools;
pub mod test_tree;

pub use fake_tools::*;
pub use test_tree::*;
