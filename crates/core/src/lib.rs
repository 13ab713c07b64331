#![forbid(unsafe_code)]

pub mod tree;

pub use tree::*;
