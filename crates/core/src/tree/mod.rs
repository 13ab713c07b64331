#![forbid(unsafe_code)]

mod error;
mod file_tree;
mod ids;
mod types;

pub use error::*;
pub use file_tree::*;
pub use ids::*;
pub use types::*;
