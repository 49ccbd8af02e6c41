pub mod common;
pub mod fact;
pub mod search;

pub use common::*;
pub use fact::*;
pub use search::*;
