mod collection;
mod filter;
mod pagination;

pub use collection::*;
pub use filter::*;
pub use pagination::*;
