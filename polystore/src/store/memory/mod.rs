mod collection;
mod store;

pub use store::*;
