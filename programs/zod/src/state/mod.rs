pub mod cache;
pub mod margin;
pub mod registry;

pub use cache::*;
pub use margin::*;
pub use registry::*;
