//! Pure Rust model of the margin engine
//! No chain dependencies, no panics, all transitions total

pub mod state;
pub mod transitions;

pub use state::*;
pub use transitions::*;
