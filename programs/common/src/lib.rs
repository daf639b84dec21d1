#![cfg_attr(target_os = "solana", no_std)]

pub mod fixed;
pub mod error;
pub mod types;
pub mod account;
pub mod instruction;

pub use fixed::*;
pub use error::*;
pub use types::*;
pub use account::*;
pub use instruction::*;
