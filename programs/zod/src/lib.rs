#![cfg_attr(target_os = "solana", no_std)]

pub mod config;
pub mod instructions;
pub mod pda;
pub mod state;

pub mod entrypoint;

// Panic handler for no_std builds (only for Solana BPF)
#[cfg(all(target_os = "solana", not(test)))]
#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    loop {}
}

pub use instructions::*;
pub use state::*;

pinocchio_pubkey::declare_id!("HjBqgYKdav882K1bbnoaSr3QmZ9mxQcpmAFrvrAKjrpL");
