#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

pub mod device;
pub mod dial;
pub mod phone;
pub mod token;

pub use device::*;
pub use dial::*;
pub use phone::*;
pub use token::*;
