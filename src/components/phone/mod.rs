pub mod device;
mod dialer;

pub use dialer::*;
