#![no_std]

mod rc_input;

pub use rc_input::*;
