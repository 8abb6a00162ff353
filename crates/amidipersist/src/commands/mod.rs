//! Command handlers: `--dump` and the persist loop.

pub mod dump;
pub mod persist;
