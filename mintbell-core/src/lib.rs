#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]
#![forbid(unsafe_code)]

pub mod announce;
pub mod chain;
pub mod config;
pub mod events;
pub mod naming;
pub mod processors;
pub mod utils;

#[cfg(test)]
mod test_support;
