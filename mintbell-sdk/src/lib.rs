//! Wire types and clients shared by the mintbell crates.
//!
//! The `objects` module is always available. The HTTP and WebSocket clients
//! live behind the `client` feature so that crates which only need the
//! payload types do not pull in `reqwest` or `tokio-tungstenite`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]
#![forbid(unsafe_code)]

#[cfg(feature = "client")]
pub mod client;
pub mod objects;
