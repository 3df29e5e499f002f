//! # Callback Bridge Test Suite
//!
//! Unified test crate for flows that span `callback-crypto` and
//! `callback-gateway`.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/
//! │   └── callback_benchmarks.rs   # signature + envelope throughput
//! └── src/
//!     ├── fixtures.rs              # platform simulator
//!     └── integration/             # end-to-end callback flows
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p callback-tests
//!
//! # By category
//! cargo test -p callback-tests integration::handshake_flows
//! cargo test -p callback-tests integration::message_flows
//!
//! # Benchmarks
//! cargo bench -p callback-tests
//! ```

pub mod fixtures;
pub mod integration;
