//! # Vigil Test Suite
//!
//! Unified test crate exercising the hub and the validator agent together
//! through their real wire frames.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/      # Hub <-> validator choreography
//!     └── flows.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p vigil-tests
//! ```

pub mod integration;
