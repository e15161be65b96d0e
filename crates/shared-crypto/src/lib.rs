//! # Shared Crypto - Signature Codec
//!
//! Ed25519 detached signatures over UTF-8 challenge strings, plus the
//! deterministic challenge construction both sides of the wire agree on.
//!
//! ## Components
//!
//! | Module | Contents |
//! |--------|----------|
//! | `signatures` | Keypair, public key, and signature newtypes |
//! | `challenges` | Challenge strings and the never-failing `verify_detached` |
//!
//! ## Security Properties
//!
//! - **Ed25519**: deterministic nonces, no RNG dependency at signing time
//! - **Context binding**: challenges embed the correlation ID, so a captured
//!   signature cannot be replayed against a different pending request
//! - **Fail-closed verification**: malformed input never panics, it verifies
//!   as `false`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod challenges;
pub mod errors;
pub mod signatures;

// Re-exports
pub use challenges::{reply_challenge, signup_challenge, verify_detached};
pub use errors::CryptoError;
pub use signatures::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
