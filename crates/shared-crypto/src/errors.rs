//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Public key bytes do not decode to a valid curve point
    #[error("Invalid public key")]
    InvalidPublicKey,

    /// Public key text is not valid hex for 32 bytes
    #[error("Invalid public key encoding")]
    InvalidPublicKeyEncoding,

    /// Signature blob has the wrong length
    #[error("Invalid signature length: expected {expected}, got {actual}")]
    InvalidSignatureLength {
        /// Expected signature length in bytes
        expected: usize,
        /// Actual signature length in bytes
        actual: usize,
    },

    /// Signature verification failed
    #[error("Signature verification failed")]
    SignatureVerificationFailed,
}
