//! Challenge construction and string-level verification.
//!
//! Challenges embed the correlation ID of the exchange they belong to, so a
//! signature captured on the wire only ever verifies in its original
//! context. The signup challenge additionally binds the claimed public key.

use crate::signatures::{Ed25519PublicKey, Ed25519Signature};
use std::fmt;

/// Challenge a validator signs to register a connection.
pub fn signup_challenge(callback_id: impl fmt::Display, public_key_hex: &str) -> String {
    format!("Signed message for {callback_id}, {public_key_hex}")
}

/// Challenge a validator signs when answering one dispatched request.
pub fn reply_challenge(callback_id: impl fmt::Display) -> String {
    format!("Replying to {callback_id}")
}

/// Verify a detached signature over the UTF-8 bytes of `message`.
///
/// This is the tolerant wire-side entry point: wrong signature length,
/// undecodable hex, or an invalid curve point all verify as `false`, never
/// as an error.
pub fn verify_detached(message: &str, signature: &[u8], public_key_hex: &str) -> bool {
    let public_key = match Ed25519PublicKey::from_hex(public_key_hex) {
        Ok(key) => key,
        Err(_) => return false,
    };

    let signature = match Ed25519Signature::from_slice(signature) {
        Ok(sig) => sig,
        Err(_) => return false,
    };

    public_key.verify(message.as_bytes(), &signature).is_ok()
}
