//! Wire protocol frames.
//!
//! Both directions speak JSON objects of the shape `{"type": ..., "data": ...}`
//! over one persistent WebSocket. Field names (`callbackID`, `publicKey`,
//! `websiteID`, ...) are part of the protocol contract; signatures travel as
//! arrays of integers.

use crate::entities::UptimeStatus;
use crate::ids::{CorrelationId, TargetId, ValidatorId};
use serde::{Deserialize, Serialize};

/// Frames a validator sends to the hub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ValidatorFrame {
    /// Authenticated registration of a validator connection.
    Signup(SignupRequest),
    /// Signed reply to one dispatched validate request.
    Validate(ValidateReply),
}

/// Frames the hub sends to a validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum HubFrame {
    /// Acknowledges a verified signup with the validator's persistent ID.
    #[serde(rename = "signup")]
    SignupAck(SignupAck),
    /// Asks the validator to check one URL.
    #[serde(rename = "validate")]
    ValidateRequest(ValidateRequest),
}

/// `Signup` payload (validator → hub).
///
/// `signed_message` covers the signup challenge
/// `"Signed message for {callbackID}, {publicKey}"`, binding the signature
/// to this one registration attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignupRequest {
    /// Self-reported source address.
    pub ip: String,
    /// Hex-encoded Ed25519 public key.
    #[serde(rename = "publicKey")]
    pub public_key: String,
    /// Detached signature over the signup challenge.
    #[serde(rename = "signedMessage")]
    pub signed_message: Vec<u8>,
    /// Echoed back in the ack so the validator can match it.
    #[serde(rename = "callbackID")]
    pub callback_id: CorrelationId,
}

/// `Validate` payload (validator → hub).
///
/// `signed_message` covers the reply challenge `"Replying to {callbackID}"`.
/// The `validator_id` field is untrusted input; the hub persists against the
/// identity it captured at dispatch time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidateReply {
    /// Correlation ID of the request being answered.
    #[serde(rename = "callbackID")]
    pub callback_id: CorrelationId,
    /// Detached signature over the reply challenge.
    #[serde(rename = "signedMessage")]
    pub signed_message: Vec<u8>,
    /// Reported reachability.
    pub status: UptimeStatus,
    /// Reported round-trip latency in milliseconds.
    pub latency: u64,
    /// Target the check was for.
    #[serde(rename = "websiteID")]
    pub website_id: TargetId,
    /// The validator's claimed identity.
    #[serde(rename = "validatorID")]
    pub validator_id: ValidatorId,
}

/// `signup` payload (hub → validator).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignupAck {
    /// Persistent identity assigned to (or recalled for) the public key.
    #[serde(rename = "validatorID")]
    pub validator_id: ValidatorId,
    /// Correlation ID from the signup frame.
    #[serde(rename = "callbackID")]
    pub callback_id: CorrelationId,
}

/// `validate` payload (hub → validator).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidateRequest {
    /// URL to check.
    pub url: String,
    /// Fresh correlation ID for this one request.
    #[serde(rename = "callbackID")]
    pub callback_id: CorrelationId,
    /// Target identity, echoed back in the reply.
    #[serde(rename = "websiteID")]
    pub website_id: TargetId,
}
