//! Validator-side protocol agent.
//!
//! Holds the node's keypair and the small amount of session state the wire
//! contract needs: the signup callback awaiting its ack, and the persistent
//! identity the hub assigned.

use crate::probe::UptimeProbe;
use parking_lot::Mutex;
use shared_crypto::{reply_challenge, signup_challenge, Ed25519KeyPair};
use shared_types::{
    CorrelationId, HubFrame, SignupAck, SignupRequest, ValidateReply, ValidateRequest,
    ValidatorFrame, ValidatorId,
};
use tracing::{debug, info};

#[derive(Default)]
struct AgentState {
    validator_id: Option<ValidatorId>,
    signup_callback: Option<CorrelationId>,
}

/// The validator's half of the hub protocol.
///
/// Owns no socket: the host feeds hub frames in through
/// [`handle_frame`](Self::handle_frame) and sends any returned frame back
/// over its connection.
pub struct ValidatorAgent {
    keypair: Ed25519KeyPair,
    state: Mutex<AgentState>,
}

impl ValidatorAgent {
    /// Create an agent over an existing keypair.
    pub fn new(keypair: Ed25519KeyPair) -> Self {
        Self {
            keypair,
            state: Mutex::new(AgentState::default()),
        }
    }

    /// Create an agent with a freshly generated identity.
    pub fn generate() -> Self {
        Self::new(Ed25519KeyPair::generate())
    }

    /// The node's public key in wire form.
    pub fn public_key_hex(&self) -> String {
        self.keypair.public_key().to_hex()
    }

    /// The identity assigned by the hub, once signup completed.
    pub fn validator_id(&self) -> Option<ValidatorId> {
        self.state.lock().validator_id
    }

    /// Build the signed signup frame for a fresh connection.
    ///
    /// Each call mints a new callback ID; only the ack matching the latest
    /// one is honored.
    pub fn signup_frame(&self, ip: &str) -> ValidatorFrame {
        let callback_id = CorrelationId::new();
        let public_key = self.public_key_hex();

        let challenge = signup_challenge(callback_id, &public_key);
        let signature = self.keypair.sign(challenge.as_bytes());

        self.state.lock().signup_callback = Some(callback_id);

        ValidatorFrame::Signup(SignupRequest {
            ip: ip.to_string(),
            public_key,
            signed_message: signature.as_bytes().to_vec(),
            callback_id,
        })
    }

    /// React to one hub frame; a `Some` return goes back over the wire.
    pub async fn handle_frame(
        &self,
        frame: HubFrame,
        probe: &dyn UptimeProbe,
    ) -> Option<ValidatorFrame> {
        match frame {
            HubFrame::SignupAck(ack) => {
                self.handle_signup_ack(ack);
                None
            }
            HubFrame::ValidateRequest(request) => self.handle_validate(request, probe).await,
        }
    }

    fn handle_signup_ack(&self, ack: SignupAck) {
        let mut state = self.state.lock();
        match state.signup_callback {
            Some(expected) if expected == ack.callback_id => {
                state.validator_id = Some(ack.validator_id);
                state.signup_callback = None;
                info!(validator_id = %ack.validator_id, "Signup acknowledged");
            }
            _ => {
                debug!(callback_id = %ack.callback_id, "Ignoring signup ack for unknown callback");
            }
        }
    }

    async fn handle_validate(
        &self,
        request: ValidateRequest,
        probe: &dyn UptimeProbe,
    ) -> Option<ValidatorFrame> {
        // Until the ack arrives we have no identity to reply with.
        let validator_id = match self.validator_id() {
            Some(id) => id,
            None => {
                debug!(url = %request.url, "Ignoring validate request before signup completed");
                return None;
            }
        };

        let outcome = probe.check(&request.url).await;

        let challenge = reply_challenge(request.callback_id);
        let signature = self.keypair.sign(challenge.as_bytes());

        debug!(
            url = %request.url,
            status = ?outcome.status,
            latency_ms = outcome.latency_ms,
            "Answering validate request"
        );

        Some(ValidatorFrame::Validate(ValidateReply {
            callback_id: request.callback_id,
            signed_message: signature.as_bytes().to_vec(),
            status: outcome.status,
            latency: outcome.latency_ms,
            website_id: request.website_id,
            validator_id,
        }))
    }
}
