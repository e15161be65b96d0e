//! Reply reconciliation.
//!
//! Invoked once per taken pending probe. Verifies the reply signature
//! against the key captured at dispatch time, then persists the observation
//! and the payout credit as one atomic storage unit.

use crate::domain::pending::PendingProbe;
use crate::domain::registry::ConnectionId;
use crate::ports::outbound::{FrameSink, StorageGateway};
use crate::service::HubService;
use chrono::Utc;
use shared_crypto::{reply_challenge, Ed25519Signature};
use shared_types::{NewObservation, ValidateReply};
use tracing::{debug, error, warn};

impl<S, F> HubService<S, F>
where
    S: StorageGateway,
    F: FrameSink,
{
    pub(super) async fn handle_reply(&self, connection: ConnectionId, reply: ValidateReply) {
        // Exactly-once: take() removes the entry, so a duplicate or delayed
        // copy of this frame finds nothing.
        let probe = match self.pending().take(reply.callback_id) {
            Some(probe) => probe,
            None => {
                debug!(
                    %connection,
                    callback_id = %reply.callback_id,
                    "Reply for unknown or expired probe"
                );
                return;
            }
        };

        self.reconcile(probe, reply).await;
    }

    async fn reconcile(&self, probe: PendingProbe, reply: ValidateReply) {
        let signature = match Ed25519Signature::from_slice(&reply.signed_message) {
            Ok(signature) => signature,
            Err(err) => {
                warn!(
                    callback_id = %reply.callback_id,
                    validator_id = %probe.validator_id,
                    error = %err,
                    "Discarding reply: malformed signature"
                );
                return;
            }
        };

        // Verify against the key captured at dispatch, never one named by
        // the reply; a validator cannot attest on another's behalf.
        let challenge = reply_challenge(reply.callback_id);
        if probe
            .expected_key
            .verify(challenge.as_bytes(), &signature)
            .is_err()
        {
            warn!(
                callback_id = %reply.callback_id,
                validator_id = %probe.validator_id,
                "Discarding reply: signature does not match dispatched validator"
            );
            return;
        }

        let observation = NewObservation {
            target_id: probe.target_id,
            validator_id: probe.validator_id,
            status: reply.status,
            latency_ms: reply.latency,
            created_at: Utc::now(),
        };

        let reward = self.config().payout.reward_per_observation;
        if let Err(err) = self.storage().record_observation(observation, reward).await {
            // No retry queue; the next dispatch tick re-probes the target.
            error!(
                callback_id = %reply.callback_id,
                target_id = %probe.target_id,
                error = %err,
                "Failed to persist observation; reply dropped"
            );
            return;
        }

        debug!(
            callback_id = %reply.callback_id,
            target_id = %probe.target_id,
            validator_id = %probe.validator_id,
            status = ?reply.status,
            latency_ms = reply.latency,
            "Observation recorded"
        );
    }
}
