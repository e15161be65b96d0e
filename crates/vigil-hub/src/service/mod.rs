//! # Hub Service
//!
//! Application service wiring the domain state to the driven ports. One
//! instance owns the validator registry and the pending probe store; every
//! inbound frame, scheduler tick, and disconnect is handled here.
//!
//! Handlers never propagate per-frame failures: bad frames, bad signatures,
//! and storage outages are logged at the level their class demands and
//! swallowed, because the hub keeps serving through all of them.

mod reconciler;
mod scheduler;

use crate::domain::config::HubConfig;
use crate::domain::pending::PendingProbeStore;
use crate::domain::registry::{ConnectionId, RegisteredValidator, ValidatorRegistry};
use crate::ports::outbound::{FrameSink, StorageGateway};
use shared_crypto::{signup_challenge, verify_detached, Ed25519PublicKey};
use shared_types::{
    HubFrame, NewValidator, SignupAck, SignupRequest, Validator, ValidatorFrame,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// The coordination hub's application service.
///
/// Generic over its driven ports so tests can exercise the full protocol
/// against an in-memory store and a recording sink.
pub struct HubService<S, F> {
    config: HubConfig,
    registry: Arc<ValidatorRegistry>,
    pending: Arc<PendingProbeStore>,
    storage: Arc<S>,
    sink: Arc<F>,
}

impl<S, F> HubService<S, F>
where
    S: StorageGateway,
    F: FrameSink,
{
    /// Create a hub service over the given store and sink.
    pub fn new(config: HubConfig, storage: Arc<S>, sink: Arc<F>) -> Self {
        let pending = Arc::new(PendingProbeStore::new(
            config.probes.timeout(),
            config.probes.max_inflight_per_validator,
        ));

        Self {
            config,
            registry: Arc::new(ValidatorRegistry::new()),
            pending,
            storage,
            sink,
        }
    }

    /// The live connection registry.
    pub fn registry(&self) -> &Arc<ValidatorRegistry> {
        &self.registry
    }

    /// The pending probe store.
    pub fn pending(&self) -> &Arc<PendingProbeStore> {
        &self.pending
    }

    pub(crate) fn config(&self) -> &HubConfig {
        &self.config
    }

    pub(crate) fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    pub(crate) fn sink(&self) -> &Arc<F> {
        &self.sink
    }

    /// Entry point for every inbound text frame from a connection.
    ///
    /// Unparseable frames are dropped without a response; the only feedback
    /// channel is the same unauthenticated connection.
    pub async fn handle_frame(&self, connection: ConnectionId, raw: &str) {
        let frame: ValidatorFrame = match serde_json::from_str(raw) {
            Ok(frame) => frame,
            Err(err) => {
                debug!(%connection, error = %err, "Dropping unparseable frame");
                return;
            }
        };

        match frame {
            ValidatorFrame::Signup(request) => self.handle_signup(connection, request).await,
            ValidatorFrame::Validate(reply) => self.handle_reply(connection, reply).await,
        }
    }

    /// The connection closed; drop its registration.
    ///
    /// Outstanding probes bound to the validator are left to the timeout
    /// sweep; their replies simply never arrive.
    pub fn handle_disconnect(&self, connection: ConnectionId) {
        if let Some(entry) = self.registry.unregister(&connection) {
            info!(
                %connection,
                validator_id = %entry.validator_id,
                "Validator disconnected"
            );
        }
    }

    async fn handle_signup(&self, connection: ConnectionId, request: SignupRequest) {
        let challenge = signup_challenge(request.callback_id, &request.public_key);
        if !verify_detached(&challenge, &request.signed_message, &request.public_key) {
            warn!(
                %connection,
                public_key = %request.public_key,
                "Rejecting signup: signature does not verify"
            );
            return;
        }

        // The challenge verified, so the key is decodable.
        let public_key = match Ed25519PublicKey::from_hex(&request.public_key) {
            Ok(key) => key,
            Err(err) => {
                warn!(%connection, error = %err, "Rejecting signup: undecodable public key");
                return;
            }
        };

        let validator = match self.lookup_or_create_validator(&request).await {
            Some(validator) => validator,
            None => return, // fail closed: no registry entry, no ack
        };

        let evicted = self.registry.register(RegisteredValidator {
            validator_id: validator.id,
            connection,
            public_key,
        });
        if let Some(stale) = evicted {
            debug!(
                stale_connection = %stale,
                validator_id = %validator.id,
                "Evicted stale registration for reconnecting key"
            );
        }

        let ack = HubFrame::SignupAck(SignupAck {
            validator_id: validator.id,
            callback_id: request.callback_id,
        });
        if let Err(err) = self.sink.send(connection, &ack) {
            // The connection died while we were talking to storage; its
            // close handler may already have run, so clean up ourselves.
            warn!(%connection, error = %err, "Signup ack undeliverable; dropping registration");
            self.registry.unregister(&connection);
            return;
        }

        info!(
            %connection,
            validator_id = %validator.id,
            "Validator signed up"
        );
    }

    async fn lookup_or_create_validator(&self, request: &SignupRequest) -> Option<Validator> {
        match self
            .storage
            .find_validator_by_public_key(&request.public_key)
            .await
        {
            Ok(Some(validator)) => Some(validator),
            Ok(None) => {
                let new = NewValidator {
                    public_key: request.public_key.clone(),
                    ip: request.ip.clone(),
                    location: "unknown".to_string(),
                };
                match self.storage.create_validator(new).await {
                    Ok(validator) => Some(validator),
                    Err(err) => {
                        error!(error = %err, "Signup failed: could not create validator");
                        None
                    }
                }
            }
            Err(err) => {
                error!(error = %err, "Signup failed: validator lookup unavailable");
                None
            }
        }
    }
}
