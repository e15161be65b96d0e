//! In-memory storage gateway.
//!
//! Backs the hub in tests and single-process deployments. A relational
//! adapter implements the same port against a real database; atomicity of
//! `record_observation` here falls out of the single mutex.
//!
//! The failure switches simulate a storage outage: `set_unavailable` fails
//! reads and creates, `set_observation_failure` fails the reconciliation
//! write before any mutation, so partial writes cannot be observed.

use crate::ports::outbound::{StorageError, StorageGateway};
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{
    MonitoredTarget, NewObservation, NewValidator, Observation, ObservationId, TargetId,
    Validator, ValidatorId,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Default)]
struct StoreInner {
    validators: HashMap<ValidatorId, Validator>,
    targets: Vec<MonitoredTarget>,
    observations: Vec<Observation>,
}

/// In-memory implementation of [`StorageGateway`].
#[derive(Default)]
pub struct InMemoryStorage {
    inner: Mutex<StoreInner>,
    unavailable: AtomicBool,
    fail_observations: AtomicBool,
}

impl InMemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an enabled target and return it.
    pub fn seed_target(&self, url: &str) -> MonitoredTarget {
        let target = MonitoredTarget {
            id: TargetId::new(),
            url: url.to_string(),
            disabled: false,
        };
        self.inner.lock().targets.push(target.clone());
        target
    }

    /// Insert a validator row directly, bypassing the signup path.
    pub fn seed_validator(&self, public_key: &str) -> Validator {
        let validator = Validator {
            id: ValidatorId::new(),
            public_key: public_key.to_string(),
            ip: "203.0.113.1".to_string(),
            location: "unknown".to_string(),
            pending_payouts: 0,
        };
        self.inner
            .lock()
            .validators
            .insert(validator.id, validator.clone());
        validator
    }

    /// Mark a target disabled; it drops out of dispatch.
    pub fn disable_target(&self, id: TargetId) {
        let mut inner = self.inner.lock();
        if let Some(target) = inner.targets.iter_mut().find(|t| t.id == id) {
            target.disabled = true;
        }
    }

    /// Snapshot of all validator rows.
    pub fn validators(&self) -> Vec<Validator> {
        self.inner.lock().validators.values().cloned().collect()
    }

    /// One validator row by ID.
    pub fn validator(&self, id: ValidatorId) -> Option<Validator> {
        self.inner.lock().validators.get(&id).cloned()
    }

    /// Snapshot of all recorded observations.
    pub fn observations(&self) -> Vec<Observation> {
        self.inner.lock().observations.clone()
    }

    /// Fail reads and creates while set, simulating an outage.
    pub fn set_unavailable(&self, failing: bool) {
        self.unavailable.store(failing, Ordering::SeqCst);
    }

    /// Fail `record_observation` while set, before any mutation.
    pub fn set_observation_failure(&self, failing: bool) {
        self.fail_observations.store(failing, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("injected outage".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl StorageGateway for InMemoryStorage {
    async fn find_validator_by_public_key(
        &self,
        public_key: &str,
    ) -> Result<Option<Validator>, StorageError> {
        self.check_available()?;
        let inner = self.inner.lock();
        Ok(inner
            .validators
            .values()
            .find(|v| v.public_key == public_key)
            .cloned())
    }

    async fn create_validator(&self, validator: NewValidator) -> Result<Validator, StorageError> {
        self.check_available()?;
        let mut inner = self.inner.lock();

        if inner
            .validators
            .values()
            .any(|v| v.public_key == validator.public_key)
        {
            return Err(StorageError::Constraint(
                "public key already registered".into(),
            ));
        }

        let row = Validator {
            id: ValidatorId::new(),
            public_key: validator.public_key,
            ip: validator.ip,
            location: validator.location,
            pending_payouts: 0,
        };
        inner.validators.insert(row.id, row.clone());
        Ok(row)
    }

    async fn list_enabled_targets(&self) -> Result<Vec<MonitoredTarget>, StorageError> {
        self.check_available()?;
        let inner = self.inner.lock();
        Ok(inner
            .targets
            .iter()
            .filter(|t| !t.disabled)
            .cloned()
            .collect())
    }

    async fn record_observation(
        &self,
        observation: NewObservation,
        reward: u64,
    ) -> Result<(), StorageError> {
        if self.fail_observations.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("injected outage".into()));
        }

        // Single lock scope: observation insert and payout credit commit
        // together or not at all.
        let mut inner = self.inner.lock();

        let validator = inner
            .validators
            .get_mut(&observation.validator_id)
            .ok_or_else(|| StorageError::Constraint("unknown validator".into()))?;
        validator.pending_payouts += reward;

        inner.observations.push(Observation {
            id: ObservationId::new(),
            target_id: observation.target_id,
            validator_id: observation.validator_id,
            status: observation.status,
            latency_ms: observation.latency_ms,
            created_at: observation.created_at,
        });

        Ok(())
    }
}
