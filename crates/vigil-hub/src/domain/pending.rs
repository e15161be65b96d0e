//! Pending probe store.
//!
//! Correlates dispatched validate requests to their eventual replies. Each
//! entry is a tagged record carrying everything the reconciler needs, keyed
//! by correlation ID; `take` removes exactly once, which is the sole
//! mechanism preventing duplicate observation writes from duplicate or
//! delayed frames.
//!
//! Expiry is a periodic sweep over the map rather than one timer per
//! request, keeping resource use bounded under high dispatch volume.

use dashmap::DashMap;
use shared_crypto::Ed25519PublicKey;
use shared_types::{CorrelationId, TargetId, ValidatorId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// One dispatched validate request awaiting its reply.
#[derive(Debug, Clone)]
pub struct PendingProbe {
    /// Target the request was for.
    pub target_id: TargetId,
    /// URL sent to the validator.
    pub url: String,
    /// Validator the request went to (dispatch-time identity).
    pub validator_id: ValidatorId,
    /// Key the reply must verify against.
    pub expected_key: Ed25519PublicKey,
    /// Dispatch time.
    pub created_at: Instant,
    /// How long the entry may stay unanswered before the sweep evicts it.
    pub timeout: Duration,
}

/// Counters for probe lifecycle outcomes.
#[derive(Debug, Default)]
pub struct ProbeStats {
    /// Probes registered
    pub registered: AtomicU64,
    /// Probes resolved by a matching reply
    pub resolved: AtomicU64,
    /// Probes evicted by the expiry sweep
    pub expired: AtomicU64,
    /// Probes cancelled after a failed dispatch send
    pub cancelled: AtomicU64,
    /// Dispatches rejected by the per-validator in-flight cap
    pub rejected: AtomicU64,
}

/// Correlation-keyed store of in-flight probes.
pub struct PendingProbeStore {
    pending: DashMap<CorrelationId, PendingProbe>,
    inflight: DashMap<ValidatorId, u64>,
    default_timeout: Duration,
    max_inflight_per_validator: u64,
    stats: ProbeStats,
}

impl PendingProbeStore {
    /// Create a store with the given probe timeout and per-validator cap.
    pub fn new(default_timeout: Duration, max_inflight_per_validator: u64) -> Self {
        Self {
            pending: DashMap::new(),
            inflight: DashMap::new(),
            default_timeout,
            max_inflight_per_validator,
            stats: ProbeStats::default(),
        }
    }

    /// Register a probe and get its fresh correlation ID.
    ///
    /// Returns `None` when the validator already has the maximum number of
    /// unanswered probes outstanding; the caller drops the dispatch.
    pub fn register(
        &self,
        target_id: TargetId,
        url: &str,
        validator_id: ValidatorId,
        expected_key: Ed25519PublicKey,
    ) -> Option<CorrelationId> {
        {
            let mut slots = self.inflight.entry(validator_id).or_insert(0);
            if *slots >= self.max_inflight_per_validator {
                self.stats.rejected.fetch_add(1, Ordering::Relaxed);
                debug!(
                    validator_id = %validator_id,
                    inflight = *slots,
                    "Rejecting dispatch: validator at in-flight capacity"
                );
                return None;
            }
            *slots += 1;
        }

        let correlation_id = CorrelationId::new();
        let probe = PendingProbe {
            target_id,
            url: url.to_string(),
            validator_id,
            expected_key,
            created_at: Instant::now(),
            timeout: self.default_timeout,
        };

        self.pending.insert(correlation_id, probe);
        self.stats.registered.fetch_add(1, Ordering::Relaxed);

        debug!(
            callback_id = %correlation_id,
            validator_id = %validator_id,
            target_id = %target_id,
            "Registered pending probe"
        );

        Some(correlation_id)
    }

    /// Remove and return the probe for `correlation_id`, exactly once.
    ///
    /// `None` for unknown, expired, or already-taken IDs; such replies are
    /// correlation misses, not errors.
    pub fn take(&self, correlation_id: CorrelationId) -> Option<PendingProbe> {
        let (_, probe) = self.pending.remove(&correlation_id)?;
        self.release_slot(&probe.validator_id);
        self.stats.resolved.fetch_add(1, Ordering::Relaxed);
        Some(probe)
    }

    /// Drop a probe whose request frame could not be delivered.
    ///
    /// The reply can never arrive, so there is no point leaving the entry
    /// for the sweep.
    pub fn cancel(&self, correlation_id: &CorrelationId) -> bool {
        match self.pending.remove(correlation_id) {
            Some((_, probe)) => {
                self.release_slot(&probe.validator_id);
                self.stats.cancelled.fetch_add(1, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    /// Evict every probe past its deadline. Returns the number removed.
    pub fn remove_expired(&self) -> usize {
        let now = Instant::now();

        let expired: Vec<CorrelationId> = self
            .pending
            .iter()
            .filter(|entry| now.duration_since(entry.created_at) > entry.timeout)
            .map(|entry| *entry.key())
            .collect();

        let mut removed = 0;
        for correlation_id in expired {
            // A reply may still win the race; remove() decides.
            if let Some((_, probe)) = self.pending.remove(&correlation_id) {
                self.release_slot(&probe.validator_id);
                self.stats.expired.fetch_add(1, Ordering::Relaxed);
                warn!(
                    callback_id = %correlation_id,
                    validator_id = %probe.validator_id,
                    target_id = %probe.target_id,
                    "Removing expired probe"
                );
                removed += 1;
            }
        }

        removed
    }

    /// Number of currently pending probes.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Whether `correlation_id` is still pending.
    pub fn is_pending(&self, correlation_id: &CorrelationId) -> bool {
        self.pending.contains_key(correlation_id)
    }

    /// Outstanding probe count for one validator.
    pub fn inflight_for(&self, validator_id: &ValidatorId) -> u64 {
        self.inflight
            .get(validator_id)
            .map(|count| *count)
            .unwrap_or(0)
    }

    /// Lifecycle counters.
    pub fn stats(&self) -> &ProbeStats {
        &self.stats
    }

    fn release_slot(&self, validator_id: &ValidatorId) {
        if let Some(mut count) = self.inflight.get_mut(validator_id) {
            *count = count.saturating_sub(1);
        }
        self.inflight.remove_if(validator_id, |_, count| *count == 0);
    }
}

/// Background task sweeping expired probes out of the store.
pub async fn sweep_task(store: Arc<PendingProbeStore>, interval: Duration) {
    let mut sweep_interval = tokio::time::interval(interval);
    sweep_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        sweep_interval.tick().await;
        let removed = store.remove_expired();
        if removed > 0 {
            debug!(removed = removed, "Swept expired probes");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_crypto::Ed25519KeyPair;

    fn store(timeout: Duration, cap: u64) -> PendingProbeStore {
        PendingProbeStore::new(timeout, cap)
    }

    fn test_key() -> Ed25519PublicKey {
        Ed25519KeyPair::generate().public_key()
    }

    #[test]
    fn test_register_and_take_exactly_once() {
        let store = store(Duration::from_secs(30), 8);
        let validator_id = ValidatorId::new();
        let target_id = TargetId::new();

        let id = store
            .register(target_id, "https://example.com", validator_id, test_key())
            .unwrap();

        assert!(store.is_pending(&id));
        assert_eq!(store.inflight_for(&validator_id), 1);

        let probe = store.take(id).unwrap();
        assert_eq!(probe.target_id, target_id);
        assert_eq!(probe.validator_id, validator_id);
        assert_eq!(store.inflight_for(&validator_id), 0);

        // Second take is a no-op
        assert!(store.take(id).is_none());
        assert_eq!(store.stats().resolved.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_take_unknown_id_is_miss() {
        let store = store(Duration::from_secs(30), 8);
        assert!(store.take(CorrelationId::new()).is_none());
    }

    #[test]
    fn test_inflight_cap_rejects_excess() {
        let store = store(Duration::from_secs(30), 2);
        let validator_id = ValidatorId::new();
        let key = test_key();

        let a = store.register(TargetId::new(), "https://a.example", validator_id, key);
        let b = store.register(TargetId::new(), "https://b.example", validator_id, key);
        let c = store.register(TargetId::new(), "https://c.example", validator_id, key);

        assert!(a.is_some());
        assert!(b.is_some());
        assert!(c.is_none());
        assert_eq!(store.stats().rejected.load(Ordering::Relaxed), 1);

        // Resolving one frees a slot
        store.take(a.unwrap());
        assert!(store
            .register(TargetId::new(), "https://d.example", validator_id, key)
            .is_some());
    }

    #[test]
    fn test_cap_is_per_validator() {
        let store = store(Duration::from_secs(30), 1);
        let key = test_key();

        let first = ValidatorId::new();
        let second = ValidatorId::new();

        assert!(store
            .register(TargetId::new(), "https://a.example", first, key)
            .is_some());
        assert!(store
            .register(TargetId::new(), "https://a.example", second, key)
            .is_some());
    }

    #[tokio::test]
    async fn test_remove_expired_sweeps_deadline() {
        let store = store(Duration::from_millis(10), 8);
        let validator_id = ValidatorId::new();

        let id = store
            .register(TargetId::new(), "https://example.com", validator_id, test_key())
            .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(store.remove_expired(), 1);
        assert!(!store.is_pending(&id));
        assert_eq!(store.inflight_for(&validator_id), 0);
        assert_eq!(store.stats().expired.load(Ordering::Relaxed), 1);

        // A reply arriving after eviction finds nothing
        assert!(store.take(id).is_none());
    }

    #[test]
    fn test_fresh_probe_survives_sweep() {
        let store = store(Duration::from_secs(30), 8);
        let id = store
            .register(
                TargetId::new(),
                "https://example.com",
                ValidatorId::new(),
                test_key(),
            )
            .unwrap();

        assert_eq!(store.remove_expired(), 0);
        assert!(store.is_pending(&id));
    }

    #[test]
    fn test_cancel_releases_slot() {
        let store = store(Duration::from_secs(30), 1);
        let validator_id = ValidatorId::new();
        let key = test_key();

        let id = store
            .register(TargetId::new(), "https://example.com", validator_id, key)
            .unwrap();

        assert!(store.cancel(&id));
        assert!(!store.cancel(&id));
        assert_eq!(store.inflight_for(&validator_id), 0);
        assert_eq!(store.stats().cancelled.load(Ordering::Relaxed), 1);

        // Slot is free again
        assert!(store
            .register(TargetId::new(), "https://example.com", validator_id, key)
            .is_some());
    }
}
