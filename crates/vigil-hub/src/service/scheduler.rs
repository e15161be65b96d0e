//! Dispatch scheduler.
//!
//! On a fixed period, loads the enabled targets and fans one validate
//! request out to every registered validator per target. Ticks are
//! independent: each runs as its own task, every dispatched request is
//! individually correlated, and a stalled tick never blocks the timer.

use crate::domain::pending;
use crate::ports::outbound::{FrameSink, StorageGateway};
use crate::service::HubService;
use shared_types::{HubFrame, ValidateRequest};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

impl<S, F> HubService<S, F>
where
    S: StorageGateway + 'static,
    F: FrameSink + 'static,
{
    /// One fan-out pass over targets × registered validators.
    ///
    /// A failed target-list fetch skips the whole tick; it is retried at the
    /// next period rather than immediately, so a storage outage never turns
    /// into a tight loop. Zero targets or zero validators are normal idle
    /// states.
    pub async fn dispatch_tick(&self) {
        let targets = match self.storage().list_enabled_targets().await {
            Ok(targets) => targets,
            Err(err) => {
                error!(error = %err, "Skipping dispatch tick: target list unavailable");
                return;
            }
        };
        if targets.is_empty() {
            return;
        }

        let validators = self.registry().snapshot();
        if validators.is_empty() {
            return;
        }

        let mut dispatched = 0usize;
        for target in &targets {
            for validator in &validators {
                let Some(callback_id) = self.pending().register(
                    target.id,
                    &target.url,
                    validator.validator_id,
                    validator.public_key,
                ) else {
                    continue; // at in-flight capacity, logged by the store
                };

                let frame = HubFrame::ValidateRequest(ValidateRequest {
                    url: target.url.clone(),
                    callback_id,
                    website_id: target.id,
                });

                if let Err(err) = self.sink().send(validator.connection, &frame) {
                    // The reply can never arrive; reclaim the probe now
                    // instead of leaving it for the sweep.
                    debug!(
                        connection = %validator.connection,
                        validator_id = %validator.validator_id,
                        error = %err,
                        "Cancelling probe: validate request undeliverable"
                    );
                    self.pending().cancel(&callback_id);
                    continue;
                }

                dispatched += 1;
            }
        }

        debug!(
            targets = targets.len(),
            validators = validators.len(),
            dispatched,
            "Dispatch tick complete"
        );
    }

    /// Spawn the periodic dispatch loop and the probe expiry sweeper.
    ///
    /// The returned handles run until aborted; the hub has no orderly
    /// shutdown beyond dropping them.
    pub fn spawn_background_tasks(self: &Arc<Self>) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();

        let service = Arc::clone(self);
        let period = self.config().dispatch.interval();
        handles.push(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // interval's first tick completes immediately; consume it so the
            // first dispatch happens one full period after startup.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let tick_service = Arc::clone(&service);
                tokio::spawn(async move {
                    tick_service.dispatch_tick().await;
                });
            }
        }));

        handles.push(tokio::spawn(pending::sweep_task(
            Arc::clone(self.pending()),
            self.config().probes.sweep_interval(),
        )));

        handles
    }
}
