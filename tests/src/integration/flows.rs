//! # Integration Test Flows
//!
//! Drives the hub service and the validator agent against each other with
//! real serialized frames: signup handshake, dispatch fan-out, signed reply
//! reconciliation, and the failure paths between them.
//!
//! The hub runs over its in-memory storage gateway and a recording sink;
//! the "network" is the test moving JSON strings between the two sides.

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;

    use shared_types::{HubFrame, UptimeStatus, ValidatorFrame};
    use vigil_hub::{
        ConnectionId, HubConfig, HubService, InMemoryStorage, RecordingSink,
    };
    use vigil_validator::{ProbeOutcome, UptimeProbe, ValidatorAgent};

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    type TestHub = HubService<InMemoryStorage, RecordingSink>;

    /// Probe that reports a scripted outcome without touching the network.
    struct StaticProbe(ProbeOutcome);

    #[async_trait]
    impl UptimeProbe for StaticProbe {
        async fn check(&self, _url: &str) -> ProbeOutcome {
            self.0
        }
    }

    fn probe(status: UptimeStatus, latency_ms: u64) -> StaticProbe {
        StaticProbe(ProbeOutcome { status, latency_ms })
    }

    fn hub() -> (Arc<TestHub>, Arc<InMemoryStorage>, Arc<RecordingSink>) {
        hub_with_config(HubConfig::default())
    }

    fn hub_with_config(
        config: HubConfig,
    ) -> (Arc<TestHub>, Arc<InMemoryStorage>, Arc<RecordingSink>) {
        let storage = Arc::new(InMemoryStorage::new());
        let sink = Arc::new(RecordingSink::new());
        let service = Arc::new(HubService::new(
            config,
            Arc::clone(&storage),
            Arc::clone(&sink),
        ));
        (service, storage, sink)
    }

    /// Serialize a validator frame and feed it to the hub.
    async fn deliver_to_hub(service: &TestHub, connection: ConnectionId, frame: &ValidatorFrame) {
        let raw = serde_json::to_string(frame).unwrap();
        service.handle_frame(connection, &raw).await;
    }

    /// Run the full signup handshake for a fresh agent.
    async fn signed_up_agent(
        service: &TestHub,
        sink: &RecordingSink,
    ) -> (ValidatorAgent, ConnectionId) {
        let agent = ValidatorAgent::generate();
        let connection = ConnectionId::new();

        deliver_to_hub(service, connection, &agent.signup_frame("203.0.113.7")).await;

        let ack = sink
            .sent_to(connection)
            .pop()
            .expect("hub should ack a verified signup");
        let reply = agent.handle_frame(ack, &probe(UptimeStatus::Up, 1)).await;
        assert!(reply.is_none(), "signup ack produces no outbound frame");
        assert!(agent.validator_id().is_some());

        (agent, connection)
    }

    /// Pull the latest validate request the hub sent to `connection`.
    fn latest_validate_request(sink: &RecordingSink, connection: ConnectionId) -> HubFrame {
        sink.sent_to(connection)
            .into_iter()
            .rev()
            .find(|frame| matches!(frame, HubFrame::ValidateRequest(_)))
            .expect("hub should have dispatched a validate request")
    }

    // =========================================================================
    // SIGNUP FLOW
    // =========================================================================

    /// Signup handshake: verified frame, identity assigned, ack adopted.
    #[tokio::test]
    async fn test_signup_handshake_end_to_end() {
        let (service, storage, sink) = hub();

        let (agent, _connection) = signed_up_agent(&service, &sink).await;

        let rows = storage.validators();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].public_key, agent.public_key_hex());
        assert_eq!(agent.validator_id(), Some(rows[0].id));
        assert_eq!(service.registry().len(), 1);
    }

    /// Reconnecting with the same key recalls the same identity and leaves
    /// exactly one live registration.
    #[tokio::test]
    async fn test_reconnect_recalls_identity_and_evicts_stale_entry() {
        let (service, storage, sink) = hub();
        let (agent, first_connection) = signed_up_agent(&service, &sink).await;
        let first_id = agent.validator_id().unwrap();

        // Same key, new connection, fresh handshake
        let second_connection = ConnectionId::new();
        deliver_to_hub(&service, second_connection, &agent.signup_frame("203.0.113.7")).await;

        assert_eq!(storage.validators().len(), 1, "no duplicate row");
        assert_eq!(service.registry().len(), 1, "stale entry evicted");
        let live = &service.registry().snapshot()[0];
        assert_eq!(live.connection, second_connection);
        assert_ne!(live.connection, first_connection);
        assert_eq!(live.validator_id, first_id);
    }

    // =========================================================================
    // DISPATCH + RECONCILIATION FLOW
    // =========================================================================

    /// One validator, one target, an `UP/120` reply inside the window:
    /// exactly one observation and exactly one reward credit.
    #[tokio::test]
    async fn test_happy_path_observation_and_payout() {
        let (service, storage, sink) = hub();
        let target = storage.seed_target("https://example.com");
        let (agent, connection) = signed_up_agent(&service, &sink).await;

        service.dispatch_tick().await;

        let request = latest_validate_request(&sink, connection);
        match &request {
            HubFrame::ValidateRequest(req) => {
                assert_eq!(req.url, "https://example.com");
                assert_eq!(req.website_id, target.id);
            }
            other => panic!("expected validate request, got {other:?}"),
        }

        let reply = agent
            .handle_frame(request, &probe(UptimeStatus::Up, 120))
            .await
            .expect("agent should answer a validate request");
        deliver_to_hub(&service, connection, &reply).await;

        let observations = storage.observations();
        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].status, UptimeStatus::Up);
        assert_eq!(observations[0].latency_ms, 120);
        assert_eq!(observations[0].target_id, target.id);

        let validator_id = agent.validator_id().unwrap();
        assert_eq!(observations[0].validator_id, validator_id);
        assert_eq!(storage.validator(validator_id).unwrap().pending_payouts, 100);

        // Probe consumed
        assert_eq!(service.pending().pending_count(), 0);
    }

    /// A structurally identical duplicate of the reply is a no-op.
    #[tokio::test]
    async fn test_duplicate_reply_creates_one_observation() {
        let (service, storage, sink) = hub();
        storage.seed_target("https://example.com");
        let (agent, connection) = signed_up_agent(&service, &sink).await;

        service.dispatch_tick().await;
        let request = latest_validate_request(&sink, connection);
        let reply = agent
            .handle_frame(request, &probe(UptimeStatus::Up, 80))
            .await
            .unwrap();

        deliver_to_hub(&service, connection, &reply).await;
        deliver_to_hub(&service, connection, &reply).await;

        assert_eq!(storage.observations().len(), 1);
        let validator_id = agent.validator_id().unwrap();
        assert_eq!(storage.validator(validator_id).unwrap().pending_payouts, 100);
    }

    /// A reply signed by a key other than the dispatched validator's writes
    /// nothing, even though the frame is otherwise well-formed.
    #[tokio::test]
    async fn test_forged_reply_is_discarded() {
        let (service, storage, sink) = hub();
        storage.seed_target("https://example.com");
        let (agent, connection) = signed_up_agent(&service, &sink).await;

        service.dispatch_tick().await;
        let request = latest_validate_request(&sink, connection);

        // A different agent answers the request with its own key but the
        // victim's claimed identity.
        let imposter = ValidatorAgent::generate();
        let imposter_signup = imposter.signup_frame("203.0.113.99");
        match &imposter_signup {
            ValidatorFrame::Signup(request) => {
                // Self-ack the imposter so it will answer validate requests
                let ack = HubFrame::SignupAck(shared_types::SignupAck {
                    validator_id: agent.validator_id().unwrap(),
                    callback_id: request.callback_id,
                });
                imposter.handle_frame(ack, &probe(UptimeStatus::Up, 1)).await;
            }
            other => panic!("expected signup frame, got {other:?}"),
        }

        let forged = imposter
            .handle_frame(request, &probe(UptimeStatus::Up, 5))
            .await
            .unwrap();
        deliver_to_hub(&service, connection, &forged).await;

        assert!(storage.observations().is_empty());
        let validator_id = agent.validator_id().unwrap();
        assert_eq!(storage.validator(validator_id).unwrap().pending_payouts, 0);
    }

    /// Two validators, one target: independent correlation IDs, replies
    /// reconcile regardless of arrival order.
    #[tokio::test]
    async fn test_two_validators_resolve_out_of_order() {
        let (service, storage, sink) = hub();
        storage.seed_target("https://example.com");
        let (first, first_conn) = signed_up_agent(&service, &sink).await;
        let (second, second_conn) = signed_up_agent(&service, &sink).await;

        service.dispatch_tick().await;

        let first_request = latest_validate_request(&sink, first_conn);
        let second_request = latest_validate_request(&sink, second_conn);

        let first_cb = match &first_request {
            HubFrame::ValidateRequest(req) => req.callback_id,
            other => panic!("expected validate request, got {other:?}"),
        };
        let second_cb = match &second_request {
            HubFrame::ValidateRequest(req) => req.callback_id,
            other => panic!("expected validate request, got {other:?}"),
        };
        assert_ne!(first_cb, second_cb);

        let first_reply = first
            .handle_frame(first_request, &probe(UptimeStatus::Up, 40))
            .await
            .unwrap();
        let second_reply = second
            .handle_frame(second_request, &probe(UptimeStatus::Down, 900))
            .await
            .unwrap();

        // Deliver in reverse dispatch order
        deliver_to_hub(&service, second_conn, &second_reply).await;
        deliver_to_hub(&service, first_conn, &first_reply).await;

        let observations = storage.observations();
        assert_eq!(observations.len(), 2);

        let first_id = first.validator_id().unwrap();
        let second_id = second.validator_id().unwrap();
        assert!(observations
            .iter()
            .any(|o| o.validator_id == first_id && o.status == UptimeStatus::Up));
        assert!(observations
            .iter()
            .any(|o| o.validator_id == second_id && o.status == UptimeStatus::Down));
        assert_eq!(storage.validator(first_id).unwrap().pending_payouts, 100);
        assert_eq!(storage.validator(second_id).unwrap().pending_payouts, 100);
    }

    // =========================================================================
    // TIMEOUT / DISCONNECT FLOWS
    // =========================================================================

    /// A validator that disconnects before replying leaves no state behind
    /// once the sweep runs; its late reply is a silent miss.
    #[tokio::test]
    async fn test_disconnect_before_reply_leaves_nothing() {
        let mut config = HubConfig::default();
        config.probes.timeout_ms = 20;
        let (service, storage, sink) = hub_with_config(config);
        storage.seed_target("https://example.com");
        let (agent, connection) = signed_up_agent(&service, &sink).await;

        service.dispatch_tick().await;
        let request = latest_validate_request(&sink, connection);
        assert_eq!(service.pending().pending_count(), 1);

        // Connection drops; registration goes, probe stays for the sweep
        service.handle_disconnect(connection);
        assert!(service.registry().is_empty());
        assert_eq!(service.pending().pending_count(), 1);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(service.pending().remove_expired(), 1);
        assert_eq!(service.pending().pending_count(), 0);

        // The reply straggles in after eviction
        let late = agent
            .handle_frame(request, &probe(UptimeStatus::Up, 10))
            .await
            .unwrap();
        deliver_to_hub(&service, connection, &late).await;

        assert!(storage.observations().is_empty());
        let validator_id = agent.validator_id().unwrap();
        assert_eq!(storage.validator(validator_id).unwrap().pending_payouts, 0);
    }

    // =========================================================================
    // ATOMICITY
    // =========================================================================

    /// Under an injected storage failure mid-reconciliation, neither the
    /// observation nor the payout becomes visible.
    #[tokio::test]
    async fn test_reconciliation_is_atomic_under_storage_failure() {
        let (service, storage, sink) = hub();
        storage.seed_target("https://example.com");
        let (agent, connection) = signed_up_agent(&service, &sink).await;

        service.dispatch_tick().await;
        let request = latest_validate_request(&sink, connection);
        let reply = agent
            .handle_frame(request, &probe(UptimeStatus::Up, 120))
            .await
            .unwrap();

        storage.set_observation_failure(true);
        deliver_to_hub(&service, connection, &reply).await;

        assert!(storage.observations().is_empty());
        let validator_id = agent.validator_id().unwrap();
        assert_eq!(storage.validator(validator_id).unwrap().pending_payouts, 0);

        // The probe was consumed either way; the next tick re-probes
        storage.set_observation_failure(false);
        service.dispatch_tick().await;
        let retry = latest_validate_request(&sink, connection);
        let retry_reply = agent
            .handle_frame(retry, &probe(UptimeStatus::Up, 95))
            .await
            .unwrap();
        deliver_to_hub(&service, connection, &retry_reply).await;

        assert_eq!(storage.observations().len(), 1);
        assert_eq!(storage.validator(validator_id).unwrap().pending_payouts, 100);
    }
}
