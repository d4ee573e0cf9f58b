//! # Integration Test Flows
//!
//! Tests that ls-01-reconciled-store, ls-02-dual-read and
//! ls-03-confirmation-poller compose correctly without the runtime.
//!
//! ## Flows Tested:
//!
//! 1. **Dual read → value store**: the verified value is what remains
//! 2. **Overlapping fetches**: a late answer of an older request never
//!    replaces a newer verified one
//! 3. **Forged list items**: a verified page removes what it disproves
//! 4. **Top-up confirmation**: processing, credited, timeout and rejection
//! 5. **Racing reads in a sync task**: a tick stays in flight until its
//!    verified read settled, and late verified failures count

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use ls_01_reconciled_store::{ApplyOutcome, ListStore, ValueStore};
    use ls_02_dual_read::{
        DeliverySink, DualReadConfig, DualReadExecutor, ReadProbe, ScriptedProbe,
    };
    use ls_03_confirmation_poller::{
        ConfirmationPoller, MockCyclesMinter, PollerConfig, TopUpConfirmation, TopUpError,
    };
    use ls_04_sync_task::{FailurePolicy, FnWork, RecordingTaskSink, SyncTask, TickHandle};
    use shared_types::{
        AccountId, Balance, CanisterId, CyclesBalance, EntityId, ReadChannel, RemoteError,
        SyncError, TaskKind, TaskStatus, Transaction, TransactionId, TrustedValue,
    };

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    /// Sink writing every admitted delivery of one request into a value store.
    struct StoreSink {
        store: Arc<ValueStore<Balance>>,
        entity: EntityId,
        request_id: u64,
        outcomes: Mutex<Vec<ApplyOutcome>>,
    }

    impl StoreSink {
        fn new(store: &Arc<ValueStore<Balance>>, request_id: u64) -> Arc<Self> {
            Arc::new(Self {
                store: Arc::clone(store),
                entity: alice(),
                request_id,
                outcomes: Mutex::new(Vec::new()),
            })
        }

        fn outcomes(&self) -> Vec<ApplyOutcome> {
            self.outcomes.lock().clone()
        }
    }

    #[async_trait]
    impl DeliverySink<Balance> for StoreSink {
        async fn on_value(&self, value: TrustedValue<Balance>) {
            let outcome = self.store.apply(self.entity.clone(), value, self.request_id);
            self.outcomes.lock().push(outcome);
        }
    }

    fn alice() -> EntityId {
        EntityId::from(&AccountId::new("alice"))
    }

    fn probe(unverified: (u64, u64), verified: (u64, u64)) -> Arc<ScriptedProbe<Balance>> {
        Arc::new(ScriptedProbe::values(
            (unverified.0, Balance::new(unverified.1)),
            (verified.0, Balance::new(verified.1)),
        ))
    }

    fn tx(id: u64, from: &str) -> Transaction {
        Transaction {
            id: TransactionId(id),
            from: AccountId::new(from),
            to: AccountId::new("alice"),
            amount_e8s: 1_000,
            fee_e8s: 10_000,
            memo: 0,
            timestamp_ms: 0,
        }
    }

    // =============================================================================
    // DUAL READ → VALUE STORE
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_fast_unverified_then_verified_ends_verified() {
        let store = Arc::new(ValueStore::new());
        let sink = StoreSink::new(&store, 1);
        let executor = DualReadExecutor::new(DualReadConfig::default());

        let report = executor
            .fetch(probe((5, 400), (20, 500)), Arc::clone(&sink))
            .await
            .settle()
            .await;

        assert_eq!(report.values, 2);
        assert_eq!(report.verified_values, 1);
        assert!(report.complete);
        assert_eq!(sink.outcomes(), vec![ApplyOutcome::Applied, ApplyOutcome::Applied]);
        assert_eq!(
            store.get(&alice()),
            Some(TrustedValue::verified(Balance::new(500)))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_unverified_never_reaches_the_store() {
        let store = Arc::new(ValueStore::new());
        let sink = StoreSink::new(&store, 1);
        let executor = DualReadExecutor::new(DualReadConfig::default());

        let report = executor
            .fetch(probe((40, 400), (5, 500)), Arc::clone(&sink))
            .await
            .settle()
            .await;

        assert_eq!(report.values, 1);
        assert_eq!(sink.outcomes(), vec![ApplyOutcome::Applied]);
        assert_eq!(
            store.get(&alice()),
            Some(TrustedValue::verified(Balance::new(500)))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_requests_keep_the_newest_verified() {
        let store = Arc::new(ValueStore::new());
        let executor = DualReadExecutor::new(DualReadConfig::default());
        let older = StoreSink::new(&store, 1);
        let newer = StoreSink::new(&store, 2);

        // Request 1 answers at 80/90 ms; request 2 starts at 20 ms and
        // answers at 30/40 ms.
        let first = executor.fetch(probe((80, 400), (90, 410)), Arc::clone(&older));
        let second = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            executor.fetch(probe((10, 450), (20, 500)), Arc::clone(&newer)).await
        };
        tokio::join!(first, second);

        assert_eq!(newer.outcomes(), vec![ApplyOutcome::Applied, ApplyOutcome::Applied]);
        assert_eq!(
            older.outcomes(),
            vec![
                ApplyOutcome::RejectedUnverified { last_verified: 2 },
                ApplyOutcome::RejectedStaleVerified { last_verified: 2 },
            ]
        );
        assert_eq!(
            store.get(&alice()),
            Some(TrustedValue::verified(Balance::new(500)))
        );
    }

    // =============================================================================
    // FORGED LIST ITEMS
    // =============================================================================

    #[test]
    fn test_verified_page_removes_forged_items() {
        let store: ListStore<Transaction> = ListStore::new();
        let id = alice();

        store.prepend(
            id.clone(),
            vec![
                TrustedValue::verified(tx(1, "bob")),
            ],
            None,
        );
        store.prepend(
            id.clone(),
            vec![
                TrustedValue::unverified(tx(1_002, "forger")),
                TrustedValue::unverified(tx(2, "bob")),
            ],
            Some(7),
        );
        assert_eq!(store.get(&id).len(), 3);

        let removed = store.reconcile_verified(id.clone(), 7, vec![tx(2, "bob")]);

        assert_eq!(removed, vec![TransactionId(1_002)]);
        let items = store.get(&id);
        assert_eq!(
            items.iter().map(|item| item.value.id).collect::<Vec<_>>(),
            vec![TransactionId(2), TransactionId(1)]
        );
        assert!(items.iter().all(|item| item.verified));
    }

    #[test]
    fn test_verified_page_keeps_later_requests_items() {
        let store: ListStore<Transaction> = ListStore::new();
        let id = alice();

        store.prepend(id.clone(), vec![TrustedValue::unverified(tx(5, "bob"))], Some(3));
        store.prepend(id.clone(), vec![TrustedValue::unverified(tx(6, "bob"))], Some(2));

        let removed = store.reconcile_verified(id.clone(), 2, Vec::new());

        assert_eq!(removed, vec![TransactionId(6)]);
        let items = store.get(&id);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].value.id, TransactionId(5));
    }

    #[test]
    fn test_next_verified_page_removes_forgery_left_by_failed_tick() {
        let store: ListStore<Transaction> = ListStore::new();
        let id = alice();

        // Tick 1 shows a forged item; its verified read fails.
        store.prepend(id.clone(), vec![TrustedValue::unverified(tx(1_007, "forger"))], Some(1));
        // Tick 2 shows nothing new and verifies the same range.
        let removed = store.reconcile_verified(id.clone(), 2, vec![tx(5, "bob")]);

        assert_eq!(removed, vec![TransactionId(1_007)]);
        let items = store.get(&id);
        assert_eq!(items.len(), 1);
        assert!(items[0].verified);
    }

    // =============================================================================
    // TOP-UP CONFIRMATION
    // =============================================================================

    fn confirmation(minter: &Arc<MockCyclesMinter>) -> TopUpConfirmation<MockCyclesMinter> {
        TopUpConfirmation::new(
            Arc::clone(minter),
            ConfirmationPoller::new(PollerConfig::for_testing()).unwrap(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_top_up_confirmed_after_processing() {
        let minter = Arc::new(MockCyclesMinter::new(2, 1_000));
        let balance = confirmation(&minter)
            .confirm(&CanisterId::new("c1"), 5)
            .await
            .unwrap();

        assert_eq!(balance, CyclesBalance::new(1_000));
        assert_eq!(minter.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_top_up_times_out_after_max_attempts() {
        let minter = Arc::new(MockCyclesMinter::new(10, 1_000));
        let result = confirmation(&minter).confirm(&CanisterId::new("c1"), 5).await;

        assert!(matches!(
            result,
            Err(TopUpError::Timeout {
                block_index: 5,
                attempts: 3
            })
        ));
        assert_eq!(minter.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_top_up_rejection_stops_polling() {
        let minter = Arc::new(MockCyclesMinter::failing());
        let result = confirmation(&minter).confirm(&CanisterId::new("c1"), 5).await;

        assert!(matches!(result, Err(TopUpError::Rejected { block_index: 5, .. })));
        assert_eq!(minter.calls(), 1);
    }

    // =============================================================================
    // RACING READS IN A SYNC TASK
    // =============================================================================

    /// Fast unverified answer; slow verified read that always fails its
    /// certificate. Tracks how many verified reads overlap.
    #[derive(Default)]
    struct FailingCertificateProbe {
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl ReadProbe<u64> for FailingCertificateProbe {
        async fn read(&self, channel: ReadChannel) -> Result<u64, RemoteError> {
            if !channel.is_verified() {
                tokio::time::sleep(Duration::from_millis(5)).await;
                return Ok(1);
            }
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(250)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            Err(RemoteError::Certificate("bad signature".to_string()))
        }
    }

    struct TickForward(TickHandle<u64>);

    #[async_trait]
    impl DeliverySink<u64> for TickForward {
        async fn on_value(&self, value: TrustedValue<u64>) {
            self.0.deliver(value).await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_racing_task_never_overlaps_and_halts_on_verified_failures() {
        let probe = Arc::new(FailingCertificateProbe::default());
        let executor = DualReadExecutor::new(DualReadConfig::racing());
        let sink = Arc::new(RecordingTaskSink::<u64>::new());
        let reads = Arc::clone(&probe);
        let task = SyncTask::new(
            TaskKind::Balance,
            100,
            FailurePolicy::for_testing(),
            Arc::new(FnWork::<_, u64>::new(move |tick: TickHandle<u64>| {
                let probe = Arc::clone(&reads);
                async move {
                    let forward = Arc::new(TickForward(tick));
                    match executor.fetch(probe, forward).await.settle().await.failure() {
                        Some(error) => Err(error),
                        None => Ok(()),
                    }
                }
            })),
            sink.clone(),
        );
        task.start();

        // Ticks at 0 and 300 ms each fail at +250 ms; the second stops the task.
        tokio::time::sleep(Duration::from_secs(3)).await;

        assert_eq!(probe.peak.load(Ordering::SeqCst), 1);
        assert_eq!(task.status(), TaskStatus::Stopped);
        let values = sink.values();
        assert_eq!(values.len(), 2);
        assert!(values.iter().all(|(_, value)| !value.verified));
        let failures = sink.failures();
        assert_eq!(failures.len(), 1);
        assert!(matches!(failures[0], (_, SyncError::VerifiedRead(_), true)));
    }
}
