//! # End-to-End Sync
//!
//! Runs the whole client (context, supervisor, tasks, store binding,
//! snapshots) against the simulated ledger.
//!
//! ## Scenarios
//!
//! - Forged unverified reads never outlive the verified read of their tick
//! - A failing certificate surfaces as a verified-read error
//! - Snapshots persisted on shutdown seed the next start
//! - A domain registration settles and its task stops itself
//! - Thread-isolated contexts deliver like task-isolated ones

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use ls_05_worker_supervisor::{Isolation, SupervisorConfig};
    use shared_types::{
        AccountId, Balance, CanisterId, EntityId, ErrorCategory, RegistrationState, TaskKind,
        TrustedValue,
    };
    use sync_runtime::{SimulatedLedger, SyncConfig, SyncContext, SyncRuntime, TRANSFER_FEE_E8S};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    /// One synced account, so each balance tick is a single dual read.
    fn start_config() -> SyncConfig {
        SyncConfig::for_testing()
    }

    fn runtime(config: SyncConfig) -> (Arc<SimulatedLedger>, SyncRuntime) {
        let ledger = Arc::new(SimulatedLedger::seeded(&config));
        ledger
            .transfer(&AccountId::new("alice"), &AccountId::new("bob"), 100_000_000, 0)
            .unwrap();
        let context = SyncContext::build(config, ledger.clone(), ledger.clone()).unwrap();
        (ledger, SyncRuntime::new(context))
    }

    fn account(name: &str) -> EntityId {
        EntityId::from(&AccountId::new(name))
    }

    /// Alice's balance after the transfer to bob.
    fn alice_seeded_balance() -> Balance {
        Balance::new(10_000_000_000 - 100_000_000 - TRANSFER_FEE_E8S)
    }

    // =============================================================================
    // VERIFIED-STICKY RECONCILIATION
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_forged_reads_never_survive_a_verified_tick() {
        let mut config = start_config();
        config.ledger.forge_probability = 1.0;
        let (ledger, runtime) = runtime(config);
        runtime.start().await.unwrap();

        // Ticks every 100 ms; unverified answers at +10 ms, verified at +50 ms.
        tokio::time::sleep(Duration::from_millis(480)).await;

        let state = runtime.context().state();
        assert_eq!(
            state.balances.get(&account("alice")),
            Some(TrustedValue::verified(alice_seeded_balance()))
        );
        let history = state.transactions.get(&account("alice"));
        assert_eq!(history.len(), 1);
        assert!(history.iter().all(|tx| tx.verified));
        assert!(history.iter().all(|tx| tx.value.from != AccountId::new("forger")));
        assert!(ledger.unverified_calls() > 0);

        runtime.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_certificate_failure_surfaces_verified_error() {
        let (ledger, runtime) = runtime(start_config());
        ledger.set_corrupt_certificates(true);
        runtime.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(480)).await;

        let state = runtime.context().state();
        let error = state.last_error(TaskKind::Balance).unwrap();
        assert!(error.verified);
        assert_eq!(error.category, ErrorCategory::VerifiedRead);
        let alice = state.balances.get(&account("alice")).unwrap();
        assert!(!alice.verified);
        assert!(runtime.summary().failing.contains(&TaskKind::Balance));

        runtime.shutdown().await.unwrap();
    }

    // =============================================================================
    // SNAPSHOTS
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_snapshots_seed_the_next_start() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = start_config();
        config.snapshot_path = Some(dir.path().join("snapshots.json"));

        let (_ledger, first) = runtime(config.clone());
        first.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(480)).await;
        assert!(first.shutdown().await.unwrap() > 0);
        drop(first);

        let (_ledger, second) = runtime(config);
        second.start().await.unwrap();
        let entry = second
            .context()
            .state()
            .balances
            .entry(&account("alice"))
            .unwrap();
        assert!(entry.hydrated);
        assert_eq!(entry.value, TrustedValue::verified(alice_seeded_balance()));

        tokio::time::sleep(Duration::from_millis(480)).await;
        let entry = second
            .context()
            .state()
            .balances
            .entry(&account("alice"))
            .unwrap();
        assert!(!entry.hydrated);

        second.shutdown().await.unwrap();
    }

    // =============================================================================
    // REGISTRATION AND TOP-UP
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_registration_settles_and_top_up_confirms() {
        let mut config = start_config();
        config.custom_domain = Some("ledger.example.org".to_string());
        config.top_up_block = Some(9);
        let (_ledger, runtime) = runtime(config);
        runtime.start().await.unwrap();

        let canister = CanisterId::new("c1");
        let balance = runtime.confirm_top_up(&canister, 9).await.unwrap();
        assert!(balance.cycles > 0);
        assert_eq!(
            runtime.context().state().cycles.get(&EntityId::from(&canister)),
            Some(TrustedValue::verified(balance))
        );

        tokio::time::sleep(Duration::from_secs(2)).await;
        let state = runtime.context().state();
        assert!(state.registration_settled("ledger.example.org"));
        assert_eq!(
            state
                .registrations
                .get(&EntityId::new("ledger.example.org"))
                .map(|r| r.value),
            Some(RegistrationState::Available)
        );

        runtime.shutdown().await.unwrap();
    }

    // =============================================================================
    // ISOLATION
    // =============================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_thread_isolated_contexts_deliver() {
        let mut config = start_config();
        config.supervisor = SupervisorConfig {
            isolation: Isolation::Thread,
            ..SupervisorConfig::for_testing()
        };
        let (_ledger, runtime) = runtime(config);
        runtime.start().await.unwrap();

        let mut verified = false;
        for _ in 0..40 {
            tokio::time::sleep(Duration::from_millis(50)).await;
            verified = runtime
                .context()
                .state()
                .balances
                .get(&account("alice"))
                .is_some_and(|value| value.verified);
            if verified {
                break;
            }
        }
        assert!(verified);

        runtime.shutdown().await.unwrap();
    }
}
