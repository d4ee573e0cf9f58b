//! # Worker Supervisor
//!
//! Owns the background contexts, routes task commands to them by kind and
//! demultiplexes their events to the handlers registered per kind.
//!
//! Kinds are spread over the contexts by `kind.index() % contexts`, so one
//! context multiplexes several unrelated kinds. Events of one context
//! arrive in the order it sent them; there is no order across contexts.

use crate::application::context::{ContextMessage, WorkerContext};
use crate::config::{Isolation, SupervisorConfig};
use crate::domain::SupervisorError;
use crate::ports::{EventHandler, LedgerReader};
use ls_02_dual_read::DualReadExecutor;
use ls_04_sync_task::FailurePolicy;
use parking_lot::{Mutex, RwLock};
use shared_bus::{
    decode_command, event_channel, ContextId, Subscription, TaskSpec, WorkerCommand,
};
use shared_types::{SyncTaskDescriptor, TaskKind};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use sync_telemetry::SUPERVISOR_EVENTS_ROUTED;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Time the demultiplexer gets to drain trailing events on shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

type HandlerMap = HashMap<TaskKind, Vec<Arc<dyn EventHandler>>>;

enum Runner {
    Thread(std::thread::JoinHandle<()>),
    Task(JoinHandle<()>),
}

struct ContextLink {
    id: ContextId,
    inbox: mpsc::Sender<ContextMessage>,
    runner: Mutex<Option<Runner>>,
}

/// Front door of the background sync machinery.
pub struct WorkerSupervisor {
    config: SupervisorConfig,
    contexts: Vec<ContextLink>,
    handlers: Arc<RwLock<HandlerMap>>,
    demux: Mutex<Option<JoinHandle<()>>>,
    routed: Arc<AtomicU64>,
}

impl WorkerSupervisor {
    /// Spawn the contexts and the demultiplexer. Must be called inside a
    /// tokio runtime.
    pub fn spawn(
        config: SupervisorConfig,
        reader: Arc<dyn LedgerReader>,
        executor: DualReadExecutor,
        policy: FailurePolicy,
    ) -> Result<Self, SupervisorError> {
        config.validate()?;
        policy.validate()?;

        let (hub, subscription) = event_channel(config.channel_capacity);
        let mut contexts = Vec::with_capacity(config.contexts);
        for index in 0..config.contexts {
            let id = ContextId(index);
            let (inbox, commands) = mpsc::channel(config.channel_capacity);
            let context = WorkerContext::new(
                id,
                hub.publisher(id),
                Arc::clone(&reader),
                executor,
                policy,
            );
            let runner = spawn_context(config.isolation, context, commands)?;
            contexts.push(ContextLink {
                id,
                inbox,
                runner: Mutex::new(Some(runner)),
            });
        }
        drop(hub);

        let handlers: Arc<RwLock<HandlerMap>> = Arc::new(RwLock::new(HashMap::new()));
        let routed = Arc::new(AtomicU64::new(0));
        let demux = tokio::spawn(demultiplex(
            subscription,
            Arc::clone(&handlers),
            Arc::clone(&routed),
        ));

        info!(
            contexts = config.contexts,
            isolation = %config.isolation,
            "[ls-05] Worker supervisor started"
        );
        Ok(Self {
            config,
            contexts,
            handlers,
            demux: Mutex::new(Some(demux)),
            routed,
        })
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    /// Context that runs `kind`.
    #[must_use]
    pub fn context_for(&self, kind: TaskKind) -> ContextId {
        ContextId(kind.index() % self.contexts.len())
    }

    /// Register a handler for the events of `kind`.
    pub fn on(&self, kind: TaskKind, handler: Arc<dyn EventHandler>) {
        self.handlers.write().entry(kind).or_default().push(handler);
    }

    /// Events handed to at least one handler so far.
    #[must_use]
    pub fn events_routed(&self) -> u64 {
        self.routed.load(Ordering::Relaxed)
    }

    /// Route a command to the context owning its kind.
    pub async fn send(&self, command: WorkerCommand) -> Result<(), SupervisorError> {
        let link = &self.contexts[self.context_for(command.kind()).0];
        debug!(context = %link.id, kind = %command.kind(), op = ?command.op(), "[ls-05] Routing command");
        link.inbox
            .send(ContextMessage::Command(command))
            .await
            .map_err(|_| SupervisorError::ContextGone(link.id))
    }

    /// Start a task; a no-op if it is already running.
    pub async fn start(&self, spec: TaskSpec) -> Result<(), SupervisorError> {
        self.send(WorkerCommand::Start(spec)).await
    }

    /// Stop a task.
    pub async fn stop(&self, kind: TaskKind) -> Result<(), SupervisorError> {
        self.send(WorkerCommand::Stop(kind)).await
    }

    /// Restart a task with fresh parameters.
    pub async fn restart(&self, spec: TaskSpec) -> Result<(), SupervisorError> {
        self.send(WorkerCommand::Restart(spec)).await
    }

    /// Route a JSON-encoded command. Returns `false` for an unknown kind,
    /// which is ignored.
    pub async fn send_wire(&self, json: &str) -> Result<bool, SupervisorError> {
        match decode_command(json)? {
            Some(command) => {
                self.send(command).await?;
                Ok(true)
            }
            None => {
                debug!("[ls-05] Ignoring command of unknown kind");
                Ok(false)
            }
        }
    }

    /// Descriptors of every task, across all contexts.
    pub async fn descriptors(&self) -> Result<Vec<SyncTaskDescriptor>, SupervisorError> {
        let mut all = Vec::new();
        for link in &self.contexts {
            let (reply, answer) = oneshot::channel();
            link.inbox
                .send(ContextMessage::Describe(reply))
                .await
                .map_err(|_| SupervisorError::ContextGone(link.id))?;
            all.extend(
                answer
                    .await
                    .map_err(|_| SupervisorError::ContextGone(link.id))?,
            );
        }
        Ok(all)
    }

    /// Stop every task, wait for the contexts to exit and drain trailing
    /// events. Idempotent.
    pub async fn shutdown(&self) -> Result<(), SupervisorError> {
        let mut result = Ok(());
        for link in &self.contexts {
            let _ = link.inbox.send(ContextMessage::Shutdown).await;
            let runner = link.runner.lock().take();
            let joined = match runner {
                Some(Runner::Task(handle)) => handle.await.is_ok(),
                Some(Runner::Thread(handle)) => {
                    tokio::task::spawn_blocking(move || handle.join().is_ok())
                        .await
                        .unwrap_or(false)
                }
                None => true,
            };
            if !joined {
                error!(context = %link.id, "[ls-05] Context panicked");
                result = Err(SupervisorError::Panicked(link.id));
            }
        }

        let demux = self.demux.lock().take();
        if let Some(mut demux) = demux {
            if tokio::time::timeout(SHUTDOWN_GRACE, &mut demux).await.is_err() {
                warn!("[ls-05] Event link still open after shutdown, aborting");
                demux.abort();
            }
        }
        info!(events_routed = self.events_routed(), "[ls-05] Worker supervisor stopped");
        result
    }
}

fn spawn_context(
    isolation: Isolation,
    context: WorkerContext,
    commands: mpsc::Receiver<ContextMessage>,
) -> Result<Runner, SupervisorError> {
    let id = context.id();
    match isolation {
        Isolation::Task => Ok(Runner::Task(tokio::spawn(context.run(commands)))),
        Isolation::Thread => {
            let spawn_error = |err: std::io::Error| SupervisorError::Spawn {
                context: id,
                message: err.to_string(),
            };
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .thread_name(format!("ls-{id}"))
                .build()
                .map_err(spawn_error)?;
            let handle = std::thread::Builder::new()
                .name(format!("ls-{id}"))
                .spawn(move || runtime.block_on(context.run(commands)))
                .map_err(spawn_error)?;
            Ok(Runner::Thread(handle))
        }
    }
}

async fn demultiplex(
    mut subscription: Subscription,
    handlers: Arc<RwLock<HandlerMap>>,
    routed: Arc<AtomicU64>,
) {
    while let Some(envelope) = subscription.recv().await {
        let kind = envelope.event.kind();
        let targets = handlers.read().get(&kind).cloned().unwrap_or_default();
        if targets.is_empty() {
            debug!(kind = %kind, "[ls-05] No handler for event");
            continue;
        }
        for handler in &targets {
            handler.handle(&envelope);
        }
        routed.fetch_add(1, Ordering::Relaxed);
        SUPERVISOR_EVENTS_ROUTED
            .with_label_values(&[kind.as_str()])
            .inc();
    }
    debug!("[ls-05] Event link closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::MockLedgerReader;
    use shared_bus::{encode_command, BalanceParams, CyclesParams, Envelope, SyncData, TaskParams, WorkerEvent};
    use shared_types::{AccountId, Balance, CanisterId, Generation, TaskStatus};

    type Log = Arc<Mutex<Vec<WorkerEvent>>>;

    fn balance_spec(account: &str, interval_ms: u64) -> TaskSpec {
        TaskSpec::new(
            TaskParams::Balance(BalanceParams {
                accounts: vec![AccountId::new(account)],
            }),
            interval_ms,
        )
    }

    fn recorder(supervisor: &WorkerSupervisor, kind: TaskKind) -> Log {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        supervisor.on(
            kind,
            Arc::new(move |envelope: &Envelope| sink.lock().push(envelope.event.clone())),
        );
        log
    }

    fn spawn(reader: MockLedgerReader) -> WorkerSupervisor {
        WorkerSupervisor::spawn(
            SupervisorConfig::for_testing(),
            Arc::new(reader),
            DualReadExecutor::default(),
            FailurePolicy::for_testing(),
        )
        .unwrap()
    }

    fn balances(log: &Log) -> Vec<(u64, bool, Generation)> {
        log.lock()
            .iter()
            .filter_map(|event| match event {
                WorkerEvent::Delivered(delivery) => match &delivery.value.value {
                    SyncData::Balance(update) => Some((
                        update.balance.e8s,
                        delivery.value.verified,
                        delivery.generation,
                    )),
                    _ => None,
                },
                WorkerEvent::Failed { .. } => None,
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_balance_delivers_unverified_then_verified() {
        let reader = MockLedgerReader::with_delays(10, 50);
        reader.set_balance(&AccountId::new("alice"), 500);
        reader.set_unverified_balance(&AccountId::new("alice"), 400);
        let supervisor = spawn(reader);
        let log = recorder(&supervisor, TaskKind::Balance);

        supervisor.start(balance_spec("alice", 10_000)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(
            balances(&log),
            vec![(400, false, Generation(1)), (500, true, Generation(1))]
        );
        assert_eq!(supervisor.events_routed(), 2);
        supervisor.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_bumps_generation_and_params() {
        let reader = MockLedgerReader::with_delays(1, 5);
        reader.set_balance(&AccountId::new("alice"), 1);
        reader.set_balance(&AccountId::new("bob"), 2);
        let supervisor = spawn(reader);
        let log = recorder(&supervisor, TaskKind::Balance);

        supervisor.start(balance_spec("alice", 10_000)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        supervisor.restart(balance_spec("bob", 10_000)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let seen = balances(&log);
        assert_eq!(seen.first(), Some(&(1, false, Generation(1))));
        assert_eq!(seen.last(), Some(&(2, true, Generation(2))));
        supervisor.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_while_running_is_noop() {
        let reader = MockLedgerReader::new();
        reader.set_balance(&AccountId::new("alice"), 7);
        let supervisor = spawn(reader);

        supervisor.start(balance_spec("alice", 10_000)).await.unwrap();
        supervisor.start(balance_spec("alice", 10_000)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let descriptors = supervisor.descriptors().await.unwrap();
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].generation, Generation(1));
        assert_eq!(descriptors[0].status, TaskStatus::Running);
        supervisor.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_deliveries() {
        let reader = MockLedgerReader::new();
        reader.set_balance(&AccountId::new("alice"), 7);
        let supervisor = spawn(reader);
        let log = recorder(&supervisor, TaskKind::Balance);

        supervisor.start(balance_spec("alice", 1_000)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        supervisor.stop(TaskKind::Balance).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        let seen = log.lock().len();

        tokio::time::sleep(Duration::from_millis(5_000)).await;
        assert_eq!(log.lock().len(), seen);
        let descriptors = supervisor.descriptors().await.unwrap();
        assert_eq!(descriptors[0].status, TaskStatus::Stopped);
        supervisor.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_wire_commands() {
        let reader = MockLedgerReader::with_delays(1, 5);
        reader.set_cycles(&CanisterId::new("c1"), 9);
        let supervisor = spawn(reader);
        let log = recorder(&supervisor, TaskKind::Cycles);

        let unknown = r#"{"kind":"staking-rewards","op":"start","payload":{}}"#;
        assert!(!supervisor.send_wire(unknown).await.unwrap());

        let start = WorkerCommand::Start(TaskSpec::new(
            TaskParams::Cycles(CyclesParams {
                canisters: vec![CanisterId::new("c1")],
            }),
            10_000,
        ));
        let json = encode_command(&start).unwrap();
        assert!(supervisor.send_wire(&json).await.unwrap());
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(log.lock().len(), 2);
        assert!(supervisor.send_wire("not json").await.is_err());
        supervisor.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_reach_only_their_kind() {
        let reader = MockLedgerReader::with_delays(1, 5);
        reader.set_balance(&AccountId::new("alice"), 3);
        let supervisor = spawn(reader);
        let balance_log = recorder(&supervisor, TaskKind::Balance);
        let cycles_log = recorder(&supervisor, TaskKind::Cycles);

        supervisor.start(balance_spec("alice", 10_000)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(balance_log.lock().len(), 2);
        assert!(cycles_log.lock().is_empty());
        assert_eq!(balances(&balance_log).last().map(|b| b.0), Some(Balance::new(3).e8s));
        supervisor.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_context_assignment() {
        let supervisor = spawn(MockLedgerReader::new());
        assert_eq!(supervisor.context_for(TaskKind::Balance), ContextId(0));
        assert_eq!(supervisor.context_for(TaskKind::Transactions), ContextId(1));
        assert_eq!(supervisor.context_for(TaskKind::Cycles), ContextId(0));
        supervisor.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_thread_isolation_round_trip() {
        let reader = MockLedgerReader::with_delays(1, 20);
        reader.set_balance(&AccountId::new("alice"), 11);
        let config = SupervisorConfig {
            contexts: 1,
            isolation: Isolation::Thread,
            ..SupervisorConfig::for_testing()
        };
        let supervisor = WorkerSupervisor::spawn(
            config,
            Arc::new(reader),
            DualReadExecutor::default(),
            FailurePolicy::for_testing(),
        )
        .unwrap();
        let log = recorder(&supervisor, TaskKind::Balance);

        supervisor.start(balance_spec("alice", 60_000)).await.unwrap();
        for _ in 0..200 {
            if log.lock().len() >= 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(balances(&log).last(), Some(&(11, true, Generation(1))));
        supervisor.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let supervisor = spawn(MockLedgerReader::new());
        supervisor.shutdown().await.unwrap();
        supervisor.shutdown().await.unwrap();
        assert!(supervisor.start(balance_spec("alice", 1_000)).await.is_err());
    }
}
