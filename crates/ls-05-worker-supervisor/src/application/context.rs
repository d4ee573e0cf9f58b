//! # Worker Context
//!
//! One isolated background execution context. It owns one persistent
//! [`SyncTask`] per task kind routed to it, applies inbound commands in
//! order and publishes results over its context link.

use crate::ports::LedgerReader;
use crate::tasks::build_work;
use async_trait::async_trait;
use ls_02_dual_read::DualReadExecutor;
use ls_04_sync_task::{FailurePolicy, SyncTask, TaskSink, TickStamp};
use shared_bus::{
    ContextId, ContextPublisher, Delivery, EventPublisher, SyncData, TaskSpec, WorkerCommand,
    WorkerEvent,
};
use shared_types::{
    ErrorEnvelope, SyncError, SyncTaskDescriptor, TaskKind, TaskStatus, TrustedValue,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

/// Messages a context accepts.
#[derive(Debug)]
pub enum ContextMessage {
    /// Apply a task command.
    Command(WorkerCommand),
    /// Report the descriptors of every known task.
    Describe(oneshot::Sender<Vec<SyncTaskDescriptor>>),
    /// Stop every task and exit.
    Shutdown,
}

/// Publishes the results of this context's tasks as [`WorkerEvent`]s.
pub struct ContextSink {
    publisher: ContextPublisher,
}

impl ContextSink {
    /// Create a sink over `publisher`.
    pub fn new(publisher: ContextPublisher) -> Self {
        Self { publisher }
    }
}

#[async_trait]
impl TaskSink<SyncData> for ContextSink {
    async fn deliver(&self, stamp: TickStamp, value: TrustedValue<SyncData>) {
        self.publisher
            .publish(WorkerEvent::Delivered(Delivery {
                generation: stamp.generation,
                request_id: stamp.request_id,
                value,
            }))
            .await;
    }

    async fn fail(&self, stamp: TickStamp, error: SyncError, terminal: bool) {
        self.publisher
            .publish(WorkerEvent::Failed {
                kind: stamp.kind,
                generation: stamp.generation,
                error: ErrorEnvelope::new(&error, terminal),
            })
            .await;
    }
}

/// State of one background context.
pub struct WorkerContext {
    id: ContextId,
    tasks: BTreeMap<TaskKind, SyncTask<SyncData>>,
    reader: Arc<dyn LedgerReader>,
    executor: DualReadExecutor,
    policy: FailurePolicy,
    sink: Arc<ContextSink>,
}

impl WorkerContext {
    /// Create an empty context.
    pub fn new(
        id: ContextId,
        publisher: ContextPublisher,
        reader: Arc<dyn LedgerReader>,
        executor: DualReadExecutor,
        policy: FailurePolicy,
    ) -> Self {
        Self {
            id,
            tasks: BTreeMap::new(),
            reader,
            executor,
            policy,
            sink: Arc::new(ContextSink::new(publisher)),
        }
    }

    /// Context id.
    #[must_use]
    pub fn id(&self) -> ContextId {
        self.id
    }

    /// Apply one command. Must run inside the context's runtime.
    pub fn handle(&mut self, command: WorkerCommand) {
        debug!(context = %self.id, kind = %command.kind(), op = ?command.op(), "[ls-05] Command");
        match command {
            WorkerCommand::Start(spec) => {
                let task = self.task_for(&spec);
                if task.start().is_none() {
                    debug!(context = %self.id, kind = %spec.kind(), "[ls-05] Already running");
                }
            }
            WorkerCommand::Stop(kind) => {
                if let Some(task) = self.tasks.get(&kind) {
                    task.stop();
                }
            }
            WorkerCommand::Restart(spec) => {
                let task = self.task_for(&spec);
                task.stop();
                self.configure(&task, &spec);
                task.start();
            }
        }
    }

    /// Descriptors of every task this context has seen.
    #[must_use]
    pub fn descriptors(&self) -> Vec<SyncTaskDescriptor> {
        self.tasks.values().map(SyncTask::descriptor).collect()
    }

    /// Stop every task.
    pub fn stop_all(&self) {
        for task in self.tasks.values() {
            task.stop();
        }
    }

    /// Serve messages until shutdown or until the supervisor is gone.
    pub async fn run(mut self, mut inbox: mpsc::Receiver<ContextMessage>) {
        info!(context = %self.id, "[ls-05] Context running");
        while let Some(message) = inbox.recv().await {
            match message {
                ContextMessage::Command(command) => self.handle(command),
                ContextMessage::Describe(reply) => {
                    let _ = reply.send(self.descriptors());
                }
                ContextMessage::Shutdown => break,
            }
        }
        self.stop_all();
        info!(context = %self.id, "[ls-05] Context stopped");
    }

    /// Existing task for the spec's kind, or a new idle one configured from
    /// it. A stopped task picks up the spec's parameters.
    fn task_for(&mut self, spec: &TaskSpec) -> SyncTask<SyncData> {
        if let Some(task) = self.tasks.get(&spec.kind()) {
            let task = task.clone();
            if task.status() != TaskStatus::Running {
                self.configure(&task, spec);
            }
            return task;
        }
        let work = build_work(&spec.params, Arc::clone(&self.reader), self.executor);
        let task = SyncTask::new(
            spec.kind(),
            spec.interval_ms,
            self.policy,
            work,
            Arc::clone(&self.sink) as Arc<dyn TaskSink<SyncData>>,
        );
        self.tasks.insert(spec.kind(), task.clone());
        task
    }

    fn configure(&self, task: &SyncTask<SyncData>, spec: &TaskSpec) {
        task.set_work(build_work(&spec.params, Arc::clone(&self.reader), self.executor));
        task.set_interval_ms(spec.interval_ms);
    }
}
