//! The reference worker runtime.
//!
//! A minimal, concrete implementation of the worker contract from spec §6:
//! enough to pull missing inputs over the network, hold a task for its
//! duration (respecting the worker's CPU count), and report completion back
//! to the kernel. It is not a general-purpose task runtime — see
//! [`crate::kernel`] for how it is wired into a run.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rustc_hash::FxHashSet;
use tokio::sync::{Mutex, Notify, Semaphore};

use crate::graph::TaskGraph;
use crate::network::NetworkModel;
use crate::types::{OutputId, TaskId, WorkerId};

/// The kernel-side hook a worker reports completions and trace events
/// through, so `worker.rs` never needs to depend on `kernel.rs` directly.
#[async_trait]
pub trait TaskCompletionSink: Send + Sync {
    async fn on_task_finished(&self, worker: WorkerId, task: TaskId);
    fn trace_start(&self, worker: WorkerId, task: TaskId);
}

struct WorkerState {
    queue: VecDeque<TaskId>,
    local_outputs: FxHashSet<OutputId>,
}

/// A simulated worker: an identity, a CPU budget, and a queue of tasks
/// assigned to it by the scheduler.
pub struct Worker {
    id: WorkerId,
    cpus: u32,
    state: Mutex<WorkerState>,
    wake: Notify,
}

impl Worker {
    #[must_use]
    pub fn new(id: WorkerId, cpus: u32) -> Self {
        Self {
            id,
            cpus,
            state: Mutex::new(WorkerState {
                queue: VecDeque::new(),
                local_outputs: FxHashSet::default(),
            }),
            wake: Notify::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> WorkerId {
        self.id
    }

    #[must_use]
    pub fn cpus(&self) -> u32 {
        self.cpus
    }

    /// Append `task` to this worker's pending queue, in the priority order
    /// the scheduler dispatched it, and wake the run loop if it is idle.
    pub async fn assign(&self, task: TaskId) {
        self.state.lock().await.queue.push_back(task);
        self.wake.notify_waiters();
    }

    /// Called by the kernel after a task finishes, once per worker already
    /// holding an assignment for one of its consumers, so that worker can
    /// notice newly-local data. No reference scheduler in this crate assigns
    /// a task to a worker before all of its inputs are ready, so this is
    /// presently never invoked with useful state to act on; it exists so a
    /// future scheduler that does speculative multi-worker assignment has
    /// somewhere to hook in without changing the worker contract.
    pub fn update_tasks(&self) {}

    async fn mark_local(&self, output: OutputId) {
        self.state.lock().await.local_outputs.insert(output);
    }

    async fn has_local(&self, output: OutputId) -> bool {
        self.state.lock().await.local_outputs.contains(&output)
    }

    /// Run this worker's task-execution loop until `shutdown` is notified.
    ///
    /// Holds at most `cpus` tasks running concurrently; each running task
    /// first gathers any missing inputs over `network` (in parallel), then
    /// occupies the worker for its duration, then reports completion to
    /// `sink`.
    pub async fn run(
        self: Arc<Self>,
        graph: Arc<TaskGraph>,
        network: Arc<dyn NetworkModel>,
        sink: Arc<dyn TaskCompletionSink>,
    ) {
        let semaphore = Arc::new(Semaphore::new(self.cpus.max(1) as usize));

        loop {
            let next = {
                let mut state = self.state.lock().await;
                state.queue.pop_front()
            };

            let Some(task) = next else {
                self.wake.notified().await;
                continue;
            };

            let worker = self.clone();
            let graph = graph.clone();
            let network = network.clone();
            let sink = sink.clone();
            let permit = semaphore.clone();

            tokio::spawn(async move {
                let _permit = permit.acquire_owned().await.expect("semaphore never closed");

                let task_def = graph.task(task).clone();
                let missing: Vec<OutputId> = {
                    let mut missing = Vec::new();
                    for &input in task_def.inputs() {
                        if !worker.has_local(input).await {
                            missing.push(input);
                        }
                    }
                    missing
                };

                let transfers = missing.into_iter().map(|input| {
                    let network = network.clone();
                    let worker = worker.clone();
                    let graph = graph.clone();
                    async move {
                        let output = graph.output(input).clone();
                        network
                            .download(output.parent(), worker.id, output.size())
                            .await
                            .expect("network precondition violated by a well-formed task graph");
                        worker.mark_local(input).await;
                    }
                });
                futures_util::future::join_all(transfers).await;

                sink.trace_start(worker.id, task);
                tokio::time::sleep(Duration::from_secs_f64(task_def.duration().max(0.0))).await;

                for &output in task_def.outputs() {
                    worker.mark_local(output).await;
                }
                sink.on_task_finished(worker.id, task).await;
            });
        }
    }
}
