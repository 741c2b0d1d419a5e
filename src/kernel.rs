//! The simulation kernel.
//!
//! Grounded in shape on `runtimes::runner::AppRunner` (a step-driven
//! coordinator holding a compiled graph, a shared mutable state store, and a
//! master loop that reacts to completions) and in domain semantics on
//! `schedsim.simulator.simulator.Simulator` (the exact `on_task_finished`
//! bookkeeping and master-process behavior). Concurrency substrate: tokio
//! tasks under a paused, auto-advancing virtual clock — see the module docs
//! on [`crate::worker`] and [`crate::network`] for where that clock is
//! actually consumed (`tokio::time::sleep`).
//!
//! Callers are responsible for running under a current-thread tokio runtime
//! with `tokio::time::pause()` already called (the `#[tokio::test(start_paused
//! = true)]` attribute does this for tests); see the crate-level example.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;
use tracing::{debug, info, instrument};

use crate::config::{NetworkModelKind, SimulatorConfig};
use crate::error::SimError;
use crate::graph::TaskGraph;
use crate::network::{FlowTraceSink, InstantNetModel, MaxMinFairNetModel, NetworkModel, SimpleNetModel};
use crate::runtime_info::RuntimeInfoStore;
use crate::scheduler::{Scheduler, SchedulerContext, TaskAssignment, WorkerDescriptor};
use crate::trace::{TraceEvent, TraceJournal};
use crate::types::{OutputId, TaskId, TaskState, WorkerId};
use crate::worker::{TaskCompletionSink, Worker};

struct SimState {
    runtime: RuntimeInfoStore,
    trace: TraceJournal,
    worker_ready_at: Vec<f64>,
    pending_ready: Vec<TaskId>,
    pending_finished: Vec<TaskId>,
    fatal: Option<SimError>,
    unfinished_task_count: usize,
}

/// A single simulation run: a task graph, a worker pool, a network model,
/// and a scheduler, wired together.
pub struct Simulator {
    graph: Arc<TaskGraph>,
    workers: Vec<Arc<Worker>>,
    network: Arc<dyn NetworkModel>,
    scheduler: Mutex<Box<dyn Scheduler>>,
    config: SimulatorConfig,
    state: Mutex<SimState>,
    master_wake: Notify,
    start: Instant,
}

impl Simulator {
    /// Build a new simulator.
    ///
    /// `worker_cpus[i]` is the CPU count of worker `i`; worker ids are
    /// assigned densely in the order given.
    #[must_use]
    pub fn new(
        graph: TaskGraph,
        worker_cpus: &[u32],
        scheduler: Box<dyn Scheduler>,
        config: SimulatorConfig,
    ) -> Arc<Self> {
        let workers: Vec<Arc<Worker>> = worker_cpus
            .iter()
            .enumerate()
            .map(|(idx, &cpus)| Arc::new(Worker::new(WorkerId::new(idx as u32), cpus)))
            .collect();

        let runtime = RuntimeInfoStore::new(&graph);
        let unfinished_task_count = graph.task_count();
        let pending_ready: Vec<TaskId> = graph.source_tasks().collect();
        let graph = Arc::new(graph);

        Arc::new_cyclic(|weak: &std::sync::Weak<Self>| {
            let network: Arc<dyn NetworkModel> = match config.network_model {
                NetworkModelKind::Instant => Arc::new(InstantNetModel),
                NetworkModelKind::Simple { bandwidth } => Arc::new(SimpleNetModel::new(bandwidth)),
                NetworkModelKind::MaxMinFair { bandwidth } => {
                    let sink: Arc<dyn FlowTraceSink> = Arc::new(KernelFlowSink { sim: weak.clone() });
                    Arc::new(MaxMinFairNetModel::new(bandwidth).with_trace_sink(sink))
                }
            };

            Self {
                graph,
                workers,
                network,
                scheduler: Mutex::new(scheduler),
                config,
                state: Mutex::new(SimState {
                    runtime,
                    trace: TraceJournal::new(),
                    worker_ready_at: vec![0.0; worker_cpus.len()],
                    pending_ready,
                    pending_finished: Vec::new(),
                    fatal: None,
                    unfinished_task_count,
                }),
                master_wake: Notify::new(),
                start: Instant::now(),
            }
        })
    }

    fn elapsed(&self) -> f64 {
        (Instant::now() - self.start).as_secs_f64()
    }

    /// The announced per-pair bandwidth scheduler heuristics should price
    /// transfers against — the static constant a network model was built
    /// with, not its live, contention-adjusted throughput.
    fn announced_bandwidth(&self) -> f64 {
        match self.config.network_model {
            NetworkModelKind::Instant => f64::INFINITY,
            NetworkModelKind::Simple { bandwidth } | NetworkModelKind::MaxMinFair { bandwidth } => bandwidth,
        }
    }

    async fn add_trace_event(&self, event: TraceEvent) {
        if !self.config.trace {
            return;
        }
        let mut state = self.state.lock().await;
        state.trace.push(event);
    }

    /// Run the simulation to completion, returning the makespan (the
    /// simulated time at which every task finished).
    ///
    /// # Errors
    /// Returns the first [`SimError`] raised by a graph invariant violation,
    /// scheduler misuse, or runtime-info underflow encountered during the
    /// run.
    #[instrument(skip(self), err)]
    pub async fn run(self: &Arc<Self>) -> Result<f64, SimError> {
        for worker in &self.workers {
            let worker = worker.clone();
            let graph = self.graph.clone();
            let network = self.network.clone();
            let sink: Arc<dyn TaskCompletionSink> = self.clone();
            tokio::spawn(async move {
                worker.run(graph, network, sink).await;
            });
        }

        {
            let (runtime_snapshot, inputs) = self.snapshot_context().await;
            let ctx = SchedulerContext {
                graph: &self.graph,
                runtime: &runtime_snapshot,
                workers: &inputs.workers,
                current_time: inputs.current_time,
                extended_selection: self.config.extended_selection,
                bandwidth: self.announced_bandwidth(),
            };
            self.scheduler.lock().await.init(&ctx);
        }

        loop {
            self.dispatch_round().await?;

            let done = {
                let state = self.state.lock().await;
                if let Some(err) = &state.fatal {
                    return Err(clone_fatal(err));
                }
                state.unfinished_task_count == 0
            };
            if done {
                break;
            }

            self.master_wake.notified().await;
        }

        info!(makespan = self.elapsed(), "simulation finished");
        Ok(self.elapsed())
    }

    /// Snapshot enough state to build a [`SchedulerContext`] without holding
    /// the lock across the scheduler call (the scheduler trait is
    /// synchronous and borrows from the snapshot for its duration).
    async fn snapshot_context(self: &Arc<Self>) -> (RuntimeInfoStore, OwnedSchedulerInputs) {
        let state = self.state.lock().await;
        let runtime = state.runtime.clone();
        let workers = self
            .workers
            .iter()
            .zip(state.worker_ready_at.iter())
            .map(|(w, &ready_at)| WorkerDescriptor {
                id: w.id(),
                cpus: w.cpus(),
                ready_at,
            })
            .collect();
        (
            runtime,
            OwnedSchedulerInputs {
                workers,
                current_time: self.elapsed(),
            },
        )
    }

    #[instrument(skip(self), err)]
    async fn dispatch_round(self: &Arc<Self>) -> Result<(), SimError> {
        let (runtime_snapshot, inputs) = self.snapshot_context().await;

        let (new_ready, new_finished) = {
            let mut state = self.state.lock().await;
            (
                std::mem::take(&mut state.pending_ready),
                std::mem::take(&mut state.pending_finished),
            )
        };

        let ctx = SchedulerContext {
            graph: &self.graph,
            runtime: &runtime_snapshot,
            workers: &inputs.workers,
            current_time: inputs.current_time,
            extended_selection: self.config.extended_selection,
            bandwidth: self.announced_bandwidth(),
        };

        let mut assignments = self.scheduler.lock().await.schedule(&ctx, &new_ready, &new_finished);
        assignments.sort_by(|a, b| b.priority.partial_cmp(&a.priority).unwrap());

        for assignment in assignments {
            self.apply_assignment(assignment).await?;
        }
        Ok(())
    }

    async fn apply_assignment(self: &Arc<Self>, assignment: TaskAssignment) -> Result<(), SimError> {
        let TaskAssignment { task, worker, priority: _ } = assignment;

        {
            let mut state = self.state.lock().await;
            let current_state = state.runtime.task(task).state;
            if current_state != TaskState::Ready {
                let err = SimError::SchedulerMisuse {
                    task,
                    worker,
                    reason: format!("task was {current_state}, not Ready"),
                };
                state.fatal = Some(clone_fatal(&err));
                self.master_wake.notify_waiters();
                return Err(err);
            }
            let duration = self.graph.task(task).duration();
            let info = state.runtime.task_mut(task);
            info.state = TaskState::Assigned;
            info.assigned_workers.push(worker);
            let widx = worker.index();
            let now = self.elapsed();
            state.worker_ready_at[widx] = state.worker_ready_at[widx].max(now) + duration;
        }

        debug!(%task, %worker, "assigning task");
        self.add_trace_event(TraceEvent::TaskAssign {
            time: self.elapsed(),
            task,
            worker,
        })
        .await;

        self.workers[worker.index()].assign(task).await;
        Ok(())
    }
}

fn clone_fatal(err: &SimError) -> SimError {
    match err {
        SimError::GraphInvariant { message, .. } => SimError::GraphInvariant {
            message: message.clone(),
            source: None,
        },
        SimError::SchedulerMisuse { task, worker, reason } => SimError::SchedulerMisuse {
            task: *task,
            worker: *worker,
            reason: reason.clone(),
        },
        SimError::UnfinishedInputsUnderflow { task, output } => {
            SimError::UnfinishedInputsUnderflow { task: *task, output: *output }
        }
        SimError::NetworkPrecondition { message } => {
            SimError::NetworkPrecondition { message: message.clone() }
        }
    }
}

struct OwnedSchedulerInputs {
    workers: Vec<WorkerDescriptor>,
    current_time: f64,
}

/// Forwards the max-min fair network model's flow recomputations into the
/// kernel's trace journal as [`TraceEvent::FlowChange`] events.
///
/// Holds a `Weak` back-reference rather than an `Arc` so the network model
/// (owned by the simulator) never keeps the simulator itself alive.
struct KernelFlowSink {
    sim: std::sync::Weak<Simulator>,
}

impl FlowTraceSink for KernelFlowSink {
    fn on_flow_recomputed(&self, time: f64, active_transfers: usize) {
        let Some(sim) = self.sim.upgrade() else { return };
        if !sim.config.trace {
            return;
        }
        // Same best-effort rationale as `trace_start`: this is called from
        // synchronous network-model code that may already be inside the
        // state lock's critical section on the same task.
        if let Ok(mut state) = sim.state.try_lock() {
            state.trace.push(TraceEvent::FlowChange { time, active_transfers });
        }
    }
}

#[async_trait]
impl TaskCompletionSink for Simulator {
    async fn on_task_finished(&self, worker: WorkerId, task: TaskId) {
        let now = self.elapsed();
        let mut newly_ready = Vec::new();
        let mut workers_to_notify: Vec<WorkerId> = Vec::new();
        {
            let mut state = self.state.lock().await;

            if state.runtime.task(task).state != TaskState::Assigned
                || !state.runtime.task(task).assigned_workers.contains(&worker)
            {
                state.fatal = Some(SimError::SchedulerMisuse {
                    task,
                    worker,
                    reason: "on_task_finished called for a task not Assigned to this worker".into(),
                });
                self.master_wake.notify_waiters();
                return;
            }

            {
                let info = state.runtime.task_mut(task);
                info.state = TaskState::Finished;
                info.end_time = Some(now);
            }
            state.unfinished_task_count -= 1;

            let outputs = self.graph.task(task).outputs().to_vec();
            for output in outputs {
                state.runtime.output_mut(output).placing.push(worker);
            }

            let mut consumers = self.graph.task(task).consumers().to_vec();
            consumers.sort_by_key(|t| t.raw());
            for consumer in consumers {
                // A consumer may take more than one input from the same
                // parent task, so it must be credited once per such input,
                // not once per (deduplicated) consumer.
                let satisfied = self
                    .graph
                    .task(consumer)
                    .inputs()
                    .iter()
                    .filter(|&&output| self.graph.output(output).parent() == task)
                    .count() as u32;
                let output_for_error = self.graph.task(consumer).inputs().first().copied();
                let info = state.runtime.task_mut(consumer);
                match info.unfinished_inputs.checked_sub(satisfied) {
                    Some(v) => info.unfinished_inputs = v,
                    None => {
                        state.fatal = Some(SimError::UnfinishedInputsUnderflow {
                            task: consumer,
                            output: output_for_error.unwrap_or(OutputId::new(0)),
                        });
                        self.master_wake.notify_waiters();
                        return;
                    }
                }
                if info.unfinished_inputs == 0 && info.state == TaskState::Waiting {
                    info.state = TaskState::Ready;
                    newly_ready.push(consumer);
                }
                for &w in &info.assigned_workers {
                    if !workers_to_notify.contains(&w) {
                        workers_to_notify.push(w);
                    }
                }
            }

            state.pending_ready.extend(newly_ready.iter().copied());
            state.pending_finished.push(task);
        }

        // A consumer already assigned before all its inputs finished (only
        // possible for a scheduler that assigns ahead of readiness) may now
        // have new local data available; let each worker holding one know.
        for worker in workers_to_notify {
            self.workers[worker.index()].update_tasks();
        }

        self.add_trace_event(TraceEvent::TaskEnd { time: now, task, worker }).await;
        self.master_wake.notify_waiters();
    }

    fn trace_start(&self, worker: WorkerId, task: TaskId) {
        let now = self.elapsed();
        let event = TraceEvent::TaskStart { time: now, task, worker };
        if self.config.trace {
            // Best-effort: this runs off the worker task, outside an async
            // lock-friendly context convenient for `add_trace_event`, so it
            // is queued via a blocking-free try_lock; a missed trace entry
            // under contention is acceptable (trace is diagnostic only).
            if let Ok(mut state) = self.state.try_lock() {
                state.trace.push(event);
            }
        }
    }
}
