//! The scheduler policy interface and its reference heuristics.
//!
//! A [`Scheduler`] observes which tasks just became ready or finished and
//! returns a batch of [`TaskAssignment`]s; it never stores a reference back
//! into the kernel — everything it needs for this call is handed to it as a
//! [`SchedulerContext`], mirroring the teacher's `Node`/`NodeContext` split
//! (`node.rs`) rather than the closures-over-shared-state style of a
//! stored back-reference.

pub mod dls;
pub mod etf;
pub mod k1h;
pub mod last;
pub mod mcp;
pub mod util;

pub use dls::DlsScheduler;
pub use etf::EtfScheduler;
pub use k1h::K1hScheduler;
pub use last::LastScheduler;
pub use mcp::McpScheduler;

use crate::graph::TaskGraph;
use crate::runtime_info::RuntimeInfoStore;
use crate::types::{TaskId, WorkerId};

/// A worker as seen by a scheduler: identity, capability, and the kernel's
/// current estimate of when it next becomes free to start a new task.
#[derive(Clone, Copy, Debug)]
pub struct WorkerDescriptor {
    pub id: WorkerId,
    pub cpus: u32,
    pub ready_at: f64,
}

/// Read-only view of simulation state handed to a scheduler for one
/// `schedule` call.
pub struct SchedulerContext<'a> {
    pub graph: &'a TaskGraph,
    pub runtime: &'a RuntimeInfoStore,
    pub workers: &'a [WorkerDescriptor],
    pub current_time: f64,
    pub extended_selection: bool,
    /// The announced per-pair network bandwidth, for heuristics that price a
    /// transfer in time (`size / bandwidth`). `InstantNetModel` announces
    /// [`f64::INFINITY`], so any finite transfer divides down to zero cost —
    /// consistent with its actual zero-time transfers.
    pub bandwidth: f64,
}

/// A scheduler's decision to place `task` on `worker`, with the priority it
/// should be dispatched at relative to other assignments made in the same
/// call (higher dispatches first within a single worker's queue).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TaskAssignment {
    pub task: TaskId,
    pub worker: WorkerId,
    pub priority: f64,
}

/// A pluggable scheduling policy.
///
/// `init` runs once, before the first `schedule` call, so a scheduler can
/// precompute static priorities (e.g. b-level, ALAP) that do not change
/// during a run. `schedule` may assign any task currently in the `Ready`
/// state, not only those named in `new_ready` — consistent with the
/// reference Python schedulers, which re-walk the whole ready set on every
/// invocation rather than tracking a delta themselves.
pub trait Scheduler: Send {
    fn init(&mut self, _ctx: &SchedulerContext<'_>) {}

    fn schedule(
        &mut self,
        ctx: &SchedulerContext<'_>,
        new_ready: &[TaskId],
        new_finished: &[TaskId],
    ) -> Vec<TaskAssignment>;
}

/// Sentinel cost assigned to a (task, worker) pair that cannot be placed
/// because the worker lacks enough CPUs, per the distilled spec's pricing
/// convention: large enough to never win a minimization, small enough not to
/// overflow when added to any real cost.
pub const INFEASIBLE_COST: f64 = 1.0e10;

/// `true` when `worker` has enough CPUs to run `task`.
#[must_use]
pub fn cpu_feasible(graph: &TaskGraph, task: TaskId, worker: &WorkerDescriptor) -> bool {
    worker.cpus >= graph.task(task).cpus()
}
