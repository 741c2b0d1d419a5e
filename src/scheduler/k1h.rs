//! K1h: one-hop lookahead locality scheduling.
//!
//! Grounded on `schedsim.schedulers.others.K1hScheduler`: prices a candidate
//! placement as the time to transfer what's missing, plus the task's own
//! duration, plus however much work is already queued on that worker, plus
//! the sizes of whatever "sibling" inputs — the other inputs of this task's
//! consumers — the worker doesn't already hold. The last term anticipates
//! the very next round of transfers a consumer will need, one hop ahead.

use crate::types::{TaskId, TaskState, WorkerId};

use super::{cpu_feasible, util, SchedulerContext, TaskAssignment, INFEASIBLE_COST};

#[derive(Clone, Copy, Debug, Default)]
pub struct K1hScheduler;

/// Sizes of the outputs a consumer of `task` will need but `worker` does not
/// already hold, excluding `task`'s own outputs (those are the transfer this
/// placement is already paying for).
fn sibling_cost(ctx: &SchedulerContext<'_>, task: TaskId, worker: WorkerId) -> f64 {
    let own_outputs = ctx.graph.task(task).outputs();
    ctx.graph
        .task(task)
        .consumers()
        .iter()
        .flat_map(|&consumer| ctx.graph.task(consumer).inputs().iter().copied())
        .filter(|input| !own_outputs.contains(input))
        .filter(|&input| !ctx.runtime.output(input).is_available_at(worker))
        .map(|input| ctx.graph.output(input).size())
        .sum()
}

/// Sum of durations of every task already assigned to `worker` but not yet
/// finished — the backlog it would have to work through before this one.
fn worker_load(ctx: &SchedulerContext<'_>, worker: WorkerId) -> f64 {
    (0..ctx.graph.task_count())
        .map(TaskId::from)
        .filter(|&t| {
            ctx.runtime.task(t).state == TaskState::Assigned
                && ctx.runtime.task(t).assigned_workers.contains(&worker)
        })
        .map(|t| ctx.graph.task(t).duration())
        .sum()
}

fn cost(ctx: &SchedulerContext<'_>, task: TaskId, worker: &super::WorkerDescriptor) -> f64 {
    if !cpu_feasible(ctx.graph, task, worker) {
        return INFEASIBLE_COST;
    }
    let transfer = util::transfer_cost_parallel(ctx.graph, ctx.runtime, task, worker.id) / ctx.bandwidth;
    let duration = ctx.graph.task(task).duration();
    transfer + duration + worker_load(ctx, worker.id) + sibling_cost(ctx, task, worker.id)
}

impl super::Scheduler for K1hScheduler {
    fn schedule(
        &mut self,
        ctx: &SchedulerContext<'_>,
        _new_ready: &[TaskId],
        _new_finished: &[TaskId],
    ) -> Vec<TaskAssignment> {
        let mut assignments = Vec::new();

        for task in ctx.runtime.ready_tasks() {
            let mut best: Option<(WorkerId, f64)> = None;
            for worker in ctx.workers {
                let c = cost(ctx, task, worker);
                let better = match &best {
                    None => true,
                    Some((_, best_cost)) => c < *best_cost,
                };
                if better {
                    best = Some((worker.id, c));
                }
            }

            if let Some((worker, c)) = best {
                if c < INFEASIBLE_COST {
                    assignments.push(TaskAssignment { task, worker, priority: -c });
                }
            }
        }

        assignments
    }
}
