//! Locality-Aware Scheduling by Transfer (LAST).
//!
//! Grounded on `schedsim.schedulers.others.LASTScheduler`: gives every ready
//! task a priority ratio that rewards inputs already sitting where the task
//! was last assigned and penalizes big outputs fanning out to many
//! consumers, repeatedly takes the highest-priority task and drops it on
//! whichever feasible worker has the cheapest `transfer_cost_parallel`, and
//! repeats until every ready task has been placed.

use crate::types::{OutputId, TaskId, WorkerId};

use super::{cpu_feasible, util, SchedulerContext, TaskAssignment, INFEASIBLE_COST};

#[derive(Clone, Copy, Debug, Default)]
pub struct LastScheduler;

/// `0.0` if `input`'s current placement already matches `task`'s own
/// assigned-workers list exactly (same worker set, same order — a literal
/// list comparison, not a set one), `1.0` otherwise.
fn edge_cost(ctx: &SchedulerContext<'_>, input: OutputId, task: TaskId) -> f64 {
    if ctx.runtime.output(input).placing == ctx.runtime.task(task).assigned_workers {
        0.0
    } else {
        1.0
    }
}

/// The priority ratio `(input_weighted + output) / (input + output)` for a
/// ready task, `1.0` for a source task (no inputs at all).
fn priority(ctx: &SchedulerContext<'_>, task: TaskId) -> f64 {
    let inputs = ctx.graph.task(task).inputs();
    if inputs.is_empty() {
        return 1.0;
    }

    let input: f64 = inputs
        .iter()
        .map(|&i| ctx.graph.output(i).size() / ctx.bandwidth)
        .sum();
    let input_weighted: f64 = inputs
        .iter()
        .map(|&i| (ctx.graph.output(i).size() / ctx.bandwidth) * edge_cost(ctx, i, task))
        .sum();
    let task_size: f64 = ctx.graph.task(task).outputs().iter().map(|&o| ctx.graph.output(o).size()).sum();
    let consumer_count = ctx.graph.task(task).consumers().len() as f64;
    let output = consumer_count * (task_size / ctx.bandwidth);

    // Under an infinite-bandwidth network every term above collapses to
    // zero; fall back to the same priority a source task gets rather than
    // divide zero by zero.
    if input + output == 0.0 {
        return 1.0;
    }
    (input_weighted + output) / (input + output)
}

impl super::Scheduler for LastScheduler {
    fn schedule(
        &mut self,
        ctx: &SchedulerContext<'_>,
        _new_ready: &[TaskId],
        _new_finished: &[TaskId],
    ) -> Vec<TaskAssignment> {
        let mut pending: Vec<(TaskId, f64)> = ctx
            .runtime
            .ready_tasks()
            .map(|task| (task, priority(ctx, task)))
            .collect();

        let mut assignments = Vec::new();

        while !pending.is_empty() {
            let mut best_idx = 0;
            for i in 1..pending.len() {
                if pending[i].1 > pending[best_idx].1 {
                    best_idx = i;
                }
            }
            let (task, prio) = pending.remove(best_idx);

            let mut best: Option<(WorkerId, f64)> = None;
            for worker in ctx.workers {
                let cost = if !cpu_feasible(ctx.graph, task, worker) {
                    INFEASIBLE_COST
                } else {
                    util::transfer_cost_parallel(ctx.graph, ctx.runtime, task, worker.id)
                };
                let better = match &best {
                    None => true,
                    Some((_, best_cost)) => cost < *best_cost,
                };
                if better {
                    best = Some((worker.id, cost));
                }
            }

            if let Some((worker, cost)) = best {
                if cost < INFEASIBLE_COST {
                    assignments.push(TaskAssignment { task, worker, priority: prio });
                }
            }
        }

        assignments
    }
}
