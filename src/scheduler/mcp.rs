//! Modified Critical Path.
//!
//! Grounded on `schedsim.schedulers.others.MCPScheduler`: computes ALAP
//! (as-late-as-possible start time) for every task once at `init`, then on
//! each call visits ready tasks in ascending ALAP order (most critical
//! first) and assigns each to whichever feasible worker gives it the
//! earliest estimated start.

use crate::types::TaskId;

use super::{util, SchedulerContext, TaskAssignment, INFEASIBLE_COST};

#[derive(Clone, Debug, Default)]
pub struct McpScheduler {
    alap: Vec<f64>,
}

impl super::Scheduler for McpScheduler {
    fn init(&mut self, ctx: &SchedulerContext<'_>) {
        self.alap = util::alap(ctx.graph);
    }

    fn schedule(
        &mut self,
        ctx: &SchedulerContext<'_>,
        _new_ready: &[TaskId],
        _new_finished: &[TaskId],
    ) -> Vec<TaskAssignment> {
        if self.alap.len() != ctx.graph.task_count() {
            self.alap = util::alap(ctx.graph);
        }

        let mut pending: Vec<TaskId> = ctx.runtime.ready_tasks().collect();
        pending.sort_by(|a, b| {
            self.alap[a.index()]
                .partial_cmp(&self.alap[b.index()])
                .unwrap()
        });

        let mut worker_ready: Vec<f64> = ctx.workers.iter().map(|w| w.ready_at).collect();
        let mut assignments = Vec::new();

        for task in pending {
            let mut best: Option<(usize, f64)> = None;
            for (wi, worker) in ctx.workers.iter().enumerate() {
                let cost = if worker.cpus < ctx.graph.task(task).cpus() {
                    INFEASIBLE_COST
                } else {
                    let transfer = util::transfer_cost_parallel(ctx.graph, ctx.runtime, task, worker.id);
                    worker_ready[wi].max(ctx.current_time) + transfer
                };
                let better = match &best {
                    None => true,
                    Some((_, best_cost)) => cost < *best_cost,
                };
                if better {
                    best = Some((wi, cost));
                }
            }
            let Some((wi, start)) = best else { continue };
            if start >= INFEASIBLE_COST {
                continue;
            }
            worker_ready[wi] = start + ctx.graph.task(task).duration();
            assignments.push(TaskAssignment {
                task,
                worker: ctx.workers[wi].id,
                priority: -self.alap[task.index()],
            });
        }

        assignments
    }
}
