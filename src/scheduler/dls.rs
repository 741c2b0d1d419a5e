//! Dynamic Level Scheduling.
//!
//! Grounded on `schedsim.schedulers.others.DLSScheduler`: at every call,
//! repeatedly pick the (task, worker) pair with the highest *dynamic level*
//! — static b-level minus the estimated start time on that worker — assign
//! it, update that worker's estimated availability, and repeat until no
//! ready task remains placeable. `extended_selection` (the scheduler's one
//! configuration knob, threaded through from
//! [`crate::config::SimulatorConfig::extended_selection`]) skips the
//! transfer-cost term, scoring purely by static level and worker
//! availability — useful when comparing scheduling quality independent of
//! network effects.

use crate::types::TaskId;

use super::{cpu_feasible, util, SchedulerContext, TaskAssignment};

#[derive(Clone, Copy, Debug, Default)]
pub struct DlsScheduler;

impl super::Scheduler for DlsScheduler {
    fn schedule(
        &mut self,
        ctx: &SchedulerContext<'_>,
        _new_ready: &[TaskId],
        _new_finished: &[TaskId],
    ) -> Vec<TaskAssignment> {
        let levels = util::b_level(ctx.graph);
        let mut worker_ready: Vec<f64> = ctx.workers.iter().map(|w| w.ready_at).collect();
        let mut pending: Vec<TaskId> = ctx.runtime.ready_tasks().collect();
        let mut assignments = Vec::new();

        loop {
            let mut best: Option<(usize, usize, f64, f64)> = None; // (pending_idx, worker_idx, dl, start)

            for (ti, &task) in pending.iter().enumerate() {
                for (wi, worker) in ctx.workers.iter().enumerate() {
                    if !cpu_feasible(ctx.graph, task, worker) {
                        continue;
                    }
                    let transfer = if ctx.extended_selection {
                        0.0
                    } else {
                        util::transfer_cost_parallel(ctx.graph, ctx.runtime, task, worker.id) / ctx.bandwidth
                    };
                    let start = worker_ready[wi].max(ctx.current_time) + transfer;
                    let dl = levels[task.index()] - start;
                    let better = match &best {
                        None => true,
                        Some((_, _, best_dl, _)) => dl > *best_dl,
                    };
                    if better {
                        best = Some((ti, wi, dl, start));
                    }
                }
            }

            let Some((ti, wi, dl, start)) = best else {
                break;
            };
            let task = pending.remove(ti);
            let worker = ctx.workers[wi];
            worker_ready[wi] = start + ctx.graph.task(task).duration();
            assignments.push(TaskAssignment {
                task,
                worker: worker.id,
                priority: dl,
            });
        }

        assignments
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::TaskGraphBuilder;
    use crate::runtime_info::RuntimeInfoStore;
    use crate::scheduler::{Scheduler, WorkerDescriptor};
    use crate::types::WorkerId;

    #[test]
    fn assigns_every_ready_source_task_when_workers_are_plentiful() {
        let mut b = TaskGraphBuilder::new();
        b.add_task("a", 1.0, 1);
        b.add_task("b", 1.0, 1);
        let graph = b.build().unwrap();
        let runtime = RuntimeInfoStore::new(&graph);
        let workers = vec![
            WorkerDescriptor { id: WorkerId::new(0), cpus: 1, ready_at: 0.0 },
            WorkerDescriptor { id: WorkerId::new(1), cpus: 1, ready_at: 0.0 },
        ];
        let ctx = SchedulerContext {
            graph: &graph,
            runtime: &runtime,
            workers: &workers,
            current_time: 0.0,
            extended_selection: false,
            bandwidth: 1.0,
        };
        let mut scheduler = DlsScheduler;
        let assignments = scheduler.schedule(&ctx, &[], &[]);
        assert_eq!(assignments.len(), 2);
    }

    #[test]
    fn cpu_infeasible_worker_is_never_chosen() {
        let mut b = TaskGraphBuilder::new();
        b.add_task("a", 1.0, 4);
        let graph = b.build().unwrap();
        let runtime = RuntimeInfoStore::new(&graph);
        let workers = vec![WorkerDescriptor { id: WorkerId::new(0), cpus: 1, ready_at: 0.0 }];
        let ctx = SchedulerContext {
            graph: &graph,
            runtime: &runtime,
            workers: &workers,
            current_time: 0.0,
            extended_selection: false,
            bandwidth: 1.0,
        };
        let mut scheduler = DlsScheduler;
        let assignments = scheduler.schedule(&ctx, &[], &[]);
        assert!(assignments.is_empty());
    }
}
