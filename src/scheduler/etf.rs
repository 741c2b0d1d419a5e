//! Earliest Time First.
//!
//! Grounded on `schedsim.schedulers.others.ETFScheduler`: among every ready
//! task and every worker, repeatedly pick whichever (task, worker) pair
//! yields the minimum `transfer_cost_parallel / bandwidth`, ties broken by
//! the task's static b-level (precomputed once in `init`, mirroring
//! `McpScheduler`'s ALAP precompute), assign it, and repeat. Unlike DLS, ETF
//! prices only the transfer, never the task's own duration or the worker's
//! current load.

use crate::types::TaskId;

use super::{cpu_feasible, util, SchedulerContext, TaskAssignment, WorkerDescriptor, INFEASIBLE_COST};

#[derive(Clone, Debug, Default)]
pub struct EtfScheduler {
    b_level: Vec<f64>,
}

fn cost(ctx: &SchedulerContext<'_>, task: TaskId, worker: &WorkerDescriptor) -> f64 {
    if !cpu_feasible(ctx.graph, task, worker) {
        return INFEASIBLE_COST;
    }
    util::transfer_cost_parallel(ctx.graph, ctx.runtime, task, worker.id) / ctx.bandwidth
}

impl super::Scheduler for EtfScheduler {
    fn init(&mut self, ctx: &SchedulerContext<'_>) {
        self.b_level = util::b_level(ctx.graph);
    }

    fn schedule(
        &mut self,
        ctx: &SchedulerContext<'_>,
        _new_ready: &[TaskId],
        _new_finished: &[TaskId],
    ) -> Vec<TaskAssignment> {
        if self.b_level.len() != ctx.graph.task_count() {
            self.b_level = util::b_level(ctx.graph);
        }

        let mut pending: Vec<TaskId> = ctx.runtime.ready_tasks().collect();
        let mut worker_taken: Vec<bool> = vec![false; ctx.workers.len()];
        let mut assignments = Vec::new();

        loop {
            // (pending_idx, worker_idx, (cost, b_level)) — the literal
            // `min(itertools.product(workers, tasks), key=(cost, b_level))`
            // selection, repeated over the still-available processors and
            // ready tasks: each processor takes at most one task per call, so
            // the pass spreads ready work across idle workers rather than
            // stacking it on whichever one is cheapest.
            let mut best: Option<(usize, usize, (f64, f64))> = None;
            for (ti, &task) in pending.iter().enumerate() {
                let key_b_level = self.b_level[task.index()];
                for (wi, worker) in ctx.workers.iter().enumerate() {
                    if worker_taken[wi] {
                        continue;
                    }
                    let key = (cost(ctx, task, worker), key_b_level);
                    let better = match &best {
                        None => true,
                        Some((_, _, best_key)) => key < *best_key,
                    };
                    if better {
                        best = Some((ti, wi, key));
                    }
                }
            }

            let Some((ti, wi, (c, b_level))) = best else { break };
            if c >= INFEASIBLE_COST {
                break;
            }
            let task = pending.remove(ti);
            worker_taken[wi] = true;
            assignments.push(TaskAssignment {
                task,
                worker: ctx.workers[wi].id,
                priority: b_level,
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
    use crate::scheduler::Scheduler;
    use crate::types::WorkerId;

    #[test]
    fn prefers_the_worker_with_cheaper_transfer() {
        let mut b = TaskGraphBuilder::new();
        let p = b.add_task("p", 1.0, 1);
        let op = b.add_output(p, 5.0);
        let c = b.add_task("c", 1.0, 1);
        b.add_input(c, op);
        let graph = b.build().unwrap();
        let mut runtime = RuntimeInfoStore::new(&graph);
        runtime.output_mut(op).placing.push(WorkerId::new(1));
        runtime.task_mut(p).state = crate::types::TaskState::Finished;
        runtime.task_mut(c).unfinished_inputs = 0;
        runtime.task_mut(c).state = crate::types::TaskState::Ready;

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
        let mut scheduler = EtfScheduler::default();
        scheduler.init(&ctx);
        let assignments = scheduler.schedule(&ctx, &[], &[]);
        let placement = assignments.iter().find(|a| a.task == c).unwrap();
        assert_eq!(placement.worker, WorkerId::new(1));
    }

    #[test]
    fn ties_are_broken_by_lower_b_level_per_the_literal_min_tuple_order() {
        // Two independent source tasks with identical (zero) transfer cost:
        // `a` feeds a downstream task and so has a higher b-level than `b`,
        // so the literal `min((cost, b_level))` selection picks `b` first.
        let mut b = TaskGraphBuilder::new();
        let a = b.add_task("a", 1.0, 1);
        let oa = b.add_output(a, 1.0);
        let a2 = b.add_task("a2", 1.0, 1);
        b.add_input(a2, oa);
        let bee = b.add_task("b", 1.0, 1);
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
        let mut scheduler = EtfScheduler::default();
        scheduler.init(&ctx);
        let assignments = scheduler.schedule(&ctx, &[], &[]);
        assert_eq!(assignments[0].task, bee);
        let _ = a2;
    }
}
