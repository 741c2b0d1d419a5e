//! The six named scenarios a correct simulator must reproduce exactly.

use schedsim::config::{NetworkModelKind, SimulatorConfig};
use schedsim::graph::TaskGraphBuilder;
use schedsim::kernel::Simulator;
use schedsim::scheduler::{
    cpu_feasible, DlsScheduler, EtfScheduler, McpScheduler, Scheduler, SchedulerContext, TaskAssignment,
};
use schedsim::types::{TaskId, WorkerId};

/// A scheduler that assigns each ready task to a caller-fixed worker,
/// ignoring cost — used to pin down placement for tests where the scenario
/// under test is about network behavior, not scheduler choice.
struct PinnedScheduler {
    placement: Vec<(TaskId, WorkerId)>,
}

impl Scheduler for PinnedScheduler {
    fn schedule(
        &mut self,
        ctx: &SchedulerContext<'_>,
        _new_ready: &[TaskId],
        _new_finished: &[TaskId],
    ) -> Vec<TaskAssignment> {
        ctx.runtime
            .ready_tasks()
            .filter_map(|task| {
                let worker = self
                    .placement
                    .iter()
                    .find(|&&(t, _)| t == task)
                    .map(|&(_, w)| w)?;
                let descriptor = ctx.workers.iter().find(|w| w.id == worker)?;
                cpu_feasible(ctx.graph, task, descriptor).then_some(TaskAssignment {
                    task,
                    worker,
                    priority: 0.0,
                })
            })
            .collect()
    }
}

#[tokio::test(start_paused = true)]
async fn scenario_1_single_task_one_worker() {
    let mut b = TaskGraphBuilder::new();
    b.add_task("only", 5.0, 1);
    let graph = b.build().unwrap();

    let sim = Simulator::new(graph, &[1], Box::new(DlsScheduler), SimulatorConfig::default());
    let makespan = sim.run().await.unwrap();
    assert!((makespan - 5.0).abs() < 1e-6);
}

#[tokio::test(start_paused = true)]
async fn scenario_2_two_independent_tasks_two_workers() {
    let mut b = TaskGraphBuilder::new();
    b.add_task("short", 3.0, 1);
    b.add_task("long", 4.0, 1);
    let graph = b.build().unwrap();

    let sim = Simulator::new(graph, &[1, 1], Box::new(DlsScheduler), SimulatorConfig::default());
    let makespan = sim.run().await.unwrap();
    assert!((makespan - 4.0).abs() < 1e-6);
}

#[tokio::test(start_paused = true)]
async fn scenario_3_chain_on_distinct_workers_pays_transfer_cost() {
    let mut b = TaskGraphBuilder::new();
    let a = b.add_task("a", 2.0, 1);
    let out = b.add_output(a, 10.0);
    let bee = b.add_task("b", 3.0, 1);
    b.add_input(bee, out);
    let graph = b.build().unwrap();

    let config = SimulatorConfig::builder()
        .with_network_model(NetworkModelKind::Simple { bandwidth: 5.0 })
        .build();
    let scheduler = PinnedScheduler {
        placement: vec![(a, WorkerId::new(0)), (bee, WorkerId::new(1))],
    };
    let sim = Simulator::new(graph, &[1, 1], Box::new(scheduler), config);
    let makespan = sim.run().await.unwrap();
    // 2 (a's duration) + 10/5 (the transfer) + 3 (b's duration) = 7.
    assert!((makespan - 7.0).abs() < 1e-6, "makespan was {makespan}");
}

#[tokio::test(start_paused = true)]
async fn scenario_3_chain_co_located_skips_transfer_cost() {
    let mut b = TaskGraphBuilder::new();
    let a = b.add_task("a", 2.0, 1);
    let out = b.add_output(a, 10.0);
    let bee = b.add_task("b", 3.0, 1);
    b.add_input(bee, out);
    let graph = b.build().unwrap();

    let config = SimulatorConfig::builder()
        .with_network_model(NetworkModelKind::Simple { bandwidth: 5.0 })
        .build();
    // A single worker can only co-locate both tasks: 2 + 3 = 5, no transfer.
    let sim = Simulator::new(graph, &[1], Box::new(DlsScheduler), config);
    let makespan = sim.run().await.unwrap();
    assert!((makespan - 5.0).abs() < 1e-6, "makespan was {makespan}");
}

#[tokio::test(start_paused = true)]
async fn scenario_4_diamond_two_workers_instant_net() {
    let mut b = TaskGraphBuilder::new();
    let a = b.add_task("a", 1.0, 1);
    let oa = b.add_output(a, 1.0);
    let bee = b.add_task("b", 1.0, 1);
    let c = b.add_task("c", 1.0, 1);
    b.add_input(bee, oa);
    b.add_input(c, oa);
    let ob = b.add_output(bee, 1.0);
    let oc = b.add_output(c, 1.0);
    let d = b.add_task("d", 1.0, 1);
    b.add_input(d, ob);
    b.add_input(d, oc);
    let graph = b.build().unwrap();

    let sim = Simulator::new(graph, &[1, 1], Box::new(DlsScheduler), SimulatorConfig::default());
    let makespan = sim.run().await.unwrap();
    assert!((makespan - 3.0).abs() < 1e-6, "makespan was {makespan}");
}

#[tokio::test(start_paused = true)]
async fn scenario_5_two_downloads_sharing_one_source() {
    use schedsim::network::{MaxMinFairNetModel, NetworkModel};
    use std::sync::Arc;

    let model = Arc::new(MaxMinFairNetModel::new(1.0));
    let a = {
        let model = model.clone();
        tokio::spawn(async move {
            model.download(WorkerId::new(0), WorkerId::new(1), 10.0).await
        })
    };
    let b = {
        let model = model.clone();
        tokio::spawn(async move {
            model.download(WorkerId::new(0), WorkerId::new(2), 10.0).await
        })
    };
    let start = tokio::time::Instant::now();
    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();
    let elapsed = (tokio::time::Instant::now() - start).as_secs_f64();
    assert!((elapsed - 20.0).abs() < 1e-6, "elapsed was {elapsed}");
}

#[tokio::test(start_paused = true)]
async fn scenario_6_mcp_schedules_smaller_alap_first() {
    // A 3-level fork-join: root feeds two leaves of different duration, both
    // feed a join. The leaf with less slack (the longer one) has the
    // strictly smaller ALAP and should be scheduled ahead of its sibling
    // whenever both are ready and workers are scarce.
    let mut b = TaskGraphBuilder::new();
    let root = b.add_task("root", 1.0, 1);
    let o_root = b.add_output(root, 0.0);
    let critical = b.add_task("critical", 5.0, 1);
    let slack = b.add_task("slack", 1.0, 1);
    b.add_input(critical, o_root);
    b.add_input(slack, o_root);
    let o_critical = b.add_output(critical, 0.0);
    let o_slack = b.add_output(slack, 0.0);
    let join = b.add_task("join", 1.0, 1);
    b.add_input(join, o_critical);
    b.add_input(join, o_slack);
    let graph = b.build().unwrap();

    let sim = Simulator::new(
        graph,
        &[1],
        Box::new(McpScheduler::default()),
        SimulatorConfig::default(),
    );
    let makespan = sim.run().await.unwrap();
    // Single worker forces a serialization; scheduling `critical` before
    // `slack` yields 1 + 5 + 1 + 1 = 8, the minimal achievable makespan.
    assert!((makespan - 8.0).abs() < 1e-6, "makespan was {makespan}");
}

#[tokio::test(start_paused = true)]
async fn etf_also_meets_critical_path_on_the_diamond() {
    let mut b = TaskGraphBuilder::new();
    let a = b.add_task("a", 1.0, 1);
    let oa = b.add_output(a, 1.0);
    let bee = b.add_task("b", 1.0, 1);
    let c = b.add_task("c", 1.0, 1);
    b.add_input(bee, oa);
    b.add_input(c, oa);
    let ob = b.add_output(bee, 1.0);
    let oc = b.add_output(c, 1.0);
    let d = b.add_task("d", 1.0, 1);
    b.add_input(d, ob);
    b.add_input(d, oc);
    let graph = b.build().unwrap();

    let sim = Simulator::new(
        graph,
        &[1, 1],
        Box::new(EtfScheduler::default()),
        SimulatorConfig::default(),
    );
    let makespan = sim.run().await.unwrap();
    assert!((makespan - 3.0).abs() < 1e-6, "makespan was {makespan}");
}
