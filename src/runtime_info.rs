//! Dense per-run mutable state for tasks and outputs.
//!
//! Grounded on `schedsim.simulator.simulator.Simulator.run`, which allocates
//! `TaskRuntimeInfo`/`OutputRuntimeInfo` arrays sized to the graph at the
//! start of a run. Kept as plain `Vec`s indexed by id rather than the
//! teacher's versioned-channel abstraction (`state.rs`): the simulator needs
//! O(1) lookup on the scheduling hot path, not snapshot/version history.

use crate::graph::TaskGraph;
use crate::types::{OutputId, TaskId, TaskState, WorkerId};

/// Mutable per-task state for one run.
#[derive(Clone, Debug)]
pub struct TaskRuntimeInfo {
    pub state: TaskState,
    pub unfinished_inputs: u32,
    pub assigned_workers: Vec<WorkerId>,
    pub end_time: Option<f64>,
}

/// Mutable per-output state for one run.
#[derive(Clone, Debug, Default)]
pub struct OutputRuntimeInfo {
    pub placing: Vec<WorkerId>,
}

impl OutputRuntimeInfo {
    #[must_use]
    pub fn is_available_at(&self, worker: WorkerId) -> bool {
        self.placing.contains(&worker)
    }
}

/// The dense runtime-info store for a single simulation run.
#[derive(Clone)]
pub struct RuntimeInfoStore {
    tasks: Vec<TaskRuntimeInfo>,
    outputs: Vec<OutputRuntimeInfo>,
}

impl RuntimeInfoStore {
    /// Allocate a store sized to `graph`, with every task's
    /// `unfinished_inputs` set to its input count (`0` inputs means the task
    /// starts `Ready`).
    #[must_use]
    pub fn new(graph: &TaskGraph) -> Self {
        let tasks = graph
            .tasks()
            .iter()
            .map(|task| {
                let unfinished_inputs = task.inputs().len() as u32;
                TaskRuntimeInfo {
                    state: if unfinished_inputs == 0 {
                        TaskState::Ready
                    } else {
                        TaskState::Waiting
                    },
                    unfinished_inputs,
                    assigned_workers: Vec::new(),
                    end_time: None,
                }
            })
            .collect();
        let outputs = vec![OutputRuntimeInfo::default(); graph.output_count()];
        Self { tasks, outputs }
    }

    #[must_use]
    pub fn task(&self, id: TaskId) -> &TaskRuntimeInfo {
        &self.tasks[id.index()]
    }

    pub fn task_mut(&mut self, id: TaskId) -> &mut TaskRuntimeInfo {
        &mut self.tasks[id.index()]
    }

    #[must_use]
    pub fn output(&self, id: OutputId) -> &OutputRuntimeInfo {
        &self.outputs[id.index()]
    }

    pub fn output_mut(&mut self, id: OutputId) -> &mut OutputRuntimeInfo {
        &mut self.outputs[id.index()]
    }

    #[must_use]
    pub fn all_finished(&self) -> bool {
        self.tasks.iter().all(|t| t.state == TaskState::Finished)
    }

    /// Tasks currently in the `Ready` state, in id order.
    pub fn ready_tasks(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.tasks
            .iter()
            .enumerate()
            .filter(|(_, info)| info.state == TaskState::Ready)
            .map(|(idx, _)| TaskId::from(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::TaskGraphBuilder;

    #[test]
    fn source_tasks_start_ready_others_start_waiting() {
        let mut b = TaskGraphBuilder::new();
        let t0 = b.add_task("a", 1.0, 1);
        let o0 = b.add_output(t0, 1.0);
        let t1 = b.add_task("b", 1.0, 1);
        b.add_input(t1, o0);
        let graph = b.build().unwrap();

        let store = RuntimeInfoStore::new(&graph);
        assert_eq!(store.task(t0).state, TaskState::Ready);
        assert_eq!(store.task(t1).state, TaskState::Waiting);
        assert_eq!(store.task(t1).unfinished_inputs, 1);
    }
}
