//! Fluent construction of a [`TaskGraph`], following the teacher's
//! `GraphBuilder` pattern: consuming `self`, returning ids as you go, and
//! deferring all invariant checks to a single `build()` validation pass.

use crate::error::SimError;
use crate::types::{OutputId, TaskId};

use super::{Output, Task, TaskGraph};

/// Builder for a [`TaskGraph`].
#[derive(Clone, Debug, Default)]
#[must_use]
pub struct TaskGraphBuilder {
    tasks: Vec<Task>,
    outputs: Vec<Output>,
}

impl TaskGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task with no outputs and no inputs yet. Returns its id so
    /// callers can attach outputs (`add_output`) and inputs (`add_input`).
    pub fn add_task(
        &mut self,
        name: impl Into<String>,
        duration: f64,
        cpus: u32,
    ) -> TaskId {
        self.add_task_with_estimate(name, duration, None, cpus)
    }

    /// Like [`add_task`](Self::add_task), but also records the scheduler's
    /// a-priori duration estimate.
    pub fn add_task_with_estimate(
        &mut self,
        name: impl Into<String>,
        duration: f64,
        expected_duration: Option<f64>,
        cpus: u32,
    ) -> TaskId {
        let id = TaskId::new(self.tasks.len() as u32);
        self.tasks.push(Task {
            id,
            name: name.into(),
            duration,
            expected_duration,
            cpus,
            outputs: Vec::new(),
            inputs: Vec::new(),
            consumers: Vec::new(),
        });
        id
    }

    /// Add an output owned by `parent`. Returns its id.
    ///
    /// # Panics
    /// Panics if `parent` was not returned by a prior `add_task` call on this
    /// builder — a programmer error, not a data error, so it is not deferred
    /// to `build()`.
    pub fn add_output(&mut self, parent: TaskId, size: f64) -> OutputId {
        self.add_output_with_estimate(parent, size, None)
    }

    pub fn add_output_with_estimate(
        &mut self,
        parent: TaskId,
        size: f64,
        expected_size: Option<f64>,
    ) -> OutputId {
        assert!(
            parent.index() < self.tasks.len(),
            "add_output: unknown parent task {parent}"
        );
        let id = OutputId::new(self.outputs.len() as u32);
        self.outputs.push(Output {
            id,
            parent,
            size,
            expected_size,
        });
        self.tasks[parent.index()].outputs.push(id);
        id
    }

    /// Record that `consumer` requires `output` as an input.
    ///
    /// # Panics
    /// Panics if `consumer` was not returned by a prior `add_task` call on
    /// this builder.
    pub fn add_input(&mut self, consumer: TaskId, output: OutputId) {
        assert!(
            consumer.index() < self.tasks.len(),
            "add_input: unknown consumer task {consumer}"
        );
        self.tasks[consumer.index()].inputs.push(output);
    }

    /// Validate and finalize the graph.
    ///
    /// # Errors
    /// Returns [`SimError::GraphInvariant`] if any input references an output
    /// owned by a task outside this graph (impossible given the builder API,
    /// kept for defense against a malformed deserialized graph reusing this
    /// path — see [`crate::serialization`]), or if the induced task-dependency
    /// relation contains a cycle.
    pub fn build(mut self) -> Result<TaskGraph, SimError> {
        for output in &self.outputs {
            if output.parent.index() >= self.tasks.len() {
                return Err(SimError::graph_invariant(format!(
                    "output {} claims parent {} which does not exist",
                    output.id, output.parent
                )));
            }
        }
        for task in &self.tasks {
            for &input in &task.inputs {
                if input.index() >= self.outputs.len() {
                    return Err(SimError::graph_invariant(format!(
                        "task {} references nonexistent output {input}",
                        task.id
                    )));
                }
            }
        }

        // Derive consumers from inputs.
        let mut consumers_by_task: Vec<Vec<TaskId>> = vec![Vec::new(); self.tasks.len()];
        for task in &self.tasks {
            for &input in &task.inputs {
                let parent = self.outputs[input.index()].parent;
                consumers_by_task[parent.index()].push(task.id);
            }
        }
        for (task, consumers) in self.tasks.iter_mut().zip(consumers_by_task.into_iter()) {
            let mut consumers = consumers;
            consumers.sort_by_key(|t| t.raw());
            consumers.dedup();
            task.consumers = consumers;
        }

        detect_cycle(&self.tasks)?;

        Ok(TaskGraph {
            tasks: self.tasks,
            outputs: self.outputs,
        })
    }
}

/// Depth-first cycle detection over the task-dependency relation (an edge
/// `a -> b` exists when `b` consumes an output of `a`).
fn detect_cycle(tasks: &[Task]) -> Result<(), SimError> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        InProgress,
        Done,
    }

    let mut marks = vec![Mark::Unvisited; tasks.len()];
    let mut stack = Vec::new();

    for start in 0..tasks.len() {
        if marks[start] != Mark::Unvisited {
            continue;
        }
        stack.push((start, 0usize));
        marks[start] = Mark::InProgress;
        while let Some(&mut (node, ref mut next_child)) = stack.last_mut() {
            let children = &tasks[node].consumers;
            if *next_child < children.len() {
                let child = children[*next_child].index();
                *next_child += 1;
                match marks[child] {
                    Mark::Unvisited => {
                        marks[child] = Mark::InProgress;
                        stack.push((child, 0));
                    }
                    Mark::InProgress => {
                        return Err(SimError::graph_invariant(format!(
                            "cycle detected through task {}",
                            tasks[child].id
                        )));
                    }
                    Mark::Done => {}
                }
            } else {
                marks[node] = Mark::Done;
                stack.pop();
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_chain_builds() {
        let mut b = TaskGraphBuilder::new();
        let t0 = b.add_task("a", 1.0, 1);
        let o0 = b.add_output(t0, 10.0);
        let t1 = b.add_task("b", 2.0, 1);
        b.add_input(t1, o0);
        let graph = b.build().unwrap();
        assert_eq!(graph.task_count(), 2);
        assert_eq!(graph.output_count(), 1);
        assert_eq!(graph.task(t0).consumers(), &[t1]);
        assert_eq!(graph.task(t1).inputs(), &[o0]);
    }

    #[test]
    fn self_loop_via_own_output_is_rejected() {
        let mut b = TaskGraphBuilder::new();
        let t0 = b.add_task("a", 1.0, 1);
        let o0 = b.add_output(t0, 10.0);
        b.add_input(t0, o0);
        assert!(b.build().is_err());
    }

    #[test]
    fn two_step_cycle_is_rejected() {
        let mut b = TaskGraphBuilder::new();
        let t0 = b.add_task("a", 1.0, 1);
        let t1 = b.add_task("b", 1.0, 1);
        let o0 = b.add_output(t0, 1.0);
        let o1 = b.add_output(t1, 1.0);
        b.add_input(t1, o0);
        b.add_input(t0, o1);
        assert!(b.build().is_err());
    }

    #[test]
    fn diamond_shape_builds_with_correct_consumers() {
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
        assert_eq!(graph.task(a).consumers(), &[bee, c]);
        assert_eq!(graph.task(d).inputs(), &[ob, oc]);
    }

    #[test]
    fn dangling_input_is_rejected() {
        let mut b = TaskGraphBuilder::new();
        let t0 = b.add_task("a", 1.0, 1);
        b.add_input(t0, OutputId::new(99));
        assert!(b.build().is_err());
    }
}
