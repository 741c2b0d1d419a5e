//! The flat JSON task-array format.
//!
//! Grounded on `estee.serialization.dask_json`: one object per task with
//! `d` (duration), `e_d` (expected duration), `cpus`, `outputs` (each an
//! `{s, e_s}` size pair), and `inputs` (a list of `[parent_index,
//! output_index]` pairs resolving an input to the producing task's
//! position in the array and that task's output slot). Task order in the
//! array is the densely renumbered id order; no task names are carried,
//! matching the original format.

use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::graph::{TaskGraph, TaskGraphBuilder};
use crate::types::{OutputId, TaskId};

#[derive(Serialize, Deserialize)]
struct OutputRecord {
    s: f64,
    e_s: Option<f64>,
}

#[derive(Serialize, Deserialize)]
struct TaskRecord {
    d: f64,
    e_d: Option<f64>,
    cpus: u32,
    outputs: Vec<OutputRecord>,
    inputs: Vec<(u32, u32)>,
}

/// Serialize `graph` to the flat JSON task-array format.
///
/// # Errors
/// Returns an error only if serialization itself fails, which does not
/// happen for well-formed graphs.
pub fn to_json(graph: &TaskGraph) -> serde_json::Result<String> {
    let mut output_index_in_parent: Vec<u32> = vec![0; graph.output_count()];
    for task in graph.tasks() {
        for (index, &output) in task.outputs().iter().enumerate() {
            output_index_in_parent[output.index()] = index as u32;
        }
    }

    let records: Vec<TaskRecord> = graph
        .tasks()
        .iter()
        .map(|task| {
            let outputs = task
                .outputs()
                .iter()
                .map(|&id| {
                    let o = graph.output(id);
                    OutputRecord {
                        s: o.size(),
                        e_s: o.expected_size(),
                    }
                })
                .collect();
            let inputs = task
                .inputs()
                .iter()
                .map(|&input| {
                    let parent = graph.output(input).parent();
                    (parent.raw(), output_index_in_parent[input.index()])
                })
                .collect();
            TaskRecord {
                d: task.duration(),
                e_d: task.expected_duration(),
                cpus: task.cpus(),
                outputs,
                inputs,
            }
        })
        .collect();

    serde_json::to_string(&records)
}

/// Deserialize the flat JSON task-array format into a [`TaskGraph`].
///
/// # Errors
/// Returns a JSON error if `data` does not parse as the expected shape, or
/// [`SimError::GraphInvariant`] if the resulting graph violates an
/// invariant (dangling reference, cycle).
pub fn from_json(data: &str) -> Result<TaskGraph, FromJsonError> {
    let records: Vec<TaskRecord> = serde_json::from_str(data)?;

    let mut builder = TaskGraphBuilder::new();
    let mut task_ids = Vec::with_capacity(records.len());
    let mut output_ids: Vec<Vec<OutputId>> = Vec::with_capacity(records.len());

    for record in &records {
        let task = builder.add_task_with_estimate(String::new(), record.d, record.e_d, record.cpus);
        let mut outs = Vec::with_capacity(record.outputs.len());
        for o in &record.outputs {
            outs.push(builder.add_output_with_estimate(task, o.s, o.e_s));
        }
        task_ids.push(task);
        output_ids.push(outs);
    }

    for (record, &consumer) in records.iter().zip(task_ids.iter()) {
        for &(parent_index, output_index) in &record.inputs {
            let parent = *task_ids
                .get(parent_index as usize)
                .ok_or(FromJsonError::DanglingReference)?;
            let output = *output_ids[parent.index()]
                .get(output_index as usize)
                .ok_or(FromJsonError::DanglingReference)?;
            builder.add_input(consumer, output);
        }
    }

    Ok(builder.build()?)
}

/// Error deserializing the flat JSON task-array format.
#[derive(Debug, thiserror::Error)]
pub enum FromJsonError {
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("task record references a parent task or output index out of range")]
    DanglingReference,
    #[error(transparent)]
    Graph(#[from] SimError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_preserves_structure() {
        let mut b = TaskGraphBuilder::new();
        let a = b.add_task("a", 2.0, 1);
        let oa = b.add_output(a, 10.0);
        let bee = b.add_task("b", 3.0, 1);
        b.add_input(bee, oa);
        let graph = b.build().unwrap();

        let json = to_json(&graph).unwrap();
        let parsed = from_json(&json).unwrap();

        assert_eq!(parsed.task_count(), graph.task_count());
        assert_eq!(parsed.output_count(), graph.output_count());
        assert_eq!(parsed.task(bee).inputs().len(), 1);
        let input = parsed.task(bee).inputs()[0];
        assert_eq!(parsed.output(input).parent(), a);
        assert!((parsed.output(input).size() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn dangling_parent_index_is_rejected() {
        let json = r#"[{"d":1.0,"e_d":null,"cpus":1,"outputs":[],"inputs":[[7,0]]}]"#;
        assert!(from_json(json).is_err());
    }

    #[test]
    fn empty_array_builds_empty_graph() {
        let graph = from_json("[]").unwrap();
        assert_eq!(graph.task_count(), 0);
    }
}
