//! The DAX (Pegasus workflow) XML format.
//!
//! Grounded on `schedsim.serialization.dax`: a flat list of `<job>` elements
//! each declaring its `<uses link="input"|"output">` files by name, plus
//! `<child ref="..."><parent ref="..."/></child>` edges. Edges are
//! reconstructed by matching a child's declared input file names against its
//! parents' declared output file names; when a `<child>/<parent>` pair shares
//! no named file (a dependency the original workflow declared structurally
//! but didn't route data through), a synthetic zero-size output is injected
//! so the dependency still exists in the resulting graph — matching the
//! original's fallback exactly, down to using a fresh UUID as the synthetic
//! file name.

use std::collections::HashMap;
use std::io::BufRead;

use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::error::SimError;
use crate::graph::{TaskGraph, TaskGraphBuilder};
use crate::types::{OutputId, TaskId};

#[derive(Debug, thiserror::Error)]
pub enum DaxError {
    #[error("malformed DAX XML: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("malformed DAX XML attribute: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),
    #[error("job element missing required attribute `{0}`")]
    MissingAttr(&'static str),
    #[error("child element references unknown job id `{0}`")]
    UnknownJobRef(String),
    #[error(transparent)]
    Graph(#[from] SimError),
}

struct OutputDecl {
    name: String,
    size: f64,
    expected_size: Option<f64>,
}

struct JobDecl {
    name: String,
    duration: f64,
    expected_duration: Option<f64>,
    cpus: u32,
    outputs: Vec<OutputDecl>,
    inputs: Vec<String>,
}

fn attr(tag: &BytesStart<'_>, key: &str) -> Result<Option<String>, DaxError> {
    for a in tag.attributes() {
        let a = a?;
        if a.key.as_ref() == key.as_bytes() {
            return Ok(Some(a.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn parse_f64(value: Option<String>, default: f64) -> f64 {
    value.and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn parse_opt_f64(value: Option<String>) -> Option<f64> {
    match value.as_deref() {
        None | Some("None") => None,
        Some(v) => v.parse().ok(),
    }
}

/// Parse a DAX document into a [`TaskGraph`].
///
/// # Errors
/// Returns [`DaxError`] on malformed XML, a `<job>` missing its required
/// `id` attribute, a `<child>`/`<parent>` edge referencing an unknown job
/// id, or a resulting graph invariant violation.
pub fn from_reader<R: BufRead>(input: R) -> Result<TaskGraph, DaxError> {
    let mut reader = Reader::from_reader(input);
    reader.trim_text(true);

    let mut jobs: HashMap<String, JobDecl> = HashMap::new();
    let mut order: Vec<String> = Vec::new();
    let mut current_job: Option<String> = None;
    let mut current_child: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => break,
            Event::Start(tag) | Event::Empty(tag) => match tag.local_name().as_ref() {
                b"job" => {
                    let id = attr(&tag, "id")?.ok_or(DaxError::MissingAttr("id"))?;
                    let name = attr(&tag, "name")?.unwrap_or_else(|| id.clone());
                    let cpus = parse_f64(attr(&tag, "cores")?, 1.0) as u32;
                    let duration = parse_f64(attr(&tag, "runtime")?, 1.0);
                    let expected_duration = parse_opt_f64(attr(&tag, "expectedRuntime")?);
                    jobs.insert(
                        id.clone(),
                        JobDecl {
                            name,
                            duration,
                            expected_duration,
                            cpus: cpus.max(1),
                            outputs: Vec::new(),
                            inputs: Vec::new(),
                        },
                    );
                    order.push(id.clone());
                    current_job = Some(id);
                }
                b"uses" => {
                    let job_id = current_job
                        .clone()
                        .ok_or(DaxError::MissingAttr("job (uses outside job)"))?;
                    let file = attr(&tag, "file")?.ok_or(DaxError::MissingAttr("file"))?;
                    let link = attr(&tag, "link")?.unwrap_or_default();
                    let job = jobs.get_mut(&job_id).expect("current_job always tracks a known job");
                    if link == "output" {
                        let size = parse_f64(attr(&tag, "size")?, 1.0);
                        let expected_size = parse_opt_f64(attr(&tag, "expectedSize")?);
                        job.outputs.push(OutputDecl {
                            name: file,
                            size,
                            expected_size,
                        });
                    } else if link == "input" {
                        job.inputs.push(file);
                    }
                }
                b"child" => {
                    current_child = Some(attr(&tag, "ref")?.ok_or(DaxError::MissingAttr("ref"))?);
                }
                b"parent" => {
                    let child_id = current_child.clone().expect("parent only appears inside child");
                    let parent_id = attr(&tag, "ref")?.ok_or(DaxError::MissingAttr("ref"))?;
                    if !jobs.contains_key(&parent_id) {
                        return Err(DaxError::UnknownJobRef(parent_id));
                    }
                    if !jobs.contains_key(&child_id) {
                        return Err(DaxError::UnknownJobRef(child_id.clone()));
                    }

                    let shares_a_file = {
                        let child = &jobs[&child_id];
                        let parent = &jobs[&parent_id];
                        child
                            .inputs
                            .iter()
                            .any(|i| parent.outputs.iter().any(|o| &o.name == i))
                    };
                    if !shares_a_file {
                        // The original's fallback: synthesize a zero-size
                        // output to carry a structural-only dependency.
                        let name = uuid::Uuid::new_v4().to_string();
                        jobs.get_mut(&parent_id).unwrap().outputs.push(OutputDecl {
                            name: name.clone(),
                            size: 0.0,
                            expected_size: Some(0.0),
                        });
                        jobs.get_mut(&child_id).unwrap().inputs.push(name);
                    }
                }
                _ => {}
            },
            Event::End(tag) => match tag.local_name().as_ref() {
                b"job" => current_job = None,
                b"child" => current_child = None,
                _ => {}
            },
            _ => {}
        }
        buf.clear();
    }

    build_graph(&order, &jobs)
}

fn build_graph(order: &[String], jobs: &HashMap<String, JobDecl>) -> Result<TaskGraph, DaxError> {
    let mut builder = TaskGraphBuilder::new();
    let mut task_by_id: HashMap<&str, TaskId> = HashMap::new();
    let mut output_by_name: HashMap<&str, OutputId> = HashMap::new();

    for id in order {
        let job = &jobs[id];
        let task = builder.add_task_with_estimate(
            job.name.clone(),
            job.duration,
            job.expected_duration,
            job.cpus,
        );
        for output in &job.outputs {
            let output_id = builder.add_output_with_estimate(task, output.size, output.expected_size);
            output_by_name.insert(&output.name, output_id);
        }
        task_by_id.insert(id.as_str(), task);
    }

    for id in order {
        let job = &jobs[id];
        let consumer = task_by_id[id.as_str()];
        for input_name in &job.inputs {
            if let Some(&output) = output_by_name.get(input_name.as_str()) {
                builder.add_input(consumer, output);
            }
        }
    }

    Ok(builder.build()?)
}

/// Serialize `graph` as DAX XML to `writer`.
///
/// # Errors
/// Returns [`DaxError`] if writing to `writer` fails.
pub fn to_writer<W: std::io::Write>(graph: &TaskGraph, writer: W) -> Result<(), DaxError> {
    let mut xml = Writer::new_with_indent(writer, b' ', 2);

    let adag_start = BytesStart::new("adag");
    xml.write_event(Event::Start(adag_start))?;

    let job_id = |task: TaskId| format!("task-{}", task.raw());

    for task in graph.tasks() {
        let id = job_id(task.id());
        let mut job = BytesStart::new("job");
        job.push_attribute(("id", id.as_str()));
        job.push_attribute(("name", task.name()));
        job.push_attribute(("runtime", task.duration().to_string().as_str()));
        job.push_attribute((
            "expectedRuntime",
            task.expected_duration().map_or("None".to_string(), |d| d.to_string()).as_str(),
        ));
        job.push_attribute(("cores", task.cpus().to_string().as_str()));
        xml.write_event(Event::Start(job.clone()))?;

        for (index, &output_id) in task.outputs().iter().enumerate() {
            let output = graph.output(output_id);
            let mut uses = BytesStart::new("uses");
            uses.push_attribute(("link", "output"));
            uses.push_attribute(("size", output.size().to_string().as_str()));
            uses.push_attribute((
                "expectedSize",
                output.expected_size().map_or("None".to_string(), |s| s.to_string()).as_str(),
            ));
            let name = format!("{id}-o{index}");
            uses.push_attribute(("file", name.as_str()));
            xml.write_event(Event::Empty(uses))?;
        }

        let mut sorted_inputs: Vec<OutputId> = task.inputs().to_vec();
        sorted_inputs.sort_by_key(|&o| graph.output(o).parent().raw());
        for &input_id in &sorted_inputs {
            let output = graph.output(input_id);
            let parent = graph.task(output.parent());
            let index = parent
                .outputs()
                .iter()
                .position(|&o| o == input_id)
                .expect("input resolves to one of its parent's outputs");
            let parent_job_id = job_id(output.parent());
            let mut uses = BytesStart::new("uses");
            uses.push_attribute(("link", "input"));
            uses.push_attribute(("size", output.size().to_string().as_str()));
            uses.push_attribute((
                "expectedSize",
                output.expected_size().map_or("None".to_string(), |s| s.to_string()).as_str(),
            ));
            let name = format!("{parent_job_id}-o{index}");
            uses.push_attribute(("file", name.as_str()));
            xml.write_event(Event::Empty(uses))?;
        }

        xml.write_event(Event::End(BytesEnd::new("job")))?;
    }

    for task in graph.tasks() {
        if task.inputs().is_empty() {
            continue;
        }
        let mut child = BytesStart::new("child");
        child.push_attribute(("ref", job_id(task.id()).as_str()));
        xml.write_event(Event::Start(child))?;

        let mut parents: Vec<TaskId> = task.inputs().iter().map(|&o| graph.output(o).parent()).collect();
        parents.sort_by_key(TaskId::raw);
        parents.dedup();
        for parent in parents {
            let mut parent_tag = BytesStart::new("parent");
            parent_tag.push_attribute(("ref", job_id(parent).as_str()));
            xml.write_event(Event::Empty(parent_tag))?;
        }

        xml.write_event(Event::End(BytesEnd::new("child")))?;
    }

    xml.write_event(Event::End(BytesEnd::new("adag")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINEAR_DAX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<adag>
  <job id="ID0" name="a" runtime="2.0" cores="1">
    <uses link="output" file="a.out" size="10.0"/>
  </job>
  <job id="ID1" name="b" runtime="3.0" cores="1">
    <uses link="input" file="a.out" size="10.0"/>
  </job>
  <child ref="ID1">
    <parent ref="ID0"/>
  </child>
</adag>"#;

    #[test]
    fn parses_linear_chain_by_matching_file_names() {
        let graph = from_reader(LINEAR_DAX.as_bytes()).unwrap();
        assert_eq!(graph.task_count(), 2);
        assert_eq!(graph.output_count(), 1);
        let b = graph.tasks().iter().find(|t| t.name() == "b").unwrap();
        assert_eq!(b.inputs().len(), 1);
    }

    const DISCONNECTED_DAX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<adag>
  <job id="ID0" name="a" runtime="1.0" cores="1"/>
  <job id="ID1" name="b" runtime="1.0" cores="1"/>
  <child ref="ID1">
    <parent ref="ID0"/>
  </child>
</adag>"#;

    #[test]
    fn structural_only_edge_gets_a_synthetic_zero_size_output() {
        let graph = from_reader(DISCONNECTED_DAX.as_bytes()).unwrap();
        let b = graph.tasks().iter().find(|t| t.name() == "b").unwrap();
        assert_eq!(b.inputs().len(), 1);
        let input = graph.output(b.inputs()[0]);
        assert_eq!(input.size(), 0.0);
    }

    #[test]
    fn round_trip_through_writer_preserves_structure() {
        let mut b = TaskGraphBuilder::new();
        let a = b.add_task("a", 2.0, 1);
        let oa = b.add_output(a, 10.0);
        let bee = b.add_task("b", 3.0, 1);
        b.add_input(bee, oa);
        let graph = b.build().unwrap();

        let mut xml = Vec::new();
        to_writer(&graph, &mut xml).unwrap();
        let parsed = from_reader(xml.as_slice()).unwrap();

        assert_eq!(parsed.task_count(), 2);
        assert_eq!(parsed.output_count(), 1);
        let bee2 = parsed.tasks().iter().find(|t| t.name() == "b").unwrap();
        assert_eq!(bee2.inputs().len(), 1);
    }
}
