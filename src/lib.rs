//! # A discrete-event simulator for task-graph scheduling
//!
//! This crate simulates running a DAG of compute tasks across a cluster of
//! workers connected by a modeled network, under a pluggable scheduling
//! policy — without running any real computation or moving any real bytes.
//! It exists to let scheduler heuristics and network models be compared
//! cheaply and reproducibly.
//!
//! ## Core concepts
//!
//! - [`graph`] — the immutable task graph (tasks, their outputs, and the
//!   dependency edges between them)
//! - [`scheduler`] — the pluggable policy interface and five reference
//!   heuristics (DLS, ETF, MCP, LAST, K1h)
//! - [`network`] — models of inter-worker bandwidth, from zero-cost to
//!   max-min fair sharing
//! - [`kernel`] — the simulation loop tying a graph, a worker pool, a
//!   network model, and a scheduler together
//! - [`worker`] — the reference worker runtime the kernel drives
//! - [`runtime_info`] — the dense per-run mutable state for tasks and
//!   outputs
//! - [`trace`] — the append-only event journal, optionally recorded during
//!   a run and renderable as JSON
//! - [`serialization`] — task graph interchange formats (a flat JSON array,
//!   and DAX/Pegasus workflow XML)
//!
//! ## Quick start
//!
//! ```
//! use schedsim::config::SimulatorConfig;
//! use schedsim::graph::TaskGraphBuilder;
//! use schedsim::kernel::Simulator;
//! use schedsim::scheduler::DlsScheduler;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let mut builder = TaskGraphBuilder::new();
//! builder.add_task("only-task", 5.0, 1);
//! let graph = builder.build().unwrap();
//!
//! let sim = Simulator::new(graph, &[1], Box::new(DlsScheduler), SimulatorConfig::default());
//! let makespan = sim.run().await.unwrap();
//! assert!((makespan - 5.0).abs() < 1e-6);
//! # }
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod kernel;
pub mod network;
pub mod runtime_info;
pub mod scheduler;
pub mod serialization;
pub mod telemetry;
pub mod trace;
pub mod types;
pub mod worker;
