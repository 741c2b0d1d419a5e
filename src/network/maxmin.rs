//! The max-min fair network model: bandwidth is fairly divided across every
//! transfer concurrently touching a worker, and the division is recomputed
//! whenever the active set changes.
//!
//! Grounded on `estee.simulator.netmodels.MaxMinFlowNetModel` and its
//! `compute_maxmin_flow` free function: an iterative algorithm that
//! repeatedly saturates whichever connections are most constrained by their
//! sender's or receiver's remaining capacity, fixes their rate, and repeats
//! among what's left. `2e-6` is carried over from the original as the
//! epsilon used both to decide a connection is saturated and to decide a
//! transfer has finished.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;

use crate::error::SimError;
use crate::types::WorkerId;

use super::{validate_transfer, NetworkModel};

/// Matches the original implementation's tie-break/termination tolerance.
const EPSILON: f64 = 0.000_002;

/// Compute the max-min fair per-connection transfer rate.
///
/// `send_capacities[w]`/`recv_capacities[w]` are worker `w`'s total upload /
/// download bandwidth. `connections[i] = (sender, receiver)` is the i-th
/// active transfer. Returns one rate per connection, in the same order.
///
/// Connections sharing a sender split that sender's remaining capacity
/// evenly in each round, and likewise for a shared receiver; whichever
/// connections are bottlenecked first are saturated (their final rate
/// fixed) and removed from further rounds, repeating until every connection
/// has a rate.
#[must_use]
pub fn compute_maxmin_flow(
    send_capacities: &[f64],
    recv_capacities: &[f64],
    connections: &[(usize, usize)],
) -> Vec<f64> {
    let n = connections.len();
    let mut speeds = vec![0.0; n];
    if n == 0 {
        return speeds;
    }

    let mut remaining_send = send_capacities.to_vec();
    let mut remaining_recv = recv_capacities.to_vec();
    let mut active: Vec<usize> = (0..n).collect();

    while !active.is_empty() {
        let mut send_count: FxHashMap<usize, u32> = FxHashMap::default();
        let mut recv_count: FxHashMap<usize, u32> = FxHashMap::default();
        for &idx in &active {
            let (s, r) = connections[idx];
            *send_count.entry(s).or_insert(0) += 1;
            *recv_count.entry(r).or_insert(0) += 1;
        }

        let bottleneck = |idx: usize| -> f64 {
            let (s, r) = connections[idx];
            let sm = remaining_send[s] / f64::from(send_count[&s]);
            let rm = remaining_recv[r] / f64::from(recv_count[&r]);
            sm.min(rm)
        };

        let min_rate = active
            .iter()
            .map(|&idx| bottleneck(idx))
            .fold(f64::INFINITY, f64::min)
            .max(0.0);

        for &idx in &active {
            let (s, r) = connections[idx];
            remaining_send[s] -= min_rate;
            remaining_recv[r] -= min_rate;
        }

        let mut still_active = Vec::with_capacity(active.len());
        for &idx in &active {
            speeds[idx] = min_rate;
            if (bottleneck(idx) - min_rate).abs() > EPSILON {
                still_active.push(idx);
            }
        }
        active = still_active;
    }

    speeds
}

/// A small fixed-capacity LRU cache from connectivity topology to the flow
/// rates it implies, so repeated topologies (the common case once a run
/// settles into a steady flow of transfers) skip re-solving the flow
/// problem. No pack dependency ships an LRU map, so this is a direct
/// `FxHashMap` + recency deque rather than an added crate.
struct FlowCache {
    capacity: usize,
    entries: FxHashMap<Vec<(u32, u32)>, Vec<f64>>,
    recency: VecDeque<Vec<(u32, u32)>>,
}

impl FlowCache {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: FxHashMap::default(),
            recency: VecDeque::new(),
        }
    }

    fn get(&mut self, key: &[(u32, u32)]) -> Option<Vec<f64>> {
        if let Some(speeds) = self.entries.get(key) {
            let speeds = speeds.clone();
            self.recency.retain(|k| k != key);
            self.recency.push_back(key.to_vec());
            Some(speeds)
        } else {
            None
        }
    }

    fn put(&mut self, key: Vec<(u32, u32)>, speeds: Vec<f64>) {
        if self.entries.len() >= self.capacity && !self.entries.contains_key(&key) {
            if let Some(oldest) = self.recency.pop_front() {
                self.entries.remove(&oldest);
            }
        }
        self.recency.push_back(key.clone());
        self.entries.insert(key, speeds);
    }
}

struct Transfer {
    id: u64,
    from: WorkerId,
    to: WorkerId,
    remaining: f64,
    speed: f64,
}

struct MaxMinState {
    transfers: Vec<Transfer>,
    next_id: u64,
    last_update: Instant,
    cache: FlowCache,
}

/// Receives a notification every time the flow matrix is recomputed —
/// matches spec §4.5's `flow-change` trace event.
pub trait FlowTraceSink: Send + Sync {
    fn on_flow_recomputed(&self, time: f64, active_transfers: usize);
}

/// The max-min fair network model.
pub struct MaxMinFairNetModel {
    bandwidth: f64,
    state: Mutex<MaxMinState>,
    changed: Notify,
    started: Instant,
    trace_sink: Option<std::sync::Arc<dyn FlowTraceSink>>,
}

impl MaxMinFairNetModel {
    /// # Panics
    /// Panics if `bandwidth` is not a positive, finite number.
    #[must_use]
    pub fn new(bandwidth: f64) -> Self {
        assert!(
            bandwidth.is_finite() && bandwidth > 0.0,
            "bandwidth must be positive and finite, got {bandwidth}"
        );
        let now = Instant::now();
        Self {
            bandwidth,
            state: Mutex::new(MaxMinState {
                transfers: Vec::new(),
                next_id: 0,
                last_update: now,
                cache: FlowCache::new(256),
            }),
            changed: Notify::new(),
            started: now,
            trace_sink: None,
        }
    }

    /// Attach a sink notified every time flows are recomputed.
    #[must_use]
    pub fn with_trace_sink(mut self, sink: std::sync::Arc<dyn FlowTraceSink>) -> Self {
        self.trace_sink = Some(sink);
        self
    }

    fn notify_flow_recomputed(&self, state: &MaxMinState, now: Instant) {
        if let Some(sink) = &self.trace_sink {
            let time = (now - self.started).as_secs_f64();
            sink.on_flow_recomputed(time, state.transfers.len());
        }
    }
}

fn advance_and_recompute(state: &mut MaxMinState, bandwidth: f64, now: Instant) {
    let elapsed = (now - state.last_update).as_secs_f64();
    if elapsed > 0.0 {
        for t in &mut state.transfers {
            t.remaining = (t.remaining - t.speed * elapsed).max(0.0);
        }
    }
    state.last_update = now;

    let n = state.transfers.len();
    if n == 0 {
        return;
    }
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by_key(|&i| (state.transfers[i].from.raw(), state.transfers[i].to.raw()));
    let key: Vec<(u32, u32)> = order
        .iter()
        .map(|&i| (state.transfers[i].from.raw(), state.transfers[i].to.raw()))
        .collect();

    let speeds_sorted = if let Some(cached) = state.cache.get(&key) {
        cached
    } else {
        let connections: Vec<(usize, usize)> = order
            .iter()
            .map(|&i| (state.transfers[i].from.index(), state.transfers[i].to.index()))
            .collect();
        let num_workers = connections
            .iter()
            .flat_map(|&(a, b)| [a, b])
            .max()
            .map_or(0, |m| m + 1);
        let caps = vec![bandwidth; num_workers];
        let speeds = compute_maxmin_flow(&caps, &caps, &connections);
        state.cache.put(key, speeds.clone());
        speeds
    };

    for (pos, &orig_idx) in order.iter().enumerate() {
        state.transfers[orig_idx].speed = speeds_sorted[pos];
    }
}

#[async_trait]
impl NetworkModel for MaxMinFairNetModel {
    async fn download(&self, from: WorkerId, to: WorkerId, size: f64) -> Result<(), SimError> {
        validate_transfer(from, to, size)?;
        if size <= EPSILON {
            return Ok(());
        }

        let id = {
            let mut state = self.state.lock().await;
            let now = Instant::now();
            advance_and_recompute(&mut state, self.bandwidth, now);
            let id = state.next_id;
            state.next_id += 1;
            state.transfers.push(Transfer {
                id,
                from,
                to,
                remaining: size,
                speed: 0.0,
            });
            advance_and_recompute(&mut state, self.bandwidth, now);
            self.notify_flow_recomputed(&state, now);
            id
        };
        self.changed.notify_waiters();

        loop {
            let wait = {
                let mut state = self.state.lock().await;
                let now = Instant::now();
                advance_and_recompute(&mut state, self.bandwidth, now);

                let mine = state
                    .transfers
                    .iter()
                    .position(|t| t.id == id)
                    .expect("own transfer must still be registered");

                if state.transfers[mine].remaining <= EPSILON {
                    state.transfers.remove(mine);
                    advance_and_recompute(&mut state, self.bandwidth, now);
                    self.notify_flow_recomputed(&state, now);
                    None
                } else {
                    let eta = state
                        .transfers
                        .iter()
                        .filter(|t| t.speed > EPSILON)
                        .map(|t| t.remaining / t.speed)
                        .fold(f64::INFINITY, f64::min);
                    Some(Duration::from_secs_f64(eta.max(0.0)))
                }
            };

            let Some(wait) = wait else {
                self.changed.notify_waiters();
                return Ok(());
            };

            tokio::select! {
                () = tokio::time::sleep(wait) => {}
                () = self.changed.notified() => {}
            }
        }
    }
}
