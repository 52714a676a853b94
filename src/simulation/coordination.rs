//! Help requests and the once-per-tick assignment pass
//!
//! Requests pile up in a [`HelpQueue`] during a tick: robots that find a
//! cluster of dirt around them and the world's own dirt sampling both push
//! onto it. At the end of the tick the queue is drained most-severe first,
//! and each request is offered to robots nearest-first until one accepts.
//! Whatever nobody accepts is dropped.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::core::types::Coord;
use crate::entity::Robot;

/// A call for help at a location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelpRequest {
    /// Number of dirty cells behind the request
    pub severity: usize,
    pub location: Coord,
}

impl HelpRequest {
    pub fn new(severity: usize, location: Coord) -> Self {
        Self { severity, location }
    }
}

/// Requests collected during the current tick
#[derive(Debug, Clone, Default)]
pub struct HelpQueue {
    requests: Vec<HelpRequest>,
}

impl HelpQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, request: HelpRequest) {
        self.requests.push(request);
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HelpRequest> {
        self.requests.iter()
    }

    /// Empty the queue, most severe first
    ///
    /// Equal severities keep their insertion order.
    pub fn drain_by_severity(&mut self) -> Vec<HelpRequest> {
        let mut requests = std::mem::take(&mut self.requests);
        requests.sort_by(|a, b| b.severity.cmp(&a.severity));
        requests
    }
}

/// A request that found a taker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub request: HelpRequest,
    pub robot: usize,
}

/// Outcome of one coordination pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoordinationReport {
    /// Requests that were offered, in offer order
    pub offered: Vec<HelpRequest>,
    pub assignments: Vec<Assignment>,
}

impl CoordinationReport {
    pub fn dropped(&self) -> usize {
        self.offered.len() - self.assignments.len()
    }
}

/// Offer every queued request to the fleet and clear the queue
///
/// `ranking` is the initial robot order (indices into `robots`). It is
/// re-sorted by distance for each request with a stable sort, so robots at
/// equal distance keep the order they had for the previous request.
pub fn run_coordination_pass(
    queue: &mut HelpQueue,
    robots: &mut [Robot],
    mut ranking: Vec<usize>,
) -> CoordinationReport {
    let offered = queue.drain_by_severity();
    let mut assignments = Vec::new();

    for request in &offered {
        ranking.sort_by_key(|&idx| OrderedFloat(robots[idx].position.distance(&request.location)));

        let taker = ranking
            .iter()
            .copied()
            .find(|&idx| robots[idx].accept_request(request.location));

        match taker {
            Some(robot) => {
                tracing::debug!(
                    "Robot {} accepted request at {} (severity {})",
                    robot,
                    request.location,
                    request.severity
                );
                assignments.push(Assignment { request: *request, robot });
            }
            None => {
                tracing::trace!("Request at {} dropped, no idle robot", request.location);
            }
        }
    }

    CoordinationReport { offered, assignments }
}
