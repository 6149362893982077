use std::collections::HashMap;

use log::debug;
use uuid::Uuid;

use crate::cancellation::CancelToken;
use crate::stop_links::{EdgeLinks, StopLinksDb};
use crate::transit_data::Stop;

use super::dijkstra::{BoundedDijkstra, SearchProgress, State};
use super::{
    point_coord, AccessProfile, Coord, EdgeId, Metric, RoadGraph, RouterPoint, VertexId, Weight,
};

/// A road path as a polyline, with its travel time.
#[derive(Debug, Clone)]
pub struct RoadPath {
    pub points: Vec<Coord>,
    pub weight: Weight,
}

#[derive(Debug)]
pub enum ClosestStopsError {
    /// the access search only makes sense over a time metric
    NotTimeMetric(Metric),
    /// the stop links index was built against another road network
    RoadNetworkMismatch { links_guid: Uuid, graph_guid: Uuid },
    /// the stop links index was built for another access mode
    ProfileMismatch {
        links_profile: String,
        profile: String,
    },
}

impl std::fmt::Display for ClosestStopsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClosestStopsError::NotTimeMetric(metric) => write!(
                f,
                "The access profile measures {}, but the search needs time in seconds.",
                metric
            ),
            ClosestStopsError::RoadNetworkMismatch {
                links_guid,
                graph_guid,
            } => write!(
                f,
                "The stop links index was built against road network {}, \
                 but the search runs on road network {}.",
                links_guid, graph_guid
            ),
            ClosestStopsError::ProfileMismatch {
                links_profile,
                profile,
            } => write!(
                f,
                "The stop links index was built for profile `{}`, \
                 but the search uses profile `{}`.",
                links_profile, profile
            ),
        }
    }
}

impl std::error::Error for ClosestStopsError {}

/// How an access search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessTermination {
    /// the budgeted area is exhausted
    Completed,
    /// the visitor asked to stop
    StoppedEarly,
    /// the cancellation token fired
    Cancelled,
}

#[derive(Debug, Clone, Copy)]
struct StopCandidate {
    weight: Weight,
    edge: EdgeId,
    offset: u16,
    /// the settled vertex the partial edge hangs off; None when the
    /// stop was reached directly along the source point's own edge
    via_vertex: Option<VertexId>,
}

/// Bounded road search around a geographic point, reporting the transit
/// stops it can reach (forward) or be reached from (backward) within a
/// time budget.
///
/// Stops are found through the stop-links index: whenever a directed
/// edge carrying links is traversed, the remaining weight to each
/// linked stop's precise offset is computed and reported.
pub struct ClosestStopsSearch<'a, Graph, Profile> {
    graph: &'a Graph,
    edge_links: &'a EdgeLinks,
    source: RouterPoint,
    backward: bool,
    max_weight: Weight,
    dijkstra: BoundedDijkstra<'a, Graph, Profile>,
    best: HashMap<Stop, StopCandidate>,
}

impl<'a, Graph, Profile> ClosestStopsSearch<'a, Graph, Profile>
where
    Graph: RoadGraph,
    Profile: AccessProfile,
{
    pub fn new(
        graph: &'a Graph,
        profile: &'a Profile,
        source: RouterPoint,
        backward: bool,
        max_weight: Weight,
        links: &StopLinksDb,
        edge_links: &'a EdgeLinks,
    ) -> Result<Self, ClosestStopsError> {
        if profile.metric() != Metric::TimeInSeconds {
            return Err(ClosestStopsError::NotTimeMetric(profile.metric()));
        }
        if links.road_guid() != graph.guid() {
            return Err(ClosestStopsError::RoadNetworkMismatch {
                links_guid: links.road_guid(),
                graph_guid: graph.guid(),
            });
        }
        if links.profile_name() != profile.name() {
            return Err(ClosestStopsError::ProfileMismatch {
                links_profile: links.profile_name().to_string(),
                profile: profile.name().to_string(),
            });
        }

        let mut dijkstra = BoundedDijkstra::new(graph, profile, backward, max_weight);
        let (vertex1, vertex2) = graph.edge_endpoints(source.edge);
        let fraction = f32::from(source.offset) / f32::from(u16::MAX);
        // leaving towards vertex2 traverses the rest of the edge in
        // storage orientation; towards vertex1, against it
        if let Some(cost) = dijkstra.partial_edge_cost(source.edge, true, 1.0 - fraction) {
            dijkstra.add_source(vertex2, cost, Some(source.edge));
        }
        if let Some(cost) = dijkstra.partial_edge_cost(source.edge, false, fraction) {
            dijkstra.add_source(vertex1, cost, Some(source.edge));
        }

        Ok(Self {
            graph,
            edge_links,
            source,
            backward,
            max_weight,
            dijkstra,
            best: HashMap::new(),
        })
    }

    /// Runs the search. `visitor` is called with `(stop, seconds)` each
    /// time a stop is first reached or improved; returning true
    /// terminates the search early.
    pub fn run<Visitor>(&mut self, cancel: &CancelToken, mut visitor: Visitor) -> AccessTermination
    where
        Visitor: FnMut(Stop, Weight) -> bool,
    {
        let edge_links = self.edge_links;
        let graph = self.graph;

        // stops linked on the source point's own edge are reachable
        // without settling any vertex
        let source_fraction = f32::from(self.source.offset) / f32::from(u16::MAX);
        for &(stop, offset) in edge_links.on_edge(self.source.edge) {
            let stop_fraction = f32::from(offset) / f32::from(u16::MAX);
            let (orientation, span) = if stop_fraction >= source_fraction {
                (true, stop_fraction - source_fraction)
            } else {
                (false, source_fraction - stop_fraction)
            };
            let cost = match self.dijkstra.partial_edge_cost(self.source.edge, orientation, span)
            {
                Some(cost) => cost,
                None => continue,
            };
            if cost > self.max_weight {
                continue;
            }
            if self.record(stop, cost, self.source.edge, offset, None) && visitor(stop, cost) {
                return AccessTermination::StoppedEarly;
            }
        }

        let mut nb_of_settled = 0u64;
        loop {
            if cancel.is_cancelled() {
                debug!(
                    "Closest stops search cancelled after {} settled vertices.",
                    nb_of_settled
                );
                return AccessTermination::Cancelled;
            }
            match self.dijkstra.step() {
                SearchProgress::Settled(State { vertex, weight }) => {
                    nb_of_settled += 1;
                    for &target in graph.edges_from(vertex) {
                        if !edge_links.has_edge(target.edge) {
                            continue;
                        }
                        for &(stop, offset) in edge_links.on_edge(target.edge) {
                            let stop_fraction = f32::from(offset) / f32::from(u16::MAX);
                            let span = if target.forward {
                                stop_fraction
                            } else {
                                1.0 - stop_fraction
                            };
                            let cost = match self.dijkstra.partial_edge_cost(
                                target.edge,
                                target.forward,
                                span,
                            ) {
                                Some(cost) => cost,
                                None => continue,
                            };
                            let total = weight + cost;
                            if total > self.max_weight {
                                continue;
                            }
                            if self.record(stop, total, target.edge, offset, Some(vertex))
                                && visitor(stop, total)
                            {
                                return AccessTermination::StoppedEarly;
                            }
                        }
                    }
                }
                SearchProgress::Exhausted => {
                    break;
                }
            }
        }
        debug!(
            "Closest stops search settled {} vertices and found {} stop(s).",
            nb_of_settled,
            self.best.len()
        );
        AccessTermination::Completed
    }

    fn record(
        &mut self,
        stop: Stop,
        weight: Weight,
        edge: EdgeId,
        offset: u16,
        via_vertex: Option<VertexId>,
    ) -> bool {
        let candidate = StopCandidate {
            weight,
            edge,
            offset,
            via_vertex,
        };
        match self.best.get_mut(&stop) {
            Some(current) if current.weight <= weight => false,
            Some(current) => {
                *current = candidate;
                true
            }
            None => {
                self.best.insert(stop, candidate);
                true
            }
        }
    }

    /// Travel time to `stop` (forward) or from it (backward), best over
    /// all its snap candidates.
    pub fn weight_to(&self, stop: Stop) -> Option<Weight> {
        self.best.get(&stop).map(|candidate| candidate.weight)
    }

    /// The snapped point the best path reaches `stop` at.
    pub fn target_point(&self, stop: Stop) -> Option<RouterPoint> {
        let candidate = self.best.get(&stop)?;
        Some(RouterPoint {
            edge: candidate.edge,
            offset: candidate.offset,
            coord: point_coord(self.graph, candidate.edge, candidate.offset),
        })
    }

    /// The best road path: source point → stop when forward, stop →
    /// source point when backward.
    pub fn path_to(&self, stop: Stop) -> Option<RoadPath> {
        let candidate = self.best.get(&stop)?;
        let mut points = vec![self.source.coord];
        if let Some(via_vertex) = candidate.via_vertex {
            let chain = self.dijkstra.vertex_chain(via_vertex)?;
            points.extend(
                chain
                    .iter()
                    .map(|&vertex| self.graph.vertex_coord(vertex)),
            );
        }
        points.push(point_coord(self.graph, candidate.edge, candidate.offset));
        if self.backward {
            points.reverse();
        }
        Some(RoadPath {
            points,
            weight: candidate.weight,
        })
    }

    pub fn found_stops(&self) -> impl Iterator<Item = (Stop, Weight)> + '_ {
        self.best
            .iter()
            .map(|(stop, candidate)| (*stop, candidate.weight))
    }
}
