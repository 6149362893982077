use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::collections::{BinaryHeap, HashMap};

use super::{AccessProfile, EdgeDirection, EdgeId, RoadGraph, VertexId, Weight};

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct State {
    pub weight: Weight,
    pub vertex: VertexId,
}

// The priority queue depends on `Ord`. Explicitly implement the trait
// so the queue becomes a min-heap instead of a max-heap; ties compare
// vertices to keep `PartialEq` and `Ord` consistent.
impl Ord for State {
    fn cmp(&self, other: &State) -> Ordering {
        other
            .weight
            .cmp(&self.weight)
            .then_with(|| self.vertex.cmp(&other.vertex))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &State) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// How a settled vertex was reached. Source seeds carry no parent.
#[derive(Debug, Clone, Copy)]
pub struct Visit {
    pub weight: Weight,
    pub parent: Option<(VertexId, EdgeId)>,
}

#[derive(Debug, Clone, Copy)]
pub enum SearchProgress {
    Settled(State),
    Exhausted,
}

/// Bounded one-to-many Dijkstra over a road graph, driven one settled
/// vertex at a time by its caller.
///
/// Seeded with `(vertex, weight, via-edge)` source paths, it never
/// expands past `max_weight`. In backward mode edge directions are
/// inverted, so weights are those of paths running towards the source.
///
/// This is a one-directional bounded search. A meeting-in-the-middle
/// pair built on top of it must interleave one step per direction and
/// stop only once both frontier minima exceed the best meeting weight;
/// running one side to exhaustion first does not terminate correctly
/// under a weight bound.
pub struct BoundedDijkstra<'a, Graph, Profile> {
    graph: &'a Graph,
    profile: &'a Profile,
    backward: bool,
    max_weight: Weight,
    heap: BinaryHeap<State>,
    visits: HashMap<VertexId, Visit>,
    settled: HashMap<VertexId, Weight>,
}

impl<'a, Graph, Profile> BoundedDijkstra<'a, Graph, Profile>
where
    Graph: RoadGraph,
    Profile: AccessProfile,
{
    pub fn new(graph: &'a Graph, profile: &'a Profile, backward: bool, max_weight: Weight) -> Self {
        Self {
            graph,
            profile,
            backward,
            max_weight,
            heap: BinaryHeap::new(),
            visits: HashMap::new(),
            settled: HashMap::new(),
        }
    }

    /// Seeds the search. `_via_edge` names the edge the source path
    /// enters the graph through, when it does not start on a vertex.
    pub fn add_source(&mut self, vertex: VertexId, weight: Weight, _via_edge: Option<EdgeId>) {
        if weight > self.max_weight {
            return;
        }
        let improves = match self.visits.entry(vertex) {
            Entry::Vacant(entry) => {
                entry.insert(Visit {
                    weight,
                    parent: None,
                });
                true
            }
            Entry::Occupied(mut entry) => {
                if weight < entry.get().weight {
                    entry.insert(Visit {
                        weight,
                        parent: None,
                    });
                    true
                } else {
                    false
                }
            }
        };
        if improves {
            self.heap.push(State { weight, vertex });
        }
    }

    /// Settles the next vertex and relaxes its outgoing edges.
    pub fn step(&mut self) -> SearchProgress {
        // lazy deletion: skip heap entries made stale by a later improvement
        while let Some(State { weight, vertex }) = self.heap.pop() {
            if self.settled.contains_key(&vertex) {
                continue;
            }
            if self
                .visits
                .get(&vertex)
                .map_or(true, |visit| visit.weight < weight)
            {
                continue;
            }
            self.settled.insert(vertex, weight);

            for &target in self.graph.edges_from(vertex) {
                let cost = match self.edge_cost(target.edge, target.forward) {
                    Some(cost) => cost,
                    None => continue,
                };
                let next_weight = weight + cost;
                if next_weight > self.max_weight {
                    continue;
                }
                let improves = match self.visits.entry(target.to) {
                    Entry::Vacant(entry) => {
                        entry.insert(Visit {
                            weight: next_weight,
                            parent: Some((vertex, target.edge)),
                        });
                        true
                    }
                    Entry::Occupied(mut entry) => {
                        if next_weight < entry.get().weight {
                            entry.insert(Visit {
                                weight: next_weight,
                                parent: Some((vertex, target.edge)),
                            });
                            true
                        } else {
                            false
                        }
                    }
                };
                if improves {
                    self.heap.push(State {
                        weight: next_weight,
                        vertex: target.to,
                    });
                }
            }

            return SearchProgress::Settled(State { weight, vertex });
        }
        SearchProgress::Exhausted
    }

    pub fn try_get_visit(&self, vertex: VertexId) -> Option<&Visit> {
        self.visits.get(&vertex)
    }

    pub fn is_settled(&self, vertex: VertexId) -> bool {
        self.settled.contains_key(&vertex)
    }

    /// The vertex chain from a source seed to `vertex`, in travel order
    /// of a forward search.
    pub fn vertex_chain(&self, vertex: VertexId) -> Option<Vec<VertexId>> {
        let mut chain = vec![vertex];
        let mut current = vertex;
        loop {
            let visit = self.visits.get(&current)?;
            match visit.parent {
                Some((parent, _)) => {
                    chain.push(parent);
                    current = parent;
                }
                None => {
                    break;
                }
            }
        }
        chain.reverse();
        Some(chain)
    }

    /// The traversal cost of `edge` in the given orientation, or `None`
    /// when the profile forbids it. The direction constraint flips in
    /// backward mode.
    pub fn edge_cost(&self, edge: EdgeId, forward_orientation: bool) -> Option<Weight> {
        let factor = self.profile.factor(self.graph.edge_meta(edge));
        if factor.seconds_per_meter < 0.0 {
            return None;
        }
        let orientation = if self.backward {
            !forward_orientation
        } else {
            forward_orientation
        };
        let allowed = match factor.direction {
            EdgeDirection::Both => true,
            EdgeDirection::Forward => orientation,
            EdgeDirection::Backward => !orientation,
        };
        if !allowed {
            return None;
        }
        let seconds = self.graph.edge_length(edge) * factor.seconds_per_meter;
        Some(seconds.round() as Weight)
    }

    /// Same as `edge_cost` but over a part of the edge.
    pub fn partial_edge_cost(
        &self,
        edge: EdgeId,
        forward_orientation: bool,
        fraction: f32,
    ) -> Option<Weight> {
        let full = self.edge_cost(edge, forward_orientation)?;
        Some((full as f32 * fraction).round() as Weight)
    }
}
