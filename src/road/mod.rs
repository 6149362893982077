use uuid::Uuid;

pub mod closest_stops;
pub mod dijkstra;

pub use closest_stops::{AccessTermination, ClosestStopsError, ClosestStopsSearch, RoadPath};

pub type VertexId = u32;
pub type EdgeId = u32;

/// travel time in seconds
pub type Weight = u32;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coord {
    pub lat: f32,
    pub lon: f32,
}

/// Which way an edge may be traversed, relative to its storage
/// orientation (from its first endpoint to its second).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeDirection {
    Both,
    Forward,
    Backward,
}

/// What an access-mode profile says about one edge.
#[derive(Debug, Clone, Copy)]
pub struct Factor {
    pub seconds_per_meter: f32,
    pub direction: EdgeDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    TimeInSeconds,
    DistanceInMeters,
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Metric::TimeInSeconds => write!(f, "time in seconds"),
            Metric::DistanceInMeters => write!(f, "distance in meters"),
        }
    }
}

/// The access mode used to reach and leave the transit network. The
/// factor function is opaque: per-edge speeds come from whatever the
/// profile was built from.
pub trait AccessProfile {
    fn name(&self) -> &str;
    fn metric(&self) -> Metric;
    fn factor(&self, edge_meta: u32) -> Factor;
}

/// A pedestrian at 4 km/h on every edge, in both directions.
pub struct WalkingProfile;

impl AccessProfile for WalkingProfile {
    fn name(&self) -> &str {
        "pedestrian"
    }

    fn metric(&self) -> Metric {
        Metric::TimeInSeconds
    }

    fn factor(&self, _edge_meta: u32) -> Factor {
        Factor {
            seconds_per_meter: 3600.0 / 4000.0,
            direction: EdgeDirection::Both,
        }
    }
}

/// A point snapped onto the road network: `offset` is the fraction of
/// the edge length scaled to `u16::MAX`, counted from the edge's first
/// endpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouterPoint {
    pub edge: EdgeId,
    pub offset: u16,
    pub coord: Coord,
}

/// One directed way out of a vertex. `forward` tells whether taking it
/// traverses the edge in storage orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeTarget {
    pub edge: EdgeId,
    pub to: VertexId,
    pub forward: bool,
}

/// The road network contract consumed by the access searches. The
/// in-memory `RoadNetwork` below implements it; production callers can
/// put their own routing database behind it.
pub trait RoadGraph {
    fn guid(&self) -> Uuid;
    fn nb_of_vertices(&self) -> usize;
    fn vertex_coord(&self, vertex: VertexId) -> Coord;
    fn edge_endpoints(&self, edge: EdgeId) -> (VertexId, VertexId);
    /// edge length in meters
    fn edge_length(&self, edge: EdgeId) -> f32;
    fn edge_meta(&self, edge: EdgeId) -> u32;
    fn edges_from(&self, vertex: VertexId) -> &[EdgeTarget];
}

#[derive(Debug, Clone, Copy)]
struct EdgeData {
    vertex1: VertexId,
    vertex2: VertexId,
    length: f32,
    meta: u32,
}

/// Reference in-memory road network.
pub struct RoadNetwork {
    guid: Uuid,
    vertex_coords: Vec<Coord>,
    edges: Vec<EdgeData>,
    adjacency: Vec<Vec<EdgeTarget>>,
}

impl RoadNetwork {
    pub fn new() -> Self {
        Self {
            guid: Uuid::new_v4(),
            vertex_coords: Vec::new(),
            edges: Vec::new(),
            adjacency: Vec::new(),
        }
    }

    pub fn add_vertex(&mut self, coord: Coord) -> VertexId {
        let vertex = self.vertex_coords.len() as VertexId;
        self.vertex_coords.push(coord);
        self.adjacency.push(Vec::new());
        vertex
    }

    pub fn add_edge(&mut self, vertex1: VertexId, vertex2: VertexId, length: f32, meta: u32) -> EdgeId {
        let edge = self.edges.len() as EdgeId;
        self.edges.push(EdgeData {
            vertex1,
            vertex2,
            length,
            meta,
        });
        self.adjacency[vertex1 as usize].push(EdgeTarget {
            edge,
            to: vertex2,
            forward: true,
        });
        self.adjacency[vertex2 as usize].push(EdgeTarget {
            edge,
            to: vertex1,
            forward: false,
        });
        edge
    }

    /// Snaps a point at `fraction` (0..=1) along `edge`.
    pub fn point_on_edge(&self, edge: EdgeId, fraction: f32) -> RouterPoint {
        let offset = (fraction.clamp(0.0, 1.0) * f32::from(u16::MAX)) as u16;
        RouterPoint {
            edge,
            offset,
            coord: self.interpolate(edge, offset),
        }
    }

    pub fn interpolate(&self, edge: EdgeId, offset: u16) -> Coord {
        let data = &self.edges[edge as usize];
        let from = self.vertex_coords[data.vertex1 as usize];
        let to = self.vertex_coords[data.vertex2 as usize];
        let fraction = f32::from(offset) / f32::from(u16::MAX);
        Coord {
            lat: from.lat + (to.lat - from.lat) * fraction,
            lon: from.lon + (to.lon - from.lon) * fraction,
        }
    }
}

impl Default for RoadNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl RoadGraph for RoadNetwork {
    fn guid(&self) -> Uuid {
        self.guid
    }

    fn nb_of_vertices(&self) -> usize {
        self.vertex_coords.len()
    }

    fn vertex_coord(&self, vertex: VertexId) -> Coord {
        self.vertex_coords[vertex as usize]
    }

    fn edge_endpoints(&self, edge: EdgeId) -> (VertexId, VertexId) {
        let data = &self.edges[edge as usize];
        (data.vertex1, data.vertex2)
    }

    fn edge_length(&self, edge: EdgeId) -> f32 {
        self.edges[edge as usize].length
    }

    fn edge_meta(&self, edge: EdgeId) -> u32 {
        self.edges[edge as usize].meta
    }

    fn edges_from(&self, vertex: VertexId) -> &[EdgeTarget] {
        &self.adjacency[vertex as usize]
    }
}

/// Interpolated coordinate of a point at `offset` along `edge`, for
/// any road graph.
pub fn point_coord<Graph: RoadGraph>(graph: &Graph, edge: EdgeId, offset: u16) -> Coord {
    let (vertex1, vertex2) = graph.edge_endpoints(edge);
    let from = graph.vertex_coord(vertex1);
    let to = graph.vertex_coord(vertex2);
    let fraction = f32::from(offset) / f32::from(u16::MAX);
    Coord {
        lat: from.lat + (to.lat - from.lat) * fraction,
        lon: from.lon + (to.lon - from.lon) * fraction,
    }
}
