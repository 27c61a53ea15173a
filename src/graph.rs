use crate::{direction::Direction8, sorted_points};

use fnv::{FnvHashMap, FnvHashSet};
use glam::IVec3;
use petgraph::{algo::astar, graph::NodeIndex, stable_graph::StableGraph, Undirected};

/// Floor cells joined to their orthogonal floor neighbours.
pub struct FloorGraph {
    pub graph: StableGraph<IVec3, (), Undirected>,
    nodes: FnvHashMap<IVec3, NodeIndex>,
}

impl FloorGraph {
    pub fn new(floor: &FnvHashSet<IVec3>) -> Self {
        let mut graph = StableGraph::default();
        let mut nodes = FnvHashMap::default();
        for p in sorted_points(floor.iter()) {
            nodes.insert(p, graph.add_node(p));
        }

        // Only look forward and right so each edge is added once.
        for p in sorted_points(floor.iter()) {
            for d in [Direction8::Forward, Direction8::Right].iter() {
                if let Some(n) = nodes.get(&(p + d.offset())) {
                    graph.add_edge(nodes[&p], *n, ());
                }
            }
        }

        FloorGraph { graph, nodes }
    }

    pub fn node(&self, p: IVec3) -> Option<NodeIndex> {
        self.nodes.get(&p).copied()
    }

    /// Shortest orthogonal walk from `from` to `to`, both ends included.
    pub fn shortest_path(&self, from: IVec3, to: IVec3) -> Option<Vec<IVec3>> {
        let start = self.node(from)?;
        let goal = self.node(to)?;
        let (_, path) = astar(
            &self.graph,
            start,
            |n| n == goal,
            |_| 1u32,
            |n| {
                let d = self.graph[n] - to;
                (d.x.abs() + d.z.abs()) as u32
            },
        )?;

        Some(path.into_iter().map(|n| self.graph[n]).collect())
    }
}

#[derive(Clone, Debug, Default)]
pub struct CorridorReservation {
    /// The two cells above every path cell: player clearance that must stay free.
    pub reserved: FnvHashSet<IVec3>,
    pub paths: Vec<Vec<IVec3>>,
}

/// Reserves a walkable route from `entry` to each of `targets` (the floor cells just inside a
/// room's doorways).
pub fn reserve_corridors(
    floor: &FnvHashSet<IVec3>,
    entry: IVec3,
    targets: &[IVec3],
) -> CorridorReservation {
    let graph = FloorGraph::new(floor);
    let mut reservation = CorridorReservation::default();
    for target in targets.iter() {
        match graph.shortest_path(entry, *target) {
            Some(path) => {
                for p in path.iter() {
                    reservation.reserved.insert(*p + IVec3::Y);
                    reservation.reserved.insert(*p + IVec3::Y * 2);
                }
                reservation.paths.push(path);
            }
            None => log::warn!("No floor path from {:?} to doorway at {:?}", entry, target),
        }
    }

    reservation
}
