use crate::geometry::{Rect, Vec2};
use crate::graph::{LayoutGraph, NodeIndex, Positions};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Black-box layout contract: one centre per node of `graph`.
///
/// Implementations may be randomized. Callers only rely on the returned
/// positions once `execute` has returned.
pub trait Layouter {
    fn execute(&self, graph: &LayoutGraph) -> Positions;

    /// Positions used when a pass never completes. Nodes are laid on a square
    /// grid in index order.
    fn initial_positions(&self, graph: &LayoutGraph) -> Positions {
        grid_positions(graph.node_count(), 100.0)
    }
}

fn grid_positions(node_count: usize, spacing: f32) -> Positions {
    let cols = (node_count as f32).sqrt().ceil().max(1.0) as usize;
    Positions::from_vec(
        (0..node_count)
            .map(|i| Vec2::new((i % cols) as f32 * spacing, (i / cols) as f32 * spacing))
            .collect(),
    )
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceLayoutParams {
    /// Horizontal space left between laid-out components.
    pub component_spacing: f32,
    /// Repulsion of a node is `base + volume * per_volume`.
    pub node_repulsion_base: f32,
    pub node_repulsion_per_volume: f32,
    pub ideal_edge_length: f32,
    pub edge_elasticity: f32,
    pub gravity: f32,
    /// Gravity only acts beyond `gravity_range * ideal_edge_length` from the
    /// component centroid.
    pub gravity_range: f32,
    /// Random initial placement; when false nodes start on a circle.
    pub randomize: bool,
    pub iterations: usize,
    /// Fixed seed for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for ForceLayoutParams {
    fn default() -> Self {
        Self {
            component_spacing: 300.0,
            node_repulsion_base: 20_000.0,
            node_repulsion_per_volume: 0.3,
            ideal_edge_length: 400.0,
            edge_elasticity: 0.45,
            gravity: 0.2,
            gravity_range: 3.0,
            randomize: true,
            iterations: 200,
            seed: None,
        }
    }
}

impl ForceLayoutParams {
    pub fn node_repulsion(&self, volume: f64) -> f32 {
        let volume = if volume.is_finite() { volume.max(0.0) } else { 0.0 };
        self.node_repulsion_base + (volume as f32) * self.node_repulsion_per_volume
    }
}

/// Force-directed layout run independently per connected component.
///
/// Components are simulated in parallel and merged in component order, then
/// arranged left to right with `component_spacing` between them. The packer
/// repositions clusters afterwards, so this arrangement only matters for the
/// timeout fallback and for callers that skip packing.
pub struct ForceDirectedLayouter {
    pub params: ForceLayoutParams,
}

impl ForceDirectedLayouter {
    const MIN_DISTANCE: f32 = 1.0;
    const SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

    pub fn new(params: ForceLayoutParams) -> Self {
        Self { params }
    }

    fn base_seed(&self) -> u64 {
        self.params.seed.unwrap_or_else(rand::random)
    }

    fn seed_component(&self, component: &[NodeIndex], rng: &mut StdRng) -> Vec<Vec2> {
        let n = component.len();
        let k = self.params.ideal_edge_length;
        if n == 1 {
            return vec![Vec2::ZERO];
        }

        if self.params.randomize {
            let half = k * (n as f32).sqrt() * 0.5;
            (0..n)
                .map(|_| Vec2::new(rng.gen_range(-half..=half), rng.gen_range(-half..=half)))
                .collect()
        } else {
            let radius = k * n as f32 / std::f32::consts::TAU;
            (0..n)
                .map(|i| {
                    let angle = i as f32 / n as f32 * std::f32::consts::TAU;
                    Vec2::new(radius * angle.cos(), radius * angle.sin())
                })
                .collect()
        }
    }

    fn layout_component(
        &self,
        graph: &LayoutGraph,
        component: &[NodeIndex],
        seed: u64,
    ) -> Vec<(NodeIndex, Vec2)> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut pos = self.seed_component(component, &mut rng);
        let n = component.len();
        if n > 1 {
            self.simulate(graph, component, &mut pos);
        }
        component.iter().copied().zip(pos).collect()
    }

    fn simulate(&self, graph: &LayoutGraph, component: &[NodeIndex], pos: &mut [Vec2]) {
        let p = &self.params;
        let n = component.len();
        let k = p.ideal_edge_length.max(Self::MIN_DISTANCE);

        let local: std::collections::HashMap<NodeIndex, usize> = component
            .iter()
            .enumerate()
            .map(|(local, &idx)| (idx, local))
            .collect();
        let springs: Vec<(usize, usize)> = graph
            .edges()
            .iter()
            .filter_map(|edge| Some((*local.get(&edge.source)?, *local.get(&edge.target)?)))
            .filter(|(a, b)| a != b)
            .collect();
        let weights: Vec<f32> = component
            .iter()
            .map(|&idx| p.node_repulsion(graph[idx].volume) / p.node_repulsion_base.max(1.0))
            .collect();

        let initial_temperature = k * (n as f32).sqrt() * 0.1;
        let iterations = p.iterations.max(1);

        for step in 0..iterations {
            let temperature = initial_temperature * (1.0 - step as f32 / iterations as f32);
            let mut disp = vec![Vec2::ZERO; n];

            // Repulsion between every pair.
            for i in 0..n {
                for j in (i + 1)..n {
                    let mut delta = pos[i] - pos[j];
                    let mut dist = delta.length();
                    if dist < Self::MIN_DISTANCE {
                        // Coincident nodes: push apart along a fixed diagonal.
                        delta = Vec2::new((i as f32) - (j as f32), 1.0);
                        dist = delta.length();
                    }
                    let force = k * k / dist * (weights[i] * weights[j]).sqrt();
                    let push = delta * (force / dist);
                    disp[i] += push;
                    disp[j] -= push;
                }
            }

            // Springs pull linked nodes toward the ideal length.
            for &(a, b) in &springs {
                let delta = pos[a] - pos[b];
                let dist = delta.length().max(Self::MIN_DISTANCE);
                let force = dist * dist / k * p.edge_elasticity;
                let pull = delta * (force / dist);
                disp[a] -= pull;
                disp[b] += pull;
            }

            // Gravity toward the centroid for stragglers.
            let centroid = pos.iter().fold(Vec2::ZERO, |acc, &v| acc + v) * (1.0 / n as f32);
            let range = p.gravity_range * k;
            for i in 0..n {
                let delta = centroid - pos[i];
                let dist = delta.length();
                if dist > range {
                    disp[i] += delta * (p.gravity * (dist - range) / dist);
                }
            }

            for i in 0..n {
                let len = disp[i].length();
                if len > 0.0 && len.is_finite() {
                    pos[i] += disp[i] * (len.min(temperature) / len);
                }
            }
        }
    }

    /// Lay components side by side, top-aligned.
    fn arrange(
        &self,
        graph: &LayoutGraph,
        laid_out: Vec<(usize, Vec<(NodeIndex, Vec2)>)>,
    ) -> Positions {
        let mut positions = Positions::new(graph.node_count());
        let mut cursor_x = 0.0;

        for (_, nodes) in laid_out {
            let bounds = crate::geometry::bounding_box(
                nodes
                    .iter()
                    .map(|&(idx, center)| Rect::from_center_size(center, graph[idx].size)),
            );
            let Some(bounds) = bounds else {
                continue;
            };
            let shift = Vec2::new(cursor_x - bounds.min.x, -bounds.min.y);
            for (idx, center) in nodes {
                positions.set(idx, center + shift);
            }
            cursor_x += bounds.width() + self.params.component_spacing;
        }

        positions
    }
}

impl Default for ForceDirectedLayouter {
    fn default() -> Self {
        Self::new(ForceLayoutParams::default())
    }
}

impl Layouter for ForceDirectedLayouter {
    fn execute(&self, graph: &LayoutGraph) -> Positions {
        if graph.node_count() == 0 {
            return Positions::default();
        }

        let components = graph.connected_components();
        let base_seed = self.base_seed();

        let mut laid_out: Vec<(usize, Vec<(NodeIndex, Vec2)>)> = components
            .par_iter()
            .enumerate()
            .map(|(i, component)| {
                let seed = base_seed.wrapping_add((i as u64).wrapping_mul(Self::SEED_STRIDE));
                (i, self.layout_component(graph, component, seed))
            })
            .collect();

        // Deterministic merge order.
        laid_out.sort_by_key(|(i, _)| *i);

        tracing::debug!(
            "Force layout finished: {} nodes in {} components",
            graph.node_count(),
            laid_out.len()
        );

        self.arrange(graph, laid_out)
    }

    fn initial_positions(&self, graph: &LayoutGraph) -> Positions {
        grid_positions(graph.node_count(), self.params.ideal_edge_length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::LayoutNode;
    use clusterview_core::ClusterId;

    fn graph_with(ids: &[&str], links: &[(&str, &str)]) -> LayoutGraph {
        let mut graph = LayoutGraph::new();
        for id in ids {
            graph.add_node(LayoutNode {
                id: id.to_string(),
                cluster: ClusterId(1),
                size: 20.0,
                volume: 100.0,
            });
        }
        for (source, target) in links {
            graph.add_edge(source, target);
        }
        graph
    }

    fn seeded(seed: u64) -> ForceDirectedLayouter {
        ForceDirectedLayouter::new(ForceLayoutParams {
            seed: Some(seed),
            iterations: 60,
            ..ForceLayoutParams::default()
        })
    }

    #[test]
    fn test_layout_returns_finite_position_per_node() {
        let graph = graph_with(&["a", "b", "c", "d"], &[("a", "b"), ("b", "c")]);
        let positions = seeded(7).execute(&graph);

        assert_eq!(positions.len(), 4);
        assert!(positions.as_slice().iter().all(Vec2::is_finite));
    }

    #[test]
    fn test_seeded_layout_is_reproducible() {
        let graph = graph_with(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")]);
        assert_eq!(seeded(42).execute(&graph), seeded(42).execute(&graph));
    }

    #[test]
    fn test_components_do_not_overlap() {
        let graph = graph_with(&["a", "b", "x", "y"], &[("a", "b"), ("x", "y")]);
        let positions = seeded(3).execute(&graph);

        let left = positions
            .body_bounds(&graph, &[NodeIndex(0), NodeIndex(1)])
            .unwrap();
        let right = positions
            .body_bounds(&graph, &[NodeIndex(2), NodeIndex(3)])
            .unwrap();
        assert!(!left.intersects(&right));
        assert!(right.min.x - left.max.x >= 300.0 - 1e-3);
    }

    #[test]
    fn test_nodes_in_a_component_are_spread_apart() {
        let graph = graph_with(&["a", "b", "c"], &[("a", "b"), ("b", "c")]);
        let positions = seeded(11).execute(&graph);

        for (i, j) in [(0, 1), (1, 2), (0, 2)] {
            let dist = (positions[NodeIndex(i)] - positions[NodeIndex(j)]).length();
            assert!(dist > 20.0, "nodes {i} and {j} overlap at distance {dist}");
        }
    }

    #[test]
    fn test_circle_seed_without_randomize() {
        let layouter = ForceDirectedLayouter::new(ForceLayoutParams {
            randomize: false,
            iterations: 1,
            ..ForceLayoutParams::default()
        });
        let graph = graph_with(&["a", "b"], &[("a", "b")]);
        let first = layouter.execute(&graph);
        let second = layouter.execute(&graph);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_graph() {
        let positions = seeded(1).execute(&LayoutGraph::new());
        assert!(positions.is_empty());
    }

    #[test]
    fn test_repulsion_grows_with_volume() {
        let params = ForceLayoutParams::default();
        assert_eq!(params.node_repulsion(0.0), 20_000.0);
        assert_eq!(params.node_repulsion(1_000.0), 20_300.0);
        assert_eq!(params.node_repulsion(f64::NAN), 20_000.0);
    }
}
