use crate::frame::RenderFrame;
use crate::geometry::Vec2;
use std::collections::HashMap;

/// Result of a hit test at a rendered position.
///
/// Priority order: Node > Edge > None
#[derive(Debug, Clone, PartialEq)]
pub enum HitResult {
    /// Empty canvas.
    None,
    /// Account address of the node hit.
    Node(String),
    /// `source-target` id of the edge hit.
    Edge(String),
}

impl HitResult {
    pub fn is_none(&self) -> bool {
        matches!(self, HitResult::None)
    }
}

#[derive(Debug, Clone)]
struct NodeRegion {
    id: String,
    center: Vec2,
    radius: f32,
}

#[derive(Debug, Clone)]
struct EdgeRegion {
    id: String,
    from: Vec2,
    to: Vec2,
    half_width: f32,
}

/// Hit tester over a committed frame, in rendered (canvas pixel)
/// coordinates.
///
/// Nodes are circles of their rendered diameter; edges are straight
/// segments widened by `edge_tolerance`. Later nodes are drawn on top, so
/// they win ties.
#[derive(Debug, Clone)]
pub struct HitTester {
    nodes: Vec<NodeRegion>,
    edges: Vec<EdgeRegion>,
    /// Extra slack (in pixels) around edge lines.
    edge_tolerance: f32,
}

impl Default for HitTester {
    fn default() -> Self {
        Self::new()
    }
}

impl HitTester {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            edge_tolerance: 4.0,
        }
    }

    pub fn with_tolerance(tolerance: f32) -> Self {
        Self {
            edge_tolerance: tolerance,
            ..Self::new()
        }
    }

    pub fn edge_tolerance(&self) -> f32 {
        self.edge_tolerance
    }

    /// Refresh hit regions from a frame. Call after every commit.
    pub fn update(&mut self, frame: &RenderFrame) {
        self.nodes.clear();
        self.edges.clear();

        let zoom = frame.viewport.zoom;
        let mut centers: HashMap<&str, Vec2> = HashMap::with_capacity(frame.nodes.len());

        for node in &frame.nodes {
            let center = frame.rendered_position(node);
            centers.insert(node.id.as_str(), center);
            self.nodes.push(NodeRegion {
                id: node.id.clone(),
                center,
                radius: node.size * zoom * 0.5,
            });
        }

        for edge in &frame.edges {
            let (Some(&from), Some(&to)) = (
                centers.get(edge.source.as_str()),
                centers.get(edge.target.as_str()),
            ) else {
                continue;
            };
            self.edges.push(EdgeRegion {
                id: edge.id.clone(),
                from,
                to,
                half_width: edge.width * zoom * 0.5,
            });
        }
    }

    pub fn from_frame(frame: &RenderFrame) -> Self {
        let mut tester = Self::new();
        tester.update(frame);
        tester
    }

    pub fn hit_test(&self, pos: Vec2) -> HitResult {
        if let Some(id) = self.node_at(pos) {
            return HitResult::Node(id.to_string());
        }
        if let Some(id) = self.edge_at(pos) {
            return HitResult::Edge(id.to_string());
        }
        HitResult::None
    }

    /// Topmost node whose rendered circle contains `pos`.
    pub fn node_at(&self, pos: Vec2) -> Option<&str> {
        self.nodes
            .iter()
            .rev()
            .find(|region| (pos - region.center).length() <= region.radius)
            .map(|region| region.id.as_str())
    }

    pub fn edge_at(&self, pos: Vec2) -> Option<&str> {
        self.edges
            .iter()
            .rev()
            .find(|region| {
                distance_to_segment(pos, region.from, region.to)
                    <= region.half_width + self.edge_tolerance
            })
            .map(|region| region.id.as_str())
    }
}

fn distance_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.x * ab.x + ab.y * ab.y;
    if len_sq <= f32::EPSILON {
        return (p - a).length();
    }
    let ap = p - a;
    let t = ((ap.x * ab.x + ap.y * ab.y) / len_sq).clamp(0.0, 1.0);
    (p - (a + ab * t)).length()
}
