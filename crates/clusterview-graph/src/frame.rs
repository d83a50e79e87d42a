use crate::elements::ElementSet;
use crate::geometry::{Rect, Vec2};
use crate::graph::{NodeIndex, Positions};
use crate::packer::Placement;
use crate::style::{COLOR_EDGE_LINE, Color};
use crate::viewport::Viewport;
use clusterview_core::{ClusterId, IntegrityIssue};
use clusterview_events::LayoutOutcome;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedNode {
    pub id: String,
    pub cluster: ClusterId,
    pub label: String,
    /// Centre in model coordinates.
    pub position: Vec2,
    pub size: f32,
    pub color: Color,
    pub level: i64,
    pub raw_volume: f64,
}

impl PlacedNode {
    pub fn body(&self) -> Rect {
        Rect::from_center_size(self.position, self.size)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub width: f32,
    pub opacity: f32,
    pub color: Color,
    pub raw_volume: f64,
}

/// A committed, fully packed and fitted picture of one redraw.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderFrame {
    pub generation: u64,
    pub outcome: LayoutOutcome,
    pub viewport: Viewport,
    pub nodes: Vec<PlacedNode>,
    pub edges: Vec<PlacedEdge>,
    pub placements: Vec<Placement>,
    pub issues: Vec<IntegrityIssue>,
}

impl RenderFrame {
    pub fn assemble(
        generation: u64,
        outcome: LayoutOutcome,
        elements: &ElementSet,
        positions: &Positions,
        viewport: Viewport,
        placements: Vec<Placement>,
    ) -> Self {
        let nodes = elements
            .nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| PlacedNode {
                id: node.id.clone(),
                cluster: node.cluster,
                label: node.label.clone(),
                position: positions.get(NodeIndex(idx)).unwrap_or_default(),
                size: node.size,
                color: node.color,
                level: node.level,
                raw_volume: node.raw_volume,
            })
            .collect();

        let edges = elements
            .edges
            .iter()
            .map(|edge| PlacedEdge {
                id: edge.id.clone(),
                source: edge.source.clone(),
                target: edge.target.clone(),
                width: edge.size,
                opacity: edge.opacity,
                color: COLOR_EDGE_LINE,
                raw_volume: edge.raw_volume,
            })
            .collect();

        Self {
            generation,
            outcome,
            viewport,
            nodes,
            edges,
            placements,
            issues: elements.issues.clone(),
        }
    }

    pub fn node(&self, id: &str) -> Option<&PlacedNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Node centre in canvas pixels.
    pub fn rendered_position(&self, node: &PlacedNode) -> Vec2 {
        self.viewport.model_to_rendered(node.position)
    }

    /// Union of all node bodies.
    pub fn extent(&self) -> Option<Rect> {
        crate::geometry::bounding_box(self.nodes.iter().map(PlacedNode::body))
    }

    pub fn cluster_nodes(&self, cluster: ClusterId) -> impl Iterator<Item = &PlacedNode> {
        self.nodes.iter().filter(move |node| node.cluster == cluster)
    }
}
