use crate::elements::ElementSet;
use crate::geometry::{Rect, Vec2};
use clusterview_core::ClusterId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::ops::{Index, IndexMut};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeIndex(pub usize);

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeIndex(pub usize);

impl fmt::Display for EdgeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct LayoutNode {
    pub id: String,
    pub cluster: ClusterId,
    /// Rendered diameter.
    pub size: f32,
    /// Trade volume, feeds the repulsion weight.
    pub volume: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct LayoutEdge {
    pub source: NodeIndex,
    pub target: NodeIndex,
}

/// Index-addressed graph handed to a layouter.
///
/// Node indices follow `ElementSet::nodes`, so index `i` here is element `i`
/// there.
#[derive(Debug, Clone, Default)]
pub struct LayoutGraph {
    nodes: Vec<LayoutNode>,
    edges: Vec<LayoutEdge>,
    node_map: HashMap<String, NodeIndex>,
}

impl LayoutGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_elements(elements: &ElementSet) -> Self {
        let mut graph = Self::new();
        for node in &elements.nodes {
            graph.add_node(LayoutNode {
                id: node.id.clone(),
                cluster: node.cluster,
                size: node.size,
                volume: node.raw_volume,
            });
        }
        for edge in &elements.edges {
            graph.add_edge(&edge.source, &edge.target);
        }
        graph
    }

    pub fn add_node(&mut self, node: LayoutNode) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(&node.id) {
            return idx;
        }
        let idx = NodeIndex(self.nodes.len());
        self.node_map.insert(node.id.clone(), idx);
        self.nodes.push(node);
        idx
    }

    pub fn add_edge(&mut self, source: &str, target: &str) -> Option<EdgeIndex> {
        match (self.node_map.get(source), self.node_map.get(target)) {
            (Some(&source), Some(&target)) => {
                let idx = EdgeIndex(self.edges.len());
                self.edges.push(LayoutEdge { source, target });
                Some(idx)
            }
            _ => {
                tracing::warn!(
                    "Dropping layout edge {}-{} because an endpoint is missing from the graph",
                    source,
                    target
                );
                None
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> {
        (0..self.nodes.len()).map(NodeIndex)
    }

    pub fn edges(&self) -> &[LayoutEdge] {
        &self.edges
    }

    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.node_map.get(id).copied()
    }

    /// Connected components, each sorted by index, ordered by their
    /// smallest member.
    pub fn connected_components(&self) -> Vec<Vec<NodeIndex>> {
        let mut parent: Vec<usize> = (0..self.nodes.len()).collect();

        fn find(parent: &mut [usize], mut x: usize) -> usize {
            while parent[x] != x {
                parent[x] = parent[parent[x]];
                x = parent[x];
            }
            x
        }

        for edge in &self.edges {
            let a = find(&mut parent, edge.source.0);
            let b = find(&mut parent, edge.target.0);
            if a != b {
                // Keep the smaller index as root so component order is stable.
                let (root, child) = if a < b { (a, b) } else { (b, a) };
                parent[child] = root;
            }
        }

        let mut by_root: HashMap<usize, Vec<NodeIndex>> = HashMap::new();
        let mut roots = Vec::new();
        for idx in 0..self.nodes.len() {
            let root = find(&mut parent, idx);
            by_root
                .entry(root)
                .or_insert_with(|| {
                    roots.push(root);
                    Vec::new()
                })
                .push(NodeIndex(idx));
        }

        roots
            .into_iter()
            .filter_map(|root| by_root.remove(&root))
            .collect()
    }
}

impl Index<NodeIndex> for LayoutGraph {
    type Output = LayoutNode;
    fn index(&self, index: NodeIndex) -> &Self::Output {
        &self.nodes[index.0]
    }
}

/// Node centres produced by a layout pass, indexed like the graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Positions {
    coords: Vec<Vec2>,
}

impl Positions {
    pub fn new(node_count: usize) -> Self {
        Self {
            coords: vec![Vec2::ZERO; node_count],
        }
    }

    pub fn from_vec(coords: Vec<Vec2>) -> Self {
        Self { coords }
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    pub fn get(&self, idx: NodeIndex) -> Option<Vec2> {
        self.coords.get(idx.0).copied()
    }

    pub fn set(&mut self, idx: NodeIndex, position: Vec2) {
        if let Some(slot) = self.coords.get_mut(idx.0) {
            *slot = position;
        }
    }

    /// Rigidly move a set of nodes.
    pub fn translate(&mut self, nodes: &[NodeIndex], delta: Vec2) {
        for &idx in nodes {
            if let Some(slot) = self.coords.get_mut(idx.0) {
                *slot += delta;
            }
        }
    }

    /// Bounding box of the node bodies (`centre ± size / 2`).
    pub fn body_bounds(&self, graph: &LayoutGraph, nodes: &[NodeIndex]) -> Option<Rect> {
        crate::geometry::bounding_box(nodes.iter().filter_map(|&idx| {
            self.get(idx)
                .filter(Vec2::is_finite)
                .map(|center| Rect::from_center_size(center, graph[idx].size))
        }))
    }

    pub fn as_slice(&self) -> &[Vec2] {
        &self.coords
    }
}

impl Index<NodeIndex> for Positions {
    type Output = Vec2;
    fn index(&self, index: NodeIndex) -> &Self::Output {
        &self.coords[index.0]
    }
}

impl IndexMut<NodeIndex> for Positions {
    fn index_mut(&mut self, index: NodeIndex) -> &mut Self::Output {
        &mut self.coords[index.0]
    }
}
