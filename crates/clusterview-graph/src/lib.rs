pub mod elements;
pub mod frame;
pub mod geometry;
pub mod graph;
pub mod hit_tester;
pub mod interaction;
pub mod layout;
pub mod packer;
pub mod session;
pub mod settings;
pub mod style;
pub mod viewport;

pub use elements::{
    ClusterGroup, EdgeElement, ElementBuilder, ElementSet, NodeElement, VisualElement,
};
pub use frame::{PlacedEdge, PlacedNode, RenderFrame};
pub use geometry::{Rect, Vec2, bounding_box};
pub use graph::{EdgeIndex, LayoutEdge, LayoutGraph, LayoutNode, NodeIndex, Positions};
pub use hit_tester::{HitResult, HitTester};
pub use interaction::{Interaction, TooltipState};
pub use layout::{ForceDirectedLayouter, ForceLayoutParams, Layouter};
pub use packer::{ComponentPacker, PackCluster, PackConfig, PackOutcome, Placement, SizeTier};
pub use session::{GraphSession, LayoutStop};
pub use settings::{CanvasSettings, GraphSettings, SettingsError};
pub use style::{
    Color, LabelStyle, LevelPalette, NODE_LABEL_STYLE, VisualEncoding, VolumeBuckets, edge_opacity,
    edge_size, level_color, node_size,
};
pub use viewport::{Viewport, ViewportConfig};
