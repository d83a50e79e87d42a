//! Component Packer
//!
//! Re-tiles laid-out clusters into a grid. Each cluster is moved rigidly so
//! its internal layout is untouched; only the macro placement changes, and it
//! depends on nothing but the member counts and their order.

use crate::elements::ElementSet;
use crate::geometry::{Rect, Vec2};
use crate::graph::{LayoutGraph, NodeIndex, Positions};
use clusterview_core::ClusterId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackConfig {
    /// Columns in one grid row.
    pub cols: usize,
    pub cluster_gap: f32,
    pub small_cluster_gap: f32,
    pub row_gap: f32,
    /// Member count from which a cluster takes a full row.
    pub extra_large_min: usize,
    /// Member count from which a cluster takes `large_columns`.
    pub large_min: usize,
    /// Clusters below this count are followed by `small_cluster_gap`.
    pub small_gap_below: usize,
    pub large_columns: usize,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            cols: 8,
            cluster_gap: 500.0,
            small_cluster_gap: 120.0,
            row_gap: 200.0,
            extra_large_min: 90,
            large_min: 30,
            small_gap_below: 10,
            large_columns: 2,
        }
    }
}

impl PackConfig {
    pub fn tier(&self, member_count: usize) -> SizeTier {
        if member_count >= self.extra_large_min {
            SizeTier::ExtraLarge
        } else if member_count >= self.large_min {
            SizeTier::Large
        } else {
            SizeTier::Small
        }
    }

    /// Grid footprint of a tier, never wider than a row.
    pub fn columns(&self, tier: SizeTier) -> usize {
        let cols = self.cols.max(1);
        let wanted = match tier {
            SizeTier::ExtraLarge => cols,
            SizeTier::Large => self.large_columns,
            SizeTier::Small => 1,
        };
        wanted.clamp(1, cols)
    }

    /// Horizontal space left after a cluster of this size.
    pub fn gap(&self, member_count: usize) -> f32 {
        if member_count < self.small_gap_below {
            self.small_cluster_gap
        } else {
            self.cluster_gap
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeTier {
    Small,
    Large,
    ExtraLarge,
}

/// One cluster as the packer sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct PackCluster {
    pub id: ClusterId,
    /// Account count as served; decides tier and gap.
    pub member_count: usize,
    pub nodes: Vec<NodeIndex>,
}

impl PackCluster {
    /// Clusters in input order with the graph indices of their nodes.
    pub fn from_elements(elements: &ElementSet) -> Vec<PackCluster> {
        elements
            .clusters
            .iter()
            .map(|group| PackCluster {
                id: group.id,
                member_count: group.member_count,
                nodes: elements
                    .nodes_in_cluster(&group.tag)
                    .map(|(idx, _)| NodeIndex(idx))
                    .collect(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement {
    pub cluster: ClusterId,
    pub member_count: usize,
    pub tier: SizeTier,
    pub columns: usize,
    pub gap: f32,
    pub row: usize,
    /// First grid column occupied.
    pub column: usize,
    pub translation: Vec2,
    /// Body box before the move. Labels are not included, so packed gaps
    /// read tighter on screen than the configured spacing.
    pub before: Rect,
    pub after: Rect,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PackOutcome {
    /// In placement order.
    pub placements: Vec<Placement>,
    pub rows: usize,
}

impl PackOutcome {
    pub fn placement(&self, cluster: ClusterId) -> Option<&Placement> {
        self.placements.iter().find(|p| p.cluster == cluster)
    }

    /// Union of all placed cluster boxes.
    pub fn extent(&self) -> Option<Rect> {
        crate::geometry::bounding_box(self.placements.iter().map(|p| p.after))
    }
}

#[derive(Debug, Default)]
struct Cursor {
    position: Vec2,
    col_index: usize,
    row_height: f32,
    row: usize,
}

impl Cursor {
    fn break_row(&mut self, height: f32, row_gap: f32) {
        self.position.x = 0.0;
        self.position.y += height + row_gap;
        self.row_height = 0.0;
        self.col_index = 0;
        self.row += 1;
    }
}

#[derive(Debug, Clone, Default)]
pub struct ComponentPacker {
    pub config: PackConfig,
}

impl ComponentPacker {
    pub fn new(config: PackConfig) -> Self {
        Self { config }
    }

    /// Move every cluster into its grid slot, updating `positions` in place.
    pub fn pack(
        &self,
        clusters: &[PackCluster],
        graph: &LayoutGraph,
        positions: &mut Positions,
    ) -> PackOutcome {
        let config = &self.config;
        let cols = config.cols.max(1);

        let mut order: Vec<&PackCluster> = clusters.iter().collect();
        // Stable, so equal counts keep input order.
        order.sort_by(|a, b| b.member_count.cmp(&a.member_count));

        let mut cursor = Cursor::default();
        let mut outcome = PackOutcome::default();

        for cluster in order {
            let Some(before) = positions.body_bounds(graph, &cluster.nodes) else {
                tracing::warn!(
                    "Skipping cluster {} in packing because none of its nodes have a position",
                    cluster.id
                );
                continue;
            };

            let tier = config.tier(cluster.member_count);
            let columns = config.columns(tier);
            let gap = config.gap(cluster.member_count);

            if cursor.col_index + columns > cols {
                cursor.break_row(cursor.row_height, config.row_gap);
            }

            let translation = cursor.position - before.min;
            positions.translate(&cluster.nodes, translation);

            outcome.placements.push(Placement {
                cluster: cluster.id,
                member_count: cluster.member_count,
                tier,
                columns,
                gap,
                row: cursor.row,
                column: cursor.col_index,
                translation,
                before,
                after: before.translate(translation),
            });
            outcome.rows = cursor.row + 1;

            cursor.col_index += columns;
            if columns == cols {
                cursor.break_row(before.height(), config.row_gap);
            } else {
                cursor.position.x += before.width() + gap;
                cursor.row_height = cursor.row_height.max(before.height());
            }
        }

        tracing::debug!(
            "Packed {} clusters into {} rows",
            outcome.placements.len(),
            outcome.rows
        );
        outcome
    }
}
