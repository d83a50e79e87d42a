use crate::style::{Color, VisualEncoding};
use clusterview_core::{Cluster, ClusterId, IntegrityIssue, abbreviate_address};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeElement {
    /// Full account address.
    pub id: String,
    pub cluster: ClusterId,
    /// `c{cluster id}`, used to select a cluster's nodes.
    pub cluster_tag: String,
    pub label: String,
    pub size: f32,
    pub color: Color,
    pub level: i64,
    pub raw_volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeElement {
    /// `source-target`.
    pub id: String,
    pub source: String,
    pub target: String,
    pub size: f32,
    pub opacity: f32,
    pub raw_volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "group", rename_all = "snake_case")]
pub enum VisualElement {
    Node(NodeElement),
    Edge(EdgeElement),
}

/// Cluster metadata the packer needs, in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterGroup {
    pub id: ClusterId,
    pub tag: String,
    /// Account count as served, which drives the size tier.
    pub member_count: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ElementSet {
    pub nodes: Vec<NodeElement>,
    pub edges: Vec<EdgeElement>,
    pub clusters: Vec<ClusterGroup>,
    pub issues: Vec<IntegrityIssue>,
}

impl ElementSet {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes carrying `tag`, with their position in `nodes`.
    pub fn nodes_in_cluster<'a>(
        &'a self,
        tag: &'a str,
    ) -> impl Iterator<Item = (usize, &'a NodeElement)> + 'a {
        self.nodes
            .iter()
            .enumerate()
            .filter(move |(_, node)| node.cluster_tag == tag)
    }

    pub fn node(&self, id: &str) -> Option<&NodeElement> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Flat element list, nodes first.
    pub fn elements(&self) -> Vec<VisualElement> {
        self.nodes
            .iter()
            .cloned()
            .map(VisualElement::Node)
            .chain(self.edges.iter().cloned().map(VisualElement::Edge))
            .collect()
    }
}

/// Turns clusters into tagged, encoded graph elements.
///
/// Bad input never aborts a build. Dangling links, links crossing into
/// another cluster's node, repeated node or edge ids, and clusters reusing an
/// earlier cluster's id are dropped and reported in `ElementSet::issues`.
#[derive(Debug, Clone, Default)]
pub struct ElementBuilder {
    encoding: VisualEncoding,
}

impl ElementBuilder {
    pub fn new(encoding: VisualEncoding) -> Self {
        Self { encoding }
    }

    pub fn encoding(&self) -> &VisualEncoding {
        &self.encoding
    }

    pub fn build(&self, clusters: &[Cluster]) -> ElementSet {
        let mut set = ElementSet::default();
        // Address -> index into `clusters` of the cluster that drew it.
        let mut owners: HashMap<&str, usize> = HashMap::new();
        let mut cluster_ids: HashSet<ClusterId> = HashSet::new();
        let mut edge_ids: HashSet<String> = HashSet::new();

        for (position, cluster) in clusters.iter().enumerate() {
            if !cluster_ids.insert(cluster.id) {
                tracing::warn!(
                    "Dropping cluster {} at position {} because its id is already in use",
                    cluster.id,
                    position
                );
                set.issues.push(IntegrityIssue::DuplicateCluster {
                    cluster: cluster.id,
                    accounts: cluster.accounts.len(),
                });
                continue;
            }

            let tag = cluster.id.tag();
            set.clusters.push(ClusterGroup {
                id: cluster.id,
                tag: tag.clone(),
                member_count: cluster.member_count(),
            });

            for account in &cluster.accounts {
                if let Some(&first) = owners.get(account.address.as_str()) {
                    let first_cluster = clusters[first].id;
                    tracing::warn!(
                        "Dropping node {} in cluster {}, already drawn for cluster {}",
                        account.address,
                        cluster.id,
                        first_cluster
                    );
                    set.issues.push(IntegrityIssue::DuplicateNode {
                        cluster: cluster.id,
                        address: account.address.clone(),
                        first_cluster,
                    });
                    continue;
                }
                owners.insert(account.address.as_str(), position);

                set.nodes.push(NodeElement {
                    id: account.address.clone(),
                    cluster: cluster.id,
                    cluster_tag: tag.clone(),
                    label: abbreviate_address(&account.address),
                    size: self.encoding.node_size(account.volume_usd),
                    color: self.encoding.level_color(account.level),
                    level: account.level,
                    raw_volume: account.volume_usd,
                });
            }

            for link in &cluster.account_links {
                let id = link.element_id();
                let missing = [&link.source, &link.target]
                    .into_iter()
                    .find(|endpoint| owners.get(endpoint.as_str()) != Some(&position));
                if let Some(missing) = missing {
                    tracing::warn!(
                        "Dropping edge {} in cluster {}, endpoint {} is not one of its nodes",
                        id,
                        cluster.id,
                        missing
                    );
                    set.issues.push(IntegrityIssue::DanglingLink {
                        cluster: cluster.id,
                        link: id,
                        missing: missing.clone(),
                    });
                    continue;
                }

                if !edge_ids.insert(id.clone()) {
                    tracing::warn!("Dropping duplicate edge {} in cluster {}", id, cluster.id);
                    set.issues.push(IntegrityIssue::DuplicateEdge {
                        cluster: cluster.id,
                        link: id,
                    });
                    continue;
                }

                let volume = link.volume();
                set.edges.push(EdgeElement {
                    id,
                    source: link.source.clone(),
                    target: link.target.clone(),
                    size: self.encoding.edge_size(volume),
                    opacity: self.encoding.edge_opacity(volume),
                    raw_volume: volume,
                });
            }
        }

        set
    }
}
