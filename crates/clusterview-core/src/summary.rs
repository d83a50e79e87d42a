use crate::{Account, Cluster, abbreviate_number};
use serde::Serialize;
use std::cmp::Ordering;

/// Row order for the list view: anchors first, then by descending volume.
pub fn holder_first(accounts: &[Account]) -> Vec<&Account> {
    let mut rows: Vec<&Account> = accounts.iter().collect();
    rows.sort_by(|a, b| match (a.is_anchor(), b.is_anchor()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => b
            .volume_usd
            .partial_cmp(&a.volume_usd)
            .unwrap_or(Ordering::Equal),
    });
    rows
}

/// Totals shown above the cluster list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClusterSummary {
    pub cluster_count: usize,
    pub account_count: usize,
    pub total_pct: f64,
    pub total_vol: f64,
}

impl ClusterSummary {
    pub fn from_clusters(clusters: &[Cluster]) -> Self {
        clusters.iter().fold(Self::default(), |mut acc, cluster| {
            acc.cluster_count += 1;
            acc.account_count += cluster.accounts.len();
            acc.total_pct += cluster.total_pct;
            acc.total_vol += cluster.total_vol;
            acc
        })
    }

    pub fn headline(&self) -> String {
        format!(
            "Found {} clusters ({:.2}% of supply)",
            self.cluster_count, self.total_pct
        )
    }

    pub fn cluster_line(cluster: &Cluster) -> String {
        format!(
            "Cluster {} • Total Ownership: {:.2}% • Total Volume: ${}",
            cluster.id,
            cluster.total_pct,
            abbreviate_number(cluster.total_vol)
        )
    }
}
