use crate::ClusterId;
use serde::Serialize;
use thiserror::Error;

/// Integrity failures found while validating cluster data.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("cluster {cluster}: link {link} references unknown account {missing}")]
    DanglingLink {
        cluster: ClusterId,
        link: String,
        missing: String,
    },
    #[error("cluster {cluster}: account {address} listed more than once")]
    DuplicateAccount { cluster: ClusterId, address: String },
    #[error("cluster id {0} appears more than once")]
    DuplicateCluster(ClusterId),
    #[error("cluster {cluster}: {subject} has invalid volume {value}")]
    InvalidVolume {
        cluster: ClusterId,
        subject: String,
        value: f64,
    },
    #[error("malformed cluster payload: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Data dropped while building graph elements.
///
/// The element builder never fails; it records what it skipped so the caller
/// can surface it next to the rendered graph.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegrityIssue {
    #[error("cluster {cluster}: dropped link {link}, account {missing} is not in the cluster")]
    DanglingLink {
        cluster: ClusterId,
        link: String,
        missing: String,
    },
    #[error("cluster {cluster}: account {address} already drawn for cluster {first_cluster}")]
    DuplicateNode {
        cluster: ClusterId,
        address: String,
        first_cluster: ClusterId,
    },
    #[error("cluster {cluster}: dropped duplicate link {link}")]
    DuplicateEdge { cluster: ClusterId, link: String },
    #[error("cluster {cluster}: id already used, dropped {accounts} accounts")]
    DuplicateCluster { cluster: ClusterId, accounts: usize },
}

impl IntegrityIssue {
    pub fn cluster(&self) -> ClusterId {
        match self {
            IntegrityIssue::DanglingLink { cluster, .. }
            | IntegrityIssue::DuplicateNode { cluster, .. }
            | IntegrityIssue::DuplicateEdge { cluster, .. }
            | IntegrityIssue::DuplicateCluster { cluster, .. } => *cluster,
        }
    }
}
