use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, PickFirst, serde_as};
use std::collections::HashSet;
use std::fmt;

pub mod error;
pub mod format;
pub mod summary;

pub use error::{DataError, IntegrityIssue};
pub use format::{abbreviate_address, abbreviate_number, format_usd, group_thousands};
pub use summary::{ClusterSummary, holder_first};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterId(pub i64);

impl ClusterId {
    /// Tag carried by every node of this cluster, e.g. `c42`.
    pub fn tag(&self) -> String {
        format!("c{}", self.0)
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A wallet address inside a cluster.
///
/// `level` is the distance from the cluster anchor: `0` is the token holder
/// that drove the cluster search, `1+` are discovered associates.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub address: String,
    pub level: i64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    #[serde(default)]
    pub volume_usd: f64,
    #[serde(default)]
    pub balance: f64,
    #[serde(default)]
    pub supply_pct: f64,
}

impl Account {
    pub fn new(address: impl Into<String>, level: i64, volume_usd: f64) -> Self {
        Self {
            address: address.into(),
            level,
            volume_usd,
            balance: 0.0,
            supply_pct: 0.0,
        }
    }

    pub fn is_anchor(&self) -> bool {
        self.level == 0
    }
}

/// Directed transfer edge between two accounts of the same cluster.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountLink {
    pub source: String,
    pub target: String,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_usd: Option<f64>,
}

impl AccountLink {
    pub fn new(source: impl Into<String>, target: impl Into<String>, volume_usd: f64) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            volume_usd: Some(volume_usd),
        }
    }

    /// Link volume, `0` when the backend omitted it.
    pub fn volume(&self) -> f64 {
        self.volume_usd.unwrap_or(0.0)
    }

    /// Element id used by the graph view, `source-target`.
    pub fn element_id(&self) -> String {
        format!("{}-{}", self.source, self.target)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub id: ClusterId,
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub account_links: Vec<AccountLink>,
    #[serde(default)]
    pub total_vol: f64,
    #[serde(default)]
    pub total_pct: f64,
}

impl Cluster {
    pub fn new(id: i64, accounts: Vec<Account>, account_links: Vec<AccountLink>) -> Self {
        let total_vol = accounts.iter().map(|a| a.volume_usd).sum();
        let total_pct = accounts.iter().map(|a| a.supply_pct).sum();
        Self {
            id: ClusterId(id),
            accounts,
            account_links,
            total_vol,
            total_pct,
        }
    }

    /// Member count used for size tiers.
    pub fn member_count(&self) -> usize {
        self.accounts.len()
    }

    pub fn contains(&self, address: &str) -> bool {
        self.accounts.iter().any(|a| a.address == address)
    }

    /// Checks the cluster invariants: unique addresses, sane volumes, and
    /// every link endpoint naming an account of this cluster.
    pub fn validate(&self) -> Result<(), DataError> {
        let mut seen = HashSet::with_capacity(self.accounts.len());
        for account in &self.accounts {
            if !seen.insert(account.address.as_str()) {
                return Err(DataError::DuplicateAccount {
                    cluster: self.id,
                    address: account.address.clone(),
                });
            }
            check_volume(self.id, &account.address, account.volume_usd)?;
        }

        for link in &self.account_links {
            for endpoint in [&link.source, &link.target] {
                if !seen.contains(endpoint.as_str()) {
                    return Err(DataError::DanglingLink {
                        cluster: self.id,
                        link: link.element_id(),
                        missing: endpoint.clone(),
                    });
                }
            }
            check_volume(self.id, &link.element_id(), link.volume())?;
        }

        Ok(())
    }
}

fn check_volume(cluster: ClusterId, subject: &str, value: f64) -> Result<(), DataError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(DataError::InvalidVolume {
            cluster,
            subject: subject.to_string(),
            value,
        })
    }
}

/// Validates every cluster and rejects duplicate cluster ids.
pub fn validate_clusters(clusters: &[Cluster]) -> Result<(), DataError> {
    let mut ids = HashSet::with_capacity(clusters.len());
    for cluster in clusters {
        if !ids.insert(cluster.id) {
            return Err(DataError::DuplicateCluster(cluster.id));
        }
        cluster.validate()?;
    }
    Ok(())
}

/// Cluster list as served by `/api/...`: either `{ "data": [...] }` or a bare array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ClusterPayload {
    Envelope { data: Vec<Cluster> },
    Bare(Vec<Cluster>),
}

impl ClusterPayload {
    pub fn from_json(raw: &str) -> Result<Vec<Cluster>, DataError> {
        let payload: ClusterPayload = serde_json::from_str(raw)?;
        Ok(payload.into_clusters())
    }

    pub fn into_clusters(self) -> Vec<Cluster> {
        match self {
            ClusterPayload::Envelope { data } => data,
            ClusterPayload::Bare(clusters) => clusters,
        }
    }
}
