//! Pass lifecycle logging.
//!
//! A [`LayoutPass`] is opened when a render pass begins and closed with
//! [`LayoutPass::success`] or [`LayoutPass::failure`]. A pass that is dropped
//! while still open was superseded by a newer generation and says so.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

const TARGET: &str = "clusterview::pass";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PassKind {
    Layout,
    Pack,
}

impl fmt::Display for PassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PassKind::Layout => "layout",
            PassKind::Pack => "pack",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PassStatus {
    Succeeded,
    Failed { reason: String },
}

/// What a closed pass leaves behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassRecord {
    pub kind: PassKind,
    pub generation: u64,
    pub correlation_id: Uuid,
    pub elapsed_ms: u64,
    #[serde(flatten)]
    pub status: PassStatus,
    /// Context noted while the pass was open.
    pub notes: Vec<String>,
}

#[derive(Debug)]
pub struct LayoutPass {
    kind: PassKind,
    generation: u64,
    correlation_id: Uuid,
    started: Instant,
    notes: Vec<String>,
    open: bool,
}

impl LayoutPass {
    pub fn start(kind: PassKind, generation: u64) -> Self {
        let pass = Self {
            kind,
            generation,
            correlation_id: Uuid::new_v4(),
            started: Instant::now(),
            notes: Vec::new(),
            open: true,
        };
        info!(
            target: TARGET,
            pass = %pass.kind,
            generation,
            correlation_id = %pass.correlation_id,
            "started"
        );
        pass
    }

    pub fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Attach a line of context, logged at debug level.
    pub fn note(&mut self, context: impl Into<String>) {
        let context = context.into();
        debug!(
            target: TARGET,
            pass = %self.kind,
            generation = self.generation,
            correlation_id = %self.correlation_id,
            %context,
            "note"
        );
        self.notes.push(context);
    }

    pub fn success(self) -> PassRecord {
        let record = self.close(PassStatus::Succeeded);
        info!(
            target: TARGET,
            pass = %record.kind,
            generation = record.generation,
            correlation_id = %record.correlation_id,
            elapsed_ms = record.elapsed_ms,
            "succeeded"
        );
        record
    }

    pub fn failure(self, reason: impl Into<String>) -> PassRecord {
        let record = self.close(PassStatus::Failed {
            reason: reason.into(),
        });
        if let PassStatus::Failed { reason } = &record.status {
            warn!(
                target: TARGET,
                pass = %record.kind,
                generation = record.generation,
                correlation_id = %record.correlation_id,
                elapsed_ms = record.elapsed_ms,
                %reason,
                "failed"
            );
        }
        record
    }

    fn close(mut self, status: PassStatus) -> PassRecord {
        self.open = false;
        PassRecord {
            kind: self.kind,
            generation: self.generation,
            correlation_id: self.correlation_id,
            elapsed_ms: self.elapsed_ms(),
            status,
            notes: std::mem::take(&mut self.notes),
        }
    }
}

impl Drop for LayoutPass {
    fn drop(&mut self) {
        if self.open {
            debug!(
                target: TARGET,
                pass = %self.kind,
                generation = self.generation,
                correlation_id = %self.correlation_id,
                "abandoned before it closed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passes_get_distinct_ids() {
        let a = LayoutPass::start(PassKind::Layout, 1);
        let b = LayoutPass::start(PassKind::Layout, 1);
        assert_ne!(a.correlation_id(), b.correlation_id());
    }

    #[test]
    fn test_success_keeps_notes_and_identity() {
        let mut pass = LayoutPass::start(PassKind::Pack, 4);
        let id = pass.correlation_id();
        pass.note("3 clusters");

        let record = pass.success();
        assert_eq!(record.kind, PassKind::Pack);
        assert_eq!(record.generation, 4);
        assert_eq!(record.correlation_id, id);
        assert_eq!(record.status, PassStatus::Succeeded);
        assert_eq!(record.notes, vec!["3 clusters".to_string()]);
    }

    #[test]
    fn test_failure_record_serializes_reason() {
        let record = LayoutPass::start(PassKind::Layout, 2).failure("timeout");
        assert_eq!(
            record.status,
            PassStatus::Failed {
                reason: "timeout".to_string()
            }
        );

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["kind"], "layout");
        assert_eq!(json["status"], "failed");
        assert_eq!(json["reason"], "timeout");
    }
}
