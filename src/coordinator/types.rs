use crate::ring::NodeId;
use serde::Serialize;

/// What happened when one logical write was fanned out to its replica set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FanoutReport {
    /// Resolved replica set, in ring order.
    pub targets: Vec<NodeId>,
    /// Replicas whose engine call succeeded, in ring order.
    pub acknowledged_by: Vec<NodeId>,
}

impl FanoutReport {
    pub fn attempted(&self) -> usize {
        self.targets.len()
    }

    pub fn acknowledged(&self) -> usize {
        self.acknowledged_by.len()
    }

    pub fn failed(&self) -> usize {
        self.attempted() - self.acknowledged()
    }
}

/// Result of a put or delete as seen by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteOutcome {
    pub success: bool,
    pub report: FanoutReport,
}

/// Result of a read: the first replica that had the key answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOutcome {
    pub value: Vec<u8>,
    pub source: NodeId,
}
