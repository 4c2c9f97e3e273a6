//! Replication Policies
//!
//! A policy decides whether a fan-out report counts as a successful logical write.
//! The coordinator always attempts every resolved replica; the policy only judges
//! the outcome, so a stricter policy can be swapped in without touching callers.

use super::types::FanoutReport;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub trait ReplicationPolicy: Send + Sync + 'static {
    /// Whether a put with this report is reported as successful.
    fn put_succeeded(&self, report: &FanoutReport) -> bool;

    /// Whether a delete with this report is reported as successful.
    fn delete_succeeded(&self, report: &FanoutReport) -> bool;

    fn name(&self) -> &'static str;
}

/// Source-compatible behaviour: a put succeeds once the fan-out has been attempted,
/// even if no replica acknowledged it; a delete needs one acknowledgement.
#[derive(Debug, Clone, Copy, Default)]
pub struct BestEffort;

impl ReplicationPolicy for BestEffort {
    fn put_succeeded(&self, _report: &FanoutReport) -> bool {
        true
    }

    fn delete_succeeded(&self, report: &FanoutReport) -> bool {
        report.acknowledged() > 0
    }

    fn name(&self) -> &'static str {
        "best-effort"
    }
}

/// Puts and deletes both need at least one acknowledging replica.
#[derive(Debug, Clone, Copy, Default)]
pub struct AtLeastOne;

impl ReplicationPolicy for AtLeastOne {
    fn put_succeeded(&self, report: &FanoutReport) -> bool {
        report.acknowledged() > 0
    }

    fn delete_succeeded(&self, report: &FanoutReport) -> bool {
        report.acknowledged() > 0
    }

    fn name(&self) -> &'static str {
        "at-least-one"
    }
}

/// Selectable put acknowledgement modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum AckMode {
    BestEffort,
    AtLeastOne,
}

impl AckMode {
    pub fn policy(self) -> Arc<dyn ReplicationPolicy> {
        match self {
            AckMode::BestEffort => Arc::new(BestEffort),
            AckMode::AtLeastOne => Arc::new(AtLeastOne),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring::NodeId;

    fn report(targets: &[&str], acked: &[&str]) -> FanoutReport {
        FanoutReport {
            targets: targets.iter().map(|t| NodeId::from(*t)).collect(),
            acknowledged_by: acked.iter().map(|t| NodeId::from(*t)).collect(),
        }
    }

    #[test]
    fn test_best_effort_put_always_succeeds() {
        assert!(BestEffort.put_succeeded(&report(&["a", "b", "c"], &[])));
        assert!(BestEffort.put_succeeded(&report(&[], &[])));
    }

    #[test]
    fn test_delete_needs_one_ack() {
        assert!(!BestEffort.delete_succeeded(&report(&["a", "b"], &[])));
        assert!(BestEffort.delete_succeeded(&report(&["a", "b"], &["b"])));
        assert!(!AtLeastOne.delete_succeeded(&report(&[], &[])));
    }

    #[test]
    fn test_at_least_one_put() {
        assert!(!AtLeastOne.put_succeeded(&report(&["a", "b", "c"], &[])));
        assert!(AtLeastOne.put_succeeded(&report(&["a", "b", "c"], &["c"])));
    }
}
