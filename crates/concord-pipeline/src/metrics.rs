//! Tally of batch outcomes

use concord_domain::{AccessId, RiskLevel};
use std::collections::HashMap;

/// Diagnostic lines kept by a merged report; older lines are dropped first
pub const MAX_MESSAGES: usize = 100;

/// Outcome counts for one or more batches
///
/// Every id handed to a batch lands in exactly one of success, failed or
/// skipped, so `total == success + failed + skipped`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    /// Ids handed to the batch
    pub total: usize,

    /// Runs that reached Completed
    pub success: usize,

    /// Runs that ended in Failed
    pub failed: usize,

    /// Ids never dispatched because shutdown was requested
    pub skipped: usize,

    /// Failed runs whose cause may clear on a retry
    pub retryable: usize,

    /// Completed runs per risk level
    pub by_risk: HashMap<RiskLevel, usize>,

    /// One diagnostic line per failed or skipped id, newest last
    pub messages: Vec<String>,

    /// Ids whose failure will not clear on a retry
    pub rejected: Vec<AccessId>,

    /// Batches folded into this report
    pub batch_count: usize,
}

impl BatchReport {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed run
    pub fn record_success(&mut self, risk_level: RiskLevel) {
        self.total += 1;
        self.success += 1;
        *self.by_risk.entry(risk_level).or_insert(0) += 1;
    }

    /// Record a failed run
    pub fn record_failure(&mut self, access_id: &AccessId, reason: &str, retryable: bool) {
        self.total += 1;
        self.failed += 1;
        if retryable {
            self.retryable += 1;
        } else {
            self.rejected.push(access_id.clone());
        }
        self.messages.push(format!("{}: {}", access_id, reason));
    }

    /// Record an id that was never dispatched
    pub fn record_skipped(&mut self, access_id: &AccessId) {
        self.total += 1;
        self.skipped += 1;
        self.messages
            .push(format!("{}: skipped, shutdown requested", access_id));
    }

    /// Record the end of a batch
    pub fn record_batch(&mut self) {
        self.batch_count += 1;
    }

    /// Fold another report into this one
    pub fn merge(&mut self, other: BatchReport) {
        self.total += other.total;
        self.success += other.success;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.retryable += other.retryable;
        for (level, count) in other.by_risk {
            *self.by_risk.entry(level).or_insert(0) += count;
        }
        self.messages.extend(other.messages);
        if self.messages.len() > MAX_MESSAGES {
            let excess = self.messages.len() - MAX_MESSAGES;
            self.messages.drain(..excess);
        }
        self.rejected.extend(other.rejected);
        self.batch_count += other.batch_count;
    }

    /// Completed runs at one risk level
    pub fn risk_count(&self, level: RiskLevel) -> usize {
        self.by_risk.get(&level).copied().unwrap_or(0)
    }

    /// Whether every dispatched id completed and none were skipped
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.skipped == 0
    }

    /// Reset all counts
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a summary report
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Batch Summary".to_string(),
            "=============".to_string(),
            format!("Batches: {}", self.batch_count),
            format!("Total: {}", self.total),
            format!("Success: {}", self.success),
            format!("Failed: {} ({} retryable)", self.failed, self.retryable),
            format!("Skipped: {}", self.skipped),
        ];

        if self.success > 0 {
            lines.push(String::new());
            lines.push("By risk level:".to_string());
            for level in [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High] {
                lines.push(format!("  {}: {}", level.as_str(), self.risk_count(level)));
            }
        }

        if !self.messages.is_empty() {
            lines.push(String::new());
            lines.push("Messages:".to_string());
            for message in &self.messages {
                lines.push(format!("  {}", message));
            }
        }

        lines.join("\n")
    }
}
