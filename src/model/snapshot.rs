//! `MachineSnapshot`: the durable state a [`crate::machine::ReviewMachine`]
//! needs to resume a task after a process restart (§3, §4.C).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::ids::{ClauseId, DiffId, TaskId};

/// Name of the node the machine was at (or about to enter) when the
/// snapshot was written. Mirrors the node set in `machine::node`.
pub type NodeName = String;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalIssue {
    pub summary: String,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineSnapshot {
    pub task_id: TaskId,
    pub current_node: NodeName,
    /// Clauses still awaiting `review_document`, in traversal order.
    pub pending_clauses: Vec<ClauseId>,
    /// Per-clause retry counters (§4.C: bounded, not unbounded recursion).
    pub clause_retry_counts: HashMap<ClauseId, u32>,
    /// Retry counters for rejected diffs keyed by diff id.
    pub reject_retry_counts: HashMap<String, u32>,
    /// Cross-clause issues that don't belong to any single clause
    /// (e.g. a document-wide cross-reference break).
    pub global_issues: Vec<GlobalIssue>,
    /// Diff ids awaiting decision for `pending_clauses[0]`, the clause
    /// the machine is suspended on. Empty once `save_clause` clears them.
    pub current_clause_diff_ids: Vec<DiffId>,
    /// Applied (approved) diffs accumulated across the whole task, used
    /// by `finalize` for summary statistics.
    pub applied_diff_ids: Vec<DiffId>,
    /// Diffs recorded as rejected-final (no further regeneration),
    /// likewise accumulated for `finalize`.
    pub rejected_diff_ids: Vec<DiffId>,
    pub sequence: u64,
}

impl MachineSnapshot {
    pub fn new(task_id: TaskId, current_node: NodeName) -> Self {
        Self {
            task_id,
            current_node,
            pending_clauses: Vec::new(),
            clause_retry_counts: HashMap::new(),
            reject_retry_counts: HashMap::new(),
            global_issues: Vec::new(),
            current_clause_diff_ids: Vec::new(),
            applied_diff_ids: Vec::new(),
            rejected_diff_ids: Vec::new(),
            sequence: 0,
        }
    }

    pub fn clause_retry_count(&self, clause_id: &str) -> u32 {
        self.clause_retry_counts.get(clause_id).copied().unwrap_or(0)
    }

    pub fn increment_clause_retry(&mut self, clause_id: &str) -> u32 {
        let count = self.clause_retry_counts.entry(clause_id.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    pub fn reject_retry_count(&self, diff_id: &str) -> u32 {
        self.reject_retry_counts.get(diff_id).copied().unwrap_or(0)
    }

    pub fn increment_reject_retry(&mut self, diff_id: &str) -> u32 {
        let count = self.reject_retry_counts.entry(diff_id.to_string()).or_insert(0);
        *count += 1;
        *count
    }
}
