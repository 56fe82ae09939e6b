//! Node set and routing for the Review State Machine (§4.C). Cycles
//! (retry loops, rejection regeneration) are explicit conditional edges
//! plus the retry counters carried in `MachineSnapshot`, not unbounded
//! recursion (§9).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    Setup,
    Plan,
    ClauseContext,
    ClauseAnalyze,
    ValidateStrategy,
    GenerateDiffs,
    HumanApproval,
    SaveClause,
    NextClause,
    Finalize,
}

impl Node {
    pub fn name(&self) -> &'static str {
        match self {
            Node::Setup => "setup",
            Node::Plan => "plan",
            Node::ClauseContext => "clause_context",
            Node::ClauseAnalyze => "clause_analyze",
            Node::ValidateStrategy => "validate_strategy",
            Node::GenerateDiffs => "generate_diffs",
            Node::HumanApproval => "human_approval",
            Node::SaveClause => "save_clause",
            Node::NextClause => "next_clause",
            Node::Finalize => "finalize",
        }
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Outcome of `validate_strategy` (§4.C).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidateOutcome {
    Pass,
    Retry,
    SkipClause,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_names_match_spec_vocabulary() {
        assert_eq!(Node::ClauseAnalyze.name(), "clause_analyze");
        assert_eq!(Node::HumanApproval.to_string(), "human_approval");
    }
}
