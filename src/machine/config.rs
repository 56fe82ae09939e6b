//! Review machine tuning knobs (§6: `clause_retry_limit`,
//! `reject_retry_limit`).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MachineConfig {
    pub clause_retry_limit: u32,
    pub reject_retry_limit: u32,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            clause_retry_limit: 2,
            reject_retry_limit: 1,
        }
    }
}
