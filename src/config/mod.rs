//! Layered configuration (§6). Grounded on the teacher's `config/loader.rs`
//! hierarchical loader, collapsed from its 4-tier System/Team/Project/User
//! resolution to the two tiers this system actually needs: process
//! defaults and task-time overrides.

pub mod loader;
pub mod validator;

pub use loader::{ConfigLevel, ConfigLoader, EmbeddingServiceConfig, ReviewCoreConfig, RemoteSkillServiceConfig};
pub use validator::ConfigValidator;
