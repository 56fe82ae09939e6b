//! Skill Registry & Dispatcher (§4.A).

pub mod local;
pub mod registry;
pub mod remote;
pub mod types;

pub use registry::SkillRegistry;
pub use remote::RemoteSkillClient;
pub use types::{
    LocalSkillHandler, RemoteSkillTarget, SkillBackend, SkillBackendKind, SkillOutcome,
    SkillRegistration, SkillSchema, SkillTimeout,
};
