//! Domain Plugin Registry (§4.B).

pub mod plugin;
pub mod registry;

pub use plugin::DomainPlugin;
pub use registry::{DomainPluginRegistry, EffectiveReviewConfig};
