//! Event Stream (§4.E).

pub mod auth;
pub mod event;
pub mod server;
pub mod stream;

pub use auth::AuthManager;
pub use event::{Event, EventKind};
pub use stream::EventStream;
