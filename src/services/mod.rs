//! Collaborators the audit endpoint depends on, each behind a trait so the
//! handlers can be wired against any storage.

mod actors;
mod authorization;
mod entity_class;
mod entity_manager;

pub use actors::*;
pub use authorization::*;
pub use entity_class::*;
pub use entity_manager::*;
