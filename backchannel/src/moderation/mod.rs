//! Interfaces of the moderation features the protocol carries.
//!
//! The features themselves (permission tables, behaviour log, curses,
//! conditions, rules) are collaborators: the protocol only needs their
//! local authoritative functions ([`ModerationBackend`]), the standing
//! authority predicate ([`AccessCheck`]) and the handlers that expose a
//! backend to peers.

pub mod backend;
pub mod handlers;
pub mod memory;
pub mod queries;
pub mod types;

pub use backend::{AccessCheck, ModerationBackend};
pub use handlers::register_moderation_queries;
pub use memory::MemoryModeration;
