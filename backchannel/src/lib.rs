//! Backchannel: a private query/answer and notification protocol carried
//! inside a shared chat room.
//!
//! Clients exchange hidden messages that the host never renders, ask each
//! other typed queries with correlated answers, announce state changes,
//! and talk to every member of the room through one [`Character`] proxy
//! that is backed locally for the player and remotely for everyone else.

pub mod character;
pub mod client;
pub mod config;
pub mod effects;
pub mod envelope;
pub mod error;
pub mod host;
pub mod lifecycle;
pub mod messaging;
pub mod moderation;

pub use character::{Character, CharacterRegistry};
pub use client::{BackchannelClient, PROTOCOL_VERSION};
pub use config::BackchannelConfig;
pub use effects::{EffectContributor, Effects};
pub use envelope::BeepChannel;
pub use error::{ProtocolError, ProtocolResult};
pub use host::{ChatHost, LoopbackHost, LoopbackRoom, MemberId};
pub use lifecycle::ModulePhase;
pub use messaging::QueryReply;
pub use moderation::{AccessCheck, MemoryModeration, ModerationBackend};
