//! Domain layer: core entities and conversation state machines.

pub mod chat_session;
pub mod day_groups;
pub mod identity;
pub mod message;
pub mod message_store;
pub mod search;
