//! Use case layer: conversation workflows over collaborator contracts.

pub mod context;
pub mod contracts;
pub mod live_refresh;
pub mod load_older;
pub mod open_chat;
pub mod send_pipeline;
