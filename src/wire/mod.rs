//! Wire shapes of the remote history and push collaborators, plus their
//! normalization into domain messages.

mod message;

pub use message::{
    WireComponent, WireMessage, WireParameter, WireParty, WireTemplate,
};
