//! Infrastructure layer: config, logging, storage paths, and the sqlite
//! cache adapter.

pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod storage_layout;
