//! CLI command implementations.

pub mod apply;
pub mod common;
pub mod schemes;
pub mod version;
