//! CLI command modules.

pub mod devices;
pub mod http;
pub mod status;
pub mod wake;
