pub mod auth;
pub mod config_source;
pub mod mcp_stdio;
pub mod memory_store;
