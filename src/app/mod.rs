pub mod compliance_usecases;
pub mod config_loader;
pub mod constraint;
pub mod mcp_config;
pub mod ports;
pub mod validator;
