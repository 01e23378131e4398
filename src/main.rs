use std::path::PathBuf;
use std::sync::Arc;

use grc_mcp_server::{
    adapters::{
        auth::BearerAuth,
        config_source::{default_config_path, FileConfigSource},
        mcp_stdio::{start_mcp_server, ServerContext},
    },
    app::{compliance_usecases::ComplianceUseCases, config_loader::ConfigLoader},
};

fn config_path_from_env() -> PathBuf {
    match std::env::var("GRC_MCP_CONFIG") {
        Ok(raw) if !raw.trim().is_empty() => PathBuf::from(raw.trim()),
        _ => default_config_path(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = if std::env::var("GRC_MCP_LOG").is_ok() {
        tracing_subscriber::EnvFilter::from_env("GRC_MCP_LOG")
    } else {
        tracing_subscriber::EnvFilter::new("grc_mcp_server=info")
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr) // log to stderr so stdout stays clean for MCP
        .with_env_filter(env_filter)
        .init();

    let source = FileConfigSource::new(config_path_from_env());
    tracing::info!("config path: {}", source.path().display());

    // No config, no server: load errors are fatal at startup.
    let loader = ConfigLoader::new();
    let config = loader.load(&source).map_err(anyhow::Error::new)?;

    let auth = BearerAuth::from_env(&config.config().auth);
    if !auth.is_enabled() {
        tracing::warn!("GRC_MCP_AUTH_DISABLED is set; tool calls are not authenticated");
    } else if !auth.has_key() {
        tracing::warn!("GRC_MCP_API_KEY is not set; every tool call will be rejected");
    }

    let ctx = Arc::new(ServerContext {
        config,
        compliance: Arc::new(ComplianceUseCases::in_memory()),
        auth,
    });

    // Leave directly: dropping the runtime would wait on the blocking stdin
    // reader until the peer closes the pipe.
    let code = match start_mcp_server(ctx).await {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!("MCP server stopped: {:#}", e);
            1
        }
    };
    std::process::exit(code);
}
