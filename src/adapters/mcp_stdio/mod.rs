mod error_contract;
mod rpc;
mod schema;
mod tool_call;
mod transport;

use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, BufReader, BufWriter};
use tokio::time::Duration;

use crate::adapters::auth::BearerAuth;
use crate::app::compliance_usecases::ComplianceUseCases;
use crate::app::mcp_config::McpConfig;
use crate::domain::errors::DomainError;

use error_contract::domain_error_response;
use rpc::{RpcEnvelope, RpcRequest, INVALID_PARAMS, METHOD_NOT_FOUND, PARSE_ERROR, SERVER_SHUT_DOWN};
use schema::tools_schema;
use tool_call::handle_tool_call;
use transport::{read_frame, write_response, TransportMode};

const MAX_FRAME_BYTES: usize = 10 * 1024 * 1024; // 10 MiB
const DEFAULT_PROTOCOL_VERSION: &str = "2025-06-18";

pub const INITIALIZE_TIMEOUT_ENV: &str = "GRC_MCP_INITIALIZE_TIMEOUT_MS";

pub struct ServerContext {
    pub config: Arc<McpConfig>,
    pub compliance: Arc<ComplianceUseCases>,
    pub auth: BearerAuth,
}

pub fn parse_initialize_timeout_ms(raw: Option<&str>) -> Duration {
    const DEFAULT_SECS: u64 = 20;
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|v| *v > 0)
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(DEFAULT_SECS))
}

fn initialize_timeout() -> Duration {
    let raw = std::env::var(INITIALIZE_TIMEOUT_ENV).ok();
    parse_initialize_timeout_ms(raw.as_deref())
}

pub async fn start_mcp_server(ctx: Arc<ServerContext>) -> anyhow::Result<()> {
    tracing::info!(
        name = %ctx.config.config().name,
        version = %ctx.config.config().version,
        tools = ?ctx.config.tool_names().collect::<Vec<_>>(),
        auth = ctx.auth.is_enabled(),
        "MCP server listening on stdio"
    );
    serve(
        tokio::io::stdin(),
        tokio::io::stdout(),
        &ctx,
        initialize_timeout(),
    )
    .await
}

/// Request loop over any byte stream pair. Returns on EOF or `exit`.
pub async fn serve<R, W>(
    input: R,
    output: W,
    ctx: &ServerContext,
    init_timeout: Duration,
) -> anyhow::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut reader = BufReader::new(input);
    let mut writer = BufWriter::new(output);
    let init_deadline = tokio::time::Instant::now() + init_timeout;
    let mut initialized = false;
    let mut shutdown_requested = false;
    let mut response_mode: Option<TransportMode> = None;

    loop {
        let read_result = if initialized {
            read_frame(&mut reader, MAX_FRAME_BYTES).await
        } else {
            match tokio::time::timeout_at(init_deadline, read_frame(&mut reader, MAX_FRAME_BYTES))
                .await
            {
                Ok(result) => result,
                Err(_) => anyhow::bail!(
                    "no initialize received within {:?}; closing server",
                    init_timeout
                ),
            }
        };

        let frame = match read_result {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("frame read error: {}", e);
                continue;
            }
        };
        let mode = *response_mode.get_or_insert(frame.mode);

        let req: RpcRequest = match serde_json::from_str(&frame.body) {
            Ok(r) => r,
            Err(e) => {
                let envelope =
                    RpcEnvelope::rpc_error(Value::Null, PARSE_ERROR, format!("parse error: {}", e));
                write_response(&mut writer, &envelope, mode).await?;
                continue;
            }
        };

        if req.method == "initialize" {
            initialized = true;
        }

        match req.method.as_str() {
            "shutdown" => {
                shutdown_requested = true;
                if !req.is_notification() {
                    let envelope = RpcEnvelope::success(req.response_id(), Value::Null);
                    write_response(&mut writer, &envelope, mode).await?;
                }
                continue;
            }
            "exit" => {
                if !req.is_notification() {
                    let envelope = RpcEnvelope::success(req.response_id(), Value::Null);
                    write_response(&mut writer, &envelope, mode).await?;
                }
                break;
            }
            _ if shutdown_requested => {
                if !req.is_notification() {
                    let envelope = RpcEnvelope::rpc_error(
                        req.response_id(),
                        SERVER_SHUT_DOWN,
                        "server is shut down; only 'exit' is accepted",
                    );
                    write_response(&mut writer, &envelope, mode).await?;
                }
                continue;
            }
            _ => {}
        }

        if let Some(envelope) = handle_request(&req, ctx).await {
            write_response(&mut writer, &envelope, mode).await?;
        }
    }

    Ok(())
}

async fn handle_request(request: &RpcRequest, ctx: &ServerContext) -> Option<RpcEnvelope> {
    let id = request.response_id();
    let snapshot = ctx.config.config();

    let envelope = match request.method.as_str() {
        "initialize" => RpcEnvelope::success(
            id,
            json!({
                "protocolVersion": initialize_protocol_version(request.params.as_ref()),
                "capabilities": { "tools": { "listChanged": false } },
                "serverInfo": {
                    "name": snapshot.name,
                    "version": snapshot.version
                },
                "instructions": snapshot.description
            }),
        ),
        "ping" => RpcEnvelope::success(id, json!({})),
        "notifications/initialized" | "initialized" => RpcEnvelope::success(id, Value::Null),
        "tools/list" => RpcEnvelope::success(id, tools_schema(&ctx.config)),
        "tools/call" => handle_tools_call(request, ctx, id).await,
        _ => RpcEnvelope::rpc_error(
            id,
            METHOD_NOT_FOUND,
            format!("method not found: '{}'", request.method),
        ),
    };

    if request.is_notification() {
        None
    } else {
        Some(envelope)
    }
}

async fn handle_tools_call(request: &RpcRequest, ctx: &ServerContext, id: Value) -> RpcEnvelope {
    let tool_name = request.param("name").and_then(Value::as_str).unwrap_or("");
    let args = request
        .param("arguments")
        .cloned()
        .unwrap_or_else(|| Value::Object(Default::default()));
    if !args.is_object() {
        return RpcEnvelope::rpc_error(id, INVALID_PARAMS, "tool arguments must be an object");
    }
    if ctx.config.tool_config(tool_name).is_none() {
        return RpcEnvelope::rpc_error(id, INVALID_PARAMS, format!("unknown tool '{}'", tool_name));
    }

    let credentials = request
        .param("_meta")
        .and_then(|meta| meta.get(ctx.auth.token_header()))
        .and_then(Value::as_str);
    if let Err(e) = ctx.auth.authorize(credentials) {
        tracing::warn!(tool = tool_name, "rejected unauthorized tool call");
        return domain_error_response(id, &e);
    }

    match handle_tool_call(tool_name, &args, &ctx.config, &ctx.compliance).await {
        Ok(v) => RpcEnvelope::success(id, v),
        Err(e) => domain_error_response(id, &e),
    }
}

fn initialize_protocol_version(request_params: Option<&Value>) -> &str {
    request_params
        .and_then(|value| value.get("protocolVersion"))
        .and_then(Value::as_str)
        .filter(|value| !value.trim().is_empty())
        .unwrap_or(DEFAULT_PROTOCOL_VERSION)
}

pub(super) fn to_json_text(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{\"error\":true}".to_string())
}

pub(super) fn tool_success(tool: &str, action: &str, payload: Value) -> Result<Value, DomainError> {
    let content = json!({
        "tool": tool,
        "action": action,
        "payload": payload
    });
    let text = serde_json::to_string(&content)?;
    if text.len() > MAX_FRAME_BYTES {
        return Err(DomainError::InvalidData(format!(
            "tool output too large: {} bytes (max {})",
            text.len(),
            MAX_FRAME_BYTES
        )));
    }
    Ok(json!({
        "content": [{
            "type": "text",
            "text": text
        }]
    }))
}
