// crates/bucket-gate-mcp/src/server.rs
// ============================================================================
// Module: MCP Server
// Description: JSON-RPC 2.0 handling over stdio and HTTP transports.
// Purpose: Expose the Bucket Gate tool catalog and tool calls to MCP clients.
// Dependencies: bucket-gate-config, axum, serde, serde_json, tokio
// ============================================================================

//! ## Overview
//! [`McpHandler`] turns one JSON-RPC payload into at most one reply. Tool
//! calls are forwarded to [`ToolRouter`]; tool failures travel inside the
//! reply as an envelope with `isError: true`, while malformed frames get
//! JSON-RPC error objects. Notifications never receive a reply.
//!
//! The stdio transport accepts both newline-delimited JSON and
//! `Content-Length` framed messages, detected per message, and answers each
//! message in the framing it arrived in. The HTTP transport serves
//! `POST /rpc`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::body::Bytes;
use axum::extract::DefaultBodyLimit;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::post;
use bucket_gate_config::AuditConfig;
use bucket_gate_config::BucketGateConfig;
use bucket_gate_config::ServerConfig;
use bucket_gate_config::ServerTransport;
use bucket_gate_contract::ToolDefinition;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use tokio::io::AsyncBufRead;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncRead;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWrite;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;
use tokio::net::TcpListener;

use crate::audit::McpAuditEvent;
use crate::audit::McpAuditEventParams;
use crate::audit::McpAuditSink;
use crate::audit::McpFileAuditSink;
use crate::audit::McpNoopAuditSink;
use crate::audit::McpStderrAuditSink;
use crate::audit::StartupAuditEvent;
use crate::audit::StartupEventKind;
use crate::bootstrap::CredentialFileFactory;
use crate::bootstrap::TenantClientFactory;
use crate::bootstrap::build_registry;
use crate::telemetry::McpMethod;
use crate::telemetry::McpMetricEvent;
use crate::telemetry::McpMetrics;
use crate::telemetry::McpOutcome;
use crate::telemetry::NoopMetrics;
use crate::tools::ToolRouter;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// MCP protocol revision announced during `initialize`.
pub const PROTOCOL_VERSION: &str = "2025-06-18";
/// Server name announced during `initialize`.
pub const SERVER_NAME: &str = "bucket-gate";
/// JSON-RPC parse error.
pub const PARSE_ERROR: i64 = -32700;
/// JSON-RPC invalid request.
pub const INVALID_REQUEST: i64 = -32600;
/// JSON-RPC method not found.
pub const METHOD_NOT_FOUND: i64 = -32601;
/// JSON-RPC invalid params.
pub const INVALID_PARAMS: i64 = -32602;
/// JSON-RPC internal error.
pub const INTERNAL_ERROR: i64 = -32603;
/// Longest accepted `Content-Length` header line.
const MAX_HEADER_LINE_BYTES: usize = 8 * 1024;
/// Reply sent when a response cannot be serialized.
const SERIALIZATION_FAILED_BODY: &[u8] =
    br#"{"jsonrpc":"2.0","id":null,"error":{"code":-32603,"message":"serialization failed"}}"#;

// ============================================================================
// SECTION: MCP Server
// ============================================================================

/// MCP server instance.
pub struct McpServer {
    /// Server transport configuration.
    server: ServerConfig,
    /// JSON-RPC handler.
    handler: McpHandler,
    /// Audit sink for start-up events.
    audit: Arc<dyn McpAuditSink>,
}

impl McpServer {
    /// Builds a server whose tenants load credential files from disk.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerError`] when configuration or start-up fails.
    pub fn from_config(config: BucketGateConfig) -> Result<Self, McpServerError> {
        let factory = CredentialFileFactory::new(config.tenants.keys_dir.clone());
        Self::from_config_with_factory(config, &factory)
    }

    /// Builds a server using a caller-supplied client factory.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerError`] when configuration or start-up fails.
    pub fn from_config_with_factory(
        config: BucketGateConfig,
        factory: &dyn TenantClientFactory,
    ) -> Result<Self, McpServerError> {
        config.validate().map_err(|err| McpServerError::Config(err.to_string()))?;
        let audit = audit_sink(&config.audit)?;
        let registry = build_registry(&config.tenants, factory, audit.as_ref())
            .map_err(|err| McpServerError::Init(err.to_string()))?;
        let router = ToolRouter::new(Arc::new(registry)).with_audit(Arc::clone(&audit));
        let handler = McpHandler::new(router, config.server.max_body_bytes)
            .with_audit(Arc::clone(&audit));
        Ok(Self {
            server: config.server,
            handler,
            audit,
        })
    }

    /// Returns the JSON-RPC handler.
    #[must_use]
    pub const fn handler(&self) -> &McpHandler {
        &self.handler
    }

    /// Serves requests using the configured transport until it closes.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerError`] when the transport cannot be established
    /// or fails.
    pub async fn serve(self) -> Result<(), McpServerError> {
        match self.server.transport {
            ServerTransport::Stdio => {
                self.announce("serving over stdio".to_string());
                serve_stdio(&self.handler, tokio::io::stdin(), tokio::io::stdout()).await
            }
            ServerTransport::Http => {
                let addr =
                    self.server.bind_addr().map_err(|err| McpServerError::Config(err.to_string()))?;
                let listener = TcpListener::bind(addr)
                    .await
                    .map_err(|err| McpServerError::Transport(format!("http bind failed: {err}")))?;
                self.announce(format!("serving over http on {addr}"));
                serve_http(listener, self.handler).await
            }
        }
    }

    /// Records the serving start-up event.
    fn announce(&self, message: String) {
        self.audit.record_startup(&StartupAuditEvent::new(
            StartupEventKind::Serving,
            None,
            Some(message),
        ));
    }
}

/// Builds the audit sink selected by configuration.
///
/// # Errors
///
/// Returns [`McpServerError::Init`] when the audit file cannot be opened.
pub fn audit_sink(config: &AuditConfig) -> Result<Arc<dyn McpAuditSink>, McpServerError> {
    if !config.enabled {
        return Ok(Arc::new(McpNoopAuditSink));
    }
    match &config.path {
        Some(path) => {
            let sink = McpFileAuditSink::new(path).map_err(|err| {
                McpServerError::Init(format!("audit log {} open failed: {err}", path.display()))
            })?;
            Ok(Arc::new(sink))
        }
        None => Ok(Arc::new(McpStderrAuditSink)),
    }
}

// ============================================================================
// SECTION: JSON-RPC Types
// ============================================================================

/// Incoming JSON-RPC request payload.
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    /// JSON-RPC protocol version.
    jsonrpc: String,
    /// Request identifier.
    #[serde(default)]
    id: Value,
    /// Method name.
    method: String,
    /// Optional parameters payload.
    #[serde(default)]
    params: Option<Value>,
}

/// JSON-RPC response envelope.
#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    /// JSON-RPC protocol version.
    jsonrpc: &'static str,
    /// Request identifier.
    id: Value,
    /// Successful result payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    /// Error payload when the request fails.
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Builds a success response.
    const fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Builds an error response.
    fn failure(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }

    /// Returns the error code, if any.
    fn error_code(&self) -> Option<i64> {
        self.error.as_ref().map(|error| error.code)
    }
}

/// JSON-RPC error payload.
#[derive(Debug, Serialize)]
struct JsonRpcError {
    /// Error code.
    code: i64,
    /// Human-readable error message.
    message: String,
}

/// Tool call parameters for JSON-RPC requests.
#[derive(Debug, Deserialize)]
struct ToolCallParams {
    /// Tool name.
    name: String,
    /// Raw JSON arguments.
    #[serde(default)]
    arguments: Value,
}

/// Tool list response payload.
#[derive(Debug, Serialize)]
struct ToolListResult {
    /// Tool definitions in catalog order.
    tools: Vec<ToolDefinition>,
}

/// Tool call response payload.
#[derive(Debug, Serialize)]
struct ToolCallResult {
    /// Tool output content.
    content: Vec<ToolContent>,
    /// True when the envelope reports a failure.
    #[serde(rename = "isError")]
    is_error: bool,
}

/// Tool output payloads for JSON-RPC responses.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ToolContent {
    /// Envelope serialized as JSON text.
    Text {
        /// Envelope JSON.
        text: String,
    },
}

/// Serialized JSON-RPC reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McpReply {
    /// Response JSON bytes.
    pub body: Vec<u8>,
    /// JSON-RPC error code when the reply is an error object.
    pub error_code: Option<i64>,
}

/// Intermediate result of dispatching one payload.
struct Dispatched {
    /// Method classification for audit and metrics.
    method: McpMethod,
    /// Request identifier when the request carried one.
    request_id: Option<String>,
    /// Reply, absent for notifications.
    response: Option<JsonRpcResponse>,
}

impl Dispatched {
    /// Classifies a payload rejected before method dispatch.
    const fn invalid(response: JsonRpcResponse) -> Self {
        Self {
            method: McpMethod::Invalid,
            request_id: None,
            response: Some(response),
        }
    }

    /// Classifies a notification.
    const fn notification() -> Self {
        Self {
            method: McpMethod::Notification,
            request_id: None,
            response: None,
        }
    }
}

// ============================================================================
// SECTION: JSON-RPC Handling
// ============================================================================

/// Transport-independent JSON-RPC handler.
#[derive(Clone)]
pub struct McpHandler {
    /// Tool router for `tools/call`.
    router: ToolRouter,
    /// Largest accepted payload in bytes.
    max_body_bytes: usize,
    /// Audit sink for request events.
    audit: Arc<dyn McpAuditSink>,
    /// Metrics sink for request observations.
    metrics: Arc<dyn McpMetrics>,
}

impl McpHandler {
    /// Creates a handler with no-op audit and metrics sinks.
    #[must_use]
    pub fn new(router: ToolRouter, max_body_bytes: usize) -> Self {
        Self {
            router,
            max_body_bytes,
            audit: Arc::new(McpNoopAuditSink),
            metrics: Arc::new(NoopMetrics),
        }
    }

    /// Replaces the audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Arc<dyn McpAuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Replaces the metrics sink.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<dyn McpMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Returns the tool router.
    #[must_use]
    pub const fn router(&self) -> &ToolRouter {
        &self.router
    }

    /// Returns the payload size limit.
    #[must_use]
    pub const fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    /// Handles one JSON-RPC payload. Returns `None` for notifications.
    pub async fn handle_payload(
        &self,
        transport: ServerTransport,
        payload: &[u8],
    ) -> Option<McpReply> {
        let started = Instant::now();
        let dispatched = self.dispatch(payload).await;
        self.finish(transport, dispatched, payload.len(), started)
    }

    /// Builds the reply for a frame rejected by the transport.
    fn reject(
        &self,
        transport: ServerTransport,
        code: i64,
        message: &str,
        request_bytes: usize,
    ) -> Option<McpReply> {
        let dispatched =
            Dispatched::invalid(JsonRpcResponse::failure(Value::Null, code, message));
        self.finish(transport, dispatched, request_bytes, Instant::now())
    }

    /// Serializes the reply and records audit and metrics.
    fn finish(
        &self,
        transport: ServerTransport,
        dispatched: Dispatched,
        request_bytes: usize,
        started: Instant,
    ) -> Option<McpReply> {
        let reply = dispatched.response.map(|response| {
            let error_code = response.error_code();
            let body = serde_json::to_vec(&response)
                .unwrap_or_else(|_| SERIALIZATION_FAILED_BODY.to_vec());
            McpReply {
                body,
                error_code,
            }
        });
        let error_code = reply.as_ref().and_then(|reply| reply.error_code);
        let outcome = if error_code.is_some() { McpOutcome::Error } else { McpOutcome::Ok };
        let response_bytes = reply.as_ref().map_or(0, |reply| reply.body.len());
        self.audit.record(&McpAuditEvent::new(McpAuditEventParams {
            request_id: dispatched.request_id,
            transport,
            method: dispatched.method,
            outcome,
            error_code,
            request_bytes,
            response_bytes,
        }));
        let event = McpMetricEvent {
            transport,
            method: dispatched.method,
            outcome,
            error_code,
            request_bytes,
            response_bytes,
        };
        self.metrics.record_request(event.clone());
        self.metrics.record_latency(event, started.elapsed());
        reply
    }

    /// Parses the payload and dispatches it by method.
    async fn dispatch(&self, payload: &[u8]) -> Dispatched {
        if payload.len() > self.max_body_bytes {
            return Dispatched::invalid(JsonRpcResponse::failure(
                Value::Null,
                INVALID_REQUEST,
                "request body too large",
            ));
        }
        let Ok(value) = serde_json::from_slice::<Value>(payload) else {
            return Dispatched::invalid(JsonRpcResponse::failure(
                Value::Null,
                PARSE_ERROR,
                "parse error",
            ));
        };
        let Some(fields) = value.as_object() else {
            let message = if value.is_array() {
                "batch requests are not supported"
            } else {
                "invalid json-rpc request"
            };
            return Dispatched::invalid(JsonRpcResponse::failure(
                Value::Null,
                INVALID_REQUEST,
                message,
            ));
        };
        let is_notification = !fields.contains_key("id");
        let raw_id = fields.get("id").cloned().unwrap_or(Value::Null);
        let request = match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(request) => request,
            Err(_) if is_notification => return Dispatched::notification(),
            Err(_) => {
                return Dispatched::invalid(JsonRpcResponse::failure(
                    raw_id,
                    INVALID_REQUEST,
                    "invalid json-rpc request",
                ));
            }
        };
        if is_notification {
            return Dispatched::notification();
        }
        if request.jsonrpc != "2.0" {
            return Dispatched::invalid(JsonRpcResponse::failure(
                request.id,
                INVALID_REQUEST,
                "invalid json-rpc version",
            ));
        }

        let method = McpMethod::from_method(&request.method);
        let request_id = Some(request.id.to_string());
        let id = request.id;
        let response = match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(id, initialize_result()),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => self.tools_list(id),
            "tools/call" => self.tools_call(id, request.params).await,
            other => {
                JsonRpcResponse::failure(id, METHOD_NOT_FOUND, format!("method not found: {other}"))
            }
        };
        Dispatched {
            method,
            request_id,
            response: Some(response),
        }
    }

    /// Answers `tools/list`.
    fn tools_list(&self, id: Value) -> JsonRpcResponse {
        match serde_json::to_value(ToolListResult {
            tools: self.router.list_tools(),
        }) {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(_) => JsonRpcResponse::failure(id, INTERNAL_ERROR, "serialization failed"),
        }
    }

    /// Answers `tools/call` with the router's envelope.
    async fn tools_call(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let Some(params) = params else {
            return JsonRpcResponse::failure(id, INVALID_PARAMS, "missing tool call params");
        };
        let Ok(call) = serde_json::from_value::<ToolCallParams>(params) else {
            return JsonRpcResponse::failure(id, INVALID_PARAMS, "invalid tool call params");
        };
        let envelope = self.router.handle_tool_call(&call.name, &call.arguments).await;
        let result = envelope.to_json_text().and_then(|text| {
            serde_json::to_value(ToolCallResult {
                content: vec![ToolContent::Text {
                    text,
                }],
                is_error: envelope.is_error(),
            })
        });
        match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(_) => JsonRpcResponse::failure(id, INTERNAL_ERROR, "serialization failed"),
        }
    }
}

/// Builds the `initialize` result.
fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": { "listChanged": false },
        },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION"),
        },
    })
}

// ============================================================================
// SECTION: Stdio Transport
// ============================================================================

/// Message framing detected on the stdio stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Framing {
    /// One JSON document per line.
    Line,
    /// `Content-Length` header block followed by the body.
    ContentLength,
}

/// Outcome of reading one stdio frame.
#[derive(Debug, PartialEq, Eq)]
enum FrameRead {
    /// Stream closed.
    Eof,
    /// Complete message payload.
    Message {
        /// Framing the message arrived in.
        framing: Framing,
        /// Message body.
        payload: Vec<u8>,
    },
    /// Frame consumed but unusable.
    Rejected {
        /// Framing the frame arrived in.
        framing: Framing,
        /// JSON-RPC error code to report.
        code: i64,
        /// Error message to report.
        message: &'static str,
        /// Bytes consumed for the frame.
        request_bytes: usize,
    },
}

/// Outcome of a bounded line read.
enum LineRead {
    /// Stream closed before any byte.
    Eof,
    /// Line read (possibly unterminated at end of stream).
    Complete,
    /// Line exceeded the limit; the remainder was discarded.
    Overflow,
}

/// Serves JSON-RPC messages from `reader`, writing replies to `writer`.
///
/// Returns when the reader reaches end of stream.
///
/// # Errors
///
/// Returns [`McpServerError::Transport`] on I/O failure or a stream that
/// closes inside a header block.
pub async fn serve_stdio<R, W>(
    handler: &McpHandler,
    reader: R,
    mut writer: W,
) -> Result<(), McpServerError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut reader = BufReader::new(reader);
    loop {
        let (framing, reply) = match read_frame(&mut reader, handler.max_body_bytes).await? {
            FrameRead::Eof => return Ok(()),
            FrameRead::Message {
                framing,
                payload,
            } => (framing, handler.handle_payload(ServerTransport::Stdio, &payload).await),
            FrameRead::Rejected {
                framing,
                code,
                message,
                request_bytes,
            } => (framing, handler.reject(ServerTransport::Stdio, code, message, request_bytes)),
        };
        if let Some(reply) = reply {
            write_frame(&mut writer, framing, &reply.body).await?;
        }
    }
}

/// Reads the next frame, skipping blank lines between messages.
async fn read_frame<R>(reader: &mut R, max_body_bytes: usize) -> Result<FrameRead, McpServerError>
where
    R: AsyncBufRead + Unpin,
{
    let line_limit = max_body_bytes.max(MAX_HEADER_LINE_BYTES);
    let mut line = Vec::new();
    loop {
        match read_line_limited(reader, line_limit, &mut line).await? {
            LineRead::Eof => return Ok(FrameRead::Eof),
            LineRead::Overflow => {
                return Ok(FrameRead::Rejected {
                    framing: Framing::Line,
                    code: INVALID_REQUEST,
                    message: "request body too large",
                    request_bytes: line.len(),
                });
            }
            LineRead::Complete => {}
        }
        let trimmed = line.trim_ascii();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(length) = content_length_header(trimmed) {
            return read_header_frame(reader, length, max_body_bytes).await;
        }
        return Ok(FrameRead::Message {
            framing: Framing::Line,
            payload: trimmed.to_vec(),
        });
    }
}

/// Reads the rest of a `Content-Length` header block and its body.
async fn read_header_frame<R>(
    reader: &mut R,
    mut length: Option<usize>,
    max_body_bytes: usize,
) -> Result<FrameRead, McpServerError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    loop {
        match read_line_limited(reader, MAX_HEADER_LINE_BYTES, &mut line).await? {
            LineRead::Eof => {
                let message = "stdio closed inside frame header".to_string();
                return Err(McpServerError::Transport(message));
            }
            LineRead::Overflow => continue,
            LineRead::Complete => {}
        }
        let trimmed = line.trim_ascii();
        if trimmed.is_empty() {
            break;
        }
        if let Some(value) = content_length_header(trimmed) {
            length = value;
        }
    }
    let Some(length) = length else {
        return Ok(FrameRead::Rejected {
            framing: Framing::ContentLength,
            code: PARSE_ERROR,
            message: "invalid content length header",
            request_bytes: 0,
        });
    };
    if length > max_body_bytes {
        let limit = u64::try_from(length).unwrap_or(u64::MAX);
        tokio::io::copy(&mut (&mut *reader).take(limit), &mut tokio::io::sink())
            .await
            .map_err(|err| McpServerError::Transport(format!("stdio read failed: {err}")))?;
        return Ok(FrameRead::Rejected {
            framing: Framing::ContentLength,
            code: INVALID_REQUEST,
            message: "request body too large",
            request_bytes: length,
        });
    }
    let mut payload = vec![0u8; length];
    reader
        .read_exact(&mut payload)
        .await
        .map_err(|err| McpServerError::Transport(format!("stdio read failed: {err}")))?;
    Ok(FrameRead::Message {
        framing: Framing::ContentLength,
        payload,
    })
}

/// Parses a `Content-Length` header line.
///
/// Returns `None` when the line is not that header, and `Some(None)` when it
/// is but the value is not a valid length.
fn content_length_header(line: &[u8]) -> Option<Option<usize>> {
    let text = std::str::from_utf8(line).ok()?;
    let (name, value) = text.split_once(':')?;
    if !name.trim().eq_ignore_ascii_case("content-length") {
        return None;
    }
    Some(value.trim().parse().ok())
}

/// Reads one line of at most `limit` bytes plus terminator into `line`.
async fn read_line_limited<R>(
    reader: &mut R,
    limit: usize,
    line: &mut Vec<u8>,
) -> Result<LineRead, McpServerError>
where
    R: AsyncBufRead + Unpin,
{
    line.clear();
    let cap = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1);
    let read = (&mut *reader)
        .take(cap)
        .read_until(b'\n', line)
        .await
        .map_err(|err| McpServerError::Transport(format!("stdio read failed: {err}")))?;
    if read == 0 {
        return Ok(LineRead::Eof);
    }
    if line.len() > limit && !line.ends_with(b"\n") {
        discard_line(reader).await?;
        return Ok(LineRead::Overflow);
    }
    Ok(LineRead::Complete)
}

/// Discards input through the next newline or end of stream.
async fn discard_line<R>(reader: &mut R) -> Result<(), McpServerError>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let buffer = reader
            .fill_buf()
            .await
            .map_err(|err| McpServerError::Transport(format!("stdio read failed: {err}")))?;
        if buffer.is_empty() {
            return Ok(());
        }
        let newline = buffer.iter().position(|byte| *byte == b'\n');
        let len = buffer.len();
        match newline {
            Some(index) => {
                reader.consume(index + 1);
                return Ok(());
            }
            None => reader.consume(len),
        }
    }
}

/// Writes a reply in the given framing.
async fn write_frame<W>(
    writer: &mut W,
    framing: Framing,
    payload: &[u8],
) -> Result<(), McpServerError>
where
    W: AsyncWrite + Unpin,
{
    let result = match framing {
        Framing::Line => {
            let mut frame = Vec::with_capacity(payload.len() + 1);
            frame.extend_from_slice(payload);
            frame.push(b'\n');
            writer.write_all(&frame).await
        }
        Framing::ContentLength => {
            let mut frame = format!("Content-Length: {}\r\n\r\n", payload.len()).into_bytes();
            frame.extend_from_slice(payload);
            writer.write_all(&frame).await
        }
    };
    result.map_err(|err| McpServerError::Transport(format!("stdio write failed: {err}")))?;
    writer
        .flush()
        .await
        .map_err(|err| McpServerError::Transport(format!("stdio write failed: {err}")))
}

// ============================================================================
// SECTION: HTTP Transport
// ============================================================================

/// Serves JSON-RPC requests on `POST /rpc` until the listener fails.
///
/// # Errors
///
/// Returns [`McpServerError::Transport`] when the HTTP server fails.
pub async fn serve_http(listener: TcpListener, handler: McpHandler) -> Result<(), McpServerError> {
    let max_body_bytes = handler.max_body_bytes();
    let app = Router::new()
        .route("/rpc", post(handle_http))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(Arc::new(handler));
    axum::serve(listener, app)
        .await
        .map_err(|err| McpServerError::Transport(format!("http server failed: {err}")))
}

/// Handles one HTTP JSON-RPC request.
async fn handle_http(State(handler): State<Arc<McpHandler>>, bytes: Bytes) -> Response {
    match handler.handle_payload(ServerTransport::Http, &bytes).await {
        None => StatusCode::ACCEPTED.into_response(),
        Some(reply) => {
            (http_status(reply.error_code), [(CONTENT_TYPE, "application/json")], reply.body)
                .into_response()
        }
    }
}

/// Maps a JSON-RPC error code to an HTTP status.
const fn http_status(error_code: Option<i64>) -> StatusCode {
    match error_code {
        None => StatusCode::OK,
        Some(PARSE_ERROR | INVALID_REQUEST | METHOD_NOT_FOUND | INVALID_PARAMS) => {
            StatusCode::BAD_REQUEST
        }
        Some(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// MCP server errors.
#[derive(Debug, thiserror::Error)]
pub enum McpServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}
