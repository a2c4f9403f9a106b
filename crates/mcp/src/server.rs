//! Per-session MCP server: tool dispatch and the JSON-RPC message loop.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::protocol::{
    CallToolParams, CallToolResult, Implementation, InitializeParams, InitializeResult,
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, ListResourcesResult, ListToolsResult,
    ReadResourceParams, ReadResourceResult, ResourcesCapability, ServerCapabilities,
    ToolsCapability, negotiate_protocol_version,
};
use crate::resources::{ResourceDescriptor, ResourceProducer, ResourceRegistry};
use crate::tools::{ToolDescriptor, ToolHandler, ToolRegistrar};

/// Maximum size of one inbound message (1MB).
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// One server instance.
///
/// Each hosting session builds its own; nothing is shared between instances.
#[derive(Debug)]
pub struct Server {
    info: Implementation,
    tools: ToolRegistrar,
    resources: ResourceRegistry,
}

impl Server {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            info: Implementation {
                name: name.into(),
                version: version.into(),
            },
            tools: ToolRegistrar::new(),
            resources: ResourceRegistry::new(),
        }
    }

    /// Register a resource that tools can render into.
    pub fn register_resource(
        &mut self,
        descriptor: ResourceDescriptor,
        producer: impl ResourceProducer + 'static,
    ) -> Result<()> {
        debug!(uri = %descriptor.uri, "registering resource");
        self.resources.register(descriptor, producer)
    }

    /// Register a tool.
    ///
    /// A tool that names a resource can only be registered after that
    /// resource.
    pub fn register_tool(
        &mut self,
        descriptor: ToolDescriptor,
        handler: impl ToolHandler + 'static,
    ) -> Result<()> {
        if let Some(uri) = &descriptor.resource_uri {
            if !self.resources.contains(uri) {
                return Err(Error::UnknownResource {
                    tool: descriptor.name.clone(),
                    uri: uri.clone(),
                });
            }
        }
        debug!(tool = %descriptor.name, "registering tool");
        self.tools.register(descriptor, handler)
    }

    pub fn tools(&self) -> &ToolRegistrar {
        &self.tools
    }

    /// Invoke a tool.
    ///
    /// Arguments are validated first; the handler never sees a call that
    /// fails validation.
    pub fn call_tool(&self, name: &str, arguments: Option<&Value>) -> Result<CallToolResult> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| Error::ToolNotFound(name.to_string()))?;

        let arguments = tool.validator.validate(arguments).map_err(|e| {
            debug!(tool = name, error = %e, "rejected tool call");
            Error::Validation(e)
        })?;

        let result = tool.handler.call(&arguments)?;
        info!(tool = name, "tool call completed");
        Ok(result)
    }

    /// Fetch a resource document.
    pub async fn read_resource(&self, uri: &str) -> Result<ReadResourceResult> {
        self.resources.read(uri).await
    }

    /// Serve newline-delimited JSON-RPC until `reader` hits EOF.
    ///
    /// Messages are handled one at a time in arrival order. Malformed input
    /// gets an error response; it does not end the session.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!(server = %self.info.name, "session started");
        let mut lines = reader.lines();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            let response = if line.len() > MAX_MESSAGE_SIZE {
                warn!(size = line.len(), max = MAX_MESSAGE_SIZE, "message too large");
                Some(JsonRpcResponse::failure(
                    None,
                    JsonRpcError::new(
                        JsonRpcError::INVALID_REQUEST,
                        format!("message too large: {} bytes (max {MAX_MESSAGE_SIZE})", line.len()),
                    ),
                ))
            } else {
                self.handle_message(&line).await
            };

            if let Some(response) = response {
                let response_json = serde_json::to_string(&response)?;
                writer.write_all(response_json.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }

        info!(server = %self.info.name, "session ended");
        Ok(())
    }

    /// Handle one raw message. Notifications produce no response.
    ///
    /// A message without an `id` member is a notification. An `id` that is
    /// present but not a string or integer (including `null`) is answered
    /// with an invalid-request error.
    pub async fn handle_message(&self, line: &str) -> Option<JsonRpcResponse> {
        let message: Value = match serde_json::from_str(line) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "unparseable message");
                return Some(JsonRpcResponse::failure(
                    None,
                    JsonRpcError::new(JsonRpcError::PARSE_ERROR, format!("parse error: {e}")),
                ));
            }
        };

        if let Some(id) = message.get("id") {
            if !(id.is_string() || id.is_i64()) {
                warn!(%id, "unusable request id");
                return Some(JsonRpcResponse::failure(
                    None,
                    JsonRpcError::new(
                        JsonRpcError::INVALID_REQUEST,
                        format!("request id must be a string or integer, got {id}"),
                    ),
                ));
            }
        }

        let request: JsonRpcRequest = match serde_json::from_value(message) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "malformed request");
                return Some(JsonRpcResponse::failure(
                    None,
                    JsonRpcError::new(
                        JsonRpcError::INVALID_REQUEST,
                        format!("invalid request: {e}"),
                    ),
                ));
            }
        };

        let Some(id) = request.id.clone() else {
            debug!(method = %request.method, "notification");
            return None;
        };

        Some(match self.handle_request(&request).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => JsonRpcResponse::failure(Some(id), JsonRpcError::from(&e)),
        })
    }

    async fn handle_request(&self, request: &JsonRpcRequest) -> Result<Value> {
        if request.jsonrpc != "2.0" {
            return Err(Error::InvalidRequest(format!(
                "unsupported jsonrpc version: {}",
                request.jsonrpc
            )));
        }

        match request.method.as_str() {
            "initialize" => {
                let params: InitializeParams = parse_params_or_default(request)?;
                if let Some(client) = &params.client_info {
                    info!(client = %client.name, version = %client.version, "client initialized");
                }
                let requested = params.protocol_version.as_deref();
                let protocol_version = negotiate_protocol_version(requested);
                if requested.is_some_and(|requested| requested != protocol_version) {
                    warn!(?requested, offered = protocol_version, "unsupported protocol version");
                }
                let result = InitializeResult {
                    protocol_version: protocol_version.to_string(),
                    capabilities: ServerCapabilities {
                        tools: Some(ToolsCapability::default()),
                        resources: Some(ResourcesCapability::default()),
                    },
                    server_info: self.info.clone(),
                };
                Ok(serde_json::to_value(result)?)
            }
            "ping" => Ok(serde_json::json!({})),
            "tools/list" => Ok(serde_json::to_value(ListToolsResult {
                tools: self.tools.list(),
            })?),
            "tools/call" => {
                let params: CallToolParams = parse_params(request)?;
                let result = self.call_tool(&params.name, params.arguments.as_ref())?;
                Ok(serde_json::to_value(result)?)
            }
            "resources/list" => Ok(serde_json::to_value(ListResourcesResult {
                resources: self.resources.list(),
            })?),
            "resources/read" => {
                let params: ReadResourceParams = parse_params(request)?;
                let result = self.read_resource(&params.uri).await?;
                Ok(serde_json::to_value(result)?)
            }
            other => Err(Error::MethodNotFound(other.to_string())),
        }
    }
}

fn parse_params<P: DeserializeOwned>(request: &JsonRpcRequest) -> Result<P> {
    let params = request
        .params
        .clone()
        .ok_or_else(|| Error::InvalidRequest(format!("{} requires params", request.method)))?;
    serde_json::from_value(params)
        .map_err(|e| Error::InvalidRequest(format!("invalid {} params: {e}", request.method)))
}

fn parse_params_or_default<P: DeserializeOwned + Default>(request: &JsonRpcRequest) -> Result<P> {
    match &request.params {
        None | Some(Value::Null) => Ok(P::default()),
        Some(_) => parse_params(request),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{LATEST_PROTOCOL_VERSION, RESOURCE_MIME_TYPE, RequestId};
    use crate::resources::StaticDocument;
    use crate::schema::{ArgumentSchema, FieldKind, FieldSpec, ToolArguments};
    use policy::SecurityPolicy;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const URI: &str = "ui://test/app.html";

    fn test_server(calls: Arc<AtomicUsize>) -> Server {
        let mut server = Server::new("test", "0.0.1");
        server
            .register_resource(
                ResourceDescriptor::new(URI, RESOURCE_MIME_TYPE).with_policy(SecurityPolicy::maps()),
                StaticDocument::new("<html></html>"),
            )
            .unwrap();
        server
            .register_tool(
                ToolDescriptor::new(
                    "setZoom",
                    ArgumentSchema::new()
                        .field(FieldSpec::new("zoom", FieldKind::number_in(0.0, 21.0))),
                )
                .with_resource(URI),
                move |args: &ToolArguments| -> Result<CallToolResult> {
                    calls.fetch_add(1, Ordering::SeqCst);
                    let zoom = args.require_number("zoom")?;
                    Ok(CallToolResult::text(format!("zoom {zoom}")))
                },
            )
            .unwrap();
        server
    }

    #[test]
    fn call_tool_runs_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let server = test_server(calls.clone());
        let result = server.call_tool("setZoom", Some(&json!({"zoom": 5}))).unwrap();
        assert_eq!(result.content[0].as_text(), Some("zoom 5"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn invalid_arguments_never_reach_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let server = test_server(calls.clone());

        let err = server.call_tool("setZoom", Some(&json!({"zoom": 22}))).unwrap_err();
        assert!(err.is_validation());
        let err = server.call_tool("setZoom", None).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unknown_tool() {
        let server = test_server(Arc::new(AtomicUsize::new(0)));
        let err = server.call_tool("nope", None).unwrap_err();
        assert!(matches!(err, Error::ToolNotFound(_)));
    }

    #[test]
    fn tool_must_reference_registered_resource() {
        let mut server = Server::new("test", "0.0.1");
        let err = server
            .register_tool(
                ToolDescriptor::new("orphan", ArgumentSchema::new()).with_resource("ui://missing"),
                |_: &ToolArguments| -> Result<CallToolResult> { Ok(CallToolResult::text("")) },
            )
            .unwrap_err();
        assert!(err.is_configuration());
        assert!(server.tools().is_empty());
    }

    #[tokio::test]
    async fn handle_tools_list() {
        let server = test_server(Arc::new(AtomicUsize::new(0)));
        let response = server
            .handle_message(r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#)
            .await
            .unwrap();
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["result"]["tools"][0]["name"], "setZoom");
        assert_eq!(json["result"]["tools"][0]["_meta"]["ui/resourceUri"], URI);
    }

    #[tokio::test]
    async fn handle_validation_error_maps_to_invalid_params() {
        let server = test_server(Arc::new(AtomicUsize::new(0)));
        let response = server
            .handle_message(
                r#"{"jsonrpc":"2.0","id":"a","method":"tools/call","params":{"name":"setZoom","arguments":{"zoom":"x"}}}"#,
            )
            .await
            .unwrap();
        let error = response.error.unwrap();
        assert_eq!(error.code, JsonRpcError::INVALID_PARAMS);
        assert_eq!(error.data.unwrap()[0]["field"], "zoom");
        assert_eq!(response.id, Some(RequestId::from("a")));
    }

    #[tokio::test]
    async fn handle_resource_read_and_missing() {
        let server = test_server(Arc::new(AtomicUsize::new(0)));
        let ok = server
            .handle_message(&format!(
                r#"{{"jsonrpc":"2.0","id":2,"method":"resources/read","params":{{"uri":"{URI}"}}}}"#
            ))
            .await
            .unwrap();
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["result"]["contents"][0]["text"], "<html></html>");
        assert!(json["result"]["contents"][0]["_meta"]["ui"]["csp"]["connectDomains"].is_array());

        let missing = server
            .handle_message(
                r#"{"jsonrpc":"2.0","id":3,"method":"resources/read","params":{"uri":"ui://x"}}"#,
            )
            .await
            .unwrap();
        assert_eq!(missing.error.unwrap().code, JsonRpcError::RESOURCE_NOT_FOUND);
    }

    #[tokio::test]
    async fn initialize_offers_latest_for_unknown_version() {
        let server = test_server(Arc::new(AtomicUsize::new(0)));
        let response = server
            .handle_message(
                r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"1999-01-01"}}"#,
            )
            .await
            .unwrap();
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["result"]["protocolVersion"], LATEST_PROTOCOL_VERSION);

        let response = server
            .handle_message(r#"{"jsonrpc":"2.0","id":2,"method":"initialize"}"#)
            .await
            .unwrap();
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["result"]["protocolVersion"], LATEST_PROTOCOL_VERSION);
    }

    #[tokio::test]
    async fn null_or_fractional_id_is_invalid_request() {
        let server = test_server(Arc::new(AtomicUsize::new(0)));
        for line in [
            r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#,
            r#"{"jsonrpc":"2.0","id":1.5,"method":"ping"}"#,
            r#"{"jsonrpc":"2.0","id":{"a":1},"method":"ping"}"#,
        ] {
            let response = server.handle_message(line).await.unwrap();
            assert_eq!(response.id, None);
            assert_eq!(response.error.unwrap().code, JsonRpcError::INVALID_REQUEST);
        }
    }

    #[tokio::test]
    async fn json_that_is_not_a_request_is_invalid_request() {
        let server = test_server(Arc::new(AtomicUsize::new(0)));
        let response = server.handle_message(r#"{"jsonrpc":"2.0","id":4}"#).await.unwrap();
        assert_eq!(response.error.unwrap().code, JsonRpcError::INVALID_REQUEST);
    }

    #[tokio::test]
    async fn notifications_get_no_response() {
        let server = test_server(Arc::new(AtomicUsize::new(0)));
        let response = server
            .handle_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn serve_answers_in_order_and_survives_bad_input() {
        let server = test_server(Arc::new(AtomicUsize::new(0)));
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2025-03-26","clientInfo":{"name":"host","version":"1"}}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            "not json\n",
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"bogus"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":3,"method":"ping"}"#,
            "\n",
        );

        let mut output = Vec::new();
        server.serve(input.as_bytes(), &mut output).await.unwrap();

        let responses: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(responses.len(), 4);
        assert_eq!(responses[0]["result"]["protocolVersion"], "2025-03-26");
        assert_eq!(responses[0]["result"]["serverInfo"]["name"], "test");
        assert_eq!(responses[1]["error"]["code"], JsonRpcError::PARSE_ERROR);
        assert_eq!(responses[1]["id"], Value::Null);
        assert_eq!(responses[2]["error"]["code"], JsonRpcError::METHOD_NOT_FOUND);
        assert_eq!(responses[3]["id"], 3);
        assert_eq!(responses[3]["result"], json!({}));
    }
}
