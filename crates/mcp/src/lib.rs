//! MCP (Model Context Protocol) server library for app-backed tools.
//!
//! A [`Server`] pairs tools with the resources that render them. Tools
//! declare a typed [`ArgumentSchema`] that is enforced before their handler
//! runs; resources carry a [`policy::SecurityPolicy`] that the host applies
//! when it embeds the document.
//!
//! # Example
//!
//! ```no_run
//! use mcp::{
//!     ArgumentSchema, CallToolResult, FieldKind, FieldSpec, FileAsset, RESOURCE_MIME_TYPE,
//!     ResourceDescriptor, Server, ToolArguments, ToolDescriptor,
//! };
//!
//! # async fn example() -> mcp::Result<()> {
//! let mut server = Server::new("demo", "1.0.0");
//! server.register_resource(
//!     ResourceDescriptor::new("ui://demo/app.html", RESOURCE_MIME_TYPE),
//!     FileAsset::new("dist/app.html"),
//! )?;
//! server.register_tool(
//!     ToolDescriptor::new(
//!         "setZoom",
//!         ArgumentSchema::new().field(FieldSpec::new("zoom", FieldKind::number_in(0.0, 21.0))),
//!     )
//!     .with_resource("ui://demo/app.html"),
//!     |args: &ToolArguments| -> mcp::Result<CallToolResult> {
//!         let zoom = args.require_number("zoom")?;
//!         Ok(CallToolResult::text(format!("zoom {zoom}")))
//!     },
//! )?;
//!
//! let result = server.call_tool("setZoom", Some(&serde_json::json!({ "zoom": 4 })))?;
//! println!("{:?}", result.content);
//!
//! server.serve(tokio::io::BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod protocol;
mod resources;
mod schema;
mod server;
mod tools;

pub use error::{Error, Result};
pub use protocol::{
    CallToolParams, CallToolResult, Implementation, InitializeParams, InitializeResult,
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, LATEST_PROTOCOL_VERSION, ListResourcesResult,
    ListToolsResult, RESOURCE_MIME_TYPE, RESOURCE_URI_META_KEY, ReadResourceParams,
    ReadResourceResult, RequestId, Resource, ResourceContents, SUPPORTED_PROTOCOL_VERSIONS,
    ServerCapabilities, Tool, ToolContent, negotiate_protocol_version,
};
pub use resources::{
    FileAsset, ResourceDescriptor, ResourceProducer, ResourceRegistry, StaticDocument,
};
pub use schema::{
    ArgumentSchema, CompiledSchema, FieldError, FieldKind, FieldSpec, SchemaError, ToolArguments,
    ValidationError,
};
pub use server::{MAX_MESSAGE_SIZE, Server};
pub use tools::{RegisteredTool, ToolDescriptor, ToolHandler, ToolRegistrar};
