//! Tool declarations and the per-server tool table.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, json};

use crate::error::{Error, Result};
use crate::protocol::{CallToolResult, RESOURCE_URI_META_KEY, Tool};
use crate::schema::{ArgumentSchema, CompiledSchema, ToolArguments};

/// Everything a client needs to know about a tool before calling it.
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub schema: ArgumentSchema,
    /// Uri of the resource whose surface renders this tool's calls.
    pub resource_uri: Option<String>,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, schema: ArgumentSchema) -> Self {
        Self {
            name: name.into(),
            title: None,
            description: None,
            schema,
            resource_uri: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Render calls of this tool into the surface served at `uri`.
    pub fn with_resource(mut self, uri: impl Into<String>) -> Self {
        self.resource_uri = Some(uri.into());
        self
    }

    /// Wire form for tools/list.
    ///
    /// The resource association is published under both the flat
    /// `ui/resourceUri` key and the nested `ui.resourceUri` form.
    pub fn to_tool(&self) -> Tool {
        let meta = self.resource_uri.as_ref().map(|uri| {
            let mut meta = Map::new();
            meta.insert(RESOURCE_URI_META_KEY.to_string(), json!(uri));
            meta.insert("ui".to_string(), json!({ "resourceUri": uri }));
            meta
        });

        Tool {
            name: self.name.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            input_schema: self.schema.to_json_schema(),
            meta,
        }
    }
}

/// The effect a tool runs once its arguments validate.
pub trait ToolHandler: Send + Sync {
    fn call(&self, arguments: &ToolArguments) -> Result<CallToolResult>;
}

impl<F> ToolHandler for F
where
    F: Fn(&ToolArguments) -> Result<CallToolResult> + Send + Sync,
{
    fn call(&self, arguments: &ToolArguments) -> Result<CallToolResult> {
        self(arguments)
    }
}

/// A tool with its handler and compiled argument validator.
#[derive(Clone)]
pub struct RegisteredTool {
    pub descriptor: ToolDescriptor,
    pub validator: Arc<CompiledSchema>,
    pub handler: Arc<dyn ToolHandler>,
}

impl std::fmt::Debug for RegisteredTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredTool")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Tool table for one server instance.
#[derive(Debug, Default)]
pub struct ToolRegistrar {
    tools: HashMap<String, RegisteredTool>,
    order: Vec<String>,
}

impl ToolRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a tool callable. Names are unique per registrar.
    ///
    /// The argument schema is compiled here, once per tool.
    pub fn register(
        &mut self,
        descriptor: ToolDescriptor,
        handler: impl ToolHandler + 'static,
    ) -> Result<()> {
        if self.tools.contains_key(&descriptor.name) {
            return Err(Error::DuplicateTool(descriptor.name));
        }

        let validator = descriptor
            .schema
            .compile()
            .map_err(|source| Error::InvalidSchema {
                tool: descriptor.name.clone(),
                source,
            })?;

        let name = descriptor.name.clone();
        self.tools.insert(
            name.clone(),
            RegisteredTool {
                descriptor,
                validator: Arc::new(validator),
                handler: Arc::new(handler),
            },
        );
        self.order.push(name);
        Ok(())
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&RegisteredTool> {
        self.tools.get(name)
    }

    /// Tool definitions in registration order.
    pub fn list(&self) -> Vec<Tool> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.descriptor.to_tool())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
