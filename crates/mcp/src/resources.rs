//! Static documents that bootstrap app surfaces.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use policy::SecurityPolicy;
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::protocol::{ReadResourceResult, Resource, ResourceContents};

/// Produces a resource's document on demand.
///
/// Called once per read. Implementations must not depend on registry state
/// and may run concurrently for separate reads.
#[async_trait]
pub trait ResourceProducer: Send + Sync {
    async fn produce(&self) -> std::io::Result<String>;
}

/// Reads the document from disk on every fetch.
#[derive(Debug, Clone)]
pub struct FileAsset {
    path: PathBuf,
}

impl FileAsset {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ResourceProducer for FileAsset {
    async fn produce(&self) -> std::io::Result<String> {
        tokio::fs::read_to_string(&self.path).await
    }
}

/// A document held in memory.
#[derive(Debug, Clone)]
pub struct StaticDocument(Arc<str>);

impl StaticDocument {
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Self(text.into())
    }
}

#[async_trait]
impl ResourceProducer for StaticDocument {
    async fn produce(&self) -> std::io::Result<String> {
        Ok(self.0.to_string())
    }
}

/// Identity and rendering policy of a registered resource.
#[derive(Debug, Clone)]
pub struct ResourceDescriptor {
    pub uri: String,
    pub name: String,
    pub mime_type: String,
    pub description: Option<String>,
    pub policy: SecurityPolicy,
}

impl ResourceDescriptor {
    pub fn new(uri: impl Into<String>, mime_type: impl Into<String>) -> Self {
        let uri = uri.into();
        Self {
            name: uri.clone(),
            uri,
            mime_type: mime_type.into(),
            description: None,
            policy: SecurityPolicy::default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_policy(mut self, policy: SecurityPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Metadata block attached to every read: `{"ui": {"csp": ...}}`.
    pub fn meta(&self) -> Map<String, Value> {
        let mut meta = Map::new();
        meta.insert("ui".to_string(), json!({ "csp": self.policy }));
        meta
    }

    fn to_resource(&self) -> Resource {
        Resource {
            uri: self.uri.clone(),
            name: self.name.clone(),
            mime_type: self.mime_type.clone(),
            description: self.description.clone(),
        }
    }
}

struct Entry {
    descriptor: ResourceDescriptor,
    producer: Arc<dyn ResourceProducer>,
}

/// Resource table for one server instance.
#[derive(Default)]
pub struct ResourceRegistry {
    entries: HashMap<String, Entry>,
    order: Vec<String>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource. The producer is not called until the first read.
    pub fn register(
        &mut self,
        descriptor: ResourceDescriptor,
        producer: impl ResourceProducer + 'static,
    ) -> Result<()> {
        if self.entries.contains_key(&descriptor.uri) {
            return Err(Error::DuplicateResource(descriptor.uri));
        }

        let uri = descriptor.uri.clone();
        self.entries.insert(
            uri.clone(),
            Entry {
                descriptor,
                producer: Arc::new(producer),
            },
        );
        self.order.push(uri);
        Ok(())
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.entries.contains_key(uri)
    }

    /// Resources in registration order.
    pub fn list(&self) -> Vec<Resource> {
        self.order
            .iter()
            .filter_map(|uri| self.entries.get(uri))
            .map(|entry| entry.descriptor.to_resource())
            .collect()
    }

    /// Fetch a resource's document. Read failures are returned as-is, never retried.
    pub async fn read(&self, uri: &str) -> Result<ReadResourceResult> {
        let entry = self
            .entries
            .get(uri)
            .ok_or_else(|| Error::ResourceNotFound(uri.to_string()))?;

        let text = entry.producer.produce().await.map_err(|source| {
            warn!(uri, error = %source, "resource read failed");
            Error::ResourceRead {
                uri: uri.to_string(),
                source,
            }
        })?;
        debug!(uri, bytes = text.len(), "resource read");

        let descriptor = &entry.descriptor;
        Ok(ReadResourceResult {
            contents: vec![ResourceContents {
                uri: descriptor.uri.clone(),
                mime_type: descriptor.mime_type.clone(),
                text,
                meta: Some(descriptor.meta()),
            }],
        })
    }
}

impl std::fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceRegistry")
            .field("uris", &self.order)
            .finish()
    }
}
