use std::{future::Future, pin::Pin, sync::Arc};

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value as J;

use crate::core::error::RpcError;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub uri: String,
    pub mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Resource {
    pub fn new(uri: impl Into<String>, mime_type: impl Into<String>, description: Option<&str>) -> Self {
        Self {
            uri: uri.into(),
            mime_type: mime_type.into(),
            description: description.map(str::to_owned),
        }
    }
}

/// What a `resources/read` returns. `content` is generated per read.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceBody {
    pub uri: String,
    pub mime_type: String,
    pub content: J,
    pub description: Option<String>,
    pub generated_at: String,
}

pub type ContentFuture = Pin<Box<dyn Future<Output = J> + Send>>;
pub type ContentProvider = Arc<dyn Fn() -> ContentFuture + Send + Sync>;

pub fn provider<F, Fut>(f: F) -> ContentProvider
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = J> + Send + 'static,
{
    Arc::new(move || Box::pin(f()))
}

struct Entry {
    resource: Resource,
    content: ContentProvider,
}

#[derive(Default)]
pub struct ResourceRegistry {
    by_uri: IndexMap<String, Entry>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert by uri. `content` produces the body on every read; a replaced
    /// entry keeps its list position.
    pub fn add(&mut self, resource: Resource, content: ContentProvider) {
        tracing::info!(uri = %resource.uri, "registered resource");
        self.by_uri.insert(resource.uri.clone(), Entry { resource, content });
    }

    pub fn list(&self) -> Vec<Resource> {
        self.by_uri.values().map(|e| e.resource.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.by_uri.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_uri.is_empty()
    }

    pub async fn read(&self, uri: &str) -> Result<ResourceBody, RpcError> {
        let entry = self
            .by_uri
            .get(uri)
            .ok_or_else(|| RpcError::UnknownResource(uri.to_owned()))?;
        let now = chrono::Utc::now();
        let content = (entry.content)().await;
        Ok(ResourceBody {
            uri: entry.resource.uri.clone(),
            mime_type: entry.resource.mime_type.clone(),
            content,
            description: entry.resource.description.clone(),
            generated_at: now.to_rfc3339(),
        })
    }
}
