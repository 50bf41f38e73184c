// files.rs — MockFilesAdapter: `files/read` and `files/write` scoped to a
// root directory. Rejects path traversal the same way the fs connector does.

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::{AdapterError, ToolAdapter};

pub struct MockFilesAdapter {
    root: PathBuf,
}

impl MockFilesAdapter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, relative_path: &str) -> Result<PathBuf, AdapterError> {
        if relative_path.contains("..") {
            return Err(AdapterError::PathTraversal {
                path: relative_path.to_string(),
            });
        }
        Ok(self.root.join(relative_path))
    }
}

#[async_trait]
impl ToolAdapter for MockFilesAdapter {
    async fn invoke(&self, tool: &str, action: &str, params: &Value) -> Result<Value, AdapterError> {
        if tool != "files" {
            return Err(AdapterError::UnknownAction {
                tool: tool.to_string(),
                action: action.to_string(),
            });
        }

        let path = params
            .get("path")
            .and_then(Value::as_str)
            .ok_or_else(|| AdapterError::MissingParam("path".to_string()))?;
        let target = self.resolve(path)?;

        match action {
            "read" => {
                let content = tokio::fs::read_to_string(&target).await.map_err(|source| AdapterError::Io {
                    path: target.display().to_string(),
                    source,
                })?;
                Ok(json!({"path": path, "content": content}))
            }
            "write" => {
                let content = params
                    .get("content")
                    .and_then(Value::as_str)
                    .ok_or_else(|| AdapterError::MissingParam("content".to_string()))?;
                if let Some(parent) = target.parent() {
                    tokio::fs::create_dir_all(parent).await.map_err(|source| AdapterError::Io {
                        path: parent.display().to_string(),
                        source,
                    })?;
                }
                tokio::fs::write(&target, content).await.map_err(|source| AdapterError::Io {
                    path: target.display().to_string(),
                    source,
                })?;
                Ok(json!({"path": path, "bytes_written": content.len()}))
            }
            other => Err(AdapterError::UnknownAction {
                tool: tool.to_string(),
                action: other.to_string(),
            }),
        }
    }
}
