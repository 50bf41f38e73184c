// error.rs — Error types for tool adapters.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("tool '{tool}' has no action '{action}'")]
    UnknownAction { tool: String, action: String },

    #[error("missing required param '{0}'")]
    MissingParam(String),

    #[error("path '{path}' escapes the adapter's scoped root")]
    PathTraversal { path: String },

    #[error("io error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
