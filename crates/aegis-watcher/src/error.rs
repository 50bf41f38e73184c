// error.rs — Error types for the policy watcher.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WatcherError {
    #[error("failed to start filesystem watcher on '{path}': {source}")]
    StartFailed {
        path: String,
        #[source]
        source: notify::Error,
    },
}
