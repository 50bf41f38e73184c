// error.rs — Error types for the policy subsystem.

use thiserror::Error;

/// Errors that can occur while scanning a policy directory.
///
/// Per-file parse/schema problems are not errors — they become
/// `LoadWarning`s and the file is dropped (spec §4.1, §7). This type is only
/// for failures that prevent the directory itself from being read at all.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The policy directory could not be listed.
    #[error("cannot read policy directory '{path}': {source}")]
    DirectoryUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
