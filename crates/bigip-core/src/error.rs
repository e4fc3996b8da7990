use thiserror::Error;

/// Unified error type for the topology layer.
///
/// Soft-fail conditions (missing data group, malformed record, orphaned
/// pool reference) are logged and skipped rather than raised -- only
/// failures that would make a partial result misleading surface here.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An iRule body could not be parsed into switch blocks. Fatal to
    /// that rule's extraction only; unrelated categories keep going.
    #[error("malformed rule text at line: {line:?}")]
    MalformedRule { line: String },

    /// Error from the API layer (auth, request, decoding).
    #[error(transparent)]
    Api(#[from] bigip_api::Error),
}
