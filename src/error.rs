use crate::node::NodeId;
use thiserror::Error;

/// Failure reported by a [`TreeSource`](crate::source::TreeSource) operation.
///
/// The store is transport-agnostic, so the payload is whatever message the
/// host's fetch layer produced. Equality is on the message, which keeps
/// scripted sources trivial to assert against in tests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("fetch failed: {message}")]
pub struct FetchError {
    message: String,
}

impl FetchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors surfaced across the store boundary.
///
/// Fetch failures leave previously loaded state intact; the caller decides
/// whether to retry on the next user action. Superseded responses and
/// rejected selections never become errors, they are absorbed inside the
/// store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A backend fetch failed during initialize, expand, refresh or search.
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// An operation addressed a node the tree does not contain.
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),
}
