//! Error Types
//!
//! Every fallible operation in the runtime returns [`Result`]. Setup-scope
//! misuse, context misses and missing async boundaries are reported at the
//! call site; nothing is retried.

use thiserror::Error;

/// Errors raised by the Trellis runtime.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A setup-only operation was invoked with no active component.
    #[error("`{operation}` can only be used during component setup")]
    OutsideSetup {
        /// The operation that was attempted.
        operation: &'static str,
    },

    /// A context lookup walked every ancestor without finding a value.
    #[error("could not find context `{context}` in parent components")]
    ContextNotFound {
        /// Name of the context type that was requested.
        context: &'static str,
    },

    /// An async value was declared with no boundary on the ancestor chain.
    #[error("no suspense boundary found for async value")]
    NoBoundary,

    /// A reactive state field was not captured at construction.
    #[error("unknown reactive field `{field}`")]
    UnknownField {
        /// The requested field name.
        field: String,
    },

    /// A typed read found a different value variant.
    #[error("field `{field}` does not hold a {expected} value")]
    TypeMismatch {
        /// The requested field name.
        field: String,
        /// The variant the caller asked for.
        expected: &'static str,
    },

    /// Runtime configuration could not be parsed.
    #[error("invalid runtime configuration: {0}")]
    InvalidConfig(String),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn outside_setup(operation: &'static str) -> Self {
        Error::OutsideSetup { operation }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_operation() {
        let err = Error::outside_setup("on_mount");
        assert_eq!(
            err.to_string(),
            "`on_mount` can only be used during component setup"
        );
    }

    #[test]
    fn context_miss_is_distinct_from_setup_misuse() {
        let miss = Error::ContextNotFound { context: "Theme" };
        assert_ne!(miss, Error::outside_setup("context get"));
        assert!(miss.to_string().contains("Theme"));
    }
}
