//! Unified error type.

use thiserror::Error;

/// The error type returned by ela's fallible operations.
///
/// Inside the request pipeline, `RouteNotFound` and `RuntimeFault` never
/// reach the caller: they are rendered as 404 / 500 responses. They surface
/// as values only from the injector, the static collaborator, and startup
/// verification.
#[derive(Debug, Error)]
pub enum Error {
    /// No value of the requested parameter type is in the injection scope.
    #[error("unresolved dependency: no value of type `{type_name}` in scope")]
    UnresolvedDependency { type_name: &'static str },

    #[error("no route or static file for `{path}`")]
    RouteNotFound { path: String },

    /// A controller panicked or returned an error.
    #[error("{message}")]
    RuntimeFault { message: String },

    #[error("config: section `{section}` does not exist")]
    MissingSection { section: String },

    #[error("config: key `{key}` in section `{section}` does not exist")]
    MissingKey { section: String, key: String },

    #[error("config: `{section}.{key}` is not of type {expected}")]
    TypeMismatch {
        section: String,
        key: String,
        expected: &'static str,
    },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn fault(message: impl Into<String>) -> Self {
        Self::RuntimeFault { message: message.into() }
    }
}
