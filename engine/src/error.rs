//! Error types for dialog sessions.
//!
//! `DialogError` is what hosts see. It wraps the two collaborator error
//! types: `SurfaceError` from the presentation surface and `ResolveError`
//! from the location service.
//!
//! Updates made before `show` or after `close` are not errors; they are
//! recorded locally and never reach a surface.

use std::io;

use thiserror::Error;

use crate::model::LocationRole;

/// Errors reported by a presentation surface or its factory.
#[derive(Debug, Error)]
pub enum SurfaceError {
    /// The surface could not be instantiated (missing OS component, COM failure)
    #[error("progress dialog component is unavailable: {reason}")]
    Unavailable { reason: String },

    /// The surface rejected a command
    #[error("progress dialog rejected {command}: {reason}")]
    CommandFailed {
        command: &'static str,
        reason: String,
    },
}

/// Errors from resolving a path or URL string into a location.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Nothing exists at the given path
    #[error("location not found: {input}")]
    NotFound {
        input: String,
        #[source]
        source: io::Error,
    },

    /// Something exists but could not be inspected (permissions, bad name)
    #[error("location not accessible: {input}")]
    Inaccessible {
        input: String,
        #[source]
        source: io::Error,
    },

    /// Looked like a URL but did not parse
    #[error("invalid URL: {input}")]
    InvalidUrl {
        input: String,
        #[source]
        source: url::ParseError,
    },
}

impl ResolveError {
    /// Only not-found failures are retried against the working context.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ResolveError::NotFound { .. })
    }

    pub fn input(&self) -> &str {
        match self {
            ResolveError::NotFound { input, .. }
            | ResolveError::Inaccessible { input, .. }
            | ResolveError::InvalidUrl { input, .. } => input,
        }
    }
}

/// Errors returned by `DialogSession` operations.
#[derive(Debug, Error)]
pub enum DialogError {
    /// `show` could not create the presentation surface. Fatal for this session.
    #[error("failed to initialize progress dialog")]
    SurfaceUnavailable(#[source] SurfaceError),

    /// A running surface rejected a command; the session is now `Errored`
    #[error("progress dialog command failed")]
    Surface(#[source] SurfaceError),

    /// A location string could not be resolved
    #[error("{role} location does not exist: {input}")]
    Location {
        role: LocationRole,
        input: String,
        #[source]
        source: ResolveError,
    },

    /// `show` was called after `close`
    #[error("progress dialog has already been closed")]
    Closed,

    /// Configuration could not be loaded
    #[error("invalid dialog configuration: {message}")]
    Config { message: String },
}

/// An operation name that matches no `OperationKind`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown operation '{name}'")]
pub struct UnknownOperation {
    pub name: String,
}

impl DialogError {
    /// The location role that failed, if this is a resolution error.
    pub fn location_role(&self) -> Option<LocationRole> {
        match self {
            DialogError::Location { role, .. } => Some(*role),
            _ => None,
        }
    }
}
