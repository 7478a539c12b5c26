//! Unified error type.

use std::fmt;

/// The level of the route tree a scope operator works on.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ScopeLevel {
    Bundle,
    Controller,
    Action,
}

impl ScopeLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bundle     => "bundle",
            Self::Controller => "controller",
            Self::Action     => "action",
        }
    }
}

impl fmt::Display for ScopeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The error type returned by gatekeep's fallible operations.
///
/// Every variant is a configuration mistake surfaced to the caller. Whether a
/// bad configuration is fatal at startup is the application's call, not ours.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// A scope operator named a bundle, controller or action that was never
    /// registered. `within` is the dotted parent path (empty for bundles).
    #[error("unknown {level} `{name}`{}", fmt_within(.within))]
    UnknownScope {
        level: ScopeLevel,
        name: String,
        within: String,
    },

    /// A controller- or action-level operator was issued without the
    /// enclosing bundle (or controller) in scope.
    #[error("no {0} in scope")]
    MissingScope(ScopeLevel),

    /// A middleware was selected before it was registered.
    #[error("middleware `{0}` not registered")]
    UnknownMiddleware(String),

    #[error("middleware `{0}` already registered")]
    DuplicateMiddleware(String),

    /// Names must be non-empty and may not contain `.`.
    #[error("invalid name `{0}`")]
    InvalidName(String),

    /// Input was not of the form `bundle.controller.action`.
    #[error("invalid route key `{0}`, expected `bundle.controller.action`")]
    InvalidRouteKey(String),

    /// The instantiation layer could not produce the named middleware.
    #[error("middleware `{0}` could not be instantiated")]
    Uninstantiable(String),
}

fn fmt_within(within: &str) -> String {
    if within.is_empty() {
        String::new()
    } else {
        format!(" in `{within}`")
    }
}
