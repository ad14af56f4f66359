use thiserror::Error;

/// Reasons a route pattern cannot be added to a tree.
///
/// Each structural rule has its own variant so callers can tell which one a
/// registration broke.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InsertError {
    /// The pattern is empty or does not start with `/`.
    #[error("route `{route}` must start with `/`")]
    MissingLeadingSlash { route: String },

    /// A `:` or `*` marker is not followed by a name.
    #[error("route `{route}` has a parameter or catch-all without a name")]
    UnnamedSegment { route: String },

    /// Two markers inside the same path segment, e.g. `/:a:b`.
    #[error("route `{route}` has more than one parameter or catch-all in one path segment")]
    MultipleDynamicInSegment { route: String },

    /// A `*name` followed by more of the pattern.
    #[error("route `{route}`: a catch-all must be the last segment")]
    CatchAllNotLast { route: String },

    /// A `*name` that does not directly follow `/`.
    #[error("route `{route}`: a catch-all must directly follow `/`")]
    CatchAllWithoutSlash { route: String },

    /// The pattern cannot share its position with an already registered one.
    #[error("route `{route}` conflicts with existing route segment `{existing}`")]
    Conflict { route: String, existing: String },

    /// The exact pattern is already bound.
    #[error("route `{route}` is already registered")]
    Duplicate { route: String },
}

impl InsertError {
    /// The pattern whose registration failed.
    pub fn route(&self) -> &str {
        match self {
            Self::MissingLeadingSlash { route }
            | Self::UnnamedSegment { route }
            | Self::MultipleDynamicInSegment { route }
            | Self::CatchAllNotLast { route }
            | Self::CatchAllWithoutSlash { route }
            | Self::Conflict { route, .. }
            | Self::Duplicate { route } => route,
        }
    }
}

/// Errors raised while registering a route on a [`Router`](crate::Router).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error(transparent)]
    Insert(#[from] InsertError),

    #[error("invalid HTTP method `{0}`")]
    InvalidMethod(String),

    #[error("invalid host pattern `{0}`")]
    InvalidHost(String),
}
