use std::fmt;

/// CORS configuration error
///
/// Returned when a [`CorsConfig`](super::CorsConfig) is validated or compiled
/// and the configuration is invalid. A policy that fails here can never be
/// installed as middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsConfigError {
    /// `allow_all_origins` was combined with explicit origins or an origin validator
    ConflictingAllowAll,
    /// No origin can ever be accepted
    ///
    /// None of `allow_all_origins`, `allow_origins` or an origin validator is set.
    AllOriginsDisabled,
    /// A literal origin does not start with any enabled scheme
    MissingScheme {
        /// The offending origin
        origin: String,
        /// Schemes enabled by the configuration (e.g. `http://`, `https://`)
        allowed: Vec<&'static str>,
    },
    /// A wildcard origin pattern contains more than one `*`
    MultipleWildcards {
        /// The offending pattern
        origin: String,
    },
}

impl fmt::Display for CorsConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorsConfigError::ConflictingAllowAll => {
                write!(
                    f,
                    "CORS configuration error: all origins are allowed. \
                    allow_origins and an origin validator are not needed"
                )
            }
            CorsConfigError::AllOriginsDisabled => {
                write!(
                    f,
                    "CORS configuration error: all origins disabled. \
                    Set allow_all_origins, allow_origins or an origin validator"
                )
            }
            CorsConfigError::MissingScheme { origin, allowed } => {
                write!(
                    f,
                    "CORS configuration error: bad origin '{}'. \
                    Origins must contain '*' or include {}",
                    origin,
                    allowed.join(",")
                )
            }
            CorsConfigError::MultipleWildcards { origin } => {
                write!(
                    f,
                    "CORS configuration error: bad origin '{}'. Only one * is allowed",
                    origin
                )
            }
        }
    }
}

impl std::error::Error for CorsConfigError {}
