//! Error types for Gati
//!
//! Errors are split by how a caller should react to them:
//!
//! - [`ConfigError`]: a malformed path, tolerance or registration. Raised
//!   eagerly at build time and never from inside the tick loop.
//! - [`LookupError`]: a named trajectory was not found. Recoverable; carries
//!   the closest registered names so the caller can retry.
//! - [`GatiError::Precondition`]: a required value was missing at a call site.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, GatiError>;

/// Gati error type
#[derive(Error, Debug)]
pub enum GatiError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Lookup error: {0}")]
    Lookup(#[from] LookupError),

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl GatiError {
    /// Short error code for logging.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.code(),
            Self::Lookup(_) => "LOOKUP",
            Self::Precondition(_) => "PRECONDITION",
            Self::Io(_) => "IO",
            Self::Parse(_) => "PARSE",
        }
    }

    /// Only lookups can be retried; everything else is a programming or
    /// configuration mistake.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Lookup(_))
    }

    /// Suggestions attached to a lookup failure, empty otherwise.
    pub fn suggestions(&self) -> &[String] {
        match self {
            Self::Lookup(e) => &e.suggestions,
            _ => &[],
        }
    }
}

impl From<toml::de::Error> for GatiError {
    fn from(e: toml::de::Error) -> Self {
        GatiError::Parse(e.to_string())
    }
}

impl From<toml::ser::Error> for GatiError {
    fn from(e: toml::ser::Error) -> Self {
        GatiError::Parse(e.to_string())
    }
}

/// Build-time configuration errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Speed {0} is outside [0, 1]")]
    InvalidSpeed(f64),

    #[error("Tolerance must be positive, got {0}")]
    NonPositiveTolerance(f64),

    #[error("Angle tolerance was not set")]
    MissingAngleTolerance,

    #[error("Non-finite value for {0}")]
    NonFinite(&'static str),

    #[error("Need at least {required} control points, got {count}")]
    TooFewControlPoints {
        /// Minimum number of points
        required: usize,
        /// Number of points supplied
        count: usize,
    },

    #[error("Control points are not monotonic along any axis (first reversal at index {index})")]
    NonMonotonic {
        /// Index of the first point that reverses direction
        index: usize,
    },

    #[error("Control point {index} duplicates its predecessor")]
    DuplicateControlPoint {
        /// Index of the duplicated point
        index: usize,
    },

    #[error("Step must be finite and non-zero, got {0}")]
    InvalidStep(f64),

    #[error("Invalid duration bounds: min {min_ms}ms, max {max_ms}ms")]
    InvalidDuration {
        /// Minimum duration in milliseconds
        min_ms: u64,
        /// Maximum duration in milliseconds
        max_ms: u64,
    },

    #[error("Name '{0}' is already registered")]
    DuplicateName(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },
}

impl ConfigError {
    /// Short error code for logging.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidSpeed(_) => "INVALID_SPEED",
            Self::NonPositiveTolerance(_) => "NON_POSITIVE_TOLERANCE",
            Self::MissingAngleTolerance => "MISSING_ANGLE_TOLERANCE",
            Self::NonFinite(_) => "NON_FINITE",
            Self::TooFewControlPoints { .. } => "TOO_FEW_CONTROL_POINTS",
            Self::NonMonotonic { .. } => "NON_MONOTONIC",
            Self::DuplicateControlPoint { .. } => "DUPLICATE_CONTROL_POINT",
            Self::InvalidStep(_) => "INVALID_STEP",
            Self::InvalidDuration { .. } => "INVALID_DURATION",
            Self::DuplicateName(_) => "DUPLICATE_NAME",
            Self::MissingField(_) => "MISSING_FIELD",
            Self::InvalidValue { .. } => "INVALID_VALUE",
        }
    }

    /// Configuration errors are never recoverable at runtime.
    pub fn is_recoverable(&self) -> bool {
        false
    }
}

/// A trajectory name was not found in the registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("No trajectory named '{name}'{}", format_suggestions(.suggestions))]
pub struct LookupError {
    /// The name that was requested
    pub name: String,
    /// Registered names close to the requested one, best match first
    pub suggestions: Vec<String>,
}

impl LookupError {
    /// Create a lookup error with suggestions.
    pub fn new(name: impl Into<String>, suggestions: Vec<String>) -> Self {
        Self {
            name: name.into(),
            suggestions,
        }
    }
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(" (did you mean: {}?)", suggestions.join(", "))
    }
}

/// Ensure a value is finite, naming it in the error.
#[inline]
pub(crate) fn ensure_finite(value: f64, what: &'static str) -> std::result::Result<f64, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::NonFinite(what))
    }
}
