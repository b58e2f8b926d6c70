//! Error types and result handling for property evaluation and shrinking.

use std::any::Any;
use std::fmt;

use crate::config::ConfigError;
use crate::report::{TestFailure, TestSuccess};

/// Everything that can go wrong while evaluating a property.
///
/// Predicate failures are values of this type too: the walker treats every variant the same
/// way ("this candidate fails"), only the report distinguishes them by [`PropertyError::kind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyError {
    /// A plain assertion failed, including panics raised by `assert!` and friends
    AssertionFailed { message: String },

    /// Property test failed with a specific message and optional context
    PropertyFailed {
        message: String,
        context: Option<String>,
        iteration: Option<usize>,
    },

    /// An arbitrary error value returned by the predicate
    Custom { kind: String, message: String },

    /// Generation of test data failed
    GenerationFailed {
        message: String,
        context: Option<String>,
    },

    /// Configuration error
    ConfigError {
        message: String,
        field: Option<String>,
    },

    /// The shrunk cause was requested but none of the argument trees could be shrunk
    MissingShrunkCause { arguments: usize },
}

impl fmt::Display for PropertyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyError::AssertionFailed { message } => write!(f, "{}", message),
            PropertyError::PropertyFailed {
                message,
                context,
                iteration,
            } => {
                write!(f, "Property failed: {}", message)?;
                if let Some(ctx) = context {
                    write!(f, " (context: {})", ctx)?;
                }
                if let Some(iter) = iteration {
                    write!(f, " (iteration: {})", iter)?;
                }
                Ok(())
            }
            PropertyError::Custom { kind, message } => write!(f, "{}: {}", kind, message),
            PropertyError::GenerationFailed { message, context } => {
                write!(f, "Generation failed: {}", message)?;
                if let Some(ctx) = context {
                    write!(f, " (context: {})", ctx)?;
                }
                Ok(())
            }
            PropertyError::ConfigError { message, field } => {
                write!(f, "Configuration error: {}", message)?;
                if let Some(field_name) = field {
                    write!(f, " (field: {})", field_name)?;
                }
                Ok(())
            }
            PropertyError::MissingShrunkCause { arguments } => write!(
                f,
                "Shrunk exception requested but none of the {} argument(s) could be shrunk",
                arguments
            ),
        }
    }
}

impl std::error::Error for PropertyError {}

impl PropertyError {
    /// Kind name reported when the error is the cause of a failure.
    pub const ASSERTION_KIND: &'static str = "AssertionFailed";

    /// Create an assertion failure
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Create a simple property failed error
    pub fn property_failed(message: impl Into<String>) -> Self {
        Self::PropertyFailed {
            message: message.into(),
            context: None,
            iteration: None,
        }
    }

    /// Create a property failed error with context
    pub fn property_failed_with_context(
        message: impl Into<String>,
        context: Option<impl Into<String>>,
        iteration: Option<usize>,
    ) -> Self {
        Self::PropertyFailed {
            message: message.into(),
            context: context.map(|c| c.into()),
            iteration,
        }
    }

    /// Wrap any error value, keeping its type name as the kind
    pub fn from_error<E>(error: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        Self::Custom {
            kind: short_type_name(std::any::type_name::<E>()).to_string(),
            message: error.to_string(),
        }
    }

    /// Create a generation failed error with context
    pub fn generation_failed_with_context(
        message: impl Into<String>,
        context: Option<impl Into<String>>,
    ) -> Self {
        Self::GenerationFailed {
            message: message.into(),
            context: context.map(|c| c.into()),
        }
    }

    /// Create a configuration error with field information
    pub fn config_error_with_field(
        message: impl Into<String>,
        field: Option<impl Into<String>>,
    ) -> Self {
        Self::ConfigError {
            message: message.into(),
            field: field.map(|f| f.into()),
        }
    }

    /// Convert the payload of a caught panic into an assertion failure
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(message) = payload.downcast_ref::<&str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "<panicked>".to_string()
        };
        Self::AssertionFailed { message }
    }

    /// The name of this error's kind
    pub fn kind(&self) -> &str {
        match self {
            PropertyError::AssertionFailed { .. } => Self::ASSERTION_KIND,
            PropertyError::PropertyFailed { .. } => "PropertyFailed",
            PropertyError::Custom { kind, .. } => kind,
            PropertyError::GenerationFailed { .. } => "GenerationFailed",
            PropertyError::ConfigError { .. } => "ConfigError",
            PropertyError::MissingShrunkCause { .. } => "MissingShrunkCause",
        }
    }

    /// Whether this is the generic assertion kind
    pub fn is_assertion(&self) -> bool {
        matches!(self, PropertyError::AssertionFailed { .. })
    }

    /// The message without the kind prefix
    pub fn message(&self) -> String {
        match self {
            PropertyError::AssertionFailed { message }
            | PropertyError::Custom { message, .. } => message.clone(),
            PropertyError::PropertyFailed {
                message,
                context,
                iteration,
            } => {
                let mut text = message.clone();
                if let Some(ctx) = context {
                    text.push_str(&format!(" (context: {})", ctx));
                }
                if let Some(iter) = iteration {
                    text.push_str(&format!(" (iteration: {})", iter));
                }
                text
            }
            other => other.to_string(),
        }
    }
}

impl From<&str> for PropertyError {
    fn from(message: &str) -> Self {
        Self::property_failed(message)
    }
}

impl From<String> for PropertyError {
    fn from(message: String) -> Self {
        Self::property_failed(message)
    }
}

impl From<ConfigError> for PropertyError {
    fn from(error: ConfigError) -> Self {
        Self::ConfigError {
            message: error.to_string(),
            field: Some(error.field().to_string()),
        }
    }
}

fn short_type_name(name: &str) -> &str {
    let base = name.split('<').next().unwrap_or(name);
    base.rsplit("::").next().unwrap_or(base)
}

/// Error returned by a property check.
///
/// `Failed` carries the shrunk counter-example; `Error` means the check could not be carried
/// out at all, for example because the configuration was invalid.
#[derive(Debug)]
pub enum CheckError<A> {
    /// The property does not hold.
    Failed(TestFailure<A>),

    /// The check itself went wrong.
    Error(PropertyError),
}

impl<A> CheckError<A> {
    /// Unwrap the `Failed` payload, panicking otherwise.
    #[track_caller]
    pub fn unwrap_failed(self) -> TestFailure<A> {
        match self {
            CheckError::Failed(failure) => failure,
            CheckError::Error(e) => panic!("CheckError::unwrap_failed called on error: {}", e),
        }
    }

    /// Unwrap the `Error` payload, panicking otherwise.
    #[track_caller]
    pub fn unwrap_error(self) -> PropertyError {
        match self {
            CheckError::Error(e) => e,
            CheckError::Failed(_) => panic!("CheckError::unwrap_error called on failed check"),
        }
    }

    /// Whether the property was falsified
    pub fn is_failed(&self) -> bool {
        matches!(self, CheckError::Failed(_))
    }
}

impl<A> From<PropertyError> for CheckError<A> {
    fn from(error: PropertyError) -> Self {
        Self::Error(error)
    }
}

impl<A> From<TestFailure<A>> for CheckError<A> {
    fn from(failure: TestFailure<A>) -> Self {
        Self::Failed(failure)
    }
}

impl<A> fmt::Display for CheckError<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckError::Failed(failure) => write!(f, "{}", failure),
            CheckError::Error(error) => write!(f, "{}", error),
        }
    }
}

impl<A: fmt::Debug> std::error::Error for CheckError<A> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CheckError::Failed(failure) => Some(&failure.cause),
            CheckError::Error(error) => Some(error),
        }
    }
}

/// Result of a property check
pub type PropertyResult<A> = Result<TestSuccess, CheckError<A>>;
