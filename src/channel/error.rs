//! Channel Error Types

use crate::core::error_handling::ContextualError;
use std::any::Any;
use std::borrow::Cow;
use std::fmt;

/// Errors surfaced to producers and to callers driving the consumer loops
///
/// Backpressure is not an error: a publish into a full channel simply waits.
/// Handler failures are not represented here either; they are absorbed by the
/// consumer loop and only show up in telemetry.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel '{channel}' is closed for publishing")]
    Closed { channel: String },

    #[error("Operation on channel '{channel}' was cancelled")]
    Cancelled { channel: String },

    #[error("Invalid channel configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("Failed to register channel instruments: {0}")]
    Telemetry(#[from] prometheus::Error),

    #[error("Consumer loops for channel '{channel}' are already running")]
    AlreadyProcessing { channel: String },

    #[error("Consumer task for partition {partition} failed: {message}")]
    TaskFailed { partition: usize, message: String },
}

impl ChannelError {
    pub(crate) fn closed(channel: &str) -> Self {
        Self::Closed {
            channel: channel.to_string(),
        }
    }

    pub(crate) fn cancelled(channel: &str) -> Self {
        Self::Cancelled {
            channel: channel.to_string(),
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed { .. })
    }
}

impl ContextualError for ChannelError {
    fn is_user_actionable(&self) -> bool {
        matches!(self, ChannelError::InvalidConfiguration { .. })
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            ChannelError::InvalidConfiguration { message } => Some(message),
            _ => None,
        }
    }
}

/// Result type for channel operations
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Failure returned by a message handler
///
/// Every handler failure carries a category which becomes the `error_type`
/// label on the failed counter. Converting any `std::error::Error` with `?`
/// uses the error's type name (without its module path) as the category, so
/// handlers can propagate their own error types directly.
///
/// `HandlerError` deliberately does not implement `std::error::Error`; that
/// keeps the blanket `From` conversion coherent.
pub struct HandlerError {
    category: Cow<'static, str>,
    message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl HandlerError {
    /// Create a failure with an explicit category
    pub fn new(category: impl Into<Cow<'static, str>>, message: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create an uncategorised failure from any displayable value
    pub fn msg(message: impl fmt::Display) -> Self {
        Self::new("error", message.to_string())
    }

    /// Build a failure from a caught panic payload
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "handler panicked".to_string()
        };
        Self::new("panic", message)
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The wrapped error, when the failure was converted from one
    pub fn source_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        self.source.as_deref()
    }
}

impl<E> From<E> for HandlerError
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Self {
            category: Cow::Borrowed(short_type_name::<E>()),
            message: error.to_string(),
            source: Some(Box::new(error)),
        }
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.category, self.message)
    }
}

impl fmt::Debug for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerError")
            .field("category", &self.category)
            .field("message", &self.message)
            .field("source", &self.source)
            .finish()
    }
}

/// `std::io::error::Error` -> `Error`, `my::Wrapper<u8>` -> `Wrapper`
fn short_type_name<E>() -> &'static str {
    let full = std::any::type_name::<E>();
    let without_generics = full.split('<').next().unwrap_or(full);
    without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics)
}
