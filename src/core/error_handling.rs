//! Fatal error reporting shared by the binary's error types
//!
//! Errors the user can fix (a bad config value, an invalid channel setting)
//! are reported with their own message. Everything else is reported under
//! the name of the operation that failed, with the error itself only at
//! debug level.

/// Errors that can tell whether their message is meant for the user
///
/// When `is_user_actionable()` is `true`, `user_message()` should return
/// `Some`; otherwise it should return `None`.
pub trait ContextualError: std::error::Error {
    /// True if the message is specific enough to be shown as-is, e.g. a
    /// validation failure, as opposed to an internal failure such as a task
    /// that could not be joined
    fn is_user_actionable(&self) -> bool;

    fn user_message(&self) -> Option<&str>;
}

/// Log a fatal error at a detail level matching how actionable it is
///
/// # Examples
/// ```rust,no_run
/// # use partichan::core::error_handling::log_error_with_context;
/// # use partichan::channel::PartitionedChannelConfig;
/// let err = PartitionedChannelConfig::new("orders", 0, 4).validate().unwrap_err();
/// log_error_with_context(&err, "Creating channel");
/// // Logs: "FATAL: channel capacity must be greater than zero"
/// ```
pub fn log_error_with_context<E: ContextualError + std::fmt::Debug>(
    error: &E,
    operation_context: &str,
) {
    match error.user_message() {
        Some(user_msg) if error.is_user_actionable() => log::error!("FATAL: {}", user_msg),
        _ => log::error!("FATAL: {}", operation_context),
    }
    log::debug!("DETAIL: {}", error);
    log::debug!("DEBUG_DETAILS: {:?}", error);
}
