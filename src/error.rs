pub use masterror::{AppError, AppResult};

/// Create file read error
pub fn file_read_error(path: &str, source: std::io::Error) -> AppError {
    AppError::internal(format!("Failed to read file '{}': {}", path, source))
}

/// Create database open error
pub fn db_open_error(path: &str, source: rusqlite::Error) -> AppError {
    AppError::internal(format!("Failed to open database '{}': {}", path, source))
}

/// Create translation error
///
/// Used when the completion service is unreachable or returns no usable
/// content. Kept distinct from execution failures, which are captured as
/// [`crate::db::ExecutionOutcome::Failure`] data instead of errors.
pub fn translation_error(message: impl Into<String>) -> AppError {
    AppError::service(message.into())
}

/// Create HTTP error
pub fn http_error(err: reqwest::Error) -> AppError {
    let msg = if err.is_timeout() {
        format!("Request timeout: {}", err)
    } else if err.is_connect() {
        format!("Connection failed: {}", err)
    } else if err.is_status() {
        format!("HTTP error {}: {}", err.status().unwrap_or_default(), err)
    } else {
        err.to_string()
    };
    AppError::service(msg)
}

/// Create config error
pub fn config_error(message: impl Into<String>) -> AppError {
    AppError::bad_request(message.into())
}
