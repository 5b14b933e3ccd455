use serde_json::Value;
use thiserror::Error;

/// Failure of a single call to the backend, as seen by a view.
///
/// `Clone` so the outcome of one shared in-flight fetch can be handed to
/// every request waiting on it.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    #[error("Request error: {0}")]
    Transport(String),

    #[error("Backend error: {status}, Details: {message}")]
    Status { status: u16, message: String },

    #[error("Unexpected response: {0}")]
    Malformed(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Text shown inline next to the table or form that failed.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status { status: 401, .. } => {
                "Your session has expired, please sign in again".to_string()
            }
            ApiError::Status { status, message } => {
                let detail = serde_json::from_str::<Value>(message)
                    .ok()
                    .and_then(|body| {
                        body.get("message")
                            .and_then(Value::as_str)
                            .map(str::to_string)
                    })
                    .unwrap_or_else(|| message.clone());
                if detail.trim().is_empty() {
                    format!("The server answered with status {status}")
                } else {
                    detail
                }
            }
            ApiError::Transport(_) => "Could not reach the server, please retry".to_string(),
            ApiError::Malformed(_) => "The server sent an unexpected response".to_string(),
            ApiError::Validation(message) => message.clone(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Malformed(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Malformed(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = err
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("{field} is invalid"),
                })
            })
            .collect();
        messages.sort();
        ApiError::Validation(messages.join("; "))
    }
}
