use shared::error::ApiErrorBody;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("registration rejected with status {status}")]
    Rejected {
        status: u16,
        body: Option<ApiErrorBody>,
    },
    #[error("registration request failed: {0}")]
    Transport(String),
    #[error("registration request timed out")]
    Timeout,
    #[error("invalid registration settings for '{endpoint}': {reason}")]
    InvalidSettings { endpoint: String, reason: String },
}

impl RegistrationError {
    /// Message supplied by the server in the error body, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            RegistrationError::Rejected {
                body: Some(body), ..
            } => body.message(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for RegistrationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RegistrationError::Timeout
        } else {
            RegistrationError::Transport(err.to_string())
        }
    }
}
