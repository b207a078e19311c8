use thiserror::Error;

pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired/Invalid. Please Logout and Login again.";

/// Coarse classification used by callers to pick a reaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Request never reached the service
    Network,
    /// Credential missing, invalid or not refreshable
    Auth,
    Validation,
    NotFound,
    Forbidden,
    Server,
    /// Response arrived but could not be understood
    Decode,
}

/// What the user was trying to do, for wording failure messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Run,
    Submit,
    LoadProblem,
    LoadSubmissions,
    LoadRanking,
    SaveProblem,
    DeleteProblem,
}

impl Operation {
    pub fn failure_message(&self) -> &'static str {
        match self {
            Operation::Run => "Failed to run code",
            Operation::Submit => "Failed to submit code",
            Operation::LoadProblem => "Failed to load problem",
            Operation::LoadSubmissions => "Failed to load submissions",
            Operation::LoadRanking => "Failed to load ranking",
            Operation::SaveProblem => "Failed to save problem",
            Operation::DeleteProblem => "Failed to delete problem",
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    #[error("network error: {0}")]
    Network(String),

    #[error("authentication required: {0}")]
    Auth(String),

    #[error("request failed with status {status}: {}", .message.as_deref().unwrap_or("no details"))]
    Http { status: u16, message: Option<String> },

    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl ServiceError {
    /// Build from a non-success response; `body` is the raw payload
    pub fn from_status(status: u16, body: &[u8]) -> Self {
        let message = error_message(body);
        if status == 401 {
            return ServiceError::Auth(message.unwrap_or_else(|| "unauthorized".to_string()));
        }
        ServiceError::Http { status, message }
    }

    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ServiceError::Decode(err.to_string())
        } else if err.is_timeout() {
            ServiceError::Network(format!("request timed out: {}", err))
        } else {
            ServiceError::Network(err.to_string())
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Network(_) => ErrorKind::Network,
            ServiceError::Auth(_) => ErrorKind::Auth,
            ServiceError::Decode(_) => ErrorKind::Decode,
            ServiceError::Http { status, .. } => match status {
                400 | 422 => ErrorKind::Validation,
                403 => ErrorKind::Forbidden,
                404 => ErrorKind::NotFound,
                _ => ErrorKind::Server,
            },
        }
    }

    /// The single line shown in the result area
    pub fn user_message(&self, operation: Operation) -> String {
        match self {
            ServiceError::Network(_) | ServiceError::Decode(_) => operation.failure_message().to_string(),
            ServiceError::Auth(_) => SESSION_EXPIRED_MESSAGE.to_string(),
            ServiceError::Http { message: Some(message), .. } => message.clone(),
            ServiceError::Http { status, message: None } => {
                format!("Request failed with status code {}", status)
            }
        }
    }
}

/// `error` or `message` field of a JSON error payload
fn error_message(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    ["error", "message"]
        .iter()
        .filter_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .find(|text| !text.trim().is_empty())
        .map(str::to_string)
}
