use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("Invalid URL for {field}: '{value}' ({reason})")]
    InvalidUrlError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Upstream exchange failed: {0}")]
    UpstreamExchangeError(#[from] reqwest::Error),

    #[error("Backend responded with status {status}: {message}")]
    BackendError { status: u16, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in {field}: {message}")]
    ConfigError { field: String, message: String },

    #[error("Validation error in {field}: {message}")]
    ValidationError { field: String, message: String },

    #[error("Storage error: {message}")]
    StorageError { message: String },
}

impl ConsoleError {
    pub fn user_friendly_message(&self) -> String {
        match self {
            ConsoleError::InvalidUrlError { value, .. } => {
                format!("'{}' is not a valid backend URL", value)
            }
            ConsoleError::UpstreamExchangeError(_) => {
                "Could not reach the backend service".to_string()
            }
            ConsoleError::BackendError { status, message } => {
                format!("Backend rejected the request ({}): {}", status, message)
            }
            ConsoleError::IoError(e) => format!("File operation failed: {}", e),
            ConsoleError::SerializationError(_) => {
                "Received data that could not be understood".to_string()
            }
            ConsoleError::ConfigError { field, message } => {
                format!("Configuration problem with '{}': {}", field, message)
            }
            ConsoleError::ValidationError { field, message } => {
                format!("Invalid value for '{}': {}", field, message)
            }
            ConsoleError::StorageError { message } => {
                format!("Settings storage failed: {}", message)
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ConsoleError::InvalidUrlError { .. } => {
                "Use an absolute http(s) URL such as http://localhost:3000"
            }
            ConsoleError::UpstreamExchangeError(_) => {
                "Check that the backend is running and that the configured API URL is correct"
            }
            ConsoleError::BackendError { .. } => "Check the request parameters and try again",
            ConsoleError::IoError(_) => "Check file paths and permissions",
            ConsoleError::SerializationError(_) => {
                "Make sure the API URL points at the project backend"
            }
            ConsoleError::ConfigError { .. } => "Fix the configuration file and restart",
            ConsoleError::ValidationError { .. } => "Correct the input and try again",
            ConsoleError::StorageError { .. } => {
                "Check that the settings file is writable and contains a JSON object"
            }
        }
    }

    /// Process exit code used by the CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            ConsoleError::InvalidUrlError { .. }
            | ConsoleError::ConfigError { .. }
            | ConsoleError::ValidationError { .. } => 1,
            ConsoleError::UpstreamExchangeError(_)
            | ConsoleError::BackendError { .. }
            | ConsoleError::SerializationError(_) => 2,
            ConsoleError::IoError(_) | ConsoleError::StorageError { .. } => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConsoleError>;
