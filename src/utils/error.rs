use thiserror::Error;

#[derive(Error, Debug)]
pub enum CouncilError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("{backend} API error {status}: {body}")]
    ApiError {
        backend: String,
        status: u16,
        body: String,
    },

    #[error("{backend} returned an empty response")]
    EmptyResponse { backend: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Could not parse {context} reply: {message}")]
    ReplyParseError { context: String, message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Path escapes the project root: {path}")]
    UnsafePathError { path: String },

    #[error("Project path does not exist: {path}")]
    ProjectNotFound { path: String },

    #[error("Process '{command}' failed: {message}")]
    ProcessError { command: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Provider,
    Configuration,
    Filesystem,
    Parsing,
    Execution,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl CouncilError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CouncilError::HttpError(_) => ErrorCategory::Network,
            CouncilError::ApiError { .. } | CouncilError::EmptyResponse { .. } => {
                ErrorCategory::Provider
            }
            CouncilError::IoError(_)
            | CouncilError::UnsafePathError { .. }
            | CouncilError::ProjectNotFound { .. } => ErrorCategory::Filesystem,
            CouncilError::SerializationError(_) | CouncilError::ReplyParseError { .. } => {
                ErrorCategory::Parsing
            }
            CouncilError::ConfigError { .. }
            | CouncilError::MissingConfigError { .. }
            | CouncilError::InvalidConfigValueError { .. }
            | CouncilError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            CouncilError::ProcessError { .. } => ErrorCategory::Execution,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 模型回覆格式錯誤通常重試即可
            ErrorCategory::Parsing => ErrorSeverity::Low,
            ErrorCategory::Network | ErrorCategory::Provider => ErrorSeverity::Medium,
            ErrorCategory::Filesystem | ErrorCategory::Execution => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            CouncilError::HttpError(e) if e.is_timeout() => {
                "The provider timed out; raise request_timeout_secs or try again later".to_string()
            }
            CouncilError::HttpError(_) => {
                "Check your network connection and the provider base_url".to_string()
            }
            CouncilError::ApiError { status, .. } if *status == 401 || *status == 403 => {
                "Check that the API key for this provider is valid".to_string()
            }
            CouncilError::ApiError { status, .. } if *status == 429 => {
                "The provider is rate limiting requests; wait a moment and retry".to_string()
            }
            CouncilError::ApiError { .. } | CouncilError::EmptyResponse { .. } => {
                "Retry the request or assign a different provider to this seat".to_string()
            }
            CouncilError::IoError(_) => {
                "Check that the target directory exists and is writable".to_string()
            }
            CouncilError::SerializationError(_) | CouncilError::ReplyParseError { .. } => {
                "The model did not return valid JSON; run the mode again".to_string()
            }
            CouncilError::ConfigError { .. }
            | CouncilError::ConfigValidationError { .. }
            | CouncilError::InvalidConfigValueError { .. } => {
                "Fix the configuration file and restart".to_string()
            }
            CouncilError::MissingConfigError { field } => {
                format!("Set '{}' in the config file or its environment variable", field)
            }
            CouncilError::UnsafePathError { .. } => {
                "Only relative paths inside the project directory are allowed".to_string()
            }
            CouncilError::ProjectNotFound { .. } => {
                "Pass the path of an existing project directory".to_string()
            }
            CouncilError::ProcessError { .. } => {
                "Make sure the required toolchain (node/npm or python3) is installed".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not reach the model provider: {}", self),
            ErrorCategory::Provider => format!("The model provider rejected the request: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Filesystem => format!("File system problem: {}", self),
            ErrorCategory::Parsing => format!("Unexpected model output: {}", self),
            ErrorCategory::Execution => format!("Could not run the generated project: {}", self),
        }
    }

    /// 依嚴重程度決定 CLI 退出碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, CouncilError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_critical() {
        let err = CouncilError::MissingConfigError {
            field: "providers.groq.api_key".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(err.exit_code(), 3);
        assert!(err.recovery_suggestion().contains("providers.groq.api_key"));
    }

    #[test]
    fn test_api_error_suggestions_depend_on_status() {
        let unauthorized = CouncilError::ApiError {
            backend: "groq".to_string(),
            status: 401,
            body: "bad key".to_string(),
        };
        assert!(unauthorized.recovery_suggestion().contains("API key"));

        let limited = CouncilError::ApiError {
            backend: "groq".to_string(),
            status: 429,
            body: String::new(),
        };
        assert!(limited.recovery_suggestion().contains("rate limiting"));
        assert_eq!(limited.exit_code(), 2);
    }

    #[test]
    fn test_parse_errors_do_not_fail_the_process() {
        let err = CouncilError::ReplyParseError {
            context: "qa".to_string(),
            message: "expected value".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert_eq!(err.exit_code(), 0);
        assert!(err.user_friendly_message().starts_with("Unexpected model output"));
    }
}
