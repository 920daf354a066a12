use thiserror::Error;

#[derive(Error, Debug)]
pub enum PermissionsError {
    #[error("Unable to execute {operation} request to {service}: {source}")]
    Transport {
        service: &'static str,
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{operation} request to {service} timed out after {timeout_ms}ms")]
    Timeout {
        service: &'static str,
        operation: &'static str,
        timeout_ms: u64,
    },

    #[error("Unexpected status code {status} from {service} for {operation}: {body}")]
    UpstreamStatus {
        service: &'static str,
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("Unable to parse {operation} response from {service}: {source}")]
    Deserialization {
        service: &'static str,
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Expected 1 {entity} but actual count was {actual}")]
    Cardinality { entity: &'static str, actual: usize },

    #[error("Authentication error: {message}")]
    Auth { message: String },

    #[error("Invalid journey string: {message}")]
    JourneyFormat { message: String },

    #[error("Invalid journey: {message}")]
    InvalidJourney { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Upstream,
    Journey,
    Io,
}

impl PermissionsError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PermissionsError::Transport { .. }
            | PermissionsError::Timeout { .. }
            | PermissionsError::UpstreamStatus { .. }
            | PermissionsError::Deserialization { .. }
            | PermissionsError::Cardinality { .. }
            | PermissionsError::Auth { .. } => ErrorCategory::Upstream,
            PermissionsError::JourneyFormat { .. } | PermissionsError::InvalidJourney { .. } => {
                ErrorCategory::Journey
            }
            PermissionsError::IoError(_) => ErrorCategory::Io,
            PermissionsError::ConfigError { .. }
            | PermissionsError::InvalidConfigValueError { .. }
            | PermissionsError::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, PermissionsError::Timeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, PermissionsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cardinality_message() {
        let err = PermissionsError::Cardinality {
            entity: "licenceView",
            actual: 2,
        };
        assert_eq!(err.to_string(), "Expected 1 licenceView but actual count was 2");
        assert_eq!(err.category(), ErrorCategory::Upstream);
    }

    #[test]
    fn test_categories() {
        let journey = PermissionsError::JourneyFormat {
            message: "missing separator".to_string(),
        };
        assert_eq!(journey.category(), ErrorCategory::Journey);

        let missing = PermissionsError::MissingConfigError {
            field: "auth.token".to_string(),
        };
        assert_eq!(missing.category(), ErrorCategory::Configuration);
        assert!(!missing.is_timeout());
    }
}
