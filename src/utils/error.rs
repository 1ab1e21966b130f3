use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing device property: {property}")]
    MissingProperty { property: String },

    #[error("Invalid signal name '{name}': {reason}")]
    InvalidSignalName { name: String, reason: String },

    #[error("Signal '{signal}' is unavailable: {reason}")]
    SignalUnavailable { signal: String, reason: String },

    #[error("Attribute '{attribute}' expects {expected}, got {found}")]
    TypeMismatch {
        attribute: String,
        expected: String,
        found: String,
    },

    #[error("Unknown attribute: {name}")]
    UnknownAttribute { name: String },

    #[error("Unknown command: {name}")]
    UnknownCommand { name: String },

    #[error("Attribute '{name}' is read-only")]
    ReadOnlyAttribute { name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Data,
    Device,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl DeviceError {
    pub fn unavailable(signal: impl ToString, reason: impl ToString) -> Self {
        Self::SignalUnavailable {
            signal: signal.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingProperty { .. }
            | Self::InvalidSignalName { .. } => ErrorCategory::Configuration,
            Self::HttpError(_) | Self::SignalUnavailable { .. } => ErrorCategory::Network,
            Self::IoError(_) | Self::SerializationError(_) | Self::TypeMismatch { .. } => {
                ErrorCategory::Data
            }
            Self::UnknownAttribute { .. }
            | Self::UnknownCommand { .. }
            | Self::ReadOnlyAttribute { .. } => ErrorCategory::Device,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Device => ErrorSeverity::Low,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::Critical,
        }
    }

    /// 給操作員看的訊息
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::HttpError(_) | Self::SignalUnavailable { .. } => {
                format!("Cannot reach the PLC: {}", self)
            }
            Self::MissingProperty { property } => {
                format!("Device property '{}' is not configured", property)
            }
            Self::ReadOnlyAttribute { name } => {
                format!("'{}' cannot be written, it is a read-only attribute", name)
            }
            _ => self.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => {
                "Check the [properties] and [rest] sections of the configuration file"
            }
            ErrorCategory::Network => {
                "Check that the REST gateway and the PLC device server are running"
            }
            ErrorCategory::Data => "Check the data type of the PLC attribute",
            ErrorCategory::Device => "Run `drive-amplifier attributes` to list valid names",
        }
    }
}

pub type Result<T> = std::result::Result<T, DeviceError>;
