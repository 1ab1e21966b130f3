use crate::utils::error::{DeviceError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A scalar value read from or written to a PLC signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SignalValue {
    Bool(bool),
    Long(i64),
    Double(f64),
}

impl SignalValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            SignalValue::Bool(_) => "bool",
            SignalValue::Long(_) => "long",
            SignalValue::Double(_) => "double",
        }
    }

    /// Converts the value into `data_type`. Bool accepts Long 0/1, Double accepts Long.
    pub fn coerce(self, data_type: DataType, attribute: &str) -> Result<SignalValue> {
        match (data_type, self) {
            (DataType::Bool, SignalValue::Bool(_)) => Ok(self),
            (DataType::Bool, SignalValue::Long(0)) => Ok(SignalValue::Bool(false)),
            (DataType::Bool, SignalValue::Long(1)) => Ok(SignalValue::Bool(true)),
            (DataType::Double, SignalValue::Double(_)) => Ok(self),
            (DataType::Double, SignalValue::Long(v)) => Ok(SignalValue::Double(v as f64)),
            (expected, found) => Err(DeviceError::TypeMismatch {
                attribute: attribute.to_string(),
                expected: expected.to_string(),
                found: format!("{} ({})", found.type_name(), found),
            }),
        }
    }

    /// A non-bool value is a type error, never `false`.
    pub fn require_bool(&self, attribute: &str) -> Result<bool> {
        match self {
            SignalValue::Bool(v) => Ok(*v),
            other => Err(DeviceError::TypeMismatch {
                attribute: attribute.to_string(),
                expected: DataType::Bool.to_string(),
                found: format!("{} ({})", other.type_name(), other),
            }),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SignalValue::Double(v) => Some(*v),
            SignalValue::Long(v) => Some(*v as f64),
            SignalValue::Bool(_) => None,
        }
    }

    /// Parses a command-line literal: `true`/`false`, an integer, or a float.
    pub fn parse_literal(raw: &str) -> Option<SignalValue> {
        let raw = raw.trim();
        match raw.to_ascii_lowercase().as_str() {
            "true" => return Some(SignalValue::Bool(true)),
            "false" => return Some(SignalValue::Bool(false)),
            _ => {}
        }
        if let Ok(v) = raw.parse::<i64>() {
            return Some(SignalValue::Long(v));
        }
        raw.parse::<f64>().ok().map(SignalValue::Double)
    }
}

impl fmt::Display for SignalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalValue::Bool(v) => write!(f, "{}", v),
            SignalValue::Long(v) => write!(f, "{}", v),
            SignalValue::Double(v) => write!(f, "{}", v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Bool,
    Double,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Bool => f.pad("bool"),
            DataType::Double => f.pad("double"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    Read,
    ReadWrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayLevel {
    Operator,
}

impl fmt::Display for DisplayLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayLevel::Operator => f.pad("operator"),
        }
    }
}

/// Full name of a remote attribute: `domain/family/member/attribute`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SignalName {
    device: String,
    attribute: String,
}

impl SignalName {
    /// Device part, `domain/family/member`.
    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }
}

impl FromStr for SignalName {
    type Err = DeviceError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| DeviceError::InvalidSignalName {
            name: s.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = s.trim().split('/').collect();
        if parts.len() != 4 {
            return Err(invalid("expected domain/family/member/attribute"));
        }
        if parts.iter().any(|p| p.is_empty()) {
            return Err(invalid("name components cannot be empty"));
        }
        if parts.iter().any(|p| !p.chars().all(is_name_char)) {
            return Err(invalid(
                "name components may only contain letters, digits, '_', '-', '.' and '+'",
            ));
        }

        Ok(SignalName {
            device: parts[..3].join("/"),
            attribute: parts[3].to_string(),
        })
    }
}

/// Characters allowed in a Tango device or attribute name component.
fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '+')
}

impl TryFrom<String> for SignalName {
    type Error = DeviceError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<SignalName> for String {
    fn from(name: SignalName) -> Self {
        name.to_string()
    }
}

impl fmt::Display for SignalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.device, self.attribute)
    }
}

/// Snapshot of the five signals the aggregate alarm is derived from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmInputs {
    pub temperature_alarm: bool,
    pub vswr_alarm: bool,
    pub psu_status: bool,
    pub interlock: bool,
    pub amplifier_state: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmOutcome {
    pub is_alarm: bool,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeviceState {
    On,
    Alarm,
    Fault,
    Unknown,
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeviceState::On => "ON",
            DeviceState::Alarm => "ALARM",
            DeviceState::Fault => "FAULT",
            DeviceState::Unknown => "UNKNOWN",
        };
        f.pad(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub state: DeviceState,
    pub status: String,
    pub changed_at: DateTime<Utc>,
}
