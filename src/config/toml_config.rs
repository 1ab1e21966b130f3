use crate::core::attributes;
use crate::core::SignalName;
use crate::utils::error::{DeviceError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
const DEFAULT_TIMEOUT_SECONDS: u64 = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub device: DeviceSection,
    pub rest: RestConfig,
    #[serde(default)]
    pub properties: HashMap<String, String>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSection {
    pub name: String,
    pub poll_interval_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestConfig {
    pub base_url: String,
    pub tango_host: String,
    pub timeout_seconds: Option<u64>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl RestConfig {
    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

impl DeviceConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| DeviceError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${TANGO_REST_PASSWORD})，未定義的保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| DeviceError::ConfigValidationError {
            field: "environment".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("device.name", &self.device.name)?;
        validation::validate_positive_number("device.poll_interval_ms", self.poll_interval_ms(), 1)?;

        validation::validate_url("rest.base_url", &self.rest.base_url)?;
        validation::validate_host_port("rest.tango_host", &self.rest.tango_host)?;
        validation::validate_positive_number("rest.timeout_seconds", self.rest.timeout_seconds(), 1)?;

        for (field, value) in [
            ("rest.username", self.rest.username.as_deref()),
            ("rest.password", self.rest.password.as_deref()),
        ] {
            if let Some(value) = value {
                reject_unresolved(field, value)?;
            }
        }

        for property in attributes::required_properties() {
            let value = self
                .properties
                .get(property)
                .ok_or_else(|| DeviceError::MissingProperty {
                    property: property.to_string(),
                })?;
            reject_unresolved(&format!("properties.{}", property), value)?;
            value.parse::<SignalName>()?;
        }

        let unknown: Vec<&str> = self
            .properties
            .keys()
            .map(String::as_str)
            .filter(|key| !attributes::required_properties().any(|p| p == *key))
            .collect();
        if !unknown.is_empty() {
            tracing::warn!("Ignoring unknown device properties: {}", unknown.join(", "));
        }

        Ok(())
    }

    pub fn poll_interval_ms(&self) -> u64 {
        self.device.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms())
    }

    pub fn log_format(&self) -> LogFormat {
        self.logging.as_ref().map(|l| l.format).unwrap_or_default()
    }
}

fn reject_unresolved(field: &str, value: &str) -> Result<()> {
    if value.contains("${") {
        return Err(DeviceError::InvalidConfigValueError {
            field: field.to_string(),
            value: value.to_string(),
            reason: "Environment variable is not set".to_string(),
        });
    }
    Ok(())
}

impl Validate for DeviceConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
