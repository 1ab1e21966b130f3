//! Signal source for PLC device servers reached through a Tango REST gateway
//! (RESTful Tango API, `rc4`).

use crate::config::toml_config::RestConfig;
use crate::core::{SignalName, SignalSource, SignalValue};
use crate::utils::error::{DeviceError, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

const INVALID_QUALITY: &str = "ATTR_INVALID";

#[derive(Debug, Deserialize)]
struct AttributeValueDto {
    #[serde(default)]
    value: serde_json::Value,
    quality: Option<String>,
}

pub struct TangoRestSource {
    client: Client,
    base_url: Url,
    host: String,
    port: String,
    username: Option<String>,
    password: Option<String>,
}

impl TangoRestSource {
    pub fn new(config: &RestConfig) -> Result<Self> {
        let (host, port) = config.tango_host.rsplit_once(':').ok_or_else(|| {
            DeviceError::InvalidConfigValueError {
                field: "rest.tango_host".to_string(),
                value: config.tango_host.clone(),
                reason: "Expected host:port".to_string(),
            }
        })?;

        let base_url = Url::parse(&config.base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| DeviceError::InvalidConfigValueError {
                field: "rest.base_url".to_string(),
                value: config.base_url.clone(),
                reason: "Expected an http(s) base URL".to_string(),
            })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds()))
            .build()?;

        Ok(Self {
            client,
            base_url,
            host: host.to_string(),
            port: port.to_string(),
            username: config.username.clone().filter(|u| !u.is_empty()),
            password: config.password.clone(),
        })
    }

    /// URL of the value resource of `signal`; every name component is a separate, escaped path segment.
    pub fn value_url(&self, signal: &SignalName) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| DeviceError::unavailable(signal, "REST base URL cannot hold a path"))?
            .pop_if_empty()
            .extend(["hosts", self.host.as_str(), self.port.as_str(), "devices"])
            .extend(signal.device().split('/'))
            .extend(["attributes", signal.attribute(), "value"]);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.username {
            Some(username) => request.basic_auth(username, self.password.as_ref()),
            None => request,
        }
    }

    async fn send(&self, signal: &SignalName, request: RequestBuilder) -> Result<Response> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| DeviceError::unavailable(signal, e))?;

        tracing::debug!("REST gateway response for {}: {}", signal, response.status());

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DeviceError::unavailable(
                signal,
                format!("HTTP {} {}", status, body.trim()),
            ));
        }
        Ok(response)
    }
}

fn scalar(signal: &SignalName, value: &serde_json::Value) -> Result<SignalValue> {
    match value {
        serde_json::Value::Bool(v) => Ok(SignalValue::Bool(*v)),
        serde_json::Value::Number(n) => n
            .as_i64()
            .map(SignalValue::Long)
            .or_else(|| n.as_f64().map(SignalValue::Double))
            .ok_or_else(|| DeviceError::unavailable(signal, format!("unsupported number {}", n))),
        other => Err(DeviceError::unavailable(
            signal,
            format!("expected a scalar value, got {}", other),
        )),
    }
}

#[async_trait]
impl SignalSource for TangoRestSource {
    async fn read(&self, signal: &SignalName) -> Result<SignalValue> {
        let url = self.value_url(signal)?;
        tracing::debug!("GET {}", url);

        let response = self.send(signal, self.client.get(url)).await?;
        let dto: AttributeValueDto = response
            .json()
            .await
            .map_err(|e| DeviceError::unavailable(signal, e))?;

        if dto.quality.as_deref() == Some(INVALID_QUALITY) {
            return Err(DeviceError::unavailable(signal, "attribute quality is ATTR_INVALID"));
        }
        scalar(signal, &dto.value)
    }

    async fn write(&self, signal: &SignalName, value: SignalValue) -> Result<()> {
        let url = self.value_url(signal)?;
        tracing::debug!("PUT {} v={}", url, value);

        let request = self.client.put(url).query(&[("v", value.to_string())]);
        self.send(signal, request).await?;
        Ok(())
    }
}
