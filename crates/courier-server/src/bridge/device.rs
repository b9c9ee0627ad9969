//! Outbound delivery channel to devices.

use async_trait::async_trait;
use courier_core::model::DeviceResponse;
use courier_settings::BridgeSettings;
use tracing::{debug, instrument};

use super::BridgeError;
use super::sas;

/// Pushes finished exchanges back to a device.
#[async_trait]
pub trait DeviceChannel: Send + Sync {
    /// Deliver one response to `device_id`.
    async fn deliver(&self, device_id: &str, response: &DeviceResponse)
    -> Result<(), BridgeError>;
}

/// REST device channel: signed cloud-to-device POST against the hub.
pub struct HttpDeviceChannel {
    client: reqwest::Client,
    settings: BridgeSettings,
    base_url: String,
}

impl HttpDeviceChannel {
    /// Channel against the configured hub.
    pub fn new(settings: BridgeSettings) -> Self {
        let base_url = format!("https://{}", settings.hub_hostname);
        Self {
            client: reqwest::Client::new(),
            settings,
            base_url,
        }
    }

    /// Test constructor with an explicit endpoint root.
    #[cfg(test)]
    fn with_base_url(settings: BridgeSettings, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings,
            base_url,
        }
    }
}

#[async_trait]
impl DeviceChannel for HttpDeviceChannel {
    #[instrument(skip(self, response))]
    async fn deliver(
        &self,
        device_id: &str,
        response: &DeviceResponse,
    ) -> Result<(), BridgeError> {
        let resource_uri = format!("{}/devices/{device_id}", self.settings.hub_hostname);
        let token = sas::sign_resource(
            &resource_uri,
            &self.settings.key,
            &self.settings.key_name,
            self.settings.token_ttl_secs,
        )?;

        let url = format!("{}/devices/{device_id}/messages/devicebound", self.base_url);
        let http_response = self
            .client
            .post(&url)
            .query(&[("api-version", self.settings.api_version.as_str())])
            .header("Authorization", token)
            .json(response)
            .send()
            .await
            .map_err(|e| BridgeError::Delivery(e.to_string()))?;

        let status = http_response.status();
        if !status.is_success() {
            let body = http_response.text().await.unwrap_or_default();
            return Err(BridgeError::Delivery(format!(
                "hub returned {status}: {body}"
            )));
        }
        debug!(device_id, status = status.as_u16(), "device delivery accepted");
        Ok(())
    }
}
