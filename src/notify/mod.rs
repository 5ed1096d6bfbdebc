//! Endpoint notification
//!
//! After a host receives a new address it is told about it with
//! `GET http://{address}:{port}{path}?ip={address}` so the service can pick
//! up its own identity. The call is best-effort and never fails a repair.

use reqwest::Client;
use std::net::IpAddr;
use std::time::Duration;

use crate::config::NotifyConfig;

/// Tells a freshly addressed host its new address
pub struct EndpointNotifier {
    client: Client,
    port: u16,
    path: String,
    timeout: Duration,
}

impl EndpointNotifier {
    pub fn new(config: &NotifyConfig) -> reqwest::Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self::with_client(client, config))
    }

    /// Create a notifier on a shared HTTP client
    pub fn with_client(client: Client, config: &NotifyConfig) -> Self {
        Self {
            client,
            port: config.port,
            path: config.path.clone(),
            timeout: config.timeout(),
        }
    }

    /// Base URL of the reconfiguration endpoint, without the query
    pub fn notify_url(&self, address: IpAddr) -> String {
        match address {
            IpAddr::V4(v4) => format!("http://{}:{}{}", v4, self.port, self.path),
            IpAddr::V6(v6) => format!("http://[{}]:{}{}", v6, self.port, self.path),
        }
    }

    /// Notify the host at `address`; returns whether a response came back
    pub async fn notify(&self, address: IpAddr) -> bool {
        let url = self.notify_url(address);
        let ip = address.to_string();

        match self
            .client
            .get(&url)
            .query(&[("ip", ip.as_str())])
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(response) => {
                tracing::info!(address = %ip, status = %response.status(), "Notified endpoint of new address");
                true
            }
            Err(e) => {
                tracing::warn!(address = %ip, error = %e, "Endpoint notification failed, continuing");
                false
            }
        }
    }
}
