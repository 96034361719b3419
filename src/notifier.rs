//! Webhook delivery of alerts and block notifications.
//!
//! Delivery is fire-and-forget with at most one attempt per event: a
//! transport error or non-2xx response surfaces as `Err` for the caller
//! to log, and is never retried. Local state (the alert latch, the
//! blocked-IP map) is always committed before delivery is attempted.

use crate::monitor::config::HTTP_TIMEOUT;
use reqwest::blocking::Client;
use serde::Serialize;

/// Whether an alert marks the start or the end of an incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Start,
    End,
}

/// Body of an incident alert POST.
///
/// Field names follow the API's camelCase contract; `endTime` is
/// omitted entirely on start alerts rather than sent as null.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertPayload<'a> {
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub ip: &'a str,
    pub location: &'a str,
    pub start_time: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct BlockedPayload<'a> {
    ip: &'a str,
}

/// HTTP client bound to the three API endpoints.
pub struct Notifier {
    client: Client,
    alert_url: String,
    block_url: String,
    stats_url: String,
}

impl Notifier {
    pub fn new(alert_url: String, block_url: String, stats_url: String) -> Result<Self, String> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| format!("failed to build http client: {}", e))?;

        Ok(Self {
            client,
            alert_url,
            block_url,
            stats_url,
        })
    }

    /// Delivers an incident start/end alert.
    pub fn send_alert(&self, payload: &AlertPayload) -> Result<(), String> {
        self.client
            .post(&self.alert_url)
            .json(payload)
            .send()
            .map_err(|e| format!("alert POST failed: {}", e))?
            .error_for_status()
            .map_err(|e| format!("alert POST rejected: {}", e))?;
        Ok(())
    }

    /// Notifies the API that an IP was blocked.
    pub fn notify_blocked(&self, ip: &str) -> Result<(), String> {
        self.client
            .post(&self.block_url)
            .json(&BlockedPayload { ip })
            .send()
            .map_err(|e| format!("block notification POST failed: {}", e))?
            .error_for_status()
            .map_err(|e| format!("block notification POST rejected: {}", e))?;
        Ok(())
    }

    /// Fetches the aggregate network statistics document.
    pub fn fetch_stats(&self) -> Result<serde_json::Value, String> {
        self.client
            .get(&self.stats_url)
            .send()
            .map_err(|e| format!("stats GET failed: {}", e))?
            .error_for_status()
            .map_err(|e| format!("stats GET rejected: {}", e))?
            .json::<serde_json::Value>()
            .map_err(|e| format!("stats response was not JSON: {}", e))
    }
}
