//! Optional webhook receiving one event per title outcome.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use gaffer_config::NotifyConfig;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

const NOTIFY_TIMEOUT_SECS: u64 = 2;

/// Event posted to the notification webhook.
#[derive(Debug, Serialize)]
pub struct TitleEvent<'a> {
    /// Title the event describes.
    pub title_id: &'a str,
    /// Stage the run stopped in, absent on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<&'a str>,
    /// `success` or `error`.
    pub outcome: &'a str,
    /// Failure detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'a str>,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
}

/// Posts [`TitleEvent`]s; delivery failures are logged at DEBUG only.
#[derive(Debug, Clone)]
pub struct Notifier {
    client: Client,
    endpoint: Url,
}

impl Notifier {
    /// Notifier for the configured webhook, if one is set.
    #[must_use]
    pub fn from_config(config: &NotifyConfig) -> Option<Self> {
        let endpoint = config.url.as_deref()?;
        let endpoint = match endpoint.parse() {
            Ok(endpoint) => endpoint,
            Err(err) => {
                warn!(error = %err, "ignoring unparsable notification url");
                return None;
            }
        };
        let client = match Client::builder()
            .timeout(Duration::from_secs(NOTIFY_TIMEOUT_SECS))
            .build()
        {
            Ok(client) => client,
            Err(err) => {
                warn!(error = %err, "notification client could not be built; notifications disabled");
                return None;
            }
        };
        Some(Self { client, endpoint })
    }

    /// Post `event`.
    pub async fn emit(&self, event: &TitleEvent<'_>) {
        if let Err(err) = self
            .client
            .post(self.endpoint.clone())
            .json(event)
            .send()
            .await
        {
            debug!(error = %err, "notification delivery failed");
        }
    }
}

/// Millisecond timestamp for events.
#[must_use]
pub fn timestamp_now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
