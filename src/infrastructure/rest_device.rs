// REST device implementation - Energy system reachable over its local REST API
use crate::application::device_api::{Device, QueryError, ReplyStream};
use crate::domain::device::{ChannelAddress, DeviceConfig};
use crate::domain::query::QueryReply;
use crate::infrastructure::config::DeviceSettings;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_stream::wrappers::IntervalStream;

#[derive(Debug, Clone)]
pub struct RestDevice {
    id: String,
    host: String,
    config: Arc<watch::Sender<DeviceConfig>>,
    poll_interval: Option<Duration>,
    client: reqwest::Client,
}

impl RestDevice {
    pub fn new(settings: &DeviceSettings, config: DeviceConfig) -> Self {
        let (config, _) = watch::channel(config);
        Self {
            id: settings.id.clone(),
            host: settings.host.trim_end_matches('/').to_string(),
            config: Arc::new(config),
            poll_interval: settings
                .poll_interval_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            client: reqwest::Client::new(),
        }
    }

    /// Fetch the device configuration and build a device handle from it.
    pub async fn connect(settings: &DeviceSettings) -> Result<Self> {
        let device = Self::new(settings, DeviceConfig::default());
        let config = fetch_config(&device.client, &device.host)
            .await
            .with_context(|| format!("Failed to fetch config of device {}", settings.id))?;

        tracing::info!(
            "Connected to device {} at {} ({} components)",
            device.id,
            device.host,
            config.things.len()
        );
        device.config.send_replace(config);
        Ok(device)
    }

    fn build_query_url(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        channels: &[ChannelAddress],
    ) -> String {
        let channels = channels
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(",");
        format!(
            "{}/rest/query?fromDate={}&toDate={}&channels={}",
            self.host,
            urlencoding::encode(&from.to_rfc3339_opts(SecondsFormat::Secs, true)),
            urlencoding::encode(&to.to_rfc3339_opts(SecondsFormat::Secs, true)),
            urlencoding::encode(&channels)
        )
    }

    fn poller(&self, url: String) -> Poller {
        Poller {
            id: self.id.clone(),
            host: self.host.clone(),
            url,
            config: self.config.clone(),
            client: self.client.clone(),
        }
    }
}

async fn fetch_config(client: &reqwest::Client, host: &str) -> Result<DeviceConfig> {
    let response = client
        .get(format!("{}/rest/config", host))
        .header("Accept", "application/json")
        .send()
        .await
        .context("Failed to send config request")?;

    if !response.status().is_success() {
        anyhow::bail!("Config request failed with status {}", response.status());
    }

    response
        .json::<DeviceConfig>()
        .await
        .context("Failed to parse device config")
}

async fn fetch_reply(client: &reqwest::Client, url: &str) -> Result<QueryReply, QueryError> {
    let response = client
        .get(url)
        .header("Accept", "application/json")
        .send()
        .await
        .map_err(|e| QueryError::Request(e.to_string()))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(QueryError::Rejected(format!("status {}: {}", status, body)));
    }

    response
        .json::<QueryReply>()
        .await
        .map_err(|e| QueryError::InvalidReply(e.to_string()))
}

/// One query of a subscription: the device config is refreshed first so the
/// reply is summarized with the components the device has right now.
#[derive(Clone)]
struct Poller {
    id: String,
    host: String,
    url: String,
    config: Arc<watch::Sender<DeviceConfig>>,
    client: reqwest::Client,
}

impl Poller {
    async fn poll(self) -> Result<QueryReply, QueryError> {
        match fetch_config(&self.client, &self.host).await {
            Ok(config) => {
                self.config.send_if_modified(|current| {
                    if *current == config {
                        return false;
                    }
                    tracing::info!("Config of device {} changed", self.id);
                    *current = config;
                    true
                });
            }
            Err(e) => {
                tracing::warn!("Keeping previous config of device {}: {:#}", self.id, e);
            }
        }
        fetch_reply(&self.client, &self.url).await
    }
}

/// Ticks for live polling; a slow fetch delays the following polls instead of
/// letting missed ticks fire back to back.
fn poll_ticks(period: Duration) -> IntervalStream {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    IntervalStream::new(interval)
}

#[async_trait]
impl Device for RestDevice {
    fn id(&self) -> &str {
        &self.id
    }

    fn config(&self) -> DeviceConfig {
        self.config.borrow().clone()
    }

    async fn query(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        channels: Vec<ChannelAddress>,
    ) -> Result<ReplyStream, QueryError> {
        if channels.is_empty() {
            return Err(QueryError::Rejected("no power channels configured".to_string()));
        }

        let url = self.build_query_url(from, to, &channels);
        tracing::debug!("Executing device query: {}", url);
        let poller = self.poller(url);

        let replies = match self.poll_interval {
            Some(period) => poll_ticks(period)
                .then(move |_| poller.clone().poll())
                .boxed(),
            None => futures::stream::once(poller.poll()).boxed(),
        };
        Ok(replies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::device::ThingRole;
    use axum::{routing::get, Json, Router};
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn settings(poll: Option<u64>) -> DeviceSettings {
        DeviceSettings {
            id: "home".to_string(),
            host: "http://192.168.1.20/".to_string(),
            poll_interval_secs: poll,
        }
    }

    #[test]
    fn test_build_query_url() {
        let device = RestDevice::new(&settings(None), DeviceConfig::default());
        let from = Utc.with_ymd_and_hms(2017, 6, 1, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2017, 6, 2, 0, 0, 0).unwrap();
        let channels = vec![
            ChannelAddress::active_power("meter0"),
            ChannelAddress::active_power("pv0"),
        ];

        assert_eq!(
            device.build_query_url(from, to, &channels),
            "http://192.168.1.20/rest/query?fromDate=2017-06-01T00%3A00%3A00Z\
             &toDate=2017-06-02T00%3A00%3A00Z\
             &channels=meter0%2FActivePower%2Cpv0%2FActivePower"
        );
    }

    #[test]
    fn test_zero_poll_interval_disables_polling() {
        assert_eq!(RestDevice::new(&settings(Some(0)), DeviceConfig::default()).poll_interval, None);
        assert_eq!(
            RestDevice::new(&settings(Some(30)), DeviceConfig::default()).poll_interval,
            Some(Duration::from_secs(30))
        );
    }

    #[tokio::test]
    async fn test_query_without_channels_is_rejected() {
        let device = RestDevice::new(&settings(None), DeviceConfig::default());
        let from = Utc.with_ymd_and_hms(2017, 6, 1, 0, 0, 0).unwrap();

        let result = device.query(from, from, Vec::new()).await;
        assert!(matches!(result, Err(QueryError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_poll_ticks_delay_after_slow_fetch() {
        let ticks = poll_ticks(Duration::from_secs(30)).into_inner();
        assert_eq!(ticks.missed_tick_behavior(), MissedTickBehavior::Delay);
        assert_eq!(ticks.period(), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_reply_comes_with_current_config() {
        let config_requests = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route(
                "/rest/config",
                get({
                    let config_requests = config_requests.clone();
                    move || {
                        let n = config_requests.fetch_add(1, Ordering::SeqCst);
                        async move {
                            let role = if n == 0 { "grid" } else { "production" };
                            Json(serde_json::json!({ "things": [{ "id": "meter0", "role": role }] }))
                        }
                    }
                }),
            )
            .route(
                "/rest/query",
                get(|| async { Json(serde_json::json!({ "data": [] })) }),
            );
        let host = serve(app).await;

        let device = RestDevice::connect(&DeviceSettings {
            id: "home".to_string(),
            host,
            poll_interval_secs: None,
        })
        .await
        .unwrap();
        assert_eq!(device.config().things[0].role, ThingRole::Grid);

        let from = Utc.with_ymd_and_hms(2017, 6, 1, 0, 0, 0).unwrap();
        let mut replies = device
            .query(from, from, device.config().power_channels())
            .await
            .unwrap();
        let reply = replies.next().await.unwrap().unwrap();

        assert!(reply.data.is_empty());
        assert_eq!(config_requests.load(Ordering::SeqCst), 2);
        assert_eq!(device.config().things[0].role, ThingRole::Production);
        assert!(replies.next().await.is_none());
    }
}
