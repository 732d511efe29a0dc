// Device and renderer traits - Collaborators consumed by the energy chart
use crate::application::energy_chart::ChartView;
use crate::domain::device::{ChannelAddress, DeviceConfig};
use crate::domain::query::QueryReply;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum QueryError {
    #[error("query request failed: {0}")]
    Request(String),

    #[error("device rejected query: {0}")]
    Rejected(String),

    #[error("invalid query reply: {0}")]
    InvalidReply(String),
}

/// Replies of one query. A device may answer more than once over the life of
/// the stream (e.g. when it keeps polling a range that includes "now").
pub type ReplyStream = BoxStream<'static, Result<QueryReply, QueryError>>;

#[async_trait]
pub trait Device: Send + Sync {
    fn id(&self) -> &str;

    /// Current configuration of the device
    fn config(&self) -> DeviceConfig;

    /// Query historic values of `channels` between `from` and `to`
    async fn query(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        channels: Vec<ChannelAddress>,
    ) -> Result<ReplyStream, QueryError>;
}

/// Receives an explicit re-sync request after the chart data was replaced.
pub trait ChartRenderer: Send + Sync {
    fn refresh(&self, view: &ChartView);
}
