// Query reply domain model - Timestamped channel readings returned by a device
use super::device::ChannelAddress;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Raw channel readings of one sample; `None` where the device recorded no value.
pub type ChannelValues = HashMap<ChannelAddress, Option<f64>>;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Sample {
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub channels: ChannelValues,
}

#[cfg(test)]
impl Sample {
    pub fn new(time: DateTime<Utc>, channels: ChannelValues) -> Self {
        Self { time, channels }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct QueryReply {
    #[serde(default)]
    pub data: Vec<Sample>,
}

#[cfg(test)]
impl QueryReply {
    pub fn new(data: Vec<Sample>) -> Self {
        Self { data }
    }
}
