// Chart data domain models - Series rendered by the energy chart
use super::device::DeviceConfig;
use super::query::QueryReply;
use super::summary::Summary;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const PRODUCTION_LABEL: &str = "Erzeugung";
pub const GRID_LABEL: &str = "Netz";
pub const CONSUMPTION_LABEL: &str = "Verbrauch";

const NO_DATA_LABEL: &str = "no data";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub label: String,
    pub data: Vec<f64>,
}

impl Dataset {
    pub fn new(label: &str, data: Vec<f64>) -> Self {
        Self {
            label: label.to_string(),
            data,
        }
    }
}

/// Placeholder shown while nothing has been rendered.
pub fn empty_datasets() -> Vec<Dataset> {
    vec![Dataset::new(NO_DATA_LABEL, Vec::new())]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesColor {
    pub background_color: &'static str,
    pub border_color: &'static str,
}

/// Colors for production, grid and consumption, in dataset order.
pub fn series_colors() -> Vec<SeriesColor> {
    vec![
        SeriesColor {
            background_color: "rgba(37,154,24,0.2)",
            border_color: "rgba(37,154,24,1)",
        },
        SeriesColor {
            background_color: "rgba(221,223,1,0.2)",
            border_color: "rgba(221,223,1,1)",
        },
        SeriesColor {
            background_color: "rgba(45,143,171,0.2)",
            border_color: "rgba(45,143,171,1)",
        },
    ]
}

/// Labels and datasets built from one query reply. Every dataset has exactly
/// one value per label.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSet {
    pub labels: Vec<DateTime<Utc>>,
    pub datasets: Vec<Dataset>,
}

impl SeriesSet {
    pub fn from_reply(config: &DeviceConfig, reply: &QueryReply) -> Self {
        let len = reply.data.len();
        let mut labels = Vec::with_capacity(len);
        let mut production = Vec::with_capacity(len);
        let mut grid = Vec::with_capacity(len);
        let mut consumption = Vec::with_capacity(len);

        for sample in &reply.data {
            labels.push(sample.time);
            let summary = Summary::new(config, &sample.channels);
            grid.push(to_kilowatts(summary.grid.active_power));
            production.push(to_kilowatts(summary.production.active_power));
            consumption.push(to_kilowatts(summary.consumption.active_power));
        }

        Self {
            labels,
            datasets: vec![
                Dataset::new(PRODUCTION_LABEL, production),
                Dataset::new(GRID_LABEL, grid),
                Dataset::new(CONSUMPTION_LABEL, consumption),
            ],
        }
    }
}

fn to_kilowatts(watts: f64) -> f64 {
    watts / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::device::{ChannelAddress, Thing, ThingRole};
    use crate::domain::query::Sample;
    use chrono::TimeZone;

    fn config() -> DeviceConfig {
        DeviceConfig::new(vec![
            Thing { id: "meter0".into(), role: ThingRole::Grid },
            Thing { id: "pv0".into(), role: ThingRole::Production },
        ])
    }

    fn sample(minute: u32, grid: f64, production: f64) -> Sample {
        let time = Utc.with_ymd_and_hms(2017, 6, 1, 10, minute, 0).unwrap();
        let channels = [
            (ChannelAddress::active_power("meter0"), Some(grid)),
            (ChannelAddress::active_power("pv0"), Some(production)),
        ]
        .into_iter()
        .collect();
        Sample::new(time, channels)
    }

    #[test]
    fn test_converts_watts_to_kilowatts() {
        let reply = QueryReply::new(vec![sample(0, 3000.0, 0.0)]);
        let set = SeriesSet::from_reply(&config(), &reply);

        assert_eq!(set.datasets[1].label, GRID_LABEL);
        assert_eq!(set.datasets[1].data, vec![3.0]);
    }

    #[test]
    fn test_series_are_index_aligned() {
        let reply = QueryReply::new(vec![
            sample(0, -200.0, 500.0),
            sample(5, -400.0, 1000.0),
            sample(10, 100.0, 0.0),
        ]);
        let set = SeriesSet::from_reply(&config(), &reply);

        assert_eq!(set.labels.len(), 3);
        assert_eq!(set.datasets.len(), 3);
        for dataset in &set.datasets {
            assert_eq!(dataset.data.len(), set.labels.len());
        }
        assert_eq!(set.datasets[0].data, vec![0.5, 1.0, 0.0]);
        assert_eq!(set.datasets[2].data, vec![0.3, 0.6, 0.1]);
    }

    #[test]
    fn test_empty_reply() {
        let set = SeriesSet::from_reply(&config(), &QueryReply::default());
        assert!(set.labels.is_empty());
        assert!(set.datasets.iter().all(|d| d.data.is_empty()));
    }

    #[test]
    fn test_colors_match_datasets() {
        assert_eq!(series_colors().len(), 3);
        assert_eq!(empty_datasets().len(), 1);
        assert!(empty_datasets()[0].data.is_empty());
    }
}
