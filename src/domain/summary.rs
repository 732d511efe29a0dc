// Summary domain model - Per-category power view over one sample
use super::device::{ChannelAddress, DeviceConfig, ThingRole};
use super::query::ChannelValues;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CategorySummary {
    /// Active power in watts.
    pub active_power: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Summary {
    pub production: CategorySummary,
    pub grid: CategorySummary,
    pub storage: CategorySummary,
    pub consumption: CategorySummary,
}

impl Summary {
    /// Summarize raw channel values using the component roles of `config`.
    /// Consumption is whatever production, grid and storage deliver together.
    pub fn new(config: &DeviceConfig, channels: &ChannelValues) -> Self {
        let sum = |role: ThingRole| -> f64 {
            config
                .things_with_role(role)
                .filter_map(|t| {
                    channels
                        .get(&ChannelAddress::active_power(&t.id))
                        .copied()
                        .flatten()
                })
                .sum()
        };

        let production = sum(ThingRole::Production);
        let grid = sum(ThingRole::Grid);
        let storage = sum(ThingRole::Ess);

        Self {
            production: CategorySummary {
                active_power: production,
            },
            grid: CategorySummary { active_power: grid },
            storage: CategorySummary {
                active_power: storage,
            },
            consumption: CategorySummary {
                active_power: production + grid + storage,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::device::Thing;

    fn config() -> DeviceConfig {
        DeviceConfig::new(vec![
            Thing { id: "meter0".into(), role: ThingRole::Grid },
            Thing { id: "pv0".into(), role: ThingRole::Production },
            Thing { id: "pv1".into(), role: ThingRole::Production },
            Thing { id: "ess0".into(), role: ThingRole::Ess },
        ])
    }

    #[test]
    fn test_summary_categories() {
        let channels: ChannelValues = [
            (ChannelAddress::active_power("meter0"), Some(-400.0)),
            (ChannelAddress::active_power("pv0"), Some(700.0)),
            (ChannelAddress::active_power("pv1"), Some(300.0)),
            (ChannelAddress::active_power("ess0"), Some(100.0)),
        ]
        .into_iter()
        .collect();

        let summary = Summary::new(&config(), &channels);
        assert_eq!(summary.production.active_power, 1000.0);
        assert_eq!(summary.grid.active_power, -400.0);
        assert_eq!(summary.storage.active_power, 100.0);
        assert_eq!(summary.consumption.active_power, 700.0);
    }

    #[test]
    fn test_missing_values_count_as_zero() {
        let channels: ChannelValues = [
            (ChannelAddress::active_power("meter0"), Some(250.0)),
            (ChannelAddress::active_power("pv0"), None),
        ]
        .into_iter()
        .collect();

        let summary = Summary::new(&config(), &channels);
        assert_eq!(summary.production.active_power, 0.0);
        assert_eq!(summary.consumption.active_power, 250.0);
    }
}
