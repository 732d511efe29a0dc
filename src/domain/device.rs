// Device domain model - Components of an energy system and their power channels
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub const ACTIVE_POWER: &str = "ActivePower";

/// Address of a measured channel, written as `component/channel`
/// (e.g. `meter0/ActivePower`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelAddress {
    pub component: String,
    pub channel: String,
}

impl ChannelAddress {
    pub fn new(component: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            channel: channel.into(),
        }
    }

    pub fn active_power(component: &str) -> Self {
        Self::new(component, ACTIVE_POWER)
    }
}

impl fmt::Display for ChannelAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.component, self.channel)
    }
}

impl FromStr for ChannelAddress {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((component, channel)) if !component.is_empty() && !channel.is_empty() => {
                Ok(Self::new(component, channel))
            }
            _ => Err(format!("invalid channel address '{}'", s)),
        }
    }
}

impl Serialize for ChannelAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ChannelAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ThingRole {
    /// Meter at the grid connection point; positive while buying from grid.
    Grid,
    /// PV inverter or production meter.
    Production,
    /// Energy storage system; positive while discharging.
    Ess,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Thing {
    pub id: String,
    pub role: ThingRole,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeviceConfig {
    #[serde(default)]
    pub things: Vec<Thing>,
}

impl DeviceConfig {
    #[cfg(test)]
    pub fn new(things: Vec<Thing>) -> Self {
        Self { things }
    }

    pub fn things_with_role(&self, role: ThingRole) -> impl Iterator<Item = &Thing> {
        self.things.iter().filter(move |t| t.role == role)
    }

    /// ActivePower channels of every power-relevant component, in
    /// configuration order without duplicates.
    pub fn power_channels(&self) -> Vec<ChannelAddress> {
        let mut channels: Vec<ChannelAddress> = Vec::with_capacity(self.things.len());
        for thing in &self.things {
            let address = ChannelAddress::active_power(&thing.id);
            if !channels.contains(&address) {
                channels.push(address);
            }
        }
        channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thing(id: &str, role: ThingRole) -> Thing {
        Thing {
            id: id.to_string(),
            role,
        }
    }

    #[test]
    fn test_channel_address_parse() {
        let address: ChannelAddress = "meter0/ActivePower".parse().unwrap();
        assert_eq!(address, ChannelAddress::active_power("meter0"));
        assert_eq!(address.to_string(), "meter0/ActivePower");

        assert!("meter0".parse::<ChannelAddress>().is_err());
        assert!("/ActivePower".parse::<ChannelAddress>().is_err());
    }

    #[test]
    fn test_power_channels() {
        let config = DeviceConfig::new(vec![
            thing("meter0", ThingRole::Grid),
            thing("pv0", ThingRole::Production),
            thing("ess0", ThingRole::Ess),
            thing("meter0", ThingRole::Grid),
        ]);

        assert_eq!(
            config.power_channels(),
            vec![
                ChannelAddress::active_power("meter0"),
                ChannelAddress::active_power("pv0"),
                ChannelAddress::active_power("ess0"),
            ]
        );
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{"things":[{"id":"meter0","role":"grid"},{"id":"pv0","role":"production"}]}"#;
        let config: DeviceConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.things_with_role(ThingRole::Grid).count(), 1);
        assert_eq!(config.things_with_role(ThingRole::Ess).count(), 0);
    }
}
