use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub chart: ChartSettings,
    #[serde(default)]
    pub devices: Vec<DeviceSettings>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChartSettings {
    #[serde(default = "default_unit_label")]
    pub unit_label: String,
    pub y_max: Option<f64>,
    #[serde(default = "default_render_timeout")]
    pub render_timeout_secs: u64,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            unit_label: default_unit_label(),
            y_max: None,
            render_timeout_secs: default_render_timeout(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DeviceSettings {
    pub id: String,
    pub host: String,
    /// Re-query the range on this interval while a chart is open
    pub poll_interval_secs: Option<u64>,
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_unit_label() -> String {
    "kW".to_string()
}

fn default_render_timeout() -> u64 {
    10
}

pub fn load_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/energychart").required(false))
        .add_source(
            config::Environment::with_prefix("ENERGYCHART")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
