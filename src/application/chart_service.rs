// Chart service - Use case for rendering the energy chart of a configured device
use crate::application::device_api::{ChartRenderer, Device};
use crate::application::energy_chart::{ChartView, EnergyChartWidget};
use crate::domain::chart::{series_colors, SeriesColor};
use crate::domain::chart_options::ChartOptions;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error, PartialEq)]
pub enum ChartServiceError {
    #[error("unknown device '{0}'")]
    UnknownDevice(String),

    #[error("fromDate {from} is after toDate {to}")]
    InvalidRange {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },

    #[error("request for device '{device}' was superseded by a newer range")]
    Superseded { device: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartResponse {
    pub device: String,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub timed_out: bool,
    #[serde(flatten)]
    pub view: ChartView,
    pub options: ChartOptions,
    pub colors: Vec<SeriesColor>,
}

struct DeviceChart {
    device: Arc<dyn Device>,
    widget: Mutex<EnergyChartWidget>,
}

pub struct EnergyChartService {
    charts: BTreeMap<String, DeviceChart>,
    render_timeout: Duration,
}

impl EnergyChartService {
    pub fn new(render_timeout: Duration) -> Self {
        Self {
            charts: BTreeMap::new(),
            render_timeout,
        }
    }

    /// Register a device with its own chart widget.
    pub fn add_device(
        &mut self,
        device: Arc<dyn Device>,
        options: ChartOptions,
        renderer: Arc<dyn ChartRenderer>,
    ) {
        let id = device.id().to_string();
        let widget = Mutex::new(EnergyChartWidget::new(options, renderer));
        self.charts.insert(id, DeviceChart { device, widget });
    }

    pub fn device_ids(&self) -> Vec<String> {
        self.charts.keys().cloned().collect()
    }

    /// Point the device's chart at a new range and wait until it has rendered
    /// or failed. A newer request for the same device supersedes this one and
    /// makes it return `Superseded`.
    pub async fn render(
        &self,
        device_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<ChartResponse, ChartServiceError> {
        let chart = self
            .charts
            .get(device_id)
            .ok_or_else(|| ChartServiceError::UnknownDevice(device_id.to_string()))?;

        if from > to {
            return Err(ChartServiceError::InvalidRange { from, to });
        }

        let (generation, mut rx, options) = {
            let mut widget = chart.widget.lock().await;
            let generation = widget.set_inputs(chart.device.clone(), from, to);
            (generation, widget.subscribe(), widget.options().clone())
        };

        let timed_out = tokio::time::timeout(
            self.render_timeout,
            rx.wait_for(|v| v.generation != generation || v.is_settled()),
        )
        .await
        .is_err();
        if timed_out {
            tracing::warn!(
                "Energy chart of device {} not ready after {:?}",
                device_id,
                self.render_timeout
            );
        }
        let view = rx.borrow().clone();
        if view.generation != generation {
            tracing::debug!(
                "Energy chart request #{} of device {} superseded by #{}",
                generation,
                device_id,
                view.generation
            );
            return Err(ChartServiceError::Superseded {
                device: device_id.to_string(),
            });
        }

        Ok(ChartResponse {
            device: device_id.to_string(),
            from,
            to,
            timed_out,
            view,
            options,
            colors: series_colors(),
        })
    }

    /// Tear down every chart widget, cancelling their queries.
    pub async fn shutdown(&self) {
        for (id, chart) in &self.charts {
            let mut widget = chart.widget.lock().await;
            widget.destroy();
            tracing::debug!(
                "Energy chart of device {} destroyed in state {:?}",
                id,
                widget.view().state
            );
        }
    }
}
