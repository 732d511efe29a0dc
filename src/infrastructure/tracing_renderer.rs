// Renderer that records chart refreshes in the trace log
use crate::application::device_api::ChartRenderer;
use crate::application::energy_chart::ChartView;
use std::sync::atomic::{AtomicU64, Ordering};

/// Server-side stand-in for the chart widget: clients pull the view over HTTP,
/// so a refresh only has to be recorded.
#[derive(Debug)]
pub struct TracingRenderer {
    device_id: String,
    refreshes: AtomicU64,
}

impl TracingRenderer {
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            refreshes: AtomicU64::new(0),
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn refreshes(&self) -> u64 {
        self.refreshes.load(Ordering::Relaxed)
    }
}

impl ChartRenderer for TracingRenderer {
    fn refresh(&self, view: &ChartView) {
        let count = self.refreshes.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(
            "Chart of device {} refreshed ({} labels, {} datasets, refresh #{})",
            self.device_id,
            view.labels.len(),
            view.datasets.len(),
            count
        );
    }
}
