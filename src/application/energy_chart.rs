// Energy chart widget - Keeps one live device query and turns its replies into chart series
use crate::application::device_api::{ChartRenderer, Device, QueryError};
use crate::domain::chart::{empty_datasets, Dataset, SeriesSet};
use crate::domain::chart_options::ChartOptions;
use crate::domain::device::ChannelAddress;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartState {
    Idle,
    Loading,
    Rendered,
    Failed,
}

/// Everything the chart shows. Labels and datasets are only ever replaced
/// together.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartView {
    pub state: ChartState,
    pub loading: bool,
    pub error: Option<String>,
    pub labels: Vec<DateTime<Utc>>,
    pub datasets: Vec<Dataset>,
    /// Inputs revision this view belongs to.
    #[serde(skip)]
    pub generation: u64,
}

impl ChartView {
    fn idle() -> Self {
        Self {
            state: ChartState::Idle,
            loading: true,
            error: None,
            labels: Vec::new(),
            datasets: empty_datasets(),
            generation: 0,
        }
    }

    fn start_loading(&mut self, generation: u64) {
        self.generation = generation;
        self.state = ChartState::Loading;
        self.loading = true;
        self.error = None;
        self.labels = Vec::new();
        self.datasets = empty_datasets();
    }

    fn apply(&mut self, series: SeriesSet) {
        self.state = ChartState::Rendered;
        self.loading = false;
        self.error = None;
        self.labels = series.labels;
        self.datasets = series.datasets;
    }

    // Failed charts keep showing the loading indicator; the error is only
    // reported through `error`.
    fn fail(&mut self, error: &QueryError) {
        self.state = ChartState::Failed;
        self.loading = true;
        self.error = Some(error.to_string());
        self.labels = Vec::new();
        self.datasets = empty_datasets();
    }

    pub fn is_settled(&self) -> bool {
        matches!(self.state, ChartState::Rendered | ChartState::Failed)
    }
}

struct Subscription {
    generation: u64,
    task: JoinHandle<()>,
}

impl Subscription {
    fn cancel(self) {
        tracing::debug!("Cancelling energy chart query #{}", self.generation);
        self.task.abort();
    }
}

pub struct EnergyChartWidget {
    options: ChartOptions,
    view: Arc<watch::Sender<ChartView>>,
    renderer: Arc<dyn ChartRenderer>,
    subscription: Option<Subscription>,
    teardown: Option<watch::Sender<bool>>,
    generation: u64,
}

impl EnergyChartWidget {
    pub fn new(options: ChartOptions, renderer: Arc<dyn ChartRenderer>) -> Self {
        let (view, _) = watch::channel(ChartView::idle());
        let (teardown, _) = watch::channel(false);
        Self {
            options,
            view: Arc::new(view),
            renderer,
            subscription: None,
            teardown: Some(teardown),
            generation: 0,
        }
    }

    pub fn options(&self) -> &ChartOptions {
        &self.options
    }

    pub fn view(&self) -> ChartView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ChartView> {
        self.view.subscribe()
    }

    /// React to a new device or date range: drop the running query and start
    /// a new one. Returns the generation whose replies the view will show.
    pub fn set_inputs(
        &mut self,
        device: Arc<dyn Device>,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> u64 {
        let Some(teardown) = self.teardown.as_ref() else {
            tracing::warn!("Ignoring input change on destroyed energy chart");
            return self.generation;
        };

        if let Some(subscription) = self.subscription.take() {
            subscription.cancel();
        }

        self.generation += 1;
        let generation = self.generation;
        // Advancing the generation makes any late update of the old query a no-op.
        self.view.send_modify(|view| view.start_loading(generation));

        let channels = device.config().power_channels();
        tracing::info!(
            "Querying {} power channels of device {} from {} to {} (#{})",
            channels.len(),
            device.id(),
            from,
            to,
            generation
        );

        let query = QueryTask {
            device,
            generation,
            view: self.view.clone(),
            renderer: self.renderer.clone(),
            teardown: teardown.subscribe(),
        };
        let task = tokio::spawn(query.run(from, to, channels));
        self.subscription = Some(Subscription { generation, task });

        generation
    }

    /// Emit and close the teardown signal and cancel the running query.
    pub fn destroy(&mut self) {
        if let Some(teardown) = self.teardown.take() {
            let _ = teardown.send(true);
        }
        if let Some(subscription) = self.subscription.take() {
            subscription.cancel();
        }
    }
}

impl Drop for EnergyChartWidget {
    fn drop(&mut self) {
        self.destroy();
    }
}

struct QueryTask {
    device: Arc<dyn Device>,
    generation: u64,
    view: Arc<watch::Sender<ChartView>>,
    renderer: Arc<dyn ChartRenderer>,
    teardown: watch::Receiver<bool>,
}

impl QueryTask {
    async fn run(
        mut self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        channels: Vec<ChannelAddress>,
    ) {
        let device = self.device.clone();
        let result = tokio::select! {
            _ = self.teardown.changed() => return,
            result = device.query(from, to, channels) => result,
        };

        let mut replies = match result {
            Ok(replies) => replies,
            Err(e) => {
                self.fail(&e);
                return;
            }
        };

        loop {
            let item = tokio::select! {
                _ = self.teardown.changed() => return,
                item = replies.next() => item,
            };

            match item {
                Some(Ok(reply)) => {
                    // Summaries use the device configuration current at this reply.
                    let series = SeriesSet::from_reply(&self.device.config(), &reply);
                    let samples = series.labels.len();
                    if self.apply(series) {
                        tracing::debug!(
                            "Rendered {} samples for device {} (#{})",
                            samples,
                            self.device.id(),
                            self.generation
                        );
                        self.schedule_refresh();
                    }
                }
                Some(Err(e)) => {
                    self.fail(&e);
                    return;
                }
                None => return,
            }
        }
    }

    fn apply(&self, series: SeriesSet) -> bool {
        let generation = self.generation;
        self.view.send_if_modified(move |view| {
            if view.generation != generation {
                return false;
            }
            view.apply(series);
            true
        })
    }

    fn fail(&self, error: &QueryError) {
        tracing::error!(
            "Energy chart query for device {} failed: {}",
            self.device.id(),
            error
        );
        let generation = self.generation;
        self.view.send_if_modified(|view| {
            if view.generation != generation {
                return false;
            }
            view.fail(error);
            true
        });
    }

    /// The renderer is told to re-sync once the current update has finished,
    /// on a later turn of the runtime.
    fn schedule_refresh(&self) {
        let view = self.view.clone();
        let renderer = self.renderer.clone();
        let teardown = self.teardown.clone();
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            if *teardown.borrow() {
                return;
            }
            let snapshot = view.borrow().clone();
            renderer.refresh(&snapshot);
        });
    }
}
