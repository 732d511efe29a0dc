// Application state for HTTP handlers
use crate::application::chart_service::EnergyChartService;

pub struct AppState {
    pub chart_service: EnergyChartService,
}
