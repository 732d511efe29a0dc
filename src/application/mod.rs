// Application layer - Use cases and the ports they consume
pub mod chart_service;
pub mod device_api;
pub mod energy_chart;
