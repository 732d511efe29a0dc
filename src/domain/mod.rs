// Domain layer - Energy chart models
pub mod chart;
pub mod chart_options;
pub mod device;
pub mod query;
pub mod summary;
