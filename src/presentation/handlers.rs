// HTTP request handlers
use crate::application::chart_service::ChartServiceError;
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeQuery {
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}

impl RangeQuery {
    /// Whole days from the start of `fromDate` to the end of `toDate`, both
    /// defaulting to today.
    fn to_range(&self, today: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        let from = self.from_date.unwrap_or(today);
        let to = self.to_date.unwrap_or(today);
        let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or_default();
        (
            from.and_time(NaiveTime::MIN).and_utc(),
            to.and_time(end_of_day).and_utc(),
        )
    }
}

fn error_status(error: &ChartServiceError) -> StatusCode {
    match error {
        ChartServiceError::UnknownDevice(_) => StatusCode::NOT_FOUND,
        ChartServiceError::InvalidRange { .. } => StatusCode::BAD_REQUEST,
        ChartServiceError::Superseded { .. } => StatusCode::CONFLICT,
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// List configured devices
pub async fn list_devices(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.chart_service.device_ids())
}

/// Energy chart of a device over a date range
pub async fn energy_chart(
    Path(id): Path<String>,
    Query(query): Query<RangeQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let (from, to) = query.to_range(Utc::now().date_naive());

    match state.chart_service.render(&id, from, to).await {
        Ok(chart) if chart.timed_out => (StatusCode::GATEWAY_TIMEOUT, Json(chart)).into_response(),
        Ok(chart) => Json(chart).into_response(),
        Err(e) => {
            tracing::warn!("Rejected energy chart request: {}", e);
            (error_status(&e), e.to_string()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_range_covers_whole_days() {
        let query = RangeQuery {
            from_date: NaiveDate::from_ymd_opt(2017, 6, 1),
            to_date: NaiveDate::from_ymd_opt(2017, 6, 2),
        };
        let today = NaiveDate::from_ymd_opt(2017, 7, 1).unwrap();

        let (from, to) = query.to_range(today);
        assert_eq!(from, Utc.with_ymd_and_hms(2017, 6, 1, 0, 0, 0).unwrap());
        assert_eq!(to, Utc.with_ymd_and_hms(2017, 6, 2, 23, 59, 59).unwrap());
    }

    #[test]
    fn test_range_defaults_to_today() {
        let query = RangeQuery {
            from_date: None,
            to_date: None,
        };
        let today = NaiveDate::from_ymd_opt(2017, 7, 1).unwrap();

        let (from, to) = query.to_range(today);
        assert_eq!(from.date_naive(), today);
        assert_eq!(to.date_naive(), today);
    }

    #[test]
    fn test_error_status() {
        let day = Utc.with_ymd_and_hms(2017, 6, 1, 0, 0, 0).unwrap();

        assert_eq!(
            error_status(&ChartServiceError::UnknownDevice("garage".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            error_status(&ChartServiceError::InvalidRange { from: day, to: day }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_status(&ChartServiceError::Superseded {
                device: "home".to_string()
            }),
            StatusCode::CONFLICT
        );
    }
}
