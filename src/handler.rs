use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use tracing::info;

use crate::api::{ReadResponse, StatusResponse, WriteResponse};
use crate::error::ParamError;
use crate::model::Measurement;
use crate::store::MeasurementStore;
use crate::{bad_request, server_error, time, unpack_error};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MeasurementStore>,
}

pub const DEFAULT_FROM: &str = "2023-06-01T00:00:00";
pub const DEFAULT_LIMIT: i32 = 1000;

#[derive(Debug, Clone, PartialEq)]
pub struct ReadParams {
    pub from: String,
    pub to: String,
    pub limit: i32,
    pub inclusive: bool,
    pub timezone_offset: i64,
}

impl ReadParams {
    /// Folds the raw query map into a fully-populated parameter record.
    /// Keys match case-insensitively; unrecognized keys are ignored.
    pub fn from_query(query: &HashMap<String, String>) -> Result<Self, ParamError> {
        let mut params = ReadParams {
            from: DEFAULT_FROM.to_string(),
            to: time::now_iso(),
            limit: DEFAULT_LIMIT,
            inclusive: true,
            timezone_offset: 0,
        };

        for (k, v) in query {
            match k.to_lowercase().as_str() {
                "from" => params.from = v.clone(),
                "to" => params.to = v.clone(),
                "limit" => params.limit = v.parse().map_err(ParamError::BadLimit)?,
                "inclusive" => params.inclusive = !v.eq_ignore_ascii_case("false"),
                "timezone_offset" => {
                    params.timezone_offset = v.parse().map_err(ParamError::BadTimezoneOffset)?
                }
                _ => {}
            }
        }

        Ok(params)
    }
}

pub fn weight_param(query: &HashMap<String, String>) -> Option<&str> {
    query
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("weight"))
        .map(|(_, v)| v.as_str())
}

pub async fn healthcheck() -> impl IntoResponse {
    info!("got healthcheck request");
    Json(StatusResponse::ok())
}

pub async fn read_measurements(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let params = match ReadParams::from_query(&query) {
        Ok(params) => params,
        Err(e) => {
            tracing::error!("failed to normalize query params. param_error: {}", e);
            return server_error();
        }
    };

    info!(
        "reading measurements for {} in [{}, {}]",
        name, params.from, params.to
    );

    let measurements = match state.store.query(&name, &params).await {
        Ok(measurements) => measurements,
        Err(e) => {
            tracing::error!("failed to query measurements. store_error: {}", unpack_error(&e));
            return server_error();
        }
    };

    let mut results = Vec::with_capacity(measurements.len());
    for m in &measurements {
        match time::shift_hours(&m.datetime, params.timezone_offset) {
            Ok(datetime) => results.push((datetime, m.weight)),
            Err(e) => {
                tracing::error!("failed to shift timestamp {}. time_error: {}", m.datetime, e);
                return server_error();
            }
        }
    }

    info!("got {} measurements for {}", results.len(), name);
    (StatusCode::OK, Json(ReadResponse { results })).into_response()
}

pub async fn write_measurement(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    // inf/nan parse as f64 but have no stored-number representation
    let weight = match weight_param(&query)
        .and_then(|w| w.parse::<f64>().ok())
        .filter(|w| w.is_finite())
    {
        Some(weight) => weight,
        None => return bad_request("A valid query param 'weight' is required."),
    };

    let measurement = Measurement {
        name,
        datetime: time::now_iso(),
        weight,
    };

    info!(
        "writing measurement for {}: {} at {}",
        measurement.name, measurement.weight, measurement.datetime
    );

    if let Err(e) = state.store.put(&measurement).await {
        tracing::error!("failed to put measurement. store_error: {}", unpack_error(&e));
        return server_error();
    }

    (
        StatusCode::OK,
        Json(WriteResponse {
            name: measurement.name,
            weight: measurement.weight,
            timestamp: measurement.datetime,
        }),
    )
        .into_response()
}
