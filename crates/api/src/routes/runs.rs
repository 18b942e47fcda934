//! Train run scheduling endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use common::TrainRunKey;
use ledger::TrainLayout;
use order_store::OrderStore;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::routes::orders::AppState;
use crate::routes::{parse_seat_class, parse_travel_date};

#[derive(Deserialize)]
pub struct ScheduleRunRequest {
    pub train_number: String,
    pub travel_date: String,
    pub stations: Vec<String>,
    pub coaches: Vec<CoachRequest>,
}

#[derive(Deserialize)]
pub struct CoachRequest {
    pub coach: u16,
    pub class: String,
    pub seat_count: u16,
}

#[derive(Serialize)]
pub struct RunScheduledResponse {
    pub train_number: String,
    pub travel_date: String,
    pub station_count: u32,
    pub seat_count: usize,
}

/// POST /runs — register a run's route and seat layout.
///
/// Seeds both halves of the booking core: the ledger learns the layout,
/// the route directory learns the ordered station list. The ledger write
/// goes first so a rejected layout leaves no route behind.
#[tracing::instrument(skip(state, req))]
pub async fn schedule<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<ScheduleRunRequest>,
) -> Result<(axum::http::StatusCode, Json<RunScheduledResponse>), ApiError> {
    let travel_date = parse_travel_date(&req.travel_date)?;
    if req.coaches.is_empty() {
        return Err(ApiError::BadRequest(
            "At least one coach is required".to_string(),
        ));
    }

    let mut builder = TrainLayout::builder();
    for coach in &req.coaches {
        let class = parse_seat_class(&coach.class)?;
        builder = builder.coach(coach.coach, class, coach.seat_count);
    }
    let layout = builder.build();
    let seat_count = layout.seat_count();
    let station_count = req.stations.len() as u32;

    let key = TrainRunKey::new(req.train_number.as_str(), travel_date);
    state
        .ledger
        .schedule(key.clone(), layout, station_count)
        .await?;
    state.directory.register_route(key, req.stations);

    Ok((
        axum::http::StatusCode::CREATED,
        Json(RunScheduledResponse {
            train_number: req.train_number,
            travel_date: req.travel_date,
            station_count,
            seat_count,
        }),
    ))
}
