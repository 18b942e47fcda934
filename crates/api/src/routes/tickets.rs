//! Remaining-ticket queries.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use common::TrainRunKey;
use order_store::OrderStore;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::routes::orders::AppState;
use crate::routes::{parse_seat_class, parse_travel_date};

#[derive(Deserialize)]
pub struct LeftTicketsQuery {
    pub train: String,
    pub date: String,
    pub from: String,
    pub to: String,
    pub class: String,
}

#[derive(Serialize)]
pub struct LeftTicketsResponse {
    pub train_number: String,
    pub travel_date: String,
    pub from: String,
    pub to: String,
    pub class: String,
    pub left: u32,
}

/// GET /tickets/left — seats still free for a journey, by class.
#[tracing::instrument(skip(state, query))]
pub async fn left<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<LeftTicketsQuery>,
) -> Result<Json<LeftTicketsResponse>, ApiError> {
    let travel_date = parse_travel_date(&query.date)?;
    let class = parse_seat_class(&query.class)?;
    let key = TrainRunKey::new(query.train.as_str(), travel_date);

    let left = state
        .coordinator
        .left_tickets(&key, &query.from, &query.to, class)
        .await?;

    Ok(Json(LeftTicketsResponse {
        train_number: query.train,
        travel_date: query.date,
        from: query.from,
        to: query.to,
        class: query.class,
        left,
    }))
}
