//! Order lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use booking::{
    DirectoryClient, InMemoryNotifier, InMemoryRouteDirectory, LifecycleCoordinator, NewOrder,
};
use common::{AccountId, OrderId};
use ledger::SeatLedger;
use order_store::OrderStore;
use orders::{Order, OrderStatus};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::routes::{parse_seat_class, parse_travel_date};

/// Shared application state accessible from all handlers.
pub struct AppState<S: OrderStore> {
    pub coordinator: LifecycleCoordinator<
        S,
        DirectoryClient<InMemoryRouteDirectory>,
        InMemoryNotifier,
    >,
    pub ledger: SeatLedger,
    pub directory: InMemoryRouteDirectory,
}

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub account_id: String,
    pub train_number: String,
    pub travel_date: String,
    pub from_station: String,
    pub to_station: String,
    pub class: String,
}

#[derive(Deserialize)]
pub struct AdvanceRequest {
    pub target: String,
}

#[derive(Deserialize)]
pub struct ListOrdersQuery {
    pub account_id: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub account_id: String,
    pub train_number: String,
    pub travel_date: String,
    pub from_index: u32,
    pub to_index: u32,
    pub coach: u16,
    pub seat: u16,
    pub class: String,
    pub status: String,
    pub created_at: String,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id.to_string(),
            account_id: order.account.to_string(),
            train_number: order.train_number.to_string(),
            travel_date: order.travel_date.to_string(),
            from_index: order.interval.start(),
            to_index: order.interval.end(),
            coach: order.seat.coach,
            seat: order.seat.number,
            class: order.class.as_str().to_string(),
            status: order.status.to_string(),
            created_at: order.created_at.to_rfc3339(),
        }
    }
}

// -- Handlers --

/// POST /orders — allocate a seat and create the order.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(axum::http::StatusCode, Json<OrderResponse>), ApiError> {
    let account = parse_account_id(&req.account_id)?;
    let travel_date = parse_travel_date(&req.travel_date)?;
    let class = parse_seat_class(&req.class)?;

    let order = state
        .coordinator
        .create_order(NewOrder {
            account,
            train_number: req.train_number.into(),
            travel_date,
            from_station: req.from_station,
            to_station: req.to_station,
            class,
        })
        .await?;

    Ok((axum::http::StatusCode::CREATED, Json(order.into())))
}

/// GET /orders/:id — fetch an order through the partition router.
#[tracing::instrument(skip(state))]
pub async fn get<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.coordinator.get_order(order_id).await?;
    Ok(Json(order.into()))
}

/// GET /orders?account_id= — list an account's orders, newest first.
#[tracing::instrument(skip(state, query))]
pub async fn list<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let account = parse_account_id(&query.account_id)?;
    let orders = state.coordinator.orders_for_account(account).await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

/// POST /orders/:id/status — drive the order to a target status.
#[tracing::instrument(skip(state, req))]
pub async fn advance<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<AdvanceRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let target = OrderStatus::parse(&req.target)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown status: {}", req.target)))?;

    let order = state.coordinator.advance(order_id, target).await?;
    Ok(Json(order.into()))
}

/// POST /orders/:id/cancel — cancel the order and release its seat.
#[tracing::instrument(skip(state))]
pub async fn cancel<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.coordinator.cancel_order(order_id).await?;
    Ok(Json(order.into()))
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid order ID: {e}")))?;
    Ok(OrderId::from_uuid(uuid))
}

fn parse_account_id(id: &str) -> Result<AccountId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid account_id: {e}")))?;
    Ok(AccountId::from_uuid(uuid))
}
