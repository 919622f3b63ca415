use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Json,
    routing::post,
    Router,
};
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::models::NewRestaurantPizza;
use crate::serializer::*;
use crate::store::StoreError;

use super::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/restaurant_pizzas", post(create_restaurant_pizza))
}

#[utoipa::path(
    post,
    path = "/restaurant_pizzas",
    request_body = CreateRestaurantPizzaRequest,
    responses(
        (status = 201, description = "Restaurant pizza created", body = CreateRestaurantPizzaResponse),
        (status = 400, description = "Invalid restaurant pizza", body = ValidationErrorResponse),
    ),
    tag = "restaurant_pizzas"
)]
#[instrument(skip(state))]
pub async fn create_restaurant_pizza(
    State(state): State<AppState>,
    payload: Result<Json<CreateRestaurantPizzaRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateRestaurantPizzaResponse>), ApiError> {
    let Json(payload) = payload?;

    let restaurant_pizza =
        NewRestaurantPizza::new(payload.price, payload.pizza_id, payload.restaurant_id)
            .map_err(|e| ApiError::RestaurantPizzaRejected(StoreError::from(e)))?;

    let created = state
        .store
        .create_restaurant_pizza(restaurant_pizza)
        .await
        .map_err(ApiError::RestaurantPizzaRejected)?;

    info!(
        id = created.restaurant_pizza.id,
        restaurant_id = created.restaurant.id,
        pizza_id = created.pizza.id,
        "restaurant pizza created"
    );

    Ok((StatusCode::CREATED, Json(created.into())))
}
