use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::serializer::*;
use crate::store::StoreError;

use super::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/restaurants", get(list_restaurants))
        .route(
            "/restaurants/{id}",
            get(get_restaurant).delete(delete_restaurant),
        )
}

#[utoipa::path(
    get,
    path = "/restaurants",
    responses(
        (status = 200, description = "List of restaurants", body = [Restaurant]),
        (status = 500, description = "Store failure", body = ApiErrorResponse),
    ),
    tag = "restaurants"
)]
#[instrument(skip(state))]
pub async fn list_restaurants(
    State(state): State<AppState>,
) -> Result<Json<Vec<Restaurant>>, ApiError> {
    let restaurants = state.store.list_restaurants().await?;

    Ok(Json(restaurants.into_iter().map(Restaurant::from).collect()))
}

#[utoipa::path(
    get,
    path = "/restaurants/{id}",
    responses(
        (status = 200, description = "Restaurant details", body = RestaurantDetails),
        (status = 404, description = "Restaurant not found", body = ApiErrorResponse),
        (status = 500, description = "Store failure", body = ApiErrorResponse),
    ),
    params(
        ("id" = i32, Path, description = "Restaurant ID")
    ),
    tag = "restaurants"
)]
#[instrument(skip(state))]
pub async fn get_restaurant(
    State(state): State<AppState>,
    restaurant_id: Result<Path<i32>, PathRejection>,
) -> Result<Json<RestaurantDetails>, ApiError> {
    let Path(restaurant_id) = restaurant_id?;

    let details = state
        .store
        .find_restaurant_with_pizzas(restaurant_id)
        .await?
        .ok_or(ApiError::RestaurantNotFound)?;

    Ok(Json(details.into()))
}

#[utoipa::path(
    delete,
    path = "/restaurants/{id}",
    responses(
        (status = 204, description = "Restaurant and its offerings deleted"),
        (status = 404, description = "Restaurant not found", body = ApiErrorResponse),
        (status = 500, description = "Store failure", body = ApiErrorResponse),
    ),
    params(
        ("id" = i32, Path, description = "Restaurant ID")
    ),
    tag = "restaurants"
)]
#[instrument(skip(state))]
pub async fn delete_restaurant(
    State(state): State<AppState>,
    restaurant_id: Result<Path<i32>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(restaurant_id) = restaurant_id?;

    match state.store.delete_restaurant(restaurant_id).await {
        Ok(()) => {
            info!(restaurant_id, "restaurant deleted");
            Ok(StatusCode::NO_CONTENT)
        }
        Err(StoreError::NotFound { .. }) => Err(ApiError::RestaurantNotFound),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use diesel::prelude::*;
    use serde_json::json;

    use crate::handlers::{app, testing::*};
    use crate::models::{NewPizza, NewRestaurant, NewRestaurantPizza};
    use crate::schema::restaurant_pizzas;
    use crate::store::testing::TestDb;

    async fn seeded() -> TestDb {
        let db = TestDb::new().await;
        let restaurant = db
            .store
            .create_restaurant(NewRestaurant {
                name: "Karen's Pizza Shack".to_string(),
                address: "address1".to_string(),
            })
            .await
            .unwrap();
        db.store
            .create_restaurant(NewRestaurant {
                name: "Sanjay's Pizza".to_string(),
                address: "address2".to_string(),
            })
            .await
            .unwrap();
        let pizza = db
            .store
            .create_pizza(NewPizza {
                name: "Emma".to_string(),
                ingredients: "Dough, Tomato Sauce, Cheese".to_string(),
            })
            .await
            .unwrap();
        db.store
            .create_restaurant_pizza(NewRestaurantPizza::new(10, pizza.id, restaurant.id).unwrap())
            .await
            .unwrap();
        db
    }

    #[tokio::test]
    async fn test_list_restaurants() {
        let db = seeded().await;
        let (status, body) =
            send_json(app(db.store.clone()), request(Method::GET, "/restaurants")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([
                {"id": 1, "name": "Karen's Pizza Shack", "address": "address1"},
                {"id": 2, "name": "Sanjay's Pizza", "address": "address2"},
            ])
        );
    }

    #[tokio::test]
    async fn test_list_restaurants_empty() {
        let db = TestDb::new().await;
        let (status, body) =
            send_json(app(db.store.clone()), request(Method::GET, "/restaurants")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_get_restaurant() {
        let db = seeded().await;
        let (status, body) =
            send_json(app(db.store.clone()), request(Method::GET, "/restaurants/1")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "id": 1,
                "name": "Karen's Pizza Shack",
                "address": "address1",
                "restaurant_pizzas": [{
                    "id": 1,
                    "price": 10,
                    "pizza_id": 1,
                    "restaurant_id": 1,
                    "pizza": {
                        "id": 1,
                        "name": "Emma",
                        "ingredients": "Dough, Tomato Sauce, Cheese"
                    }
                }]
            })
        );
    }

    #[tokio::test]
    async fn test_get_restaurant_without_offerings() {
        let db = seeded().await;
        let (status, body) =
            send_json(app(db.store.clone()), request(Method::GET, "/restaurants/2")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], 2);
        assert_eq!(body["restaurant_pizzas"], json!([]));
    }

    #[tokio::test]
    async fn test_get_restaurant_skips_dangling_pizza() {
        let db = seeded().await;
        diesel::insert_into(restaurant_pizzas::table)
            .values((
                restaurant_pizzas::price.eq(3),
                restaurant_pizzas::pizza_id.eq(404),
                restaurant_pizzas::restaurant_id.eq(1),
            ))
            .execute(&mut db.raw_connection())
            .unwrap();
        db.store
            .create_pizza(NewPizza {
                name: "Geri".to_string(),
                ingredients: "Dough, Tomato Sauce, Cheese, Pepperoni".to_string(),
            })
            .await
            .unwrap();
        db.store
            .create_restaurant_pizza(NewRestaurantPizza::new(7, 2, 1).unwrap())
            .await
            .unwrap();
        db.store.delete_pizza(2).await.unwrap();

        let (status, body) =
            send_json(app(db.store.clone()), request(Method::GET, "/restaurants/1")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], 1);
        let offerings = body["restaurant_pizzas"].as_array().unwrap();
        assert_eq!(offerings.len(), 1);
        assert_eq!(offerings[0]["pizza"]["name"], "Emma");
    }

    #[tokio::test]
    async fn test_get_missing_restaurant() {
        let db = seeded().await;
        for uri in ["/restaurants/0", "/restaurants/99", "/restaurants/abc"] {
            let (status, body) = send_json(app(db.store.clone()), request(Method::GET, uri)).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(body, json!({"error": "Restaurant not found"}));
        }
    }

    #[tokio::test]
    async fn test_delete_restaurant() {
        let db = seeded().await;
        let (status, body) = send(
            app(db.store.clone()),
            request(Method::DELETE, "/restaurants/1"),
        )
        .await;

        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_empty());

        let (status, body) =
            send_json(app(db.store.clone()), request(Method::GET, "/restaurants/1")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "Restaurant not found"}));
        assert!(db.store.list_restaurant_pizzas().await.unwrap().is_empty());
        assert_eq!(db.store.list_pizzas().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_restaurant_twice() {
        let db = seeded().await;
        let (status, _) = send(
            app(db.store.clone()),
            request(Method::DELETE, "/restaurants/2"),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = send_json(
            app(db.store.clone()),
            request(Method::DELETE, "/restaurants/2"),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "Restaurant not found"}));
    }
}
