pub mod pizza;
pub mod restaurant;
pub mod restaurant_pizza;

pub use pizza::router as pizza_router;
pub use restaurant::router as restaurant_router;
pub use restaurant_pizza::router as restaurant_pizza_router;

use axum::{response::Html, response::Json, routing::get, Router};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::store::RecordStore;

pub const INDEX_HTML: &str = "<h1>Code challenge</h1>";

#[derive(Clone)]
pub struct AppState {
    pub store: RecordStore,
}

/// The full HTTP surface, ready to be served.
pub fn app(store: RecordStore) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api-docs/openapi.json", get(openapi))
        .merge(restaurant_router())
        .merge(pizza_router())
        .merge(restaurant_pizza_router())
        .with_state(AppState { store })
        .layer(TraceLayer::new_for_http())
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Index page", body = String, content_type = "text/html"),
    ),
    tag = "index"
)]
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        index,
        restaurant::list_restaurants,
        restaurant::get_restaurant,
        restaurant::delete_restaurant,
        pizza::list_pizzas,
        restaurant_pizza::create_restaurant_pizza,
    ),
    components(
        schemas(
            crate::serializer::Restaurant,
            crate::serializer::RestaurantDetails,
            crate::serializer::RestaurantPizza,
            crate::serializer::Pizza,
            crate::serializer::CreateRestaurantPizzaRequest,
            crate::serializer::CreateRestaurantPizzaResponse,
            crate::serializer::ApiErrorResponse,
            crate::serializer::ValidationErrorResponse
        )
    ),
    tags(
        (name = "index", description = "Landing page"),
        (name = "restaurants", description = "Restaurant endpoints"),
        (name = "pizzas", description = "Pizza endpoints"),
        (name = "restaurant_pizzas", description = "Restaurant pizza offerings")
    ),
    info(
        title = "Pizza Restaurant Service",
        description = "Restaurants, pizzas and the prices restaurants offer them at",
        version = "1.0.0"
    )
)]
pub struct ApiDoc;
