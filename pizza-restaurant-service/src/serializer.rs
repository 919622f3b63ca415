use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models;
use crate::store::{CreatedRestaurantPizza, RestaurantWithPizzas};

#[derive(Debug, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct Restaurant {
    /// Unique identifier for the restaurant
    pub id: i32,
    /// Name of the restaurant
    pub name: String,
    /// Address of the restaurant
    pub address: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct Pizza {
    /// Unique identifier for the pizza
    pub id: i32,
    /// Name of the pizza
    pub name: String,
    /// Comma separated ingredient list
    pub ingredients: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct RestaurantPizza {
    pub id: i32,
    pub price: i32,
    pub pizza_id: i32,
    pub restaurant_id: i32,
    pub pizza: Pizza,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct RestaurantDetails {
    pub id: i32,
    pub name: String,
    pub address: String,
    /// Offerings whose pizza still exists
    pub restaurant_pizzas: Vec<RestaurantPizza>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateRestaurantPizzaRequest {
    /// Price between 1 and 30
    pub price: i32,
    pub pizza_id: i32,
    pub restaurant_id: i32,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct CreateRestaurantPizzaResponse {
    pub id: i32,
    pub price: i32,
    pub pizza_id: i32,
    pub restaurant_id: i32,
    pub pizza: Pizza,
    pub restaurant: Restaurant,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// Error message
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ValidationErrorResponse {
    /// Always `["validation errors"]`
    pub errors: Vec<String>,
}

impl From<models::Restaurant> for Restaurant {
    fn from(r: models::Restaurant) -> Self {
        Self {
            id: r.id,
            name: r.name,
            address: r.address,
        }
    }
}

impl From<models::Pizza> for Pizza {
    fn from(p: models::Pizza) -> Self {
        Self {
            id: p.id,
            name: p.name,
            ingredients: p.ingredients,
        }
    }
}

impl From<RestaurantWithPizzas> for RestaurantDetails {
    fn from(details: RestaurantWithPizzas) -> Self {
        let RestaurantWithPizzas {
            restaurant,
            restaurant_pizzas,
        } = details;
        Self {
            id: restaurant.id,
            name: restaurant.name,
            address: restaurant.address,
            restaurant_pizzas: restaurant_pizzas
                .into_iter()
                .map(|(rp, pizza)| RestaurantPizza {
                    id: rp.id,
                    price: rp.price,
                    pizza_id: rp.pizza_id.unwrap_or(pizza.id),
                    restaurant_id: rp.restaurant_id,
                    pizza: pizza.into(),
                })
                .collect(),
        }
    }
}

impl From<CreatedRestaurantPizza> for CreateRestaurantPizzaResponse {
    fn from(created: CreatedRestaurantPizza) -> Self {
        let CreatedRestaurantPizza {
            restaurant_pizza,
            pizza,
            restaurant,
        } = created;
        Self {
            id: restaurant_pizza.id,
            price: restaurant_pizza.price,
            pizza_id: restaurant_pizza.pizza_id.unwrap_or(pizza.id),
            restaurant_id: restaurant_pizza.restaurant_id,
            pizza: pizza.into(),
            restaurant: restaurant.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> (models::Restaurant, models::RestaurantPizza, models::Pizza) {
        (
            models::Restaurant {
                id: 4,
                name: "Dominoes".to_string(),
                address: "X".to_string(),
            },
            models::RestaurantPizza {
                id: 11,
                price: 5,
                pizza_id: Some(7),
                restaurant_id: 4,
            },
            models::Pizza {
                id: 7,
                name: "Cheese".to_string(),
                ingredients: "Dough, Cheese".to_string(),
            },
        )
    }

    #[test]
    fn test_restaurant_details_use_row_columns() {
        let (restaurant, mut rp, pizza) = rows();
        rp.pizza_id = Some(8);

        let details = RestaurantDetails::from(RestaurantWithPizzas {
            restaurant,
            restaurant_pizzas: vec![(rp, pizza)],
        });

        assert_eq!(details.id, 4);
        assert_eq!(details.restaurant_pizzas.len(), 1);
        let offering = &details.restaurant_pizzas[0];
        assert_eq!(offering.id, 11);
        assert_eq!(offering.price, 5);
        assert_eq!(offering.pizza_id, 8);
        assert_eq!(offering.restaurant_id, 4);
        assert_eq!(offering.pizza.id, 7);
    }

    #[test]
    fn test_created_response_uses_row_columns() {
        let (restaurant, mut rp, pizza) = rows();
        rp.pizza_id = Some(8);
        rp.restaurant_id = 3;

        let response = CreateRestaurantPizzaResponse::from(CreatedRestaurantPizza {
            restaurant_pizza: rp,
            pizza,
            restaurant,
        });

        assert_eq!(response.id, 11);
        assert_eq!(response.pizza_id, 8);
        assert_eq!(response.restaurant_id, 3);
        assert_eq!(response.pizza.name, "Cheese");
        assert_eq!(response.restaurant.name, "Dominoes");
    }

    #[test]
    fn test_cleared_pizza_id_falls_back_to_joined_pizza() {
        let (restaurant, mut rp, pizza) = rows();
        rp.pizza_id = None;

        let details = RestaurantDetails::from(RestaurantWithPizzas {
            restaurant,
            restaurant_pizzas: vec![(rp, pizza)],
        });

        assert_eq!(details.restaurant_pizzas[0].pizza_id, 7);
    }
}
