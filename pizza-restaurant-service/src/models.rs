use diesel::prelude::*;
use thiserror::Error;

use crate::schema::{pizzas, restaurant_pizzas, restaurants};

pub const MIN_PRICE: i32 = 1;
pub const MAX_PRICE: i32 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("price must be between 1 and 30, got {0}")]
    PriceOutOfRange(i32),
}

/// Checks the price bound every `RestaurantPizza` must satisfy.
pub fn validate_price(price: i32) -> Result<i32, ValidationError> {
    if (MIN_PRICE..=MAX_PRICE).contains(&price) {
        Ok(price)
    } else {
        Err(ValidationError::PriceOutOfRange(price))
    }
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq)]
#[diesel(table_name = restaurants)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Restaurant {
    pub id: i32,
    pub name: String,
    pub address: String,
}

#[derive(Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = restaurants)]
pub struct NewRestaurant {
    pub name: String,
    pub address: String,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq)]
#[diesel(table_name = pizzas)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Pizza {
    pub id: i32,
    pub name: String,
    /// Free-form, comma separated.
    pub ingredients: String,
}

#[derive(Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = pizzas)]
pub struct NewPizza {
    pub name: String,
    pub ingredients: String,
}

/// A restaurant's offering of a pizza at a price.
///
/// `pizza_id` becomes `None` once the referenced pizza is deleted; the row
/// itself stays until its restaurant goes away.
#[derive(Queryable, Selectable, Identifiable, Associations, Debug, Clone, PartialEq)]
#[diesel(belongs_to(Restaurant))]
#[diesel(belongs_to(Pizza))]
#[diesel(table_name = restaurant_pizzas)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RestaurantPizza {
    pub id: i32,
    pub price: i32,
    pub pizza_id: Option<i32>,
    pub restaurant_id: i32,
}

/// Insertable association whose price has already passed `validate_price`.
#[derive(Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = restaurant_pizzas)]
pub struct NewRestaurantPizza {
    price: i32,
    pizza_id: i32,
    restaurant_id: i32,
}

impl NewRestaurantPizza {
    pub fn new(price: i32, pizza_id: i32, restaurant_id: i32) -> Result<Self, ValidationError> {
        Ok(Self {
            price: validate_price(price)?,
            pizza_id,
            restaurant_id,
        })
    }

    pub fn price(&self) -> i32 {
        self.price
    }

    pub fn pizza_id(&self) -> i32 {
        self.pizza_id
    }

    pub fn restaurant_id(&self) -> i32 {
        self.restaurant_id
    }
}
