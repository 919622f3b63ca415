use diesel::prelude::*;
use tracing::info;

use crate::models::{NewPizza, NewRestaurant, NewRestaurantPizza, Pizza, Restaurant};
use crate::schema::{pizzas, restaurant_pizzas, restaurants};
use crate::store::{RecordStore, StoreError};

const RESTAURANTS: &[(&str, &str)] = &[
    ("Karen's Pizza Shack", "address1"),
    ("Sanjay's Pizza", "address2"),
    ("Kiki's Pizza", "address3"),
];

const PIZZAS: &[(&str, &str)] = &[
    ("Emma", "Dough, Tomato Sauce, Cheese"),
    ("Geri", "Dough, Tomato Sauce, Cheese, Pepperoni"),
    ("Melanie", "Dough, Sauce, Ricotta, Red peppers, Mustard"),
];

// (restaurant index, pizza index, price)
const OFFERINGS: &[(usize, usize, i32)] = &[(0, 0, 1), (1, 1, 4), (2, 2, 5)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub restaurants: usize,
    pub pizzas: usize,
    pub restaurant_pizzas: usize,
}

/// Replaces every row with the sample data set. Ids restart at 1.
pub async fn seed(store: &RecordStore) -> Result<SeedSummary, StoreError> {
    let summary = store
        .transaction(|conn| {
            diesel::delete(restaurant_pizzas::table).execute(conn)?;
            diesel::delete(restaurants::table).execute(conn)?;
            diesel::delete(pizzas::table).execute(conn)?;
            diesel::sql_query(
                "DELETE FROM sqlite_sequence \
                 WHERE name IN ('restaurants', 'pizzas', 'restaurant_pizzas')",
            )
            .execute(conn)?;

            let restaurants = RESTAURANTS
                .iter()
                .map(|(name, address)| {
                    diesel::insert_into(restaurants::table)
                        .values(NewRestaurant {
                            name: name.to_string(),
                            address: address.to_string(),
                        })
                        .returning(Restaurant::as_returning())
                        .get_result(conn)
                })
                .collect::<QueryResult<Vec<_>>>()?;

            let pizzas = PIZZAS
                .iter()
                .map(|(name, ingredients)| {
                    diesel::insert_into(pizzas::table)
                        .values(NewPizza {
                            name: name.to_string(),
                            ingredients: ingredients.to_string(),
                        })
                        .returning(Pizza::as_returning())
                        .get_result(conn)
                })
                .collect::<QueryResult<Vec<_>>>()?;

            for &(restaurant, pizza, price) in OFFERINGS {
                let offering =
                    NewRestaurantPizza::new(price, pizzas[pizza].id, restaurants[restaurant].id)?;
                diesel::insert_into(restaurant_pizzas::table)
                    .values(&offering)
                    .execute(conn)?;
            }

            Ok(SeedSummary {
                restaurants: restaurants.len(),
                pizzas: pizzas.len(),
                restaurant_pizzas: OFFERINGS.len(),
            })
        })
        .await?;

    info!(
        restaurants = summary.restaurants,
        pizzas = summary.pizzas,
        restaurant_pizzas = summary.restaurant_pizzas,
        "seeded database"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::TestDb;

    #[tokio::test]
    async fn test_seed_replaces_existing_rows() {
        let db = TestDb::new().await;
        db.store
            .create_restaurant(NewRestaurant {
                name: "Leftover".to_string(),
                address: "Nowhere".to_string(),
            })
            .await
            .unwrap();

        for _ in 0..2 {
            let summary = seed(&db.store).await.unwrap();
            assert_eq!(
                summary,
                SeedSummary {
                    restaurants: 3,
                    pizzas: 3,
                    restaurant_pizzas: 3,
                }
            );
        }

        let restaurants = db.store.list_restaurants().await.unwrap();
        assert_eq!(restaurants.len(), 3);
        assert_eq!(restaurants[0].id, 1);
        assert_eq!(restaurants[0].name, "Karen's Pizza Shack");
        assert_eq!(db.store.list_pizzas().await.unwrap().len(), 3);

        let offerings = db.store.restaurant_pizzas_of(2).await.unwrap();
        assert_eq!(offerings.len(), 1);
        assert_eq!(offerings[0].0.price, 4);
        assert_eq!(offerings[0].1.name, "Geri");
    }
}
