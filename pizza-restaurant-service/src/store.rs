use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use thiserror::Error;
use tracing::debug;

use crate::models::{
    validate_price, NewPizza, NewRestaurant, NewRestaurantPizza, Pizza, Restaurant,
    RestaurantPizza, ValidationError,
};
use crate::schema::{pizzas, restaurant_pizzas, restaurants};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i32 },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
    #[error("migration failed: {0}")]
    Migration(Box<dyn std::error::Error + Send + Sync>),
    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// A freshly created association with both of its parents.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedRestaurantPizza {
    pub restaurant_pizza: RestaurantPizza,
    pub pizza: Pizza,
    pub restaurant: Restaurant,
}

/// A restaurant together with the offerings whose pizza still resolves.
#[derive(Debug, Clone, PartialEq)]
pub struct RestaurantWithPizzas {
    pub restaurant: Restaurant,
    pub restaurant_pizzas: Vec<(RestaurantPizza, Pizza)>,
}

// Foreign key enforcement is a per-connection setting in SQLite.
#[derive(Debug)]
struct SqlitePragmas;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Handle to the relational store, cheap to clone and shared by every request.
///
/// Diesel connections are blocking, so each operation checks a connection out
/// of the pool on the blocking thread pool.
#[derive(Clone)]
pub struct RecordStore {
    pool: DbPool,
}

impl RecordStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn connect(database_url: &str, max_size: u32) -> Result<Self, StoreError> {
        let manager = ConnectionManager::<SqliteConnection>::new(database_url);
        let pool = Pool::builder()
            .max_size(max_size)
            .connection_customizer(Box::new(SqlitePragmas))
            .build(manager)?;
        Ok(Self::new(pool))
    }

    /// Applies the embedded migrations and returns the versions that ran.
    pub async fn run_pending_migrations(&self) -> Result<Vec<String>, StoreError> {
        self.interact(|conn| {
            let applied = conn
                .run_pending_migrations(MIGRATIONS)
                .map_err(StoreError::Migration)?;
            Ok(applied.iter().map(|v| v.to_string()).collect())
        })
        .await
    }

    async fn interact<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            f(&mut *conn)
        })
        .await?
    }

    /// Runs `f` inside one transaction; any `Err` rolls the whole thing back.
    pub async fn transaction<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        self.interact(move |conn| conn.immediate_transaction(f)).await
    }

    pub async fn create_restaurant(&self, new: NewRestaurant) -> Result<Restaurant, StoreError> {
        self.interact(move |conn| {
            Ok(diesel::insert_into(restaurants::table)
                .values(&new)
                .returning(Restaurant::as_returning())
                .get_result(conn)?)
        })
        .await
    }

    pub async fn find_restaurant(&self, id: i32) -> Result<Option<Restaurant>, StoreError> {
        self.interact(move |conn| Ok(load_restaurant(conn, id)?))
            .await
    }

    pub async fn list_restaurants(&self) -> Result<Vec<Restaurant>, StoreError> {
        self.interact(|conn| {
            Ok(restaurants::table
                .select(Restaurant::as_select())
                .load(conn)?)
        })
        .await
    }

    pub async fn find_restaurant_with_pizzas(
        &self,
        id: i32,
    ) -> Result<Option<RestaurantWithPizzas>, StoreError> {
        self.interact(move |conn| {
            let Some(restaurant) = load_restaurant(conn, id)? else {
                return Ok(None);
            };
            let restaurant_pizzas = load_restaurant_pizzas_of(conn, restaurant.id)?;
            Ok(Some(RestaurantWithPizzas {
                restaurant,
                restaurant_pizzas,
            }))
        })
        .await
    }

    /// Offerings of one restaurant joined with their pizza. Rows whose pizza
    /// is gone are left out.
    pub async fn restaurant_pizzas_of(
        &self,
        restaurant_id: i32,
    ) -> Result<Vec<(RestaurantPizza, Pizza)>, StoreError> {
        self.interact(move |conn| Ok(load_restaurant_pizzas_of(conn, restaurant_id)?))
            .await
    }

    /// Deletes a restaurant and every association it owns.
    pub async fn delete_restaurant(&self, id: i32) -> Result<(), StoreError> {
        self.transaction(move |conn| {
            if load_restaurant(conn, id)?.is_none() {
                return Err(StoreError::NotFound {
                    entity: "restaurant",
                    id,
                });
            }
            let removed = diesel::delete(
                restaurant_pizzas::table.filter(restaurant_pizzas::restaurant_id.eq(id)),
            )
            .execute(conn)?;
            diesel::delete(restaurants::table.find(id)).execute(conn)?;
            debug!(restaurant_id = id, removed, "deleted restaurant");
            Ok(())
        })
        .await
    }

    pub async fn create_pizza(&self, new: NewPizza) -> Result<Pizza, StoreError> {
        self.interact(move |conn| {
            Ok(diesel::insert_into(pizzas::table)
                .values(&new)
                .returning(Pizza::as_returning())
                .get_result(conn)?)
        })
        .await
    }

    pub async fn find_pizza(&self, id: i32) -> Result<Option<Pizza>, StoreError> {
        self.interact(move |conn| Ok(load_pizza(conn, id)?)).await
    }

    pub async fn list_pizzas(&self) -> Result<Vec<Pizza>, StoreError> {
        self.interact(|conn| Ok(pizzas::table.select(Pizza::as_select()).load(conn)?))
            .await
    }

    /// Deletes a pizza. Associations that offered it stay, with their
    /// `pizza_id` cleared.
    pub async fn delete_pizza(&self, id: i32) -> Result<(), StoreError> {
        self.transaction(move |conn| {
            if load_pizza(conn, id)?.is_none() {
                return Err(StoreError::NotFound { entity: "pizza", id });
            }
            let orphaned = diesel::update(
                restaurant_pizzas::table.filter(restaurant_pizzas::pizza_id.eq(id)),
            )
            .set(restaurant_pizzas::pizza_id.eq(None::<i32>))
            .execute(conn)?;
            diesel::delete(pizzas::table.find(id)).execute(conn)?;
            debug!(pizza_id = id, orphaned, "deleted pizza");
            Ok(())
        })
        .await
    }

    /// Inserts an association and re-reads both parents in the same
    /// transaction, so an unknown pizza or restaurant leaves no row behind.
    pub async fn create_restaurant_pizza(
        &self,
        new: NewRestaurantPizza,
    ) -> Result<CreatedRestaurantPizza, StoreError> {
        self.transaction(move |conn| {
            let restaurant_pizza = diesel::insert_into(restaurant_pizzas::table)
                .values(&new)
                .returning(RestaurantPizza::as_returning())
                .get_result(conn)?;
            let pizza = load_pizza(conn, new.pizza_id())?.ok_or(StoreError::NotFound {
                entity: "pizza",
                id: new.pizza_id(),
            })?;
            let restaurant =
                load_restaurant(conn, new.restaurant_id())?.ok_or(StoreError::NotFound {
                    entity: "restaurant",
                    id: new.restaurant_id(),
                })?;
            Ok(CreatedRestaurantPizza {
                restaurant_pizza,
                pizza,
                restaurant,
            })
        })
        .await
    }

    pub async fn find_restaurant_pizza(
        &self,
        id: i32,
    ) -> Result<Option<RestaurantPizza>, StoreError> {
        self.interact(move |conn| {
            Ok(restaurant_pizzas::table
                .find(id)
                .select(RestaurantPizza::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    pub async fn list_restaurant_pizzas(&self) -> Result<Vec<RestaurantPizza>, StoreError> {
        self.interact(|conn| {
            Ok(restaurant_pizzas::table
                .select(RestaurantPizza::as_select())
                .load(conn)?)
        })
        .await
    }

    pub async fn update_restaurant_pizza_price(
        &self,
        id: i32,
        price: i32,
    ) -> Result<RestaurantPizza, StoreError> {
        let price = validate_price(price)?;
        self.interact(move |conn| {
            diesel::update(restaurant_pizzas::table.find(id))
                .set(restaurant_pizzas::price.eq(price))
                .returning(RestaurantPizza::as_returning())
                .get_result(conn)
                .optional()?
                .ok_or(StoreError::NotFound {
                    entity: "restaurant_pizza",
                    id,
                })
        })
        .await
    }

    pub async fn delete_restaurant_pizza(&self, id: i32) -> Result<(), StoreError> {
        self.interact(move |conn| {
            match diesel::delete(restaurant_pizzas::table.find(id)).execute(conn)? {
                0 => Err(StoreError::NotFound {
                    entity: "restaurant_pizza",
                    id,
                }),
                _ => Ok(()),
            }
        })
        .await
    }
}

fn load_restaurant(conn: &mut SqliteConnection, id: i32) -> QueryResult<Option<Restaurant>> {
    restaurants::table
        .find(id)
        .select(Restaurant::as_select())
        .first(conn)
        .optional()
}

fn load_pizza(conn: &mut SqliteConnection, id: i32) -> QueryResult<Option<Pizza>> {
    pizzas::table
        .find(id)
        .select(Pizza::as_select())
        .first(conn)
        .optional()
}

fn load_restaurant_pizzas_of(
    conn: &mut SqliteConnection,
    restaurant_id: i32,
) -> QueryResult<Vec<(RestaurantPizza, Pizza)>> {
    restaurant_pizzas::table
        .inner_join(pizzas::table)
        .filter(restaurant_pizzas::restaurant_id.eq(restaurant_id))
        .order(restaurant_pizzas::id)
        .select((RestaurantPizza::as_select(), Pizza::as_select()))
        .load(conn)
}
