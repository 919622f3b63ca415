pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod schema;
pub mod seed;
pub mod serializer;
pub mod store;

pub use handlers::app;
pub use store::RecordStore;
