mod client;
mod models;

pub use client::MongoPersistenceClient;
pub use models::{MongoQuestion, MongoThread};
