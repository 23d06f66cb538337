pub mod error;
pub mod memory;
pub mod models;
pub mod trait_client;

#[cfg(feature = "mongodb")]
pub mod dbs;

pub use error::{PersistError, Result};
pub use memory::InMemoryPersistenceClient;
pub use models::{StoredQuestion, StoredThread};
pub use trait_client::PersistenceClient;

#[cfg(feature = "mongodb")]
pub use dbs::mongo::MongoPersistenceClient;
