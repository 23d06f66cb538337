pub mod client;
pub mod config;
pub mod render;

pub use client::ServerClient;
pub use config::{Config, PersistenceBackend};
pub use render::TerminalRenderer;
