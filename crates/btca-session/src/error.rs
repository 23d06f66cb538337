use btca_persist::PersistError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    /// Nothing was named and the registry has nothing to offer
    #[error("No resources configured. Add resources to your btca config file.")]
    EmptyResourceSet,

    #[error("No thread initialized")]
    ThreadNotInitialized,

    #[error("Failed to list resources: {0}")]
    Registry(anyhow::Error),

    #[error(transparent)]
    Persist(#[from] PersistError),
}

pub type Result<T> = std::result::Result<T, SessionError>;
