use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistError {
    #[cfg(feature = "mongodb")]
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[cfg(feature = "mongodb")]
    #[error("BSON serialization error: {0}")]
    BsonSerialization(#[from] bson::ser::Error),

    #[error("Thread not found: {0}")]
    ThreadNotFound(String),

    #[error("Question not found: {0}")]
    QuestionNotFound(String),

    #[error("Connection error: {0}")]
    Connection(String),
}

impl PersistError {
    /// Worth retrying: the record may exist, the store just did not answer
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ThreadNotFound(_) | Self::QuestionNotFound(_) => false,
            #[cfg(feature = "mongodb")]
            Self::BsonSerialization(_) => false,
            #[cfg(feature = "mongodb")]
            Self::Database(_) => true,
            Self::Connection(_) => true,
        }
    }
}

pub type Result<T> = std::result::Result<T, PersistError>;
