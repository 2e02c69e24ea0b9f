#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("failed to encode the parsed schema: {0}")]
    Encode(#[from] bincode::Error),
    #[error("failed to (de)compress the parsed schema: {0}")]
    Io(#[from] std::io::Error),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;
