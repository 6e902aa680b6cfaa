use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("invalid message payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("ingestion api rejected reading with status {status} after {attempts} attempts")]
    DeliveryRejected { status: u16, attempts: u32 },

    #[error("transport failure after {attempts} attempts")]
    Transport { attempts: u32 },
}
