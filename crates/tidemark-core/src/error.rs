use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TidemarkError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Order not found: {0}")]
    OrderNotFound(i64),

    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, TidemarkError>;
