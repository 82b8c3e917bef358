//! Shared error types for the marketplace

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharedError {
    #[error("Invalid id: {input}")]
    InvalidId { input: String },

    #[error("Invalid coordinate: {input}")]
    InvalidCoordinate { input: String },

    #[error("Invalid configuration: {field} = {value}")]
    InvalidConfig { field: String, value: String },
}

pub type SharedResult<T> = Result<T, SharedError>;
