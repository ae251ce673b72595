use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Unknown role: {0}")]
    UnknownRole(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
