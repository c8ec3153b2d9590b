use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    #[error("Invalid buffer capacity: {capacity} (must be between 1 and {max})", max = super::MAX_CAPACITY)]
    InvalidCapacity { capacity: usize },
}
