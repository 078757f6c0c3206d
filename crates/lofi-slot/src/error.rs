//! Error types for the slot engine

use thiserror::Error;

/// Engine error type
///
/// Every variant is recoverable; the machine keeps running after any of them.
#[derive(Error, Debug)]
pub enum SlotError {
    #[error("Not enough credits: spin costs {needed}, have {available}")]
    InsufficientCredits { needed: u64, available: u64 },

    #[error("A spin is already in progress")]
    AlreadySpinning,

    #[error("Invalid bet: {0}")]
    InvalidBet(u64),

    #[error("Unknown symbol id: {0}")]
    InvalidSymbol(u32),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias
pub type SlotResult<T> = Result<T, SlotError>;
