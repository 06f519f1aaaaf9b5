use thiserror::Error;

/// Errors reported by the decoding and metric layers.
#[derive(Error, Debug)]
pub enum TsMonError {
    /// A structural violation was found while framing a buffer. The whole
    /// buffer is rejected; offsets past the violation cannot be trusted.
    #[error("framing error: {0}")]
    Framing(String),

    /// A PES header carried invalid syntax (bad timestamp code, missing
    /// marker bit, or a reserved flag combination).
    #[error("PES syntax error: {0}")]
    PesSyntax(String),

    /// The caller violated an API contract, e.g. feeding a packet to a
    /// metric keyed on a different PID.
    #[error("invalid usage: {0}")]
    InvalidUsage(String),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, TsMonError>;
