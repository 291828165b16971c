
use thiserror::Error;

/// Errors reported by the consensus engine.
/// Every variant is detected during input validation, before any graph state
/// is built, so a failed call leaves the engine untouched.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConsensusError {
    #[error("no sequences were provided")]
    EmptyInput,

    #[error("sequence {index} is empty")]
    EmptySequence { index: usize },

    #[error("sequence {index} contains a symbol outside the nucleotide alphabet: {symbol:#04x}")]
    InvalidSymbol { index: usize, symbol: u8 },

    #[error("sequence {index} has zero weight, weights must be >= 1")]
    ZeroWeight { index: usize },

    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),

    #[error("cumulative sequence weights are too large to merge without overflow")]
    WeightOverflow,
}
