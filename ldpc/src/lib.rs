//! Rate-adaptive binary LDPC error correction.
//!
//! Built for the information-reconciliation stage of quantum key
//! distribution: two parties hold correlated bit strings, one sends the
//! syndrome of its string over a public channel, and the other recovers it
//! with a belief-propagation decoder. The syndrome length (and with it the
//! code rate) can be shortened after the fact by XOR-combining rows of the
//! mother parity-check matrix according to a pre-computed schedule.
//!
//! The central type is [`RateAdaptiveCode`]; see [`example_codes`] for
//! ready-made matrices to experiment with and [`file_formats`] for the
//! on-disk representations.

pub mod bit;
pub mod code;
pub mod decoder;
pub mod example_codes;
pub mod file_formats;
pub mod rate_adaption;
pub mod sparse_matrix;

// Re-export main types
pub use bit::Bit;
pub use code::{llrs_bsc, RateAdaptiveCode, DEFAULT_MAX_ITERATIONS, DEFAULT_VSAT};
pub use decoder::{DecodeResult, DecodeStatus};
pub use file_formats::{
    load_code, read_matrix_from_bincsc_json, read_matrix_from_cscmat,
    read_rate_adaption_from_csv, ParseError,
};
pub use rate_adaption::{RateAdaptionSchedule, ScheduleError};
pub use sparse_matrix::{CscError, Mod2Csc};

use thiserror::Error;

/// Integer type of the column-pointer array; must fit the number of stored
/// entries plus one.
pub type ColPtr = u32;

/// Integer type of row and column indices; must fit the larger matrix
/// dimension.
pub type MatrixIndex = u32;

#[derive(Error, Debug)]
pub enum LdpcError {
    #[error("invalid CSC matrix: {0}")]
    InvalidCsc(#[from] CscError),
    #[error("invalid rate adaption schedule: {0}")]
    InvalidSchedule(#[from] ScheduleError),
    #[error("input length {actual} does not match expected length {expected}")]
    InvalidInputLength { expected: usize, actual: usize },
    #[error("syndrome length {requested} outside the supported range [{min}, {max}]")]
    UnsupportedRate {
        requested: usize,
        min: usize,
        max: usize,
    },
    #[error(transparent)]
    Parse(#[from] ParseError),
}
