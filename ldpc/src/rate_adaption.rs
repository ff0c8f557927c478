//! Rate adaption: shortening the syndrome by pairwise row combination.
//!
//! A rate-adaption schedule names pairs of mother-matrix rows. Combining a
//! pair replaces its two checks by their GF(2) sum, whose variable set is
//! the symmetric difference of the two rows: a variable shared by both rows
//! cancels and drops out of the combined check ("variable-node
//! elimination"). Schedules producing such eliminations are accepted as-is;
//! they are known to degrade decoding quality, and judging that trade-off
//! is left to whoever designed the schedule.

use std::cmp::Ordering;

use thiserror::Error;

use crate::bit::{xor_as_bools, Bit};
use crate::MatrixIndex;

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("rate adaption schedule has odd length {0} (expected row pairs)")]
    OddLength(usize),
    #[error("schedule row index {index} is out of bounds for a matrix with {n_rows} rows")]
    RowIndexOutOfBounds { index: MatrixIndex, n_rows: usize },
    #[error("schedule names {named} rows but the matrix only has {n_rows}")]
    TooManyPairs { named: usize, n_rows: usize },
    #[error("requested {requested} rate adaption steps but the schedule supports at most {max}")]
    StepsOutOfRange { requested: usize, max: usize },
}

/// An immutable sequence of mother-matrix row pairs to be XOR-combined.
///
/// The flattened list `[a_0, b_0, a_1, b_1, ...]` is read two entries at a
/// time; combining `K` pairs shortens the syndrome by `K` bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateAdaptionSchedule {
    rows_to_combine: Vec<MatrixIndex>,
}

impl RateAdaptionSchedule {
    /// Take ownership of a flattened pair list, rejecting odd lengths.
    ///
    /// Bounds against a concrete matrix are checked by [`validate_for`],
    /// since the schedule itself does not know the matrix dimensions.
    ///
    /// [`validate_for`]: RateAdaptionSchedule::validate_for
    pub fn new(rows_to_combine: Vec<MatrixIndex>) -> Result<Self, ScheduleError> {
        if rows_to_combine.len() % 2 != 0 {
            return Err(ScheduleError::OddLength(rows_to_combine.len()));
        }
        Ok(Self { rows_to_combine })
    }

    /// Check that every named row exists in a matrix with `n_rows` rows and
    /// that the schedule does not name more row slots than the matrix has.
    pub fn validate_for(&self, n_rows: usize) -> Result<(), ScheduleError> {
        if self.rows_to_combine.len() > n_rows {
            return Err(ScheduleError::TooManyPairs {
                named: self.rows_to_combine.len(),
                n_rows,
            });
        }
        for &index in &self.rows_to_combine {
            if index as usize >= n_rows {
                return Err(ScheduleError::RowIndexOutOfBounds { index, n_rows });
            }
        }
        Ok(())
    }

    /// Number of pairs, i.e. the largest supported number of adaption steps.
    pub fn max_steps(&self) -> usize {
        self.rows_to_combine.len() / 2
    }

    pub fn pair(&self, i: usize) -> (MatrixIndex, MatrixIndex) {
        (self.rows_to_combine[2 * i], self.rows_to_combine[2 * i + 1])
    }

    pub fn as_slice(&self) -> &[MatrixIndex] {
        &self.rows_to_combine
    }
}

/// Symmetric difference of two ascending index lists.
///
/// An index present in both inputs is dropped entirely; this is GF(2) row
/// addition on sparse rows.
fn symmetric_difference(a: &[MatrixIndex], b: &[MatrixIndex]) -> Vec<MatrixIndex> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Less => {
                out.push(a[i]);
                i += 1;
            }
            Ordering::Greater => {
                out.push(b[j]);
                j += 1;
            }
            Ordering::Equal => {
                i += 1;
                j += 1;
            }
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}

/// Apply `steps` pair combinations to the mother check-node adjacency.
///
/// The first `2 * steps` schedule entries are consumed: surviving rows are
/// copied to the front in mother order, and one combined row per pair is
/// appended after them, sorted ascending. A consumed row takes part in later
/// pairs as an empty row. The result has `mother.len() - steps` rows.
///
/// Callers guarantee `steps <= schedule.max_steps()` and that the schedule
/// was validated against this adjacency.
pub(crate) fn combine_rows(
    mother: &[Vec<MatrixIndex>],
    schedule: &RateAdaptionSchedule,
    steps: usize,
) -> Vec<Vec<MatrixIndex>> {
    let n_rows = mother.len();
    let mut working: Vec<Vec<MatrixIndex>> = mother.to_vec();
    let mut consumed = vec![false; n_rows];

    let mut combined: Vec<Vec<MatrixIndex>> = Vec::with_capacity(steps);
    for i in 0..steps {
        let (a, b) = schedule.pair(i);
        let (a, b) = (a as usize, b as usize);
        combined.push(symmetric_difference(&working[a], &working[b]));
        working[a].clear();
        consumed[a] = true;
        working[b].clear();
        consumed[b] = true;
    }

    let front_len = n_rows - 2 * steps;
    let mut rows: Vec<Vec<MatrixIndex>> = Vec::with_capacity(n_rows - steps);
    for (row, vars) in working.iter().enumerate() {
        if rows.len() == front_len {
            break;
        }
        if !consumed[row] {
            rows.push(vars.clone());
        }
    }
    rows.extend(combined);
    rows
}

/// Transpose a check-node adjacency into the variable-node view.
///
/// Rows are walked in ascending order, so each variable's check list comes
/// out sorted ascending.
pub(crate) fn transpose(
    check_to_var: &[Vec<MatrixIndex>],
    n_cols: usize,
) -> Vec<Vec<MatrixIndex>> {
    let mut var_to_check: Vec<Vec<MatrixIndex>> = vec![Vec::new(); n_cols];
    for (row, vars) in check_to_var.iter().enumerate() {
        for &var in vars {
            var_to_check[var as usize].push(row as MatrixIndex);
        }
    }
    var_to_check
}

/// Apply the rate-adaption step directly to a mother-rate syndrome.
///
/// Produces the same bits as encoding against the adjacency returned by
/// [`combine_rows`] for the same number of steps: surviving syndrome bits at
/// the front in mother order, one XOR-combined bit per pair at the back. A
/// consumed bit contributes zero to later pairs, mirroring the empty-row
/// convention of the adjacency transform.
pub(crate) fn adapt_syndrome<B: Bit>(
    mother_syndrome: &[B],
    schedule: &RateAdaptionSchedule,
    steps: usize,
    out: &mut Vec<B>,
) {
    let n_rows = mother_syndrome.len();
    let front_len = n_rows - 2 * steps;

    let mut working: Vec<B> = mother_syndrome.to_vec();
    let mut consumed = vec![false; n_rows];

    out.clear();
    out.resize(n_rows - steps, B::from_bool(false));
    for i in 0..steps {
        let (a, b) = schedule.pair(i);
        let (a, b) = (a as usize, b as usize);
        out[front_len + i] = xor_as_bools(working[a], working[b]);
        working[a] = B::from_bool(false);
        consumed[a] = true;
        working[b] = B::from_bool(false);
        consumed[b] = true;
    }

    let mut slot = 0;
    for (row, &bit) in mother_syndrome.iter().enumerate() {
        if slot == front_len {
            break;
        }
        if !consumed[row] {
            out[slot] = bit;
            slot += 1;
        }
    }
}
