//! Immutable mother parity-check matrix in compressed sparse column form.

use thiserror::Error;

use crate::bit::{xor_as_bools, Bit};
use crate::{ColPtr, MatrixIndex};

#[derive(Error, Debug)]
pub enum CscError {
    #[error("column pointer array must have at least two entries")]
    EmptyColptr,
    #[error("matrix has no nonzero entries")]
    EmptyMatrix,
    #[error("column pointers must start at zero (got {0})")]
    NonzeroStart(ColPtr),
    #[error("column pointers must be non-decreasing (violated at column {col})")]
    NotMonotonic { col: usize },
    #[error("last column pointer {last} does not match the number of stored entries {nnz}")]
    ColptrNnzMismatch { last: ColPtr, nnz: usize },
    #[error("matrix has more rows ({n_rows}) than columns ({n_cols})")]
    MoreRowsThanCols { n_rows: usize, n_cols: usize },
}

/// Binary sparse matrix over GF(2) in compressed sparse column storage.
///
/// Only the positions of ones are stored: `colptr` has one entry per column
/// plus a terminator, and `rowval[colptr[c]..colptr[c + 1]]` lists the rows
/// holding a one in column `c`. The number of rows is inferred as one plus
/// the largest stored row index. The matrix is immutable after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mod2Csc {
    colptr: Vec<ColPtr>,
    rowval: Vec<MatrixIndex>,
    n_rows: usize,
    n_cols: usize,
}

impl Mod2Csc {
    /// Validate a CSC pair and take ownership of it.
    pub fn new(colptr: Vec<ColPtr>, rowval: Vec<MatrixIndex>) -> Result<Self, CscError> {
        if colptr.len() < 2 {
            return Err(CscError::EmptyColptr);
        }
        if rowval.is_empty() {
            return Err(CscError::EmptyMatrix);
        }
        if colptr[0] != 0 {
            return Err(CscError::NonzeroStart(colptr[0]));
        }
        for col in 1..colptr.len() {
            if colptr[col] < colptr[col - 1] {
                return Err(CscError::NotMonotonic { col });
            }
        }
        let last = colptr[colptr.len() - 1];
        if last as usize != rowval.len() {
            return Err(CscError::ColptrNnzMismatch {
                last,
                nnz: rowval.len(),
            });
        }

        let n_cols = colptr.len() - 1;
        let n_rows = match rowval.iter().max() {
            Some(&max_row) => max_row as usize + 1,
            None => return Err(CscError::EmptyMatrix),
        };
        if n_rows > n_cols {
            return Err(CscError::MoreRowsThanCols { n_rows, n_cols });
        }

        Ok(Self {
            colptr,
            rowval,
            n_rows,
            n_cols,
        })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    pub fn num_nonzero(&self) -> usize {
        self.rowval.len()
    }

    pub fn colptr(&self) -> &[ColPtr] {
        &self.colptr
    }

    pub fn rowval(&self) -> &[MatrixIndex] {
        &self.rowval
    }

    /// Materialise the check-node adjacency: for every row, the variable
    /// nodes incident to it.
    ///
    /// Columns are walked in ascending order, so each row's list comes out
    /// sorted ascending. The rate-adaption transform relies on that order.
    pub fn check_node_adjacency(&self) -> Vec<Vec<MatrixIndex>> {
        let mut check_to_var: Vec<Vec<MatrixIndex>> = vec![Vec::new(); self.n_rows];
        for col in 0..self.n_cols {
            let start = self.colptr[col] as usize;
            let end = self.colptr[col + 1] as usize;
            for &row in &self.rowval[start..end] {
                check_to_var[row as usize].push(col as MatrixIndex);
            }
        }
        check_to_var
    }
}

/// Sparse GF(2) matrix-vector product over a row adjacency.
///
/// `out` is overwritten with one bit per row; bit `r` is the XOR of the
/// input bits selected by row `r`.
pub(crate) fn mulvec<B: Bit>(check_to_var: &[Vec<MatrixIndex>], input: &[B], out: &mut Vec<B>) {
    out.clear();
    out.resize(check_to_var.len(), B::from_bool(false));
    for (row, vars) in check_to_var.iter().enumerate() {
        for &var in vars {
            out[row] = xor_as_bools(out[row], input[var as usize]);
        }
    }
}
